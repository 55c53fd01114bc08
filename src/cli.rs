use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "booster")]
#[command(about = "Discover GitHub users and generate a card for each new one", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Collect new users, generate their cards and update the ledger
    Run(RunArgs),
    /// Load and validate configuration, then print the effective settings
    CheckConfig(ConfigArgs),
}

#[derive(clap::Args, Debug)]
pub struct ConfigArgs {
    /// TOML configuration file (defaults to $BOOSTER_CONFIG or booster.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Ledger file listing users that already have a card
    #[arg(long)]
    pub ledger: Option<PathBuf>,

    /// Directory the card images are written to
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Number of new users to collect
    #[arg(long)]
    pub target: Option<usize>,
}
