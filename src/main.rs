mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    booster::observability::init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => commands::run(args).await?,
        Commands::CheckConfig(args) => commands::check_config(args)?,
    }

    Ok(())
}
