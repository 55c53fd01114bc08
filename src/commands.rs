use std::sync::Arc;

use booster::card::{CardGenerator, HttpCardApi, RetryPolicy, TokenMinter, TokioSleeper};
use booster::config::{Config, ValidationError};
use booster::discovery::{self, RunSettings};
use booster::ledger::LedgerFile;
use booster::observability::Metrics;
use booster::source::GitHubSource;
use booster::storage::StorageClient;
use tracing::info;

use crate::cli::{ConfigArgs, RunArgs};

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

fn load_config(args: &ConfigArgs) -> Result<Config, AnyError> {
    let config = match &args.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    Ok(config)
}

pub async fn run(args: RunArgs) -> Result<(), AnyError> {
    let mut config = load_config(&args.config)?;

    if let Some(ledger) = args.ledger {
        config.run.ledger_path = ledger;
    }
    if let Some(output_dir) = args.output_dir {
        config.run.output_dir = output_dir;
    }
    if let Some(target) = args.target {
        config.run.target = target;
    }
    config.validate()?;

    let client = booster::client::build(&config.http)?;

    let token = config
        .github
        .token
        .clone()
        .ok_or(ValidationError::MissingGitHubToken)?;
    let source = GitHubSource::new(client.clone(), &config.github, token);

    let minter = TokenMinter::from_config(&config.card_api)?;
    let base_url = config
        .card_api
        .base_url
        .as_deref()
        .ok_or(ValidationError::MissingCardApiUrl)?;
    let api = HttpCardApi::new(client, base_url, minter)?;

    let storage = StorageClient::local(&config.run.output_dir)?;
    let metrics = Arc::new(Metrics::new());
    let generator = CardGenerator::new(
        api,
        RetryPolicy::from(&config.retry),
        Arc::new(TokioSleeper),
        storage,
    )
    .with_metrics(metrics.clone());

    let ledger = LedgerFile::new(&config.run.ledger_path);
    let settings = RunSettings {
        target: config.run.target,
    };

    info!(
        target_users = settings.target,
        ledger = %ledger.path().display(),
        output_dir = %config.run.output_dir.display(),
        "Starting discovery run"
    );

    let report = discovery::run(&source, &generator, &ledger, &settings, &metrics).await?;

    if report.source_exhausted && report.collected.len() < settings.target {
        info!(
            collected = report.collected.len(),
            "User source exhausted before reaching target"
        );
    }
    metrics.snapshot().log_summary();

    Ok(())
}

pub fn check_config(args: ConfigArgs) -> Result<(), AnyError> {
    let config = load_config(&args)?;
    let minter = TokenMinter::from_config(&config.card_api)?;

    println!("{}", serde_json::to_string_pretty(&config)?);
    println!("configuration ok (signing with {:?})", minter.algorithm());
    Ok(())
}
