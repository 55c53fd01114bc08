use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::{Path, PathBuf};

const CONFIG_ENV_VAR: &str = "BOOSTER_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "booster.toml";
const ENV_PREFIX: &str = "BOOSTER";
const ENV_SEPARATOR: &str = "__";

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists; `BOOSTER_CONFIG` or `booster.toml` unless a path is given)
/// 3. `BOOSTER__*` environment variables
/// 4. Secrets and card API settings from the process environment / `.env`
pub fn load(config_path: Option<&Path>) -> Result<Config, ConfigError> {
    // Load .env file if it exists (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    let config_path = config_path.map(Path::to_path_buf).unwrap_or_else(|| {
        env::var(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
    });

    let mut config = load_from_sources(&config_path)?;
    apply_environment(&mut config, |key| env::var(key).ok());

    Ok(config)
}

/// Fill secrets and card API settings from environment lookups.
/// Secrets are never stored in TOML files, only in environment
pub fn apply_environment<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| lookup(key).filter(|value| !value.is_empty());

    if let Some(token) = lookup("GITHUB_TOKEN") {
        config.github.token = Some(token);
    }
    if let Some(secret) = lookup("TARGET_API_JWT_SECRET") {
        config.card_api.jwt_secret = Some(secret);
    }

    if let Some(url) = lookup("TARGET_API_URL") {
        config.card_api.base_url = Some(url);
    }
    if let Some(alg) = lookup("TARGET_API_JWT_ALG") {
        config.card_api.jwt_algorithm = alg;
    }
    if let Some(issuer) = lookup("TARGET_API_JWT_ISSUER") {
        config.card_api.jwt_issuer = Some(issuer);
    }
}

/// Load configuration from a specific path and `BOOSTER__*` overrides
/// Useful for testing with custom config files
pub fn load_from_sources(config_path: &Path) -> Result<Config, ConfigError> {
    load_layers(config_path, None)
}

/// Build the file and `BOOSTER__*` layers. `env` replaces the process
/// environment when given.
fn load_layers(
    config_path: &Path,
    env: Option<config::Map<String, String>>,
) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::debug!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // BOOSTER__RETRY__MAX_ATTEMPTS -> retry.max_attempts
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
            .source(env),
    );

    let config = builder.build()?;
    config.try_deserialize()
}
