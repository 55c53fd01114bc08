//! Configuration management for booster
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. `BOOSTER__<section>__<key>` environment variables
//! 4. Secrets from the environment or a `.env` file
//!
//! # Usage
//!
//! ```no_run
//! use booster::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Collecting {} users per run", config.run.target);
//! ```
//!
//! # Environment Variables
//!
//! Secrets are only read from the environment:
//! - `GITHUB_TOKEN` - token for the GraphQL search
//! - `TARGET_API_JWT_SECRET` - signing secret for card API tokens
//!
//! The card API can also be configured with `TARGET_API_URL`,
//! `TARGET_API_JWT_ALG` and `TARGET_API_JWT_ISSUER`. Any other key can be
//! overridden with `BOOSTER__<section>__<key>`, e.g.
//! `BOOSTER__RETRY__WAIT=30s`.
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `booster.toml`.
//! This can be overridden using the `BOOSTER_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use crate::humanize::HumanDuration;
pub use models::{CardApiConfig, Config, GitHubConfig, HttpConfig, RetryConfig, RunConfig};
pub use sources::apply_environment;
pub use validation::ValidationError;

use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file is malformed
    /// - A required secret is missing or a value is out of range
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load(None)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific TOML path plus the process environment
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let config = sources::load(Some(path))?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration with an explicit environment lookup instead of the
    /// process environment
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_with_env<F>(path: &Path, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = sources::load_from_sources(path)?;
        apply_environment(&mut config, lookup);
        validation::validate(&config)?;
        Ok(config)
    }

    /// Validate an already assembled configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        validation::validate(self)?;
        Ok(())
    }
}
