use super::models::Config;
use jsonwebtoken::Algorithm;
use reqwest::Url;
use std::str::FromStr;
use thiserror::Error;

/// Largest page the GitHub search connection will return
const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("TARGET_API_JWT_SECRET environment variable is not set")]
    MissingJwtSecret,

    #[error("GITHUB_TOKEN environment variable is not set")]
    MissingGitHubToken,

    #[error("Card API base URL is not set (TARGET_API_URL or card_api.base_url)")]
    MissingCardApiUrl,

    #[error("Invalid {field} URL '{url}'")]
    InvalidUrl { field: String, url: String },

    #[error("Unsupported JWT algorithm '{algorithm}'")]
    UnsupportedJwtAlgorithm { algorithm: String },

    #[error("page_size must be between 1 and 100, got {value}")]
    InvalidPageSize { value: u32 },

    #[error("run.target must be positive")]
    InvalidTarget,

    #[error("retry.max_attempts must be positive")]
    InvalidRetryAttempts,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_card_api(config)?;
    validate_github(config)?;
    validate_run(config)?;
    Ok(())
}

/// The signing secret is checked first: without it no card can ever be requested
fn validate_card_api(config: &Config) -> Result<(), ValidationError> {
    let card_api = &config.card_api;

    if card_api.jwt_secret.as_deref().is_none_or(str::is_empty) {
        return Err(ValidationError::MissingJwtSecret);
    }

    if Algorithm::from_str(&card_api.jwt_algorithm).is_err() {
        return Err(ValidationError::UnsupportedJwtAlgorithm {
            algorithm: card_api.jwt_algorithm.clone(),
        });
    }

    let base_url = card_api
        .base_url
        .as_deref()
        .ok_or(ValidationError::MissingCardApiUrl)?;
    validate_url("card_api.base_url", base_url)
}

fn validate_github(config: &Config) -> Result<(), ValidationError> {
    if config.github.token.as_deref().is_none_or(str::is_empty) {
        return Err(ValidationError::MissingGitHubToken);
    }

    let page_size = config.github.page_size;
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(ValidationError::InvalidPageSize { value: page_size });
    }

    validate_url("github.endpoint", &config.github.endpoint)
}

fn validate_run(config: &Config) -> Result<(), ValidationError> {
    if config.run.target == 0 {
        return Err(ValidationError::InvalidTarget);
    }

    if config.retry.max_attempts == 0 {
        return Err(ValidationError::InvalidRetryAttempts);
    }

    Ok(())
}

fn validate_url(field: &str, url: &str) -> Result<(), ValidationError> {
    match Url::parse(url) {
        Ok(parsed) if !parsed.cannot_be_a_base() => Ok(()),
        _ => Err(ValidationError::InvalidUrl {
            field: field.to_string(),
            url: url.to_string(),
        }),
    }
}
