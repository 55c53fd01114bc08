//! Shared reqwest client construction

use crate::config::HttpConfig;
use reqwest::Client;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Failed to build HTTP client: {0}")]
pub struct ClientBuildError(#[from] reqwest::Error);

/// Build a client with the configured timeouts and user agent
///
/// Both the GraphQL search and the card API go through clients built here, so
/// an unresponsive endpoint fails the request instead of hanging the run.
pub fn build(config: &HttpConfig) -> Result<Client, ClientBuildError> {
    let client = Client::builder()
        .connect_timeout(config.connect_timeout.as_duration())
        .timeout(config.request_timeout.as_duration())
        .user_agent(&config.user_agent)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()?;

    Ok(client)
}
