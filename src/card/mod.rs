//! Card generation
//!
//! A [`CardApi`] performs a single request for a user's card image. The
//! [`CardGenerator`] wraps it with a flat [`RetryPolicy`] and writes the image
//! to storage on the attempt that succeeds.
//!
//! Non-200 responses and transport errors are retried; when every attempt
//! fails the user is skipped. Token and storage errors are fatal and propagate.

pub mod http;
pub mod retry;
pub mod token;

pub use http::HttpCardApi;
pub use retry::{RetryPolicy, Sleeper, TokioSleeper};
pub use token::{TokenError, TokenMinter};

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::observability::Metrics;
use crate::storage::{StorageClient, StorageError, card_key};

#[derive(Debug, Error)]
pub enum CardError {
    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Card API returned HTTP {0}")]
    Status(u16),

    #[error("Card request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid card API URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to store card: {0}")]
    Storage(#[from] StorageError),
}

impl CardError {
    /// Whether another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, CardError::Status(_) | CardError::Transport(_))
    }
}

pub type Result<T> = std::result::Result<T, CardError>;

/// One card request, no retry
#[async_trait]
pub trait CardApi: Send + Sync {
    async fn fetch_card(&self, username: &str, ordinal: usize) -> Result<Bytes>;
}

#[async_trait]
impl<T: CardApi + ?Sized> CardApi for Arc<T> {
    async fn fetch_card(&self, username: &str, ordinal: usize) -> Result<Bytes> {
        (**self).fetch_card(username, ordinal).await
    }
}

/// Requests cards with retry and persists the successful ones
pub struct CardGenerator<A> {
    api: A,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    storage: StorageClient,
    metrics: Arc<Metrics>,
}

impl<A: CardApi> CardGenerator<A> {
    pub fn new(api: A, policy: RetryPolicy, sleeper: Arc<dyn Sleeper>, storage: StorageClient) -> Self {
        Self {
            api,
            policy,
            sleeper,
            storage,
            metrics: Arc::new(Metrics::new()),
        }
    }

    /// Record attempt failures into a shared metrics handle
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Generate the card for `username`, writing `Card_{sequence}.png` on success
    ///
    /// Returns `Ok(false)` once every attempt has failed with a retryable error.
    pub async fn generate(&self, username: &str, ordinal: usize, sequence: u32) -> Result<bool> {
        let max_attempts = self.policy.max_attempts;

        for attempt in 1..=max_attempts {
            match self.api.fetch_card(username, ordinal).await {
                Ok(bytes) => {
                    let saved = self.storage.upload(&card_key(sequence), bytes.to_vec()).await?;
                    info!(
                        username,
                        ordinal,
                        attempt,
                        file = %saved.key,
                        bytes = saved.size,
                        "Saved card"
                    );
                    return Ok(true);
                }
                Err(e) if e.is_retryable() => {
                    self.metrics.attempt_failed();

                    if attempt < max_attempts {
                        warn!(
                            username,
                            attempt,
                            error = %e,
                            wait_secs = self.policy.wait.as_secs(),
                            "Failed to generate card, retrying"
                        );
                        self.sleeper.sleep(self.policy.wait).await;
                    } else {
                        warn!(username, attempt, error = %e, "Failed to generate card");
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Ok(false)
    }
}
