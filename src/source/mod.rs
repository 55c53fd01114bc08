//! Candidate user discovery
//!
//! A [`UserSource`] hands out pages of GitHub logins. Failures here are never
//! retried: a page that cannot be fetched aborts the run.

pub mod github;

pub use github::GitHubSource;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Search request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Search endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("GraphQL errors: {0}")]
    GraphQl(String),

    #[error("Malformed search response: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, SourceError>;

/// One batch of search results
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub logins: Vec<String>,
    /// Opaque continuation cursor for the next request
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
}

/// Paginated source of user logins
#[async_trait]
pub trait UserSource: Send + Sync {
    /// Fetch the page after `cursor` (the first page when `None`)
    async fn fetch_page(&self, cursor: Option<&str>) -> Result<Page>;
}
