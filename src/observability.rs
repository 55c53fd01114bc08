//! Run counters and logging setup

use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber, honouring `RUST_LOG` (default `info`)
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Metrics handle for recording counters over one run
#[derive(Debug, Default)]
pub struct Metrics {
    pages_fetched: AtomicU64,
    cards_generated: AtomicU64,
    attempts_failed: AtomicU64,
    users_skipped: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page_fetched(&self) {
        self.pages_fetched.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "pages_fetched", "Metric incremented");
    }

    pub fn card_generated(&self) {
        self.cards_generated.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "cards_generated", "Metric incremented");
    }

    pub fn attempt_failed(&self) {
        self.attempts_failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "attempts_failed", "Metric incremented");
    }

    pub fn user_skipped(&self) {
        self.users_skipped.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "users_skipped", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            pages_fetched: self.pages_fetched.load(Ordering::Relaxed),
            cards_generated: self.cards_generated.load(Ordering::Relaxed),
            attempts_failed: self.attempts_failed.load(Ordering::Relaxed),
            users_skipped: self.users_skipped.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub pages_fetched: u64,
    pub cards_generated: u64,
    pub attempts_failed: u64,
    pub users_skipped: u64,
}

impl MetricsSnapshot {
    /// Emit the counters as a single summary event
    pub fn log_summary(&self) {
        tracing::info!(
            pages_fetched = self.pages_fetched,
            cards_generated = self.cards_generated,
            attempts_failed = self.attempts_failed,
            users_skipped = self.users_skipped,
            "Run summary"
        );
    }
}
