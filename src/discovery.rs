//! Discovery loop: page through the user source, request cards for users not
//! yet in the ledger, and stop once enough new users are collected or the
//! source runs dry.

use std::collections::HashSet;

use thiserror::Error;
use tracing::{info, warn};

use crate::card::{CardApi, CardError, CardGenerator};
use crate::ledger::{Ledger, LedgerError, LedgerFile};
use crate::observability::Metrics;
use crate::source::{SourceError, UserSource};

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Card(#[from] CardError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

pub type Result<T> = std::result::Result<T, DiscoveryError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    /// New users to collect before stopping
    pub target: usize,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self { target: 10 }
    }
}

/// Outcome of one discovery run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Newly collected usernames in collection order
    pub collected: Vec<String>,
    /// Sequence number the next card would have been written under
    pub next_sequence: u32,
    pub pages_fetched: usize,
    /// The source reported no further pages
    pub source_exhausted: bool,
}

/// Load the ledger, discover new users, and rewrite the ledger
///
/// The ledger file is only rewritten when discovery finishes; a fatal error
/// leaves it untouched.
pub async fn run<S, A>(
    source: &S,
    generator: &CardGenerator<A>,
    ledger_file: &LedgerFile,
    settings: &RunSettings,
    metrics: &Metrics,
) -> Result<RunReport>
where
    S: UserSource + ?Sized,
    A: CardApi,
{
    let mut ledger = ledger_file.load()?;
    let report = discover(source, generator, &mut ledger, settings, metrics).await?;
    ledger_file.save(&ledger)?;
    Ok(report)
}

/// Collect up to `settings.target` new users into `ledger`
pub async fn discover<S, A>(
    source: &S,
    generator: &CardGenerator<A>,
    ledger: &mut Ledger,
    settings: &RunSettings,
    metrics: &Metrics,
) -> Result<RunReport>
where
    S: UserSource + ?Sized,
    A: CardApi,
{
    let mut report = RunReport {
        next_sequence: 1,
        ..RunReport::default()
    };
    let mut cursor: Option<String> = None;

    while report.collected.len() < settings.target {
        let page = source.fetch_page(cursor.as_deref()).await?;
        report.pages_fetched += 1;
        metrics.page_fetched();

        let candidates = new_candidates(&page.logins, ledger);
        info!(
            page = report.pages_fetched,
            logins = page.logins.len(),
            candidates = candidates.len(),
            collected = report.collected.len(),
            "Processing page"
        );

        for username in candidates {
            if report.collected.len() >= settings.target {
                break;
            }

            let ordinal = report.collected.len() + 1;
            if generator.generate(username, ordinal, report.next_sequence).await? {
                report.next_sequence += 1;
                ledger.insert(username);
                report.collected.push(username.to_string());
                metrics.card_generated();
            } else {
                warn!(username, "Skipping user due to repeated failures");
                metrics.user_skipped();
            }
        }

        if !page.has_next_page {
            report.source_exhausted = true;
            break;
        }

        cursor = match page.end_cursor {
            Some(next) => Some(next),
            None => {
                return Err(SourceError::Malformed(
                    "hasNextPage is true but endCursor is missing".to_string(),
                )
                .into());
            }
        };
    }

    info!(
        collected = report.collected.len(),
        pages = report.pages_fetched,
        source_exhausted = report.source_exhausted,
        "Discovery finished"
    );

    Ok(report)
}

/// Page logins not yet in the ledger, in page order without repeats
fn new_candidates<'a>(logins: &'a [String], ledger: &Ledger) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    logins
        .iter()
        .map(String::as_str)
        .filter(|login| !ledger.contains(login) && seen.insert(*login))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::RetryPolicy;
    use crate::card::retry::RecordingSleeper;
    use crate::source::Page;
    use crate::storage::StorageClient;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Serves pages in order; page `n` is requested with cursor `c{n}`
    struct FakeSource {
        pages: Vec<Vec<&'static str>>,
        cursors: Mutex<Vec<Option<String>>>,
    }

    impl FakeSource {
        fn new(pages: Vec<Vec<&'static str>>) -> Self {
            Self {
                pages,
                cursors: Mutex::new(Vec::new()),
            }
        }

        fn requested_cursors(&self) -> Vec<Option<String>> {
            self.cursors.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl UserSource for FakeSource {
        async fn fetch_page(&self, cursor: Option<&str>) -> crate::source::Result<Page> {
            self.cursors.lock().unwrap().push(cursor.map(str::to_string));

            let index = match cursor {
                None => 0,
                Some(c) => c.trim_start_matches('c').parse::<usize>().unwrap(),
            };
            let logins = self.pages[index].iter().map(|s| s.to_string()).collect();
            let has_next_page = index + 1 < self.pages.len();

            Ok(Page {
                logins,
                end_cursor: Some(format!("c{}", index + 1)),
                has_next_page,
            })
        }
    }

    /// Succeeds for everyone except the listed users
    #[derive(Default)]
    struct FakeCards {
        failing: Vec<&'static str>,
        calls: Mutex<Vec<(String, usize)>>,
    }

    impl FakeCards {
        fn failing(users: Vec<&'static str>) -> Self {
            Self {
                failing: users,
                ..Self::default()
            }
        }

        fn requested(&self) -> Vec<String> {
            self.calls.lock().unwrap().iter().map(|(u, _)| u.clone()).collect()
        }

        fn ordinals(&self) -> HashMap<String, usize> {
            self.calls.lock().unwrap().iter().cloned().collect()
        }
    }

    #[async_trait]
    impl CardApi for FakeCards {
        async fn fetch_card(&self, username: &str, ordinal: usize) -> crate::card::Result<Bytes> {
            self.calls.lock().unwrap().push((username.to_string(), ordinal));
            if self.failing.iter().any(|f| *f == username) {
                Err(CardError::Status(500))
            } else {
                Ok(Bytes::from(format!("card for {}", username)))
            }
        }
    }

    fn generator(cards: Arc<FakeCards>) -> (CardGenerator<Arc<FakeCards>>, StorageClient) {
        let storage = StorageClient::in_memory();
        let policy = RetryPolicy {
            max_attempts: 2,
            wait: Duration::from_secs(60),
        };
        let generator = CardGenerator::new(
            cards,
            policy,
            Arc::new(RecordingSleeper::new()),
            storage.clone(),
        );
        (generator, storage)
    }

    fn settings(target: usize) -> RunSettings {
        RunSettings { target }
    }

    #[tokio::test]
    async fn test_single_exhausted_page() {
        let source = FakeSource::new(vec![vec!["alice", "bob"]]);
        let cards = Arc::new(FakeCards::default());
        let (generator, storage) = generator(cards.clone());
        let mut ledger = Ledger::new("# booster");

        let report = discover(&source, &generator, &mut ledger, &settings(10), &Metrics::new())
            .await
            .unwrap();

        assert_eq!(report.collected, vec!["alice", "bob"]);
        assert!(report.source_exhausted);
        assert_eq!(report.pages_fetched, 1);
        assert_eq!(report.next_sequence, 3);
        assert_eq!(ledger.render(), "# booster\n1. alice\n2. bob\n");
        assert_eq!(storage.download("Card_1.png").await.unwrap(), b"card for alice");
        assert_eq!(storage.download("Card_2.png").await.unwrap(), b"card for bob");
    }

    #[tokio::test]
    async fn test_failing_user_is_skipped() {
        let source = FakeSource::new(vec![vec!["carol"]]);
        let cards = Arc::new(FakeCards::failing(vec!["carol"]));
        let (generator, storage) = generator(cards.clone());
        let mut ledger = Ledger::default();
        let metrics = Metrics::new();

        let report = discover(&source, &generator, &mut ledger, &settings(10), &metrics)
            .await
            .unwrap();

        assert!(report.collected.is_empty());
        assert!(!ledger.contains("carol"));
        assert_eq!(cards.requested(), vec!["carol", "carol"]);
        assert!(!storage.exists("Card_1.png").await.unwrap());
        assert_eq!(metrics.snapshot().users_skipped, 1);
    }

    #[tokio::test]
    async fn test_known_users_never_requested() {
        let source = FakeSource::new(vec![vec!["alice", "bob", "carol"]]);
        let cards = Arc::new(FakeCards::default());
        let (generator, _storage) = generator(cards.clone());
        let mut ledger = Ledger::parse("# booster\n1. alice\n2. carol\n");

        let report = discover(&source, &generator, &mut ledger, &settings(10), &Metrics::new())
            .await
            .unwrap();

        assert_eq!(cards.requested(), vec!["bob"]);
        assert_eq!(report.collected, vec!["bob"]);
        assert_eq!(ledger.names(), ["alice", "carol", "bob"]);
    }

    #[tokio::test]
    async fn test_stops_at_target_mid_page() {
        let source = FakeSource::new(vec![
            vec!["u1", "u2", "u3", "u4"],
            vec!["u5", "u6"],
        ]);
        let cards = Arc::new(FakeCards::default());
        let (generator, _storage) = generator(cards.clone());
        let mut ledger = Ledger::default();

        let report = discover(&source, &generator, &mut ledger, &settings(3), &Metrics::new())
            .await
            .unwrap();

        assert_eq!(report.collected, vec!["u1", "u2", "u3"]);
        assert!(!report.source_exhausted);
        assert_eq!(source.requested_cursors(), vec![None]);
        assert_eq!(cards.requested().len(), 3);
    }

    #[tokio::test]
    async fn test_follows_cursor_across_pages() {
        let source = FakeSource::new(vec![vec!["u1", "u1"], vec!["u2"], vec!["u3", "u4"]]);
        let cards = Arc::new(FakeCards::default());
        let (generator, _storage) = generator(cards);
        let mut ledger = Ledger::default();

        let report = discover(&source, &generator, &mut ledger, &settings(4), &Metrics::new())
            .await
            .unwrap();

        assert_eq!(report.collected, vec!["u1", "u2", "u3", "u4"]);
        assert_eq!(
            source.requested_cursors(),
            vec![None, Some("c1".to_string()), Some("c2".to_string())]
        );
    }

    #[tokio::test]
    async fn test_ordinal_counts_new_users_only() {
        let source = FakeSource::new(vec![vec!["old", "x", "bad", "y"]]);
        let cards = Arc::new(FakeCards::failing(vec!["bad"]));
        let (generator, storage) = generator(cards.clone());
        let mut ledger = Ledger::parse("# booster\n1. old\n");

        let report = discover(&source, &generator, &mut ledger, &settings(10), &Metrics::new())
            .await
            .unwrap();

        let ordinals = cards.ordinals();
        assert_eq!(ordinals["x"], 1);
        assert_eq!(ordinals["bad"], 2);
        assert_eq!(ordinals["y"], 2);
        assert_eq!(report.next_sequence, 3);
        assert_eq!(storage.download("Card_2.png").await.unwrap(), b"card for y");
    }

    #[tokio::test]
    async fn test_failed_user_retried_when_seen_again() {
        let source = FakeSource::new(vec![vec!["flaky"], vec!["flaky"]]);
        let cards = Arc::new(FakeCards::failing(vec!["flaky"]));
        let (generator, _storage) = generator(cards.clone());
        let mut ledger = Ledger::default();

        discover(&source, &generator, &mut ledger, &settings(10), &Metrics::new())
            .await
            .unwrap();

        assert_eq!(cards.requested().len(), 4);
    }

    #[tokio::test]
    async fn test_ledger_grows_without_repeats_across_runs() {
        let cards = Arc::new(FakeCards::default());
        let (generator, _storage) = generator(cards);
        let mut ledger = Ledger::default();

        let first = FakeSource::new(vec![vec![
            "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o",
        ]]);
        discover(&first, &generator, &mut ledger, &settings(10), &Metrics::new())
            .await
            .unwrap();
        assert_eq!(ledger.len(), 10);

        let second = FakeSource::new(vec![vec!["a", "k", "l", "m", "n", "o", "p"]]);
        let report = discover(&second, &generator, &mut ledger, &settings(10), &Metrics::new())
            .await
            .unwrap();

        assert_eq!(report.collected, vec!["k", "l", "m", "n", "o", "p"]);
        assert_eq!(ledger.len(), 16);
    }

    struct CursorlessSource;

    #[async_trait]
    impl UserSource for CursorlessSource {
        async fn fetch_page(&self, _cursor: Option<&str>) -> crate::source::Result<Page> {
            Ok(Page {
                logins: vec![],
                end_cursor: None,
                has_next_page: true,
            })
        }
    }

    #[tokio::test]
    async fn test_missing_cursor_is_fatal() {
        let (generator, _storage) = generator(Arc::new(FakeCards::default()));
        let mut ledger = Ledger::default();

        let result = discover(
            &CursorlessSource,
            &generator,
            &mut ledger,
            &settings(10),
            &Metrics::new(),
        )
        .await;

        assert!(matches!(
            result,
            Err(DiscoveryError::Source(SourceError::Malformed(_)))
        ));
    }

    #[test]
    fn test_new_candidates_dedups_in_page_order() {
        let ledger = Ledger::parse("# booster\n1. b\n");
        let logins: Vec<String> = ["c", "a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();

        assert_eq!(new_candidates(&logins, &ledger), vec!["c", "a", "d"]);
    }
}
