//! Reconciliation of the feed against the service's unread entries.
//!
//! ```text
//! authenticate → (fetch feed ∥ list unread) → plan → apply → report
//! ```
//!
//! A fatal error before planning aborts the run with no mutation attempted.
//! While applying, failures are per item and collected in the [`SyncReport`].

pub mod apply;
pub mod plan;
pub mod progress;
pub mod report;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;

use crate::app::{AppContext, Result};
use crate::fetcher::FeedFetcher;
use crate::wallabag::{Authenticator, Credentials, EntryRepository, WallabagEntries};

pub use apply::ParallelApplier;
pub use plan::{plan, ReconciliationPlan};
pub use progress::{NullSink, ProgressSink, RecordingSink, SyncEvent};
pub use report::{ItemFailure, SyncReport};

#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Plan only; make no mutating calls.
    pub dry_run: bool,
    /// Concurrent add/archive calls.
    pub workers: usize,
    /// Cleared on shutdown; pending items are then skipped.
    pub running: Arc<AtomicBool>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            workers: crate::config::DEFAULT_WORKERS,
            running: Arc::new(AtomicBool::new(true)),
        }
    }
}

/// Run one full sync against the configured feed and Wallabag instance.
pub async fn run(
    ctx: &AppContext,
    options: &SyncOptions,
    sink: &dyn ProgressSink,
) -> Result<SyncReport> {
    ctx.config.validate()?;

    let credentials = Credentials::from(&ctx.config.wallabag);
    tracing::info!(base_url = %ctx.wallabag.base_url(), "Requesting access token");
    let session = ctx.wallabag.authenticate(&credentials).await?;
    sink.emit(SyncEvent::Authenticated);

    let repository = Arc::new(WallabagEntries::new(
        ctx.wallabag.clone(),
        Arc::new(session),
        ctx.config.sync.page_size,
    ));

    reconcile(
        ctx.fetcher.as_ref(),
        repository,
        &ctx.config.feed_url,
        options,
        sink,
    )
    .await
}

/// Fetch both sides, plan, and (unless dry-running) apply.
pub async fn reconcile(
    fetcher: &(dyn FeedFetcher + Send + Sync),
    repository: Arc<dyn EntryRepository + Send + Sync>,
    feed_url: &str,
    options: &SyncOptions,
    sink: &dyn ProgressSink,
) -> Result<SyncReport> {
    let mut report = SyncReport::new(Utc::now(), options.dry_run);

    tracing::info!(feed_url, "Fetching feed and unread entries");
    let (snapshot, remote) = tokio::try_join!(fetcher.fetch(feed_url), repository.list_unread())?;

    let unique = snapshot.dedup().len();
    sink.emit(SyncEvent::FeedFetched {
        urls: snapshot.len(),
        unique,
    });
    sink.emit(SyncEvent::EntriesFetched {
        count: remote.len(),
    });
    report.feed_urls = unique;
    report.unread_entries = remote.len();

    let plan = plan(&snapshot, &remote);
    tracing::info!(
        to_add = plan.to_add.len(),
        to_archive = plan.to_archive.len(),
        "Planned reconciliation"
    );
    sink.emit(SyncEvent::Planned(plan.clone()));

    if !options.dry_run {
        if !options.running.load(Ordering::SeqCst) {
            tracing::warn!("Shutdown requested before applying changes");
        }
        ParallelApplier::with_workers(repository, options.workers)
            .with_shutdown(options.running.clone())
            .apply(&plan, &mut report, sink)
            .await?;
    }

    report.plan = plan;
    report.finished_at = Utc::now();
    tracing::info!(elapsed_ms = report.elapsed_ms(), "{}", report.summary());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use crate::app::SyncError;
    use crate::domain::{FeedSnapshot, Fingerprint, RemoteEntry};

    struct StaticFeed(Result<Vec<&'static str>>);

    #[async_trait]
    impl FeedFetcher for StaticFeed {
        async fn fetch(&self, _feed_url: &str) -> Result<FeedSnapshot> {
            match &self.0 {
                Ok(urls) => Ok(urls.iter().copied().collect()),
                Err(e) => Err(SyncError::FeedUnavailable(e.to_string())),
            }
        }
    }

    /// In-memory stand-in for the service.
    #[derive(Default)]
    struct MemoryRepository {
        entries: Mutex<Vec<RemoteEntry>>,
        next_id: Mutex<i64>,
        mutations: Mutex<usize>,
    }

    impl MemoryRepository {
        fn with_urls(urls: &[(i64, &str)]) -> Self {
            let repo = Self::default();
            *repo.entries.lock().unwrap() = urls
                .iter()
                .map(|(id, url)| RemoteEntry {
                    id: *id,
                    url: Some(url.to_string()),
                    given_url: Some(url.to_string()),
                    fingerprint: Fingerprint::of(url),
                })
                .collect();
            *repo.next_id.lock().unwrap() = 100;
            repo
        }

        fn mutations(&self) -> usize {
            *self.mutations.lock().unwrap()
        }
    }

    #[async_trait]
    impl EntryRepository for MemoryRepository {
        async fn list_unread(&self) -> Result<Vec<RemoteEntry>> {
            Ok(self.entries.lock().unwrap().clone())
        }

        async fn add(&self, url: &str) -> Result<()> {
            *self.mutations.lock().unwrap() += 1;
            let mut next_id = self.next_id.lock().unwrap();
            *next_id += 1;
            self.entries.lock().unwrap().push(RemoteEntry {
                id: *next_id,
                url: Some(url.to_string()),
                given_url: Some(url.to_string()),
                fingerprint: Fingerprint::of(url),
            });
            Ok(())
        }

        async fn archive(&self, entry_id: i64) -> Result<()> {
            *self.mutations.lock().unwrap() += 1;
            self.entries.lock().unwrap().retain(|e| e.id != entry_id);
            Ok(())
        }
    }

    async fn sync(
        feed: &StaticFeed,
        repository: &Arc<MemoryRepository>,
        dry_run: bool,
    ) -> Result<SyncReport> {
        let options = SyncOptions {
            dry_run,
            ..SyncOptions::default()
        };
        reconcile(
            feed,
            repository.clone(),
            "https://feed.example/feed.json",
            &options,
            &NullSink,
        )
        .await
    }

    #[tokio::test]
    async fn test_second_run_is_a_no_op() {
        let feed = StaticFeed(Ok(vec!["https://a.example/1", "https://a.example/2"]));
        let repository = Arc::new(MemoryRepository::with_urls(&[(7, "https://a.example/old")]));

        let first = sync(&feed, &repository, false).await.unwrap();
        assert_eq!(first.added.len(), 2);
        assert_eq!(first.archived, vec![7]);

        let second = sync(&feed, &repository, false).await.unwrap();
        assert!(second.plan.is_empty());
        assert_eq!(second.unread_entries, 2);
    }

    #[tokio::test]
    async fn test_feed_failure_makes_no_mutations() {
        let feed = StaticFeed(Err(SyncError::FeedUnavailable("HTTP 503".into())));
        let repository = Arc::new(MemoryRepository::with_urls(&[(7, "https://a.example/1")]));

        let err = sync(&feed, &repository, false).await.unwrap_err();
        assert!(matches!(err, SyncError::FeedUnavailable(_)));
        assert_eq!(repository.mutations(), 0);
    }

    #[tokio::test]
    async fn test_dry_run_plans_without_mutating() {
        let feed = StaticFeed(Ok(vec!["https://a.example/1"]));
        let repository = Arc::new(MemoryRepository::with_urls(&[(7, "https://a.example/old")]));

        let report = sync(&feed, &repository, true).await.unwrap();
        assert_eq!(report.plan.to_add, vec!["https://a.example/1".to_string()]);
        assert_eq!(report.plan.archive_ids(), vec![7]);
        assert!(report.added.is_empty());
        assert_eq!(repository.mutations(), 0);
    }

    #[tokio::test]
    async fn test_progress_events_in_order() {
        let feed = StaticFeed(Ok(vec!["https://a.example/1", "https://a.example/1"]));
        let repository = Arc::new(MemoryRepository::with_urls(&[]));
        let sink = RecordingSink::new();

        reconcile(
            &feed,
            repository,
            "https://feed.example/feed.json",
            &SyncOptions::default(),
            &sink,
        )
        .await
        .unwrap();

        let events = sink.take();
        assert_eq!(events[0], SyncEvent::FeedFetched { urls: 2, unique: 1 });
        assert_eq!(events[1], SyncEvent::EntriesFetched { count: 0 });
        assert!(matches!(events[2], SyncEvent::Planned(_)));
        assert_eq!(
            events[3],
            SyncEvent::Added {
                url: "https://a.example/1".into()
            }
        );
    }
}
