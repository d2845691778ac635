pub mod http_fetcher;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::FeedSnapshot;

#[async_trait]
pub trait FeedFetcher {
    /// Fetch and parse the feed at `feed_url`.
    ///
    /// Transport failures and non-2xx responses are
    /// [`SyncError::FeedUnavailable`](crate::app::SyncError::FeedUnavailable);
    /// unparseable bodies are
    /// [`SyncError::FeedFormat`](crate::app::SyncError::FeedFormat).
    async fn fetch(&self, feed_url: &str) -> Result<FeedSnapshot>;
}
