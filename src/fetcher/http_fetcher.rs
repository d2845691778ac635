use async_trait::async_trait;
use reqwest::Client;

use crate::app::{Result, SyncError};
use crate::config::parse_http_url;
use crate::domain::FeedSnapshot;
use crate::fetcher::FeedFetcher;
use crate::normalizer::Normalizer;

pub struct HttpFeedFetcher {
    client: Client,
    normalizer: Normalizer,
}

impl HttpFeedFetcher {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            normalizer: Normalizer::new(),
        }
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, feed_url: &str) -> Result<FeedSnapshot> {
        let url = parse_http_url("FEED_URL", feed_url)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SyncError::FeedUnavailable(format!("{}: {}", feed_url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::FeedUnavailable(format!(
                "{} returned HTTP {}",
                feed_url,
                status.as_u16()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| SyncError::FeedUnavailable(format!("{}: {}", feed_url, e)))?;

        let snapshot = self.normalizer.normalize(&body)?;
        tracing::debug!(url = %feed_url, count = snapshot.len(), "Fetched feed");
        Ok(snapshot)
    }
}
