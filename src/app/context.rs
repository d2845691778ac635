use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::app::error::Result;
use crate::config::Config;
use crate::fetcher::http_fetcher::HttpFeedFetcher;
use crate::fetcher::FeedFetcher;
use crate::wallabag::WallabagClient;

/// Everything one run needs, built from a validated [`Config`].
pub struct AppContext {
    pub config: Config,
    pub fetcher: Arc<dyn FeedFetcher + Send + Sync>,
    pub wallabag: WallabagClient,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.sync.timeout_secs))
            .gzip(true)
            .brotli(true)
            .user_agent(concat!("wallabag-sync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let fetcher: Arc<dyn FeedFetcher + Send + Sync> =
            Arc::new(HttpFeedFetcher::new(client.clone()));
        let wallabag = WallabagClient::new(client, &config.wallabag.base_url)?;

        Ok(Self {
            config,
            fetcher,
            wallabag,
        })
    }
}
