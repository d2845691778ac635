//! # wallabag-sync
//!
//! Keeps a Wallabag account's unread list in step with a JSON feed of
//! article URLs: feed articles missing from Wallabag are added, unread
//! entries that dropped out of the feed are archived.
//!
//! ## Architecture
//!
//! One linear run, no local state:
//!
//! ```text
//! authenticate → (fetch feed ∥ list unread entries) → plan → apply → report
//! ```
//!
//! Feed URLs and Wallabag entries are joined on the SHA-1 of the URL string.
//! For entries the service's own `hashed_given_url` is used, so the client
//! never has to agree with Wallabag on URL normalization.
//!
//! ## Quick Start
//!
//! ```bash
//! export FEED_URL=https://example.com/feed.json
//! export WALLABAG_BASE_URL=https://app.wallabag.it
//! export WALLABAG_CLIENT_ID=... WALLABAG_CLIENT_SECRET=...
//! export WALLABAG_USERNAME=... WALLABAG_PASSWORD=...
//!
//! # See what would change
//! wallabag-sync plan
//!
//! # Apply it
//! wallabag-sync sync
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the HTTP
/// client, the feed fetcher and the Wallabag client.
pub mod app;

/// Command-line interface using clap.
///
/// - `sync` - Reconcile and apply (default)
/// - `plan` - Reconcile and print, no changes
/// - `config` - Show the resolved configuration
pub mod cli;

/// Configuration from `~/.config/wallabag-sync/config.toml` and the environment.
pub mod config;

/// Core domain models.
///
/// - [`Fingerprint`](domain::Fingerprint): SHA-1 join key
/// - [`RemoteEntry`](domain::RemoteEntry): an unread Wallabag entry
/// - [`FeedSnapshot`](domain::FeedSnapshot): URLs from one feed fetch
pub mod domain;

/// HTTP fetching of the feed.
///
/// - [`FeedFetcher`](fetcher::FeedFetcher): Async trait for feed fetching
/// - [`HttpFeedFetcher`](fetcher::http_fetcher::HttpFeedFetcher): reqwest-based implementation
pub mod fetcher;

/// Parsing of the JSON feed body into a [`FeedSnapshot`](domain::FeedSnapshot).
pub mod normalizer;

/// Reconciliation: planning, parallel apply, run report.
pub mod sync;

/// Wallabag REST API: OAuth2 session and entries.
pub mod wallabag;
