use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authentication failed{}: {message}", status_suffix(.status))]
    Authentication {
        status: Option<u16>,
        message: String,
    },

    #[error("Feed unavailable: {0}")]
    FeedUnavailable(String),

    #[error("Feed format error: {0}")]
    FeedFormat(String),

    #[error("Failed to fetch entries{}: {message}", status_suffix(.status))]
    EntryFetch {
        status: Option<u16>,
        message: String,
    },

    #[error("Failed to update {target}{}: {message}", status_suffix(.status))]
    EntryMutation {
        target: String,
        status: Option<u16>,
        message: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl SyncError {
    /// Fatal errors abort the run; mutation errors are recorded per item.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SyncError::EntryMutation { .. })
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        SyncError::Authentication {
            status: Some(401),
            message: message.into(),
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (HTTP {})", code),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
