//! Wire types for the Wallabag REST API.

use serde::{Deserialize, Serialize};

use crate::domain::{Fingerprint, RemoteEntry};

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Error body of the OAuth endpoint and, loosely, of the API.
#[derive(Debug, Default, Deserialize)]
pub struct ApiError {
    pub error: Option<String>,
    pub error_description: Option<String>,
    pub message: Option<String>,
}

impl ApiError {
    pub fn best_message(self) -> Option<String> {
        self.error_description
            .or(self.message)
            .or(self.error)
            .filter(|m| !m.trim().is_empty())
    }
}

/// One page of `GET /api/entries.json`.
#[derive(Debug, Deserialize)]
pub struct EntryListing {
    pub page: Option<u32>,
    pub pages: Option<u32>,
    pub total: Option<u64>,
    #[serde(rename = "_embedded")]
    pub embedded: Embedded,
}

#[derive(Debug, Deserialize)]
pub struct Embedded {
    #[serde(default)]
    pub items: Vec<ApiEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ApiEntry {
    pub id: i64,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub given_url: Option<String>,
    #[serde(default)]
    pub hashed_given_url: Option<String>,
    #[serde(default)]
    pub is_archived: Option<Flag>,
}

/// Wallabag reports booleans as `0`/`1`; some versions use `true`/`false`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum Flag {
    Bool(bool),
    Int(i64),
}

impl Flag {
    pub fn is_set(self) -> bool {
        match self {
            Flag::Bool(b) => b,
            Flag::Int(n) => n != 0,
        }
    }
}

/// Why an API entry did not become a [`RemoteEntry`].
#[derive(Debug, PartialEq, Eq)]
pub enum Skipped {
    Archived,
    MissingFingerprint,
    InvalidFingerprint(String),
}

impl ApiEntry {
    pub fn into_remote(self) -> Result<RemoteEntry, Skipped> {
        if self.is_archived.is_some_and(Flag::is_set) {
            return Err(Skipped::Archived);
        }

        let raw = self.hashed_given_url.ok_or(Skipped::MissingFingerprint)?;
        let fingerprint =
            Fingerprint::parse(&raw).ok_or_else(|| Skipped::InvalidFingerprint(raw.clone()))?;

        Ok(RemoteEntry {
            id: self.id,
            url: self.url,
            given_url: self.given_url,
            fingerprint,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct NewEntry<'a> {
    pub url: &'a str,
}

#[derive(Debug, Serialize)]
pub struct EntryPatch {
    pub archive: u8,
}
