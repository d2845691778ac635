use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};

use crate::app::{Result, SyncError};
use crate::domain::RemoteEntry;
use crate::wallabag::models::{EntryListing, EntryPatch, NewEntry, Skipped};
use crate::wallabag::{failure_details, Session, WallabagClient};

pub const ENTRIES_PATH: &str = "/api/entries.json";

/// Upper bound on listing pages, so a misbehaving server cannot loop us forever.
pub const MAX_PAGES: u32 = 1000;

#[async_trait]
pub trait EntryRepository {
    /// Every unread, non-archived entry, pages merged in response order.
    async fn list_unread(&self) -> Result<Vec<RemoteEntry>>;

    /// Create an entry for `url`. An existing entry counts as success.
    async fn add(&self, url: &str) -> Result<()>;

    /// Flip the archived flag of `entry_id`.
    async fn archive(&self, entry_id: i64) -> Result<()>;
}

/// [`EntryRepository`] backed by the Wallabag REST API.
pub struct WallabagEntries {
    api: WallabagClient,
    session: Arc<Session>,
    page_size: u32,
}

impl WallabagEntries {
    pub fn new(api: WallabagClient, session: Arc<Session>, page_size: u32) -> Self {
        Self {
            api,
            session,
            page_size: page_size.max(1),
        }
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(self.session.access_token())
    }

    async fn fetch_page(&self, page: u32) -> Result<EntryListing> {
        let per_page = self.page_size.to_string();
        let page_number = page.to_string();
        let query = [
            ("archive", "0"),
            ("detail", "metadata"),
            ("perPage", per_page.as_str()),
            ("page", page_number.as_str()),
        ];

        let response = self
            .authorized(self.api.http().get(self.api.endpoint(ENTRIES_PATH)))
            .query(&query)
            .send()
            .await
            .map_err(|e| SyncError::EntryFetch {
                status: None,
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let (status, message) = failure_details(response).await;
            if status == StatusCode::UNAUTHORIZED {
                return Err(SyncError::unauthorized(message));
            }
            return Err(SyncError::EntryFetch {
                status: Some(status.as_u16()),
                message,
            });
        }

        response.json().await.map_err(|e| SyncError::EntryFetch {
            status: None,
            message: format!("invalid entries response: {}", e),
        })
    }

    async fn mutation_result(target: String, response: Response) -> Result<()> {
        if response.status().is_success() {
            return Ok(());
        }

        let (status, message) = failure_details(response).await;
        if status == StatusCode::UNAUTHORIZED {
            return Err(SyncError::unauthorized(message));
        }

        Err(SyncError::EntryMutation {
            target,
            status: Some(status.as_u16()),
            message,
        })
    }
}

#[async_trait]
impl EntryRepository for WallabagEntries {
    async fn list_unread(&self) -> Result<Vec<RemoteEntry>> {
        let mut entries = Vec::new();
        let mut page = 1;

        loop {
            let listing = self.fetch_page(page).await?;
            let count = listing.embedded.items.len();
            tracing::debug!(
                page,
                pages = ?listing.pages,
                total = ?listing.total,
                count,
                "Fetched entries page"
            );

            for item in listing.embedded.items {
                let id = item.id;
                match item.into_remote() {
                    Ok(entry) => entries.push(entry),
                    Err(Skipped::Archived) => {
                        tracing::debug!(entry_id = id, "Skipping archived entry");
                    }
                    Err(Skipped::MissingFingerprint) => {
                        tracing::warn!(entry_id = id, "Entry has no hashed_given_url, ignoring");
                    }
                    Err(Skipped::InvalidFingerprint(raw)) => {
                        tracing::warn!(entry_id = id, hash = %raw, "Entry has a malformed hashed_given_url, ignoring");
                    }
                }
            }

            // A server may cap perPage below what was asked, so a short
            // page only ends the listing when the envelope has no page count.
            let last_page = count == 0
                || match listing.pages {
                    Some(pages) => page >= pages,
                    None => count < self.page_size as usize,
                };
            if last_page {
                break;
            }
            if page >= MAX_PAGES {
                tracing::warn!(max_pages = MAX_PAGES, "Stopped paging through entries");
                break;
            }
            page += 1;
        }

        Ok(entries)
    }

    async fn add(&self, url: &str) -> Result<()> {
        let response = self
            .authorized(self.api.http().post(self.api.endpoint(ENTRIES_PATH)))
            .json(&NewEntry { url })
            .send()
            .await
            .map_err(|e| SyncError::EntryMutation {
                target: url.to_string(),
                status: None,
                message: e.to_string(),
            })?;

        Self::mutation_result(url.to_string(), response).await
    }

    async fn archive(&self, entry_id: i64) -> Result<()> {
        let target = format!("entry {}", entry_id);
        let response = self
            .authorized(
                self.api
                    .http()
                    .patch(self.api.endpoint(&format!("/api/entries/{}.json", entry_id))),
            )
            .json(&EntryPatch { archive: 1 })
            .send()
            .await
            .map_err(|e| SyncError::EntryMutation {
                target: target.clone(),
                status: None,
                message: e.to_string(),
            })?;

        Self::mutation_result(target, response).await
    }
}
