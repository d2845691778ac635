//! Client for the Wallabag REST API.
//!
//! - [`auth`]: OAuth2 password grant producing a [`Session`]
//! - [`entries`]: the [`EntryRepository`] trait and its HTTP implementation
//! - [`models`]: request/response bodies

pub mod auth;
pub mod entries;
pub mod models;

pub use auth::{Authenticator, Credentials, Session};
pub use entries::{EntryRepository, WallabagEntries};

use reqwest::{Client, Response, StatusCode};

use crate::app::Result;
use crate::config::parse_http_url;
use models::ApiError;

/// Longest slice of an error body quoted in diagnostics.
const MAX_ERROR_BODY: usize = 200;

/// Shared HTTP client bound to one Wallabag instance.
#[derive(Clone)]
pub struct WallabagClient {
    client: Client,
    base_url: String,
}

impl WallabagClient {
    pub fn new(client: Client, base_url: &str) -> Result<Self> {
        parse_http_url("WALLABAG_BASE_URL", base_url)?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    /// `path` must start with `/`.
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Read an unsuccessful response into `(status, message)`.
pub(crate) async fn failure_details(response: Response) -> (StatusCode, String) {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    (status, error_message(status, &body))
}

/// Extract the most useful explanation from an error body.
pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    if let Some(message) = serde_json::from_str::<ApiError>(body)
        .ok()
        .and_then(ApiError::best_message)
    {
        return message;
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("no response body")
            .to_string();
    }

    match trimmed.char_indices().nth(MAX_ERROR_BODY) {
        Some((cut, _)) => format!("{}…", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let api = WallabagClient::new(Client::new(), "https://wallabag.example.com//").unwrap();
        assert_eq!(api.base_url(), "https://wallabag.example.com");
        assert_eq!(
            api.endpoint("/oauth/v2/token"),
            "https://wallabag.example.com/oauth/v2/token"
        );
    }

    #[test]
    fn test_base_url_with_subpath() {
        let api = WallabagClient::new(Client::new(), "https://example.com/wallabag/").unwrap();
        assert_eq!(
            api.endpoint("/api/entries.json"),
            "https://example.com/wallabag/api/entries.json"
        );
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(WallabagClient::new(Client::new(), "wallabag.example.com").is_err());
    }

    #[test]
    fn test_error_message_from_json() {
        let message = error_message(
            StatusCode::BAD_REQUEST,
            r#"{"error": "invalid_grant", "error_description": "Invalid credentials"}"#,
        );
        assert_eq!(message, "Invalid credentials");
    }

    #[test]
    fn test_error_message_from_plain_body() {
        let message = error_message(StatusCode::BAD_GATEWAY, "  upstream down \n");
        assert_eq!(message, "upstream down");
    }

    #[test]
    fn test_error_message_empty_body_uses_reason() {
        let message = error_message(StatusCode::SERVICE_UNAVAILABLE, "");
        assert_eq!(message, "Service Unavailable");
    }

    #[test]
    fn test_error_message_truncates_long_body() {
        let body = "x".repeat(500);
        let message = error_message(StatusCode::INTERNAL_SERVER_ERROR, &body);
        assert_eq!(message.chars().count(), MAX_ERROR_BODY + 1);
        assert!(message.ends_with('…'));
    }
}
