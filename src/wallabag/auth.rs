use std::fmt;

use async_trait::async_trait;

use crate::app::{Result, SyncError};
use crate::config::WallabagConfig;
use crate::wallabag::models::TokenResponse;
use crate::wallabag::{failure_details, WallabagClient};

pub const TOKEN_PATH: &str = "/oauth/v2/token";

/// OAuth2 client and account credentials.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
}

impl From<&WallabagConfig> for Credentials {
    fn from(config: &WallabagConfig) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Bearer token for one run. Never cached, never refreshed.
#[derive(Clone)]
pub struct Session {
    access_token: String,
}

impl Session {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Session { access_token: \"********\" }")
    }
}

#[async_trait]
pub trait Authenticator {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Session>;
}

#[async_trait]
impl Authenticator for WallabagClient {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Session> {
        let form = [
            ("grant_type", "password"),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("username", credentials.username.as_str()),
            ("password", credentials.password.as_str()),
        ];

        let response = self
            .http()
            .post(self.endpoint(TOKEN_PATH))
            .form(&form)
            .send()
            .await
            .map_err(|e| SyncError::Authentication {
                status: None,
                message: format!("token request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let (status, message) = failure_details(response).await;
            return Err(SyncError::Authentication {
                status: Some(status.as_u16()),
                message,
            });
        }

        let token: TokenResponse = response.json().await.map_err(|e| SyncError::Authentication {
            status: None,
            message: format!("invalid token response: {}", e),
        })?;

        let access_token = token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SyncError::Authentication {
                status: None,
                message: "no access token in response".into(),
            })?;

        tracing::debug!(
            user = %credentials.username,
            expires_in = ?token.expires_in,
            token_type = ?token.token_type,
            "Obtained access token"
        );

        Ok(Session::new(access_token))
    }
}
