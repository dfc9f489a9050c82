//! OAuth2 client-credentials token handling.

use reqwest::{Client as HttpClient, StatusCode};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

use super::error::ApiError;

/// Tokens are refreshed this long before they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Option<Instant>,
}

impl CachedToken {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Instant::now() >= exp)
    }
}

/// Fetches and caches access tokens from the commercetools auth service.
pub(crate) struct TokenSource {
    token_url: String,
    client_id: String,
    client_secret: String,
    scopes: String,
    token: RwLock<Option<CachedToken>>,
}

impl TokenSource {
    pub(crate) fn new(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        scopes: impl Into<String>,
    ) -> Self {
        Self {
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scopes: scopes.into(),
            token: RwLock::new(None),
        }
    }

    /// Return a valid access token, requesting a new one when needed.
    pub(crate) async fn access_token(&self, http: &HttpClient) -> Result<String, ApiError> {
        {
            let guard = self.token.read().await;
            if let Some(token) = guard.as_ref().filter(|t| !t.is_expired()) {
                return Ok(token.access_token.clone());
            }
        }

        let fresh = self.request_token(http).await?;
        let access_token = fresh.access_token.clone();
        *self.token.write().await = Some(fresh);
        Ok(access_token)
    }

    /// Drop the cached token, e.g. after the API rejected it.
    pub(crate) async fn invalidate(&self) {
        *self.token.write().await = None;
    }

    async fn request_token(&self, http: &HttpClient) -> Result<CachedToken, ApiError> {
        debug!(token_url = %self.token_url, "Requesting commercetools access token");

        let url = format!("{}/oauth/token", self.token_url.trim_end_matches('/'));
        let response = http
            .post(url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[
                ("grant_type", "client_credentials"),
                ("scope", self.scopes.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        // 400 and 401 are the auth service rejecting the credentials or scopes.
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Auth(format!("token request returned {status}: {body}")));
        }
        if !status.is_success() {
            return Err(ApiError::from_body(status.as_u16(), &body));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| ApiError::Decode(format!("token response: {e}")))?;

        let expires_at = token
            .expires_in
            .map(|secs| Instant::now() + Duration::from_secs(secs).saturating_sub(EXPIRY_MARGIN));

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at,
        })
    }
}
