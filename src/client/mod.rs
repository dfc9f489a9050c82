//! Thin commercetools REST client.
//!
//! Covers the endpoints the provider's resources use: create, get by ID,
//! update with actions and versioned delete on the `products` and `states`
//! collections of one project. Requests carry an OAuth2 bearer token
//! obtained with the client-credentials grant.

mod auth;
mod error;
pub mod models;

pub use error::{ApiError, ErrorObject};

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;
use std::time::Duration;
use tracing::{debug, warn};

use auth::TokenSource;
use models::{Product, State, UpdateRequest};

/// Timeout applied to every HTTP request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for one commercetools project.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the HTTP API.
    pub api_url: String,
    /// Base URL of the auth service.
    pub token_url: String,
    /// Key of the project all requests go to.
    pub project_key: String,
    /// OAuth client ID.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Space-separated OAuth scopes.
    pub scopes: String,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("token_url", &self.token_url)
            .field("project_key", &self.project_key)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// Authenticated client for one commercetools project.
pub struct Client {
    http: reqwest::Client,
    config: ClientConfig,
    tokens: TokenSource,
}

impl Client {
    /// Create a client. No request is made until the first call.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        let tokens = TokenSource::new(
            config.token_url.clone(),
            config.client_id.clone(),
            config.client_secret.clone(),
            config.scopes.clone(),
        );

        Ok(Self {
            http,
            config,
            tokens,
        })
    }

    /// The settings this client was created with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The project's products.
    pub fn products(&self) -> Endpoint<'_, Product> {
        Endpoint::new(self, "products")
    }

    /// The project's states.
    pub fn states(&self) -> Endpoint<'_, State> {
        Endpoint::new(self, "states")
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.api_url.trim_end_matches('/'),
            self.config.project_key,
            path
        )
    }

    async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let token = self.tokens.access_token(&self.http).await?;
        Ok(self.http.request(method, self.url(path)).bearer_auth(token))
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let err = ApiError::from_body(status.as_u16(), &body);
            if status == reqwest::StatusCode::UNAUTHORIZED {
                warn!("Access token rejected, dropping cached token");
                self.tokens.invalidate().await;
            }
            return Err(err);
        }

        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Typed operations on one resource collection.
///
/// Methods consume the endpoint so the returned futures only borrow the client.
pub struct Endpoint<'a, T> {
    client: &'a Client,
    collection: &'static str,
    _resource: PhantomData<fn() -> T>,
}

impl<'a, T: DeserializeOwned> Endpoint<'a, T> {
    fn new(client: &'a Client, collection: &'static str) -> Self {
        Self {
            client,
            collection,
            _resource: PhantomData,
        }
    }

    /// Create a resource from its draft.
    pub async fn create<D: Serialize + ?Sized>(self, draft: &D) -> Result<T, ApiError> {
        debug!(collection = self.collection, "POST");
        let builder = self
            .client
            .request(Method::POST, self.collection)
            .await?
            .json(draft);
        self.client.send(builder).await
    }

    /// Fetch a resource by ID.
    pub async fn get(self, id: &str) -> Result<T, ApiError> {
        debug!(collection = self.collection, id, "GET");
        let path = format!("{}/{}", self.collection, id);
        let builder = self.client.request(Method::GET, &path).await?;
        self.client.send(builder).await
    }

    /// Apply update actions to the resource at `version`.
    pub async fn update<A: Serialize>(
        self,
        id: &str,
        version: i64,
        actions: &[A],
    ) -> Result<T, ApiError> {
        debug!(
            collection = self.collection,
            id,
            version,
            actions = actions.len(),
            "POST update"
        );
        let path = format!("{}/{}", self.collection, id);
        let builder = self
            .client
            .request(Method::POST, &path)
            .await?
            .json(&UpdateRequest { version, actions });
        self.client.send(builder).await
    }

    /// Delete the resource at `version`.
    pub async fn delete(self, id: &str, version: i64) -> Result<T, ApiError> {
        debug!(collection = self.collection, id, version, "DELETE");
        let path = format!("{}/{}", self.collection, id);
        let builder = self
            .client
            .request(Method::DELETE, &path)
            .await?
            .query(&[("version", version)]);
        self.client.send(builder).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClientConfig {
        ClientConfig {
            api_url: "https://api.example.com/".to_string(),
            token_url: "https://auth.example.com".to_string(),
            project_key: "my-project".to_string(),
            client_id: "client".to_string(),
            client_secret: "s3cret".to_string(),
            scopes: "manage_project:my-project".to_string(),
        }
    }

    #[test]
    fn test_url_joins_project_and_collection() {
        let client = Client::new(config()).unwrap();
        assert_eq!(
            client.url("states/abc"),
            "https://api.example.com/my-project/states/abc"
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", config());
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("<redacted>"));
    }
}
