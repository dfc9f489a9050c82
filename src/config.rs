//! Provider configuration.
//!
//! Every attribute may be left out of the host configuration and supplied
//! through an environment variable instead.

use serde::Deserialize;

use crate::client::ClientConfig;
use crate::error::ProviderError;
use crate::schema::{Attribute, Schema};

/// Default commercetools HTTP API (Europe, Google Cloud).
pub const DEFAULT_API_URL: &str = "https://api.europe-west1.gcp.commercetools.com";
/// Default commercetools auth service (Europe, Google Cloud).
pub const DEFAULT_TOKEN_URL: &str = "https://auth.europe-west1.gcp.commercetools.com";

/// Environment variable for `client_id`.
pub const ENV_CLIENT_ID: &str = "CTP_CLIENT_ID";
/// Environment variable for `client_secret`.
pub const ENV_CLIENT_SECRET: &str = "CTP_CLIENT_SECRET";
/// Environment variable for `project_key`.
pub const ENV_PROJECT_KEY: &str = "CTP_PROJECT_KEY";
/// Environment variable for `scopes`.
pub const ENV_SCOPES: &str = "CTP_SCOPES";
/// Environment variable for `api_url`.
pub const ENV_API_URL: &str = "CTP_API_URL";
/// Environment variable for `token_url`.
pub const ENV_TOKEN_URL: &str = "CTP_AUTH_URL";

/// Provider configuration as sent by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    /// OAuth client ID.
    pub client_id: Option<String>,
    /// OAuth client secret.
    pub client_secret: Option<String>,
    /// Project key.
    pub project_key: Option<String>,
    /// Space-separated OAuth scopes.
    pub scopes: Option<String>,
    /// HTTP API base URL.
    pub api_url: Option<String>,
    /// Auth service base URL.
    pub token_url: Option<String>,
}

impl ProviderConfig {
    /// Parse the JSON configuration object. `null` is an empty configuration.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, ProviderError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value.clone())
            .map_err(|e| ProviderError::Configuration(e.to_string()))
    }

    /// Fill gaps from the process environment and build client settings.
    pub fn resolve(self) -> Result<ClientConfig, ProviderError> {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// Like [`resolve`](Self::resolve) with a custom variable lookup.
    pub fn resolve_with<F>(self, env: F) -> Result<ClientConfig, ProviderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |value: Option<String>, var: &str| {
            value
                .filter(|v| !v.is_empty())
                .or_else(|| env(var).filter(|v| !v.is_empty()))
        };

        let client_id = lookup(self.client_id, ENV_CLIENT_ID);
        let client_secret = lookup(self.client_secret, ENV_CLIENT_SECRET);
        let project_key = lookup(self.project_key, ENV_PROJECT_KEY);

        let mut missing = Vec::new();
        if client_id.is_none() {
            missing.push(format!("client_id ({})", ENV_CLIENT_ID));
        }
        if client_secret.is_none() {
            missing.push(format!("client_secret ({})", ENV_CLIENT_SECRET));
        }
        if project_key.is_none() {
            missing.push(format!("project_key ({})", ENV_PROJECT_KEY));
        }

        let (Some(client_id), Some(client_secret), Some(project_key)) =
            (client_id, client_secret, project_key)
        else {
            return Err(ProviderError::Configuration(format!(
                "missing required settings: {}",
                missing.join(", ")
            )));
        };

        let scopes = lookup(self.scopes, ENV_SCOPES)
            .unwrap_or_else(|| format!("manage_project:{}", project_key));
        let api_url =
            lookup(self.api_url, ENV_API_URL).unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let token_url =
            lookup(self.token_url, ENV_TOKEN_URL).unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string());

        Ok(ClientConfig {
            api_url,
            token_url,
            project_key,
            client_id,
            client_secret,
            scopes,
        })
    }
}

/// Schema of the provider configuration block.
pub fn provider_schema() -> Schema {
    Schema::v0()
        .with_description("commercetools project credentials and endpoints")
        .with_attribute(
            "client_id",
            Attribute::optional_string()
                .with_description(format!("OAuth client ID. Falls back to {}.", ENV_CLIENT_ID)),
        )
        .with_attribute(
            "client_secret",
            Attribute::optional_string()
                .sensitive()
                .with_description(format!(
                    "OAuth client secret. Falls back to {}.",
                    ENV_CLIENT_SECRET
                )),
        )
        .with_attribute(
            "project_key",
            Attribute::optional_string()
                .with_description(format!("Project key. Falls back to {}.", ENV_PROJECT_KEY)),
        )
        .with_attribute(
            "scopes",
            Attribute::optional_string().with_description(format!(
                "Space-separated OAuth scopes. Falls back to {}, then \
                 manage_project:<project_key>.",
                ENV_SCOPES
            )),
        )
        .with_attribute(
            "api_url",
            Attribute::optional_string().with_description(format!(
                "HTTP API URL. Falls back to {}, then {}.",
                ENV_API_URL, DEFAULT_API_URL
            )),
        )
        .with_attribute(
            "token_url",
            Attribute::optional_string().with_description(format!(
                "Auth service URL. Falls back to {}, then {}.",
                ENV_TOKEN_URL, DEFAULT_TOKEN_URL
            )),
        )
}
