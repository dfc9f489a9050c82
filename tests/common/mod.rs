//! Shared fixtures: a wiremock server standing in for the commercetools
//! auth service and HTTP API.

#![allow(dead_code)]

use hemmer_provider_commercetools::client::ClientConfig;
use hemmer_provider_commercetools::CommercetoolsProvider;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PROJECT_KEY: &str = "test-project";
pub const ACCESS_TOKEN: &str = "test-token";

/// Start a mock server that hands out access tokens.
pub async fn start_server() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": ACCESS_TOKEN,
            "token_type": "Bearer",
            "expires_in": 172800,
            "scope": format!("manage_project:{}", PROJECT_KEY)
        })))
        .mount(&server)
        .await;

    server
}

pub fn client_config(server: &MockServer) -> ClientConfig {
    ClientConfig {
        api_url: server.uri(),
        token_url: server.uri(),
        project_key: PROJECT_KEY.to_string(),
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
        scopes: format!("manage_project:{}", PROJECT_KEY),
    }
}

/// A provider talking to the mock server.
pub fn provider(server: &MockServer) -> CommercetoolsProvider {
    CommercetoolsProvider::with_client_config(client_config(server))
        .expect("client should build")
}

/// Path of a collection, or of one object in it.
pub fn api_path(collection: &str, id: Option<&str>) -> String {
    match id {
        Some(id) => format!("/{}/{}/{}", PROJECT_KEY, collection, id),
        None => format!("/{}/{}", PROJECT_KEY, collection),
    }
}

pub fn product_json(id: &str, version: i64, name: &str, slug: &str) -> Value {
    let data = json!({
        "name": {"en": name},
        "slug": {"en": slug},
        "categories": [],
        "variants": []
    });
    json!({
        "id": id,
        "version": version,
        "key": "shoe-1",
        "productType": {"typeId": "product-type", "id": "pt-1"},
        "masterData": {
            "published": false,
            "hasStagedChanges": false,
            "current": data.clone(),
            "staged": data
        },
        "createdAt": "2026-01-01T00:00:00.000Z",
        "lastModifiedAt": "2026-01-01T00:00:00.000Z"
    })
}

pub fn state_json(id: &str, version: i64, key: &str, transitions: Option<&[&str]>) -> Value {
    let mut state = json!({
        "id": id,
        "version": version,
        "key": key,
        "type": "ReviewState",
        "name": {"en": "State C"},
        "initial": true,
        "builtIn": false,
        "roles": []
    });
    if let Some(ids) = transitions {
        state["transitions"] = ids
            .iter()
            .map(|id| json!({"typeId": "state", "id": id}))
            .collect();
    }
    state
}

/// JSON bodies of all requests the server received for `method` and `path`.
pub async fn request_bodies(
    server: &MockServer,
    http_method: &str,
    request_path: &str,
) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.method.as_str() == http_method && r.url.path() == request_path)
        .map(|r| serde_json::from_slice(&r.body).unwrap_or(Value::Null))
        .collect()
}
