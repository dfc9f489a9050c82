mod common;

use common::*;
use hemmer_provider_commercetools::testing::ProviderTester;
use hemmer_provider_commercetools::{CommercetoolsProvider, ProviderError, ProviderService};
use serde_json::json;
use tokio_test::assert_ok;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_schema_lists_resources() {
    let tester = ProviderTester::new(CommercetoolsProvider::new());

    assert_eq!(
        tester.resource_types(),
        vec!["commercetools_product".to_string(), "commercetools_state".to_string()]
    );

    let schema = tester.schema();
    assert!(schema.provider.attributes["client_secret"].flags.sensitive);
    assert!(schema.resources["commercetools_state"].attributes["key"].flags.required);
}

#[tokio::test]
async fn test_configure_then_read() {
    let server = start_server().await;

    Mock::given(method("GET"))
        .and(path(api_path("states", Some("s1"))))
        .and(header("authorization", format!("Bearer {}", ACCESS_TOKEN).as_str()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(state_json("s1", 1, "state-c", None)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let tester = ProviderTester::new(CommercetoolsProvider::new());
    let config = json!({
        "client_id": "client-id",
        "client_secret": "client-secret",
        "project_key": PROJECT_KEY,
        "scopes": format!("manage_project:{}", PROJECT_KEY),
        "api_url": server.uri(),
        "token_url": server.uri()
    });
    assert_ok!(tester.validate_provider_config(config.clone()).await);
    assert_ok!(tester.configure(config).await);

    let state = tester
        .read("commercetools_state", json!({"id": "s1"}))
        .await
        .unwrap();
    assert_eq!(state["key"], "state-c");

    assert_ok!(tester.stop().await);
    let err = tester
        .read("commercetools_state", json!({"id": "s1"}))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Configuration(_)));
}

#[tokio::test]
async fn test_token_request_uses_client_credentials() {
    let server = wiremock::MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("scope=manage_project%3Atest-project"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": ACCESS_TOKEN,
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api_path("products", Some("p1"))))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(product_json("p1", 1, "Shoe", "shoe")),
        )
        .expect(2)
        .mount(&server)
        .await;

    let provider = provider(&server);
    for _ in 0..2 {
        let state = provider
            .read("commercetools_product", json!({"id": "p1"}))
            .await
            .unwrap();
        assert_eq!(state["name"]["en"], "Shoe");
    }
}

#[tokio::test]
async fn test_rejected_credentials() {
    let server = wiremock::MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "statusCode": 401,
            "message": "Please provide valid client credentials using HTTP Basic Authentication.",
            "error": "invalid_client"
        })))
        .mount(&server)
        .await;

    let err = provider(&server)
        .read("commercetools_product", json!({"id": "p1"}))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::PermissionDenied(_)));
}

#[tokio::test]
async fn test_create_retries_auth_service_outage() {
    let server = wiremock::MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": ACCESS_TOKEN,
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(api_path("products", None)))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(product_json("p1", 1, "Shoe", "shoe")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api_path("products", Some("p1"))))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(product_json("p1", 1, "Shoe", "shoe")),
        )
        .mount(&server)
        .await;

    let state = provider(&server)
        .create(
            "commercetools_product",
            json!({"name": {"en": "Shoe"}, "slug": {"en": "shoe"}}),
        )
        .await
        .unwrap();
    assert_eq!(state["id"], "p1");
}

#[tokio::test]
async fn test_auth_service_outage_is_not_a_credentials_error() {
    let server = wiremock::MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let err = provider(&server)
        .read("commercetools_product", json!({"id": "p1"}))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Unavailable(_)));
}

#[tokio::test]
async fn test_unknown_resource_type() {
    let server = start_server().await;
    let err = provider(&server)
        .read("commercetools_category", json!({"id": "c1"}))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::UnknownResource(_)));
}

#[tokio::test]
async fn test_read_without_id_is_no_state() {
    let server = start_server().await;
    let state = provider(&server)
        .read("commercetools_product", json!({"name": {"en": "Shoe"}}))
        .await
        .unwrap();
    assert!(state.is_null());
}
