mod common;

use async_trait::async_trait;
use axum::http::StatusCode;
use common::{StubResolver, read_json, service_with};
use http_helpers::{empty_request, json_request};
use orgauth::app::{AppState, build_router};
use orgauth::store::memory::InMemoryStore;
use orgauth::store::{ConfigStore, StoreError, StoreResult};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

type App = axum::routing::RouterIntoService<axum::body::Body, ()>;

fn app_with(store: Arc<dyn ConfigStore>, resolver: Arc<StubResolver>) -> App {
    let state = AppState {
        service: Arc::new(service_with(store, resolver, None)),
    };
    build_router(state).into_service()
}

fn memory_app() -> App {
    app_with(Arc::new(InMemoryStore::new()), StubResolver::new(31337))
}

#[tokio::test]
async fn read_before_write_is_not_found() {
    let app = memory_app();
    let response = app
        .oneshot(empty_request("GET", "/v1/auth/config"))
        .await
        .expect("read");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json(response).await;
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn write_then_read_round_trip() {
    let app = memory_app();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/auth/config",
            json!({
                "organization": "acme",
                "base_url": "http://example.com",
                "token_policies": "Dev, ops",
                "token_ttl": "1h",
            }),
        ))
        .await
        .expect("write");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(empty_request("GET", "/v1/auth/config"))
        .await
        .expect("read");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["organization"], "acme");
    assert_eq!(body["organization_id"], 31337);
    assert_eq!(body["base_url"], "http://example.com/");
    assert_eq!(body["token_policies"], json!(["dev", "ops"]));
    assert_eq!(body["token_ttl"], 3600);
    assert_eq!(body["ttl"], 3600);
    assert!(body.get("max_ttl").is_none());
}

#[tokio::test]
async fn put_is_accepted_as_write() {
    let app = memory_app();
    let response = app
        .oneshot(json_request(
            "PUT",
            "/v1/auth/config",
            json!({ "organization": "acme", "organization_id": 3 }),
        ))
        .await
        .expect("write");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn missing_organization_is_bad_request() {
    let app = memory_app();
    let response = app
        .oneshot(json_request("POST", "/v1/auth/config", json!({})))
        .await
        .expect("write");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["code"], "validation_error");
    assert_eq!(body["message"], "organization is a required parameter");
}

#[tokio::test]
async fn malformed_bodies_are_bad_requests() {
    let app = memory_app();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/auth/config",
            json!({ "organization": "acme", "organization_id": "many" }),
        ))
        .await
        .expect("write");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .starts_with("invalid request body")
    );

    let response = app
        .oneshot(json_request("POST", "/v1/auth/config", json!(["not", "an", "object"])))
        .await
        .expect("write");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["code"], "validation_error");
}

#[tokio::test]
async fn warnings_are_returned_with_ok_status() {
    let app = memory_app();
    let response = app
        .oneshot(json_request(
            "POST",
            "/v1/auth/config",
            json!({
                "organization": "acme",
                "organization_id": 1,
                "ttl": 60,
                "github_token": "ghp_from_caller",
            }),
        ))
        .await
        .expect("write");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let warnings: Vec<String> = serde_json::from_value(body["warnings"].clone()).unwrap();
    assert_eq!(warnings.len(), 2);
    assert_eq!(warnings[0], "ignoring unrecognized parameters: github_token");
    assert!(warnings[1].contains("\"ttl\" is deprecated"));
}

#[tokio::test]
async fn resolver_failure_is_internal_error() {
    let store = Arc::new(InMemoryStore::new());
    let app = app_with(store.clone(), StubResolver::new(0));
    let response = app
        .oneshot(json_request(
            "POST",
            "/v1/auth/config",
            json!({ "organization": "ghost" }),
        ))
        .await
        .expect("write");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = read_json(response).await;
    assert_eq!(body["code"], "internal");
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("organization_id not found for ghost")
    );
    assert!(store.get("config").await.unwrap().is_none());
}

#[tokio::test]
async fn field_listing_describes_schema() {
    let app = memory_app();
    let response = app
        .oneshot(empty_request("GET", "/v1/auth/config/fields"))
        .await
        .expect("fields");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let items = body["items"].as_array().expect("items");
    let organization = items
        .iter()
        .find(|item| item["name"] == "organization")
        .expect("organization field");
    assert_eq!(organization["required"], true);
    assert_eq!(organization["type"], "string");
    let ttl = items.iter().find(|item| item["name"] == "ttl").expect("ttl");
    assert_eq!(ttl["deprecated"], true);
    assert!(items.iter().any(|item| item["name"] == "token_bound_cidrs"));
}

#[tokio::test]
async fn health_reports_backend() {
    let app = memory_app();
    let response = app
        .oneshot(empty_request("GET", "/v1/system/health"))
        .await
        .expect("health");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["backend"], "memory");
}

#[tokio::test]
async fn openapi_document_lists_config_paths() {
    let app = memory_app();
    let response = app
        .oneshot(empty_request("GET", "/v1/openapi.json"))
        .await
        .expect("openapi");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert!(body["paths"].get("/v1/auth/config").is_some());
    assert!(body["paths"].get("/v1/auth/config/fields").is_some());
}

struct FailingStore;

#[async_trait]
impl ConfigStore for FailingStore {
    async fn get(&self, _key: &str) -> StoreResult<Option<Vec<u8>>> {
        Err(StoreError::Unexpected(anyhow::anyhow!("get failed")))
    }

    async fn put(&self, _key: &str, _value: Vec<u8>) -> StoreResult<()> {
        Err(StoreError::Unexpected(anyhow::anyhow!("put failed")))
    }

    async fn compare_and_put(
        &self,
        _key: &str,
        _expected: Option<&[u8]>,
        _value: Vec<u8>,
    ) -> StoreResult<()> {
        Err(StoreError::Unexpected(anyhow::anyhow!("cas failed")))
    }

    async fn health_check(&self) -> StoreResult<()> {
        Err(StoreError::Unexpected(anyhow::anyhow!("down")))
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "failing"
    }
}

#[tokio::test]
async fn storage_failures_are_internal_errors() {
    let app = app_with(Arc::new(FailingStore), StubResolver::new(1));

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/v1/system/health"))
        .await
        .expect("health");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(read_json(response).await["message"], "storage unavailable");

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/v1/auth/config"))
        .await
        .expect("read");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(read_json(response).await["message"], "storage failure");

    let response = app
        .oneshot(json_request(
            "POST",
            "/v1/auth/config",
            json!({ "organization": "acme", "organization_id": 1 }),
        ))
        .await
        .expect("write");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
