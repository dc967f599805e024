//! HTTP surface integration tests, run in-memory against the router
//! `tower::ServiceExt::oneshot` style, behind a scripted stub ERP.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use suitebridge_client::ErpClient;
use suitebridge_coordinator::{Coordinator, Lookups};
use suitebridge_config::Config;
use suitebridge_core::Subsidiary;
use suitebridge_equity::EquityEngine;
use suitebridge_server::AppState;
use suitebridge_test_utils::fixtures::{account_type_row, minimal_config, account_amount_row};
use suitebridge_test_utils::{StubErpServer, StubResponse, TestServerConfig};

fn single_subsidiary_lookups() -> Lookups {
    let mut subsidiaries = HashMap::new();
    subsidiaries.insert(
        1,
        Subsidiary {
            id: 1,
            name: "Acme Corp.".to_string(),
            parent_id: None,
            is_inactive: false,
            is_elimination: false,
        },
    );
    Lookups {
        subsidiaries,
        default_consolidation_root: 1,
        ..Default::default()
    }
}

async fn test_router_against(server: &StubErpServer, config: Config) -> axum::Router {
    let client = ErpClient::with_query_url(&config, server.query_url());
    let coordinator = Arc::new(Coordinator::with_client_and_lookups(client, single_subsidiary_lookups(), &config));
    let equity = Arc::new(EquityEngine::new(Arc::clone(&coordinator), &config));
    let state = AppState {
        coordinator,
        equity,
        config: Arc::new(config),
    };
    suitebridge_server::build(state)
}

async fn json_response(router: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn root_returns_banner() {
    let server = StubErpServer::spawn(TestServerConfig::default(), vec![]).await;
    let router = test_router_against(&server, minimal_config()).await;

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(String::from_utf8(body.to_vec()).unwrap().starts_with("suitebridge-server"));
}

#[tokio::test]
async fn health_reports_subsidiary_count_and_account_id() {
    let server = StubErpServer::spawn(TestServerConfig::default(), vec![]).await;
    let router = test_router_against(&server, minimal_config()).await;

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = json_response(router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["account_id"], "TEST123");
    assert_eq!(body["subsidiary_count"], 1);
}

#[tokio::test]
async fn single_cell_balance_hits_cache_on_second_call() {
    let server = StubErpServer::spawn(
        TestServerConfig::default(),
        vec![
            StubResponse::page(vec![account_type_row("4220", "Income")]),
            StubResponse::page(vec![account_amount_row("4220", "pl_2025_01", 500.0)]),
        ],
    )
    .await;
    let router = test_router_against(&server, minimal_config()).await;

    let uri = "/balance?account=4220&from_period=Jan+2025&to_period=Jan+2025&subsidiary=1";
    let first = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let (status, body) = json_response(router.clone(), first).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(500.0));
    assert_eq!(server.request_count(), 2);

    let second = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let (status, body) = json_response(router, second).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(500.0));
    assert_eq!(server.request_count(), 2, "second call must be served entirely from cache");
}

#[tokio::test]
async fn batch_account_types_drops_unknown_accounts_instead_of_failing() {
    let server = StubErpServer::spawn(
        TestServerConfig::default(),
        vec![StubResponse::page(vec![account_type_row("4220", "Income")])],
    )
    .await;
    let router = test_router_against(&server, minimal_config()).await;

    let request = Request::builder()
        .uri("/batch/account_types")
        .method("POST")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&json!({"accounts": ["4220", "9999"]})).unwrap()))
        .unwrap();
    let (status, body) = json_response(router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["4220"], "Income");
    assert!(body.get("9999").is_none());
}

#[tokio::test]
async fn empty_batch_balance_grid_issues_no_erp_queries() {
    let server = StubErpServer::spawn(TestServerConfig::default(), vec![]).await;
    let router = test_router_against(&server, minimal_config()).await;

    let request = Request::builder()
        .uri("/batch/balance")
        .method("POST")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&json!({"accounts": [], "periods": [], "filters": {}})).unwrap()))
        .unwrap();
    let (status, body) = json_response(router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balances"], json!({}));
    assert_eq!(server.request_count(), 0);
}

#[tokio::test]
async fn cors_preflight_returns_204() {
    let server = StubErpServer::spawn(TestServerConfig::default(), vec![]).await;
    let router = test_router_against(&server, minimal_config()).await;

    let request = Request::builder()
        .uri("/health")
        .method("OPTIONS")
        .header("origin", "https://any-domain.example")
        .header("access-control-request-method", "GET")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(response.headers().get("access-control-allow-origin").unwrap(), "*");
}

#[tokio::test]
async fn unknown_single_account_returns_404() {
    let server = StubErpServer::spawn(TestServerConfig::default(), vec![StubResponse::page(vec![])]).await;
    let router = test_router_against(&server, minimal_config()).await;

    let request = Request::builder().uri("/account/9999/name").body(Body::empty()).unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
