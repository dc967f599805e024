use std::collections::HashMap;
use std::sync::Arc;

use suitebridge_client::ErpClient;
use suitebridge_coordinator::{Coordinator, Lookups};
use suitebridge_core::{FilterBundle, Subsidiary};
use suitebridge_equity::EquityEngine;
use suitebridge_test_utils::fixtures::{minimal_config, scalar_row};
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

fn period_row(name: &str, id: i64, start: &str, end: &str) -> serde_json::Value {
    serde_json::json!({ "id": id, "periodname": name, "startdate": start, "enddate": end })
}

async fn engine_against(server: &StubErpServer) -> Arc<EquityEngine> {
    let config = minimal_config();
    let client = ErpClient::with_query_url(&config, server.query_url());
    let coordinator = Coordinator::with_client_and_lookups(client, single_subsidiary_lookups(), &config);
    Arc::new(EquityEngine::new(Arc::new(coordinator), &config))
}

#[tokio::test]
async fn net_income_resolves_periods_then_issues_one_scalar_query() {
    let server = StubErpServer::spawn(
        TestServerConfig::default(),
        vec![
            StubResponse::page(vec![period_row("Mar 2025", 100, "2025-03-01", "2025-03-31")]),
            StubResponse::page(vec![period_row("Dec 2024", 90, "2024-12-01", "2024-12-31")]),
            StubResponse::page(vec![scalar_row(54_321.0)]),
        ],
    )
    .await;

    let engine = engine_against(&server).await;
    let ni = engine.net_income("Mar 2025", &FilterBundle::default()).await.unwrap();

    assert_eq!(ni, 54_321.0);
    assert_eq!(server.request_count(), 3);
}

#[tokio::test]
async fn net_income_is_cached_on_the_second_call() {
    let server = StubErpServer::spawn(
        TestServerConfig::default(),
        vec![
            StubResponse::page(vec![period_row("Mar 2025", 100, "2025-03-01", "2025-03-31")]),
            StubResponse::page(vec![period_row("Dec 2024", 90, "2024-12-01", "2024-12-31")]),
            StubResponse::page(vec![scalar_row(54_321.0)]),
        ],
    )
    .await;

    let engine = engine_against(&server).await;
    let filters = FilterBundle::default();
    engine.net_income("Mar 2025", &filters).await.unwrap();
    engine.net_income("Mar 2025", &filters).await.unwrap();

    assert_eq!(server.request_count(), 3);
}

#[tokio::test]
async fn retained_earnings_sums_the_roll_forward_and_manual_entries() {
    let server = StubErpServer::spawn(
        TestServerConfig::default(),
        vec![
            StubResponse::page(vec![period_row("Mar 2025", 100, "2025-03-01", "2025-03-31")]),
            StubResponse::page(vec![period_row("Dec 2024", 90, "2024-12-01", "2024-12-31")]),
            StubResponse::page(vec![scalar_row(1_000.0)]),
            StubResponse::page(vec![scalar_row(250.0)]),
        ],
    )
    .await;

    let engine = engine_against(&server).await;
    let re = engine.retained_earnings("Mar 2025", &FilterBundle::default()).await.unwrap();

    assert_eq!(re, 1_250.0);
    assert_eq!(server.request_count(), 4);
}

#[tokio::test]
async fn cta_combines_every_component_concurrently() {
    let server = StubErpServer::spawn(
        TestServerConfig::default(),
        vec![
            StubResponse::page(vec![period_row("Mar 2025", 100, "2025-03-01", "2025-03-31")]),
            StubResponse::page(vec![period_row("Dec 2024", 90, "2024-12-01", "2024-12-31")]),
            StubResponse::page(vec![scalar_row(10.0)]),
            StubResponse::page(vec![scalar_row(10.0)]),
            StubResponse::page(vec![scalar_row(10.0)]),
            StubResponse::page(vec![scalar_row(10.0)]),
            StubResponse::page(vec![scalar_row(10.0)]),
            StubResponse::page(vec![scalar_row(10.0)]),
        ],
    )
    .await;

    let engine = engine_against(&server).await;
    let cta = engine.cta("Mar 2025", &FilterBundle::default()).await.unwrap();

    // assets == liabilities, so (A - L) is 0; posted equity, RE (roll +
    // manual), and net income each subtract another 10.
    assert_eq!(cta, -40.0);
    assert_eq!(server.request_count(), 8);

    let cached = engine.cta("Mar 2025", &FilterBundle::default()).await.unwrap();
    assert_eq!(cached, -40.0);
    assert_eq!(server.request_count(), 8);
}
