//! `GET /health` and `GET /test` (`spec.md` §6).

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use suitebridge_sql::lookups::subsidiaries_query;
use tracing::instrument;

use crate::error::ApiError;
use crate::state::AppState;

/// Ornamental human sanity-check endpoint; not part of the spreadsheet
/// add-in's contract.
pub async fn banner() -> &'static str {
    concat!("suitebridge-server ", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    account_id: String,
    subsidiary_count: usize,
}

#[instrument(skip(state))]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        account_id: state.config.erp.account_id.clone(),
        subsidiary_count: state.coordinator.lookups().subsidiaries.len(),
    })
}

#[derive(Debug, Serialize)]
pub struct PingResponse {
    account: String,
    active_accounts: usize,
    message: String,
}

/// Runs a live query against the ERP so the caller learns whether
/// credentials and connectivity are actually good, not just that the
/// process is up.
#[instrument(skip(state))]
pub async fn ping(State(state): State<AppState>) -> Result<Json<PingResponse>, ApiError> {
    let rows = state
        .coordinator
        .client()
        .execute_query(subsidiaries_query(), std::time::Duration::from_secs(30))
        .await
        .map_err(ApiError::from)?;

    Ok(Json(PingResponse {
        account: state.config.erp.account_id.clone(),
        active_accounts: rows.len(),
        message: "connected".to_string(),
    }))
}
