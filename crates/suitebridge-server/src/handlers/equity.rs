//! `/retained-earnings`, `/net-income`, `/cta` (`spec.md` §6, §4.4).

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use suitebridge_core::normalize::normalize_period_name;

use crate::error::ApiError;
use crate::filters::RawFilters;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EquityRequest {
    period: String,
    #[serde(default)]
    filters: RawFilters,
}

pub async fn retained_earnings(State(state): State<AppState>, Json(req): Json<EquityRequest>) -> Result<Json<f64>, ApiError> {
    let period = normalize_period_name(&req.period).map_err(ApiError::from)?;
    let filters = req.filters.resolve(state.coordinator.lookups()).map_err(ApiError::from)?;
    let amount = state.equity.retained_earnings(&period, &filters).await.map_err(ApiError::from)?;
    Ok(Json(amount))
}

pub async fn net_income(State(state): State<AppState>, Json(req): Json<EquityRequest>) -> Result<Json<f64>, ApiError> {
    let period = normalize_period_name(&req.period).map_err(ApiError::from)?;
    let filters = req.filters.resolve(state.coordinator.lookups()).map_err(ApiError::from)?;
    let amount = state.equity.net_income(&period, &filters).await.map_err(ApiError::from)?;
    Ok(Json(amount))
}

#[derive(Debug, Deserialize)]
pub struct CtaRequest {
    period: String,
    subsidiary: Option<String>,
    #[serde(rename = "accountingBook")]
    accounting_book: Option<String>,
}

pub async fn cta(State(state): State<AppState>, Json(req): Json<CtaRequest>) -> Result<Json<f64>, ApiError> {
    let period = normalize_period_name(&req.period).map_err(ApiError::from)?;
    let raw = RawFilters {
        subsidiary: req.subsidiary,
        accounting_book: req.accounting_book,
        ..Default::default()
    };
    let filters = raw.resolve(state.coordinator.lookups()).map_err(ApiError::from)?;
    let amount = state.equity.cta(&period, &filters).await.map_err(ApiError::from)?;
    Ok(Json(amount))
}
