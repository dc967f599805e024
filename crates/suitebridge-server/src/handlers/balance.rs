//! `GET /balance` and `GET /budget` (`spec.md` §6): single-cell lookups
//! over an inclusive `from_period..=to_period` month range.

use std::collections::BTreeSet;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use suitebridge_core::normalize::{canonical_period_year_month, normalize_account_number, normalize_period_name};
use suitebridge_core::{GatewayError, GatewayResult, QueryRequest};

use crate::error::ApiError;
use crate::filters::RawFilters;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SingleCellQuery {
    account: String,
    from_period: String,
    to_period: String,
    #[serde(flatten)]
    filters: RawFilters,
}

/// Every canonical `Mon YYYY` name from `from` through `to` inclusive.
pub(crate) fn month_range(from: &str, to: &str) -> GatewayResult<BTreeSet<String>> {
    const MONTH_NAMES: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    let (from_year, from_month) = canonical_period_year_month(from)?;
    let (to_year, to_month) = canonical_period_year_month(to)?;

    let from_index = from_year as i64 * 12 + from_month as i64;
    let to_index = to_year as i64 * 12 + to_month as i64;
    if from_index > to_index {
        return Err(GatewayError::validation(format!(
            "from_period '{from}' is later than to_period '{to}'"
        )));
    }

    let mut periods = BTreeSet::new();
    let mut index = from_index;
    while index <= to_index {
        let year = (index - 1).div_euclid(12);
        let month = (index - 1).rem_euclid(12) as usize;
        periods.insert(format!("{} {year}", MONTH_NAMES[month]));
        index += 1;
    }
    Ok(periods)
}

pub async fn balance(State(state): State<AppState>, Query(query): Query<SingleCellQuery>) -> Result<Json<f64>, ApiError> {
    let account = normalize_account_number(&query.account).map_err(ApiError::from)?;
    let from_period = normalize_period_name(&query.from_period).map_err(ApiError::from)?;
    let to_period = normalize_period_name(&query.to_period).map_err(ApiError::from)?;
    let periods = month_range(&from_period, &to_period).map_err(ApiError::from)?;
    let filters = query.filters.resolve(state.coordinator.lookups()).map_err(ApiError::from)?;

    let accounts: BTreeSet<String> = [account].into_iter().collect();
    let classification = state.coordinator.classify(&accounts, &periods).await.map_err(ApiError::from)?;
    let request = QueryRequest {
        accounts,
        periods,
        filters,
        classification,
    };
    let result = state.coordinator.balance_for_accounts(&request).await.map_err(ApiError::from)?;

    let total: f64 = result.0.values().flat_map(|row| row.values()).sum();
    Ok(Json(total))
}

pub async fn budget(State(state): State<AppState>, Query(query): Query<SingleCellQuery>) -> Result<Json<f64>, ApiError> {
    let account = normalize_account_number(&query.account).map_err(ApiError::from)?;
    let from_period = normalize_period_name(&query.from_period).map_err(ApiError::from)?;
    let to_period = normalize_period_name(&query.to_period).map_err(ApiError::from)?;
    let filters = query.filters.resolve(state.coordinator.lookups()).map_err(ApiError::from)?;

    let amount = state
        .coordinator
        .budget_for_account(&account, &from_period, &to_period, &filters)
        .await
        .map_err(ApiError::from)?;
    Ok(Json(amount))
}
