//! `/batch/*` endpoints (`spec.md` §6): multi-cell balance, account type
//! resolution, full-year P&L refresh, and balance-sheet multi-period.

use std::collections::{BTreeMap, BTreeSet};

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use suitebridge_core::normalize::{normalize_account_number, normalize_period_name};
use suitebridge_core::{BalanceResult, GatewayResult, QueryRequest};

use crate::error::ApiError;
use crate::filters::RawFilters;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BatchBalanceCell {
    account: String,
    #[serde(rename = "fromPeriod")]
    from_period: String,
    #[serde(rename = "toPeriod")]
    to_period: String,
    #[serde(default)]
    filters: RawFilters,
}

/// The two JSON shapes `/batch/balance` accepts: an explicit list of
/// per-cell requests (each with its own filter bundle), or a single
/// account × period grid sharing one filter bundle.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum BatchBalanceRequest {
    Cells {
        requests: Vec<BatchBalanceCell>,
    },
    Grid {
        accounts: Vec<String>,
        periods: Vec<String>,
        #[serde(default)]
        filters: RawFilters,
    },
}

#[derive(Debug, Serialize)]
pub struct BalancesResponse {
    balances: BTreeMap<String, BTreeMap<String, f64>>,
}

pub async fn balance(State(state): State<AppState>, Json(req): Json<BatchBalanceRequest>) -> Result<Json<BalancesResponse>, ApiError> {
    let lookups = state.coordinator.lookups();
    let mut merged = BalanceResult::new();

    match req {
        BatchBalanceRequest::Cells { requests } => {
            for cell in requests {
                let account = normalize_account_number(&cell.account).map_err(ApiError::from)?;
                let from_period = normalize_period_name(&cell.from_period).map_err(ApiError::from)?;
                let to_period = normalize_period_name(&cell.to_period).map_err(ApiError::from)?;
                let periods = super::balance::month_range(&from_period, &to_period).map_err(ApiError::from)?;
                let filters = cell.filters.resolve(lookups).map_err(ApiError::from)?;
                let accounts: BTreeSet<String> = [account].into_iter().collect();
                let classification = state.coordinator.classify(&accounts, &periods).await.map_err(ApiError::from)?;
                let request = QueryRequest {
                    accounts,
                    periods,
                    filters,
                    classification,
                };
                let result = state.coordinator.balance_for_accounts(&request).await.map_err(ApiError::from)?;
                merged.merge(result);
            }
        }
        BatchBalanceRequest::Grid { accounts, periods, filters } => {
            let accounts: BTreeSet<String> = accounts
                .iter()
                .map(|a| normalize_account_number(a))
                .collect::<GatewayResult<_>>()
                .map_err(ApiError::from)?;
            let periods: BTreeSet<String> = periods
                .iter()
                .map(|p| normalize_period_name(p))
                .collect::<GatewayResult<_>>()
                .map_err(ApiError::from)?;
            let filters = filters.resolve(lookups).map_err(ApiError::from)?;
            if !accounts.is_empty() && !periods.is_empty() {
                let classification = state.coordinator.classify(&accounts, &periods).await.map_err(ApiError::from)?;
                let request = QueryRequest {
                    accounts,
                    periods,
                    filters,
                    classification,
                };
                let result = state.coordinator.balance_for_accounts(&request).await.map_err(ApiError::from)?;
                merged.merge(result);
            }
        }
    }

    Ok(Json(BalancesResponse { balances: merged.0 }))
}

#[derive(Debug, Deserialize)]
pub struct BatchAccountTypesRequest {
    accounts: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchAccountTypesResponse {
    #[serde(flatten)]
    types: BTreeMap<String, String>,
}

/// Unknown accounts are dropped rather than failing the whole request
/// (`spec.md` §7 "for batch endpoints, treat as a zero cell and continue").
pub async fn account_types(
    State(state): State<AppState>,
    Json(req): Json<BatchAccountTypesRequest>,
) -> Result<Json<BatchAccountTypesResponse>, ApiError> {
    let numbers: Vec<String> = req
        .accounts
        .iter()
        .map(|a| normalize_account_number(a))
        .collect::<GatewayResult<_>>()
        .map_err(ApiError::from)?;

    let mut types = BTreeMap::new();
    match state.coordinator.account_types(&numbers).await {
        Ok(accounts) => {
            for account in accounts {
                types.insert(account.number, account.account_type.erp_tag().to_string());
            }
        }
        Err(_) => {
            for number in &numbers {
                if let Ok(mut accounts) = state.coordinator.account_types(std::slice::from_ref(number)).await {
                    if let Some(account) = accounts.pop() {
                        types.insert(account.number, account.account_type.erp_tag().to_string());
                    }
                }
            }
        }
    }

    Ok(Json(BatchAccountTypesResponse { types }))
}

#[derive(Debug, Deserialize)]
pub struct FullYearRefreshRequest {
    year: i32,
    #[serde(default)]
    skip_bs: bool,
    #[serde(default)]
    filters: RawFilters,
}

#[derive(Debug, Serialize)]
pub struct FullYearRefreshResponse {
    balances: BTreeMap<String, BTreeMap<String, f64>>,
    account_types: BTreeMap<String, String>,
}

pub async fn full_year_refresh(
    State(state): State<AppState>,
    Json(req): Json<FullYearRefreshRequest>,
) -> Result<Json<FullYearRefreshResponse>, ApiError> {
    let filters = req.filters.resolve(state.coordinator.lookups()).map_err(ApiError::from)?;
    let (balances, accounts) = state
        .coordinator
        .full_year_refresh(req.year, req.skip_bs, &filters)
        .await
        .map_err(ApiError::from)?;

    let account_types = accounts
        .into_iter()
        .map(|a| (a.number, a.account_type.erp_tag().to_string()))
        .collect();

    Ok(Json(FullYearRefreshResponse { balances: balances.0, account_types }))
}

#[derive(Debug, Deserialize)]
pub struct BsPeriodsRequest {
    periods: Vec<String>,
    #[serde(default)]
    filters: RawFilters,
}

pub async fn bs_periods(State(state): State<AppState>, Json(req): Json<BsPeriodsRequest>) -> Result<Json<BalancesResponse>, ApiError> {
    let periods: BTreeSet<String> = req
        .periods
        .iter()
        .map(|p| normalize_period_name(p))
        .collect::<GatewayResult<_>>()
        .map_err(ApiError::from)?;
    let filters = req.filters.resolve(state.coordinator.lookups()).map_err(ApiError::from)?;

    let result = state.coordinator.bs_periods(&periods, &filters).await.map_err(ApiError::from)?;
    Ok(Json(BalancesResponse { balances: result.0 }))
}
