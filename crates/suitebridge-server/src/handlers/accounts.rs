//! Account name/type/parent lookup and account search (`spec.md` §6).

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use suitebridge_core::normalize::normalize_account_number;
use suitebridge_core::GatewayError;
use suitebridge_sql::{account_search_query, wildcard_pattern};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AccountBody {
    pub account: String,
}

async fn resolve_one(state: &AppState, account: &str) -> Result<suitebridge_core::Account, ApiError> {
    let number = normalize_account_number(account).map_err(ApiError::from)?;
    let mut accounts = state
        .coordinator
        .account_types(std::slice::from_ref(&number))
        .await
        .map_err(ApiError::from)?;
    accounts.pop().ok_or_else(|| ApiError(GatewayError::not_found(format!("unknown account '{number}'"))))
}

pub async fn name_path(Path(account): Path<String>, State(state): State<AppState>) -> Result<Json<String>, ApiError> {
    Ok(Json(resolve_one(&state, &account).await?.name))
}

pub async fn name_body(State(state): State<AppState>, Json(body): Json<AccountBody>) -> Result<Json<String>, ApiError> {
    Ok(Json(resolve_one(&state, &body.account).await?.name))
}

pub async fn type_path(Path(account): Path<String>, State(state): State<AppState>) -> Result<Json<String>, ApiError> {
    Ok(Json(resolve_one(&state, &account).await?.account_type.erp_tag().to_string()))
}

pub async fn type_body(State(state): State<AppState>, Json(body): Json<AccountBody>) -> Result<Json<String>, ApiError> {
    Ok(Json(resolve_one(&state, &body.account).await?.account_type.erp_tag().to_string()))
}

pub async fn parent_path(Path(account): Path<String>, State(state): State<AppState>) -> Result<Json<String>, ApiError> {
    Ok(Json(resolve_one(&state, &account).await?.parent_number.unwrap_or_default()))
}

pub async fn parent_body(State(state): State<AppState>, Json(body): Json<AccountBody>) -> Result<Json<String>, ApiError> {
    Ok(Json(resolve_one(&state, &body.account).await?.parent_number.unwrap_or_default()))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pattern: String,
    #[serde(default)]
    active_only: bool,
}

#[derive(Debug, Serialize)]
pub struct SearchResultRow {
    id: i64,
    accountnumber: String,
    accountname: String,
    accttype: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pattern: String,
    count: usize,
    accounts: Vec<SearchResultRow>,
}

pub async fn search(State(state): State<AppState>, Query(query): Query<SearchQuery>) -> Result<Json<SearchResponse>, ApiError> {
    let sql_pattern = wildcard_pattern(&query.pattern);
    let sql = account_search_query(&sql_pattern, query.active_only);
    let rows = state
        .coordinator
        .client()
        .execute_query(&sql, std::time::Duration::from_secs(60))
        .await
        .map_err(ApiError::from)?;

    let accounts = rows
        .iter()
        .filter_map(|row| {
            Some(SearchResultRow {
                id: row.get("id")?.as_i64()?,
                accountnumber: row.get("accountnumber")?.as_str()?.to_string(),
                accountname: row.get("accountname")?.as_str()?.to_string(),
                accttype: row.get("accttype")?.as_str()?.to_string(),
            })
        })
        .collect::<Vec<_>>();

    Ok(Json(SearchResponse {
        pattern: query.pattern,
        count: accounts.len(),
        accounts,
    }))
}
