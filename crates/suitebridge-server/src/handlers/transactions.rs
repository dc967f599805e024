//! `GET /transactions` (`spec.md` §6): GL drill-down behind a single
//! account/period cell, not cached — each call reflects live ERP state.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use suitebridge_core::normalize::{normalize_account_number, normalize_period_name};
use suitebridge_sql::transactions_query;

use crate::error::ApiError;
use crate::filters::RawFilters;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TransactionsQuery {
    account: String,
    period: String,
    #[serde(flatten)]
    filters: RawFilters,
}

#[derive(Debug, Serialize)]
pub struct TransactionRow {
    transaction_date: Option<String>,
    transaction_type: Option<String>,
    transaction_number: Option<String>,
    entity_name: Option<String>,
    memo: Option<String>,
    debit: Option<f64>,
    credit: Option<f64>,
    net_amount: Option<f64>,
    netsuite_url: String,
    account_number: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TransactionsResponse {
    transactions: Vec<TransactionRow>,
}

pub async fn transactions(
    State(state): State<AppState>,
    Query(query): Query<TransactionsQuery>,
) -> Result<Json<TransactionsResponse>, ApiError> {
    let account = normalize_account_number(&query.account).map_err(ApiError::from)?;
    let period = normalize_period_name(&query.period).map_err(ApiError::from)?;
    let filters = query.filters.resolve(state.coordinator.lookups()).map_err(ApiError::from)?;

    let sql = transactions_query(&account, &period, &filters).map_err(ApiError::from)?;
    let rows = state
        .coordinator
        .client()
        .execute_query(&sql, std::time::Duration::from_secs(60))
        .await
        .map_err(ApiError::from)?;

    let account_id = &state.config.erp.account_id;
    let transactions = rows
        .iter()
        .map(|row| {
            let transaction_number = row.get("transaction_number").and_then(|v| v.as_str()).map(str::to_string);
            let netsuite_url = match &transaction_number {
                Some(id) => format!("https://{account_id}.app.netsuite.com/app/accounting/transactions/transaction.nl?id={id}"),
                None => String::new(),
            };
            TransactionRow {
                transaction_date: row.get("transaction_date").and_then(|v| v.as_str()).map(str::to_string),
                transaction_type: row.get("transaction_type").and_then(|v| v.as_str()).map(str::to_string),
                transaction_number,
                entity_name: row.get("entity_name").and_then(|v| v.as_str()).map(str::to_string),
                memo: row.get("memo").and_then(|v| v.as_str()).map(str::to_string),
                debit: row.get("debit").and_then(value_as_f64),
                credit: row.get("credit").and_then(value_as_f64),
                net_amount: row.get("net_amount").and_then(value_as_f64),
                netsuite_url,
                account_number: row.get("account_number").and_then(|v| v.as_str()).map(str::to_string),
            }
        })
        .collect();

    Ok(Json(TransactionsResponse { transactions }))
}

fn value_as_f64(value: &serde_json::Value) -> Option<f64> {
    value.as_f64().or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}
