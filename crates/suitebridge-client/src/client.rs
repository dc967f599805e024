//! The ERP REST client: signs, paginates, and retries a single SuiteQL-style
//! statement (`spec.md` §4.1).

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{Map, Value};
use suitebridge_config::{Config, ErpCredentials, RetryConfig};
use suitebridge_core::error::{GatewayError, GatewayResult};
use tracing::{debug, warn};

use crate::retry::{RetryReason, RetryState};
use crate::signing::{authorization_header, generate_nonce, OAuthParams};

/// One ERP result row, keyed by the lowercased column names the ERP
/// returns.
pub type Row = Map<String, Value>;

const DEFAULT_PAGE_SIZE: u32 = 1000;

pub struct ErpClient {
    http: reqwest::Client,
    credentials: ErpCredentials,
    retry_config: RetryConfig,
    query_url: String,
    row_cap: usize,
}

impl ErpClient {
    pub fn new(config: &Config) -> Self {
        let account_id = config.erp.account_id.to_lowercase().replace('_', "-");
        Self::with_query_url(
            config,
            format!("https://{account_id}.suitetalk.api.netsuite.com/services/rest/query/v1/suiteql"),
        )
    }

    /// Construct a client against an arbitrary endpoint instead of the
    /// account's real query URL. The seam integration tests use to point
    /// at a stub ERP server.
    pub fn with_query_url(config: &Config, query_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            credentials: config.erp.clone(),
            retry_config: config.retry.clone(),
            query_url,
            row_cap: config.operational.erp_row_cap,
        }
    }

    /// Execute `sql` and return every row, following pagination until
    /// exhausted or the row cap is hit.
    pub async fn execute_query(&self, sql: &str, timeout: Duration) -> GatewayResult<Vec<Row>> {
        let mut rows = Vec::new();
        let mut offset = 0u32;

        loop {
            let page = self.fetch_page(sql, offset, DEFAULT_PAGE_SIZE, timeout).await?;
            let page_len = page.items.len();
            rows.extend(page.items);

            if rows.len() >= self.row_cap {
                rows.truncate(self.row_cap);
                warn!(row_cap = self.row_cap, "ERP query truncated at row cap");
                break;
            }
            if !page.has_more || page_len == 0 {
                break;
            }
            offset += page_len as u32;
        }

        Ok(rows)
    }

    async fn fetch_page(&self, sql: &str, offset: u32, limit: u32, timeout: Duration) -> GatewayResult<Page> {
        let mut retry = RetryState::new(&self.retry_config);

        loop {
            match self.send_once(sql, offset, limit, timeout).await {
                Ok(page) => return Ok(page),
                Err(Attempt::Retryable { reason, detail }) => {
                    match retry.next_delay_ms(reason) {
                        Some(delay_ms) => {
                            debug!(?reason, delay_ms, attempt = retry.attempts_made(), "retrying ERP call");
                            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                        }
                        None => {
                            return Err(match reason {
                                RetryReason::RateLimited => GatewayError::rate_limited(detail),
                                RetryReason::ServerError => GatewayError::backend(detail),
                                RetryReason::ReadTimeout => GatewayError::timeout(detail),
                            });
                        }
                    }
                }
                Err(Attempt::Fatal(err)) => return Err(err),
            }
        }
    }

    async fn send_once(&self, sql: &str, offset: u32, limit: u32, timeout: Duration) -> Result<Page, Attempt> {
        let url = format!("{}?limit={limit}&offset={offset}", self.query_url);
        let params = OAuthParams {
            consumer_key: self.credentials.consumer_key.clone(),
            token: self.credentials.token_id.clone(),
            nonce: generate_nonce(),
            timestamp: chrono::Utc::now().timestamp(),
        };
        let extra_query = vec![
            ("limit".to_string(), limit.to_string()),
            ("offset".to_string(), offset.to_string()),
        ];
        let auth_header = authorization_header(
            "POST",
            &self.query_url,
            &self.credentials,
            &params,
            &extra_query,
        );

        let response = self
            .http
            .post(&url)
            .header("Authorization", auth_header)
            .header("Prefer", "transient")
            .json(&serde_json::json!({ "q": sql }))
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Attempt::Retryable {
                        reason: RetryReason::ReadTimeout,
                        detail: e.to_string(),
                    }
                } else {
                    Attempt::Fatal(GatewayError::backend(format!("ERP request failed: {e}")))
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Attempt::Retryable {
                reason: RetryReason::RateLimited,
                detail: "ERP concurrent request limit".to_string(),
            });
        }
        if status.is_server_error() {
            return Err(Attempt::Retryable {
                reason: RetryReason::ServerError,
                detail: format!("ERP server error: {status}"),
            });
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(Attempt::Fatal(GatewayError::auth(format!(
                "ERP rejected credentials ({status}): {body}"
            ))));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Attempt::Fatal(GatewayError::backend(format!(
                "ERP error ({status}): {body}"
            ))));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| Attempt::Fatal(GatewayError::backend(format!("malformed ERP response: {e}"))))?;

        let items = body
            .get("items")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter_map(|v| v.as_object().cloned())
            .collect();
        let has_more = body.get("hasMore").and_then(Value::as_bool).unwrap_or(false);

        Ok(Page { items, has_more })
    }
}

struct Page {
    items: Vec<Row>,
    has_more: bool,
}

enum Attempt {
    Retryable { reason: RetryReason, detail: String },
    Fatal(GatewayError),
}

/// Convert the ERP's string-typed (or occasionally numeric) amount column
/// into a real number. Missing columns are a backend error, never a
/// silent zero — a query that omits the column it was supposed to select
/// is a builder bug, not a legitimate zero balance.
pub fn to_number(row: &Row, column: &str) -> GatewayResult<f64> {
    match row.get(column) {
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| GatewayError::backend(format!("column '{column}' is not numeric: '{s}'"))),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| GatewayError::backend(format!("column '{column}' is not a finite number"))),
        Some(Value::Null) | None => Err(GatewayError::backend(format!("column '{column}' is missing"))),
        Some(other) => Err(GatewayError::backend(format!(
            "column '{column}' has unexpected shape: {other}"
        ))),
    }
}
