//! Period-id cache (`spec.md` §3 `Period`, §4.2).
//!
//! The balance-sheet pivot and every derived-equity scalar sub-query need
//! the ERP's own `accountingperiod.id`, not just the canonical `Mon YYYY`
//! name. Resolved lazily, one query per miss set, same pattern as
//! [`crate::accounts::AccountCache`].

use std::collections::HashMap;
use std::time::Duration;

use chrono::Datelike;
use tokio::sync::RwLock;

use suitebridge_client::ErpClient;
use suitebridge_core::{normalize::canonical_period_year_month, GatewayError, GatewayResult, Period};
use suitebridge_sql::period_resolution_query;

const RESOLUTION_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Default)]
pub struct PeriodCache {
    periods: RwLock<HashMap<String, Period>>,
}

impl PeriodCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return every requested canonical period name resolved to its
    /// [`Period`], fetching any the cache doesn't already hold in one
    /// round trip.
    pub async fn resolve(&self, client: &ErpClient, names: &[String]) -> GatewayResult<Vec<Period>> {
        let missing: Vec<String> = {
            let periods = self.periods.read().await;
            names.iter().filter(|n| !periods.contains_key(n.as_str())).cloned().collect()
        };

        if !missing.is_empty() {
            let sql = period_resolution_query(&missing)?;
            let rows = client.execute_query(&sql, RESOLUTION_TIMEOUT).await?;

            let mut periods = self.periods.write().await;
            for row in &rows {
                let name = row.get("periodname").and_then(|v| v.as_str());
                let id = row.get("id").and_then(|v| v.as_i64());
                let start = row
                    .get("startdate")
                    .and_then(|v| v.as_str())
                    .and_then(|s| chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());
                let end = row
                    .get("enddate")
                    .and_then(|v| v.as_str())
                    .and_then(|s| chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());
                let (Some(name), Some(id), Some(start), Some(end)) = (name, id, start, end) else {
                    continue;
                };

                periods.insert(
                    name.to_string(),
                    Period {
                        name: name.to_string(),
                        id,
                        start_date: start,
                        end_date: end,
                        fiscal_year: start.year(),
                        is_year: false,
                        is_quarter: false,
                    },
                );
            }
        }

        let periods = self.periods.read().await;
        names
            .iter()
            .map(|n| {
                periods
                    .get(n.as_str())
                    .cloned()
                    .ok_or_else(|| GatewayError::not_found(format!("unknown period '{n}'")))
            })
            .collect()
    }

    /// Resolve a single canonical period name, validating it parses as
    /// `Mon YYYY` before touching the ERP at all.
    pub async fn resolve_one(&self, client: &ErpClient, name: &str) -> GatewayResult<Period> {
        canonical_period_year_month(name)?;
        self.resolve(client, std::slice::from_ref(&name.to_string()))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::not_found(format!("unknown period '{name}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cache_starts_empty() {
        let cache = PeriodCache::new();
        assert!(cache.periods.try_read().unwrap().is_empty());
    }
}
