//! Account type/metadata cache (`spec.md` §3 `Account`, §4.3).
//!
//! Populated lazily: a batch request first asks the cache for every
//! account number it needs, collects the misses, and resolves the whole
//! miss set with a single query before proceeding. Never one query per
//! account.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::RwLock;

use suitebridge_client::ErpClient;
use suitebridge_core::{Account, AccountType, GatewayResult};
use suitebridge_sql::account_type_resolution_query;

const RESOLUTION_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Default)]
pub struct AccountCache {
    accounts: RwLock<HashMap<String, Account>>,
}

impl AccountCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return whichever requested accounts the ERP actually knows about,
    /// resolving any the cache doesn't already hold with one round trip.
    ///
    /// An account number the ERP never returns is simply absent from the
    /// result rather than failing the whole call — callers that need the
    /// zero-fill/unknown-cell behavior (`spec.md` §4.3, §7) rely on this;
    /// callers that need a hard "does this one account exist" answer (a
    /// single name/type/parent lookup) check for absence themselves.
    pub async fn resolve(&self, client: &ErpClient, numbers: &[String]) -> GatewayResult<Vec<Account>> {
        let missing: Vec<String> = {
            let accounts = self.accounts.read().await;
            numbers.iter().filter(|n| !accounts.contains_key(n.as_str())).cloned().collect()
        };

        if !missing.is_empty() {
            let sql = account_type_resolution_query(&missing)?;
            let rows = client.execute_query(&sql, RESOLUTION_TIMEOUT).await?;

            let mut accounts = self.accounts.write().await;
            for row in &rows {
                let number = row.get("acctnumber").and_then(|v| v.as_str());
                let tag = row.get("accttype").and_then(|v| v.as_str());
                let (Some(number), Some(tag)) = (number, tag) else {
                    continue;
                };
                let Some(account_type) = AccountType::from_erp_tag(tag) else {
                    continue;
                };
                let internal_id = row.get("internal_id").and_then(|v| v.as_i64()).unwrap_or_default();
                let name = row.get("name").and_then(|v| v.as_str()).unwrap_or_default().to_string();
                let parent_number = row.get("parentnumber").and_then(|v| v.as_str()).map(str::to_string);
                let is_eliminate = row.get("eliminate").and_then(|v| v.as_str()) == Some("T");
                let special_tag = row
                    .get("custrecord_special_tag")
                    .and_then(|v| v.as_str())
                    .map(str::to_string);

                accounts.insert(
                    number.to_string(),
                    Account {
                        number: number.to_string(),
                        internal_id,
                        name,
                        account_type,
                        parent_number,
                        is_eliminate,
                        special_tag,
                    },
                );
            }
        }

        let accounts = self.accounts.read().await;
        Ok(numbers.iter().filter_map(|n| accounts.get(n.as_str()).cloned()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use suitebridge_test_utils::fixtures::{account_type_row, minimal_config};
    use suitebridge_test_utils::{StubErpServer, StubResponse, TestServerConfig};

    #[test]
    fn empty_request_returns_empty_result() {
        let cache = AccountCache::new();
        assert!(cache.accounts.try_read().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unresolved_account_is_dropped_not_an_error() {
        let server = StubErpServer::spawn(
            TestServerConfig::default(),
            vec![StubResponse::page(vec![account_type_row("4220", "Income")])],
        )
        .await;
        let config = minimal_config();
        let client = ErpClient::with_query_url(&config, server.query_url());
        let cache = AccountCache::new();

        let resolved = cache
            .resolve(&client, &["4220".to_string(), "9999".to_string()])
            .await
            .expect("resolve must not error on an unknown account");

        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].number, "4220");
        assert_eq!(server.request_count(), 1, "one resolution query regardless of how many misses");
    }
}
