//! Pre-built test fixtures: a minimal [`Config`] pointed at a stub ERP
//! endpoint, and SuiteQL row builders for the shapes the coordinator and
//! equity engine expect back.

use serde_json::{json, Value};
use suitebridge_config::{Config, EquityConfig, ErpCredentials, OperationalConfig, RetryConfig, ServerConfig, TimeoutConfig};

/// A `Config` with fake credentials and short retry backoffs, suitable for
/// pointing an [`suitebridge_client::ErpClient`] at a [`crate::StubErpServer`]
/// via `ErpClient::with_query_url`.
pub fn minimal_config() -> Config {
    Config {
        erp: ErpCredentials {
            account_id: "TEST123".to_string(),
            consumer_key: "consumer-key".to_string(),
            consumer_secret: "consumer-secret".to_string(),
            token_id: "token-id".to_string(),
            token_secret: "token-secret".to_string(),
        },
        server: ServerConfig::default(),
        operational: OperationalConfig {
            cache_ttl_secs: 300,
            max_concurrent_erp_queries: 3,
            erp_row_cap: 100_000,
        },
        retry: RetryConfig {
            max_retries: 3,
            initial_backoff_ms: 5,
            backoff_multiplier: 2.0,
            jitter_fraction: 0.0,
        },
        timeouts: TimeoutConfig::default(),
        equity: EquityConfig::default(),
    }
}

/// A single P&L/balance-sheet row: `{acctnumber, <column>: amount}`.
pub fn account_amount_row(acctnumber: &str, column: &str, amount: f64) -> Value {
    json!({ "acctnumber": acctnumber, column: amount.to_string() })
}

/// A single-value scalar query result row: `{amount}`.
pub fn scalar_row(amount: f64) -> Value {
    json!({ "amount": amount.to_string() })
}

/// An account-type lookup row: `{acctnumber, accttype}`.
pub fn account_type_row(acctnumber: &str, accttype: &str) -> Value {
    json!({ "acctnumber": acctnumber, "accttype": accttype })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_round_trips_through_serde() {
        let config = minimal_config();
        let text = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&text).unwrap();
        assert_eq!(back.erp.account_id, "TEST123");
    }

    #[test]
    fn account_amount_row_stores_amount_as_string() {
        let row = account_amount_row("4000", "m01", 123.45);
        assert_eq!(row["m01"], "123.45");
    }

    #[test]
    fn scalar_row_has_a_single_amount_field() {
        let row = scalar_row(42.0);
        assert_eq!(row["amount"], "42");
    }
}
