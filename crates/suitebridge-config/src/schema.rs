//! Configuration schema for the ERP query gateway.

use std::fmt;

use serde::{Deserialize, Serialize};

/// OAuth1 credential pair and ERP account id. Never logged and never
/// debug-printed in full — [`fmt::Debug`] redacts every secret field.
#[derive(Clone, Serialize, Deserialize)]
pub struct ErpCredentials {
    pub account_id: String,
    pub consumer_key: String,
    pub consumer_secret: String,
    pub token_id: String,
    pub token_secret: String,
}

impl fmt::Debug for ErpCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErpCredentials")
            .field("account_id", &self.account_id)
            .field("consumer_key", &"<redacted>")
            .field("consumer_secret", &"<redacted>")
            .field("token_id", &"<redacted>")
            .field("token_secret", &"<redacted>")
            .finish()
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}

/// HTTP surface bind settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_cache_ttl_secs() -> u64 {
    300
}
fn default_max_concurrent_erp_queries() -> usize {
    3
}
fn default_erp_row_cap() -> usize {
    100_000
}

/// Cache and fan-out concurrency knobs (`spec.md` §4.5, §5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationalConfig {
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_max_concurrent_erp_queries")]
    pub max_concurrent_erp_queries: usize,
    #[serde(default = "default_erp_row_cap")]
    pub erp_row_cap: usize,
}

impl Default for OperationalConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl_secs(),
            max_concurrent_erp_queries: default_max_concurrent_erp_queries(),
            erp_row_cap: default_erp_row_cap(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}
fn default_initial_backoff_ms() -> u64 {
    2_000
}
fn default_backoff_multiplier() -> f64 {
    2.0
}
fn default_jitter_fraction() -> f64 {
    0.2
}

/// ERP client retry/backoff policy (`spec.md` §4.1, §9: fixed at up to 3
/// retries, initial 2s, ×2 multiplier, ±20% jitter).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    #[serde(default = "default_jitter_fraction")]
    pub jitter_fraction: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter_fraction: default_jitter_fraction(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    60
}
fn default_balance_sheet_timeout_secs() -> u64 {
    120
}
fn default_equity_timeout_secs() -> u64 {
    300
}
fn default_sub_query_timeout_secs() -> u64 {
    120
}

/// Per-operation timeout budgets (`spec.md` §4.1, §4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_timeout_secs")]
    pub default_secs: u64,
    #[serde(default = "default_balance_sheet_timeout_secs")]
    pub balance_sheet_secs: u64,
    #[serde(default = "default_equity_timeout_secs")]
    pub equity_secs: u64,
    #[serde(default = "default_sub_query_timeout_secs")]
    pub sub_query_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            default_secs: default_timeout_secs(),
            balance_sheet_secs: default_balance_sheet_timeout_secs(),
            equity_secs: default_equity_timeout_secs(),
            sub_query_secs: default_sub_query_timeout_secs(),
        }
    }
}

fn default_retained_earnings_substrings() -> Vec<String> {
    vec!["retained earnings".to_string()]
}

fn default_cta_exclude_substrings() -> Vec<String> {
    vec![
        "retained earnings".to_string(),
        "translation".to_string(),
        "cta".to_string(),
        "net income".to_string(),
        "cumulative translation".to_string(),
    ]
}

/// Name-substring configuration points the derived-equity engine uses to
/// classify "manual" retained-earnings entries and to exclude posted
/// equity from the CTA plug (`spec.md` §4.4, §9 — flagged there as
/// fragile across tenants, hence configurable rather than hardcoded).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquityConfig {
    #[serde(default = "default_retained_earnings_substrings")]
    pub retained_earnings_name_substrings: Vec<String>,
    #[serde(default = "default_cta_exclude_substrings")]
    pub cta_exclude_name_substrings: Vec<String>,
}

impl Default for EquityConfig {
    fn default() -> Self {
        Self {
            retained_earnings_name_substrings: default_retained_earnings_substrings(),
            cta_exclude_name_substrings: default_cta_exclude_substrings(),
        }
    }
}

/// Root configuration for the gateway process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub erp: ErpCredentials,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub operational: OperationalConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub equity: EquityConfig,
}
