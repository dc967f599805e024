//! Canonical cache-key derivation (`spec.md` §4.5).
//!
//! A key is the operation tag followed by the normalized parameters —
//! sorted accounts, sorted periods, every filter id as a string — joined
//! so the shape is stable across process runs; tests assert exact key
//! strings.

use suitebridge_core::FilterBundle;

/// The closed set of cacheable operation tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Balance,
    Budget,
    Title,
    Type,
    Parent,
    RetainedEarnings,
    NetIncome,
    Cta,
    FullYearRefresh,
    BsPeriods,
}

impl Operation {
    fn tag(&self) -> &'static str {
        match self {
            Self::Balance => "balance",
            Self::Budget => "budget",
            Self::Title => "title",
            Self::Type => "type",
            Self::Parent => "parent",
            Self::RetainedEarnings => "retained_earnings",
            Self::NetIncome => "net_income",
            Self::Cta => "cta",
            Self::FullYearRefresh => "full_year_refresh",
            Self::BsPeriods => "bs_periods",
        }
    }
}

/// Build a canonical cache key for `operation` over `accounts`/`periods`
/// (both sorted before joining) and `filters`.
pub fn cache_key(operation: Operation, accounts: &[String], periods: &[String], filters: &FilterBundle) -> String {
    let mut accounts = accounts.to_vec();
    accounts.sort();
    let mut periods = periods.to_vec();
    periods.sort();

    let filter_parts = filters
        .canonical_parts()
        .into_iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join(",");

    format!(
        "{}|accounts={}|periods={}|{}",
        operation.tag(),
        accounts.join(","),
        periods.join(","),
        filter_parts
    )
}
