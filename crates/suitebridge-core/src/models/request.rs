//! The batch coordinator's normalized internal request and result shapes.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::subsidiary::FilterBundle;

/// How the batch coordinator should fan a [`QueryRequest`] out to the ERP
/// (`spec.md` §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryClassification {
    ProfitAndLossOnly,
    BalanceSheetOnly,
    Mixed,
    FullYearProfitAndLoss,
}

/// A normalized, internal description of what to fetch from the ERP.
///
/// Every account number has already passed through the account-number
/// normalizer and every period name through the period normalizer before a
/// `QueryRequest` is constructed; a non-canonical value reaching here is a
/// bug upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub accounts: BTreeSet<String>,
    pub periods: BTreeSet<String>,
    pub filters: FilterBundle,
    pub classification: QueryClassification,
}

/// `{account_number -> {period_name -> amount}}`.
///
/// Every cell present in a `BalanceResult` returned to a caller was
/// explicitly requested; the coordinator's zero-fill step guarantees
/// `dom(result) == accounts × periods` so a missing key always means "not
/// requested", never "the ERP returned nothing" (`spec.md` §3, §8).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceResult(pub BTreeMap<String, BTreeMap<String, f64>>);

impl BalanceResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, account: &str, period: &str) -> Option<f64> {
        self.0.get(account).and_then(|periods| periods.get(period)).copied()
    }

    pub fn set(&mut self, account: &str, period: &str, amount: f64) {
        self.0
            .entry(account.to_string())
            .or_default()
            .insert(period.to_string(), amount);
    }

    /// Fill an explicit `0.0` for every `(account, period)` pair not yet
    /// present, so the result's domain is exactly `accounts × periods`
    /// (`spec.md` §4.3 "Zero-fill").
    pub fn zero_fill(&mut self, accounts: &BTreeSet<String>, periods: &BTreeSet<String>) {
        for account in accounts {
            let entry = self.0.entry(account.clone()).or_default();
            for period in periods {
                entry.entry(period.clone()).or_insert(0.0);
            }
        }
    }

    /// True iff every requested cell is present (the invariant in
    /// `spec.md` §8: `dom(result) == accounts × periods`).
    pub fn covers(&self, accounts: &BTreeSet<String>, periods: &BTreeSet<String>) -> bool {
        accounts.iter().all(|account| {
            self.0
                .get(account)
                .is_some_and(|row| periods.iter().all(|period| row.contains_key(period)))
        })
    }

    pub fn merge(&mut self, other: BalanceResult) {
        for (account, periods) in other.0 {
            let entry = self.0.entry(account).or_default();
            for (period, amount) in periods {
                entry.insert(period, amount);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn zero_fill_covers_full_cartesian_product() {
        let accounts = set(&["4000", "5000"]);
        let periods = set(&["Jan 2025", "Feb 2025"]);
        let mut result = BalanceResult::new();
        result.set("4000", "Jan 2025", 123.45);

        result.zero_fill(&accounts, &periods);

        assert!(result.covers(&accounts, &periods));
        assert_eq!(result.get("4000", "Jan 2025"), Some(123.45));
        assert_eq!(result.get("4000", "Feb 2025"), Some(0.0));
        assert_eq!(result.get("5000", "Jan 2025"), Some(0.0));
        assert_eq!(result.get("5000", "Feb 2025"), Some(0.0));
    }

    #[test]
    fn empty_request_covers_trivially_and_has_no_erp_queries() {
        let result = BalanceResult::new();
        assert!(result.covers(&BTreeSet::new(), &BTreeSet::new()));
        assert!(result.0.is_empty());
    }

    #[test]
    fn merge_combines_disjoint_accounts_without_loss() {
        let mut a = BalanceResult::new();
        a.set("4000", "Jan 2025", 10.0);
        let mut b = BalanceResult::new();
        b.set("5000", "Jan 2025", 20.0);

        a.merge(b);

        assert_eq!(a.get("4000", "Jan 2025"), Some(10.0));
        assert_eq!(a.get("5000", "Jan 2025"), Some(20.0));
    }

    #[test]
    fn not_requested_cell_is_absent_not_zero() {
        let accounts = set(&["4000"]);
        let periods = set(&["Jan 2025"]);
        let mut result = BalanceResult::new();
        result.zero_fill(&accounts, &periods);

        assert_eq!(result.get("4000", "Jan 2025"), Some(0.0));
        assert_eq!(result.get("4000", "Feb 2025"), None);
    }
}
