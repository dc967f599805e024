//! Single-value cumulative queries shared by the derived-equity engine
//! (`spec.md` §4.4): a cumulative balance-sheet component (assets,
//! liabilities, posted equity, retained-earnings manual entries) and a
//! P&L activity range (net income, retained-earnings roll).
//!
//! These are composed from the same primitives as [`crate::pl`] and
//! [`crate::balance_sheet`] rather than duplicating join/predicate logic;
//! the equity engine calls them with the account-type sets and date
//! windows its five sub-queries each need.

use chrono::NaiveDate;
use suitebridge_core::{AccountType, FilterBundle};

use crate::consolidation::{consolidated_amount_expr, RatePeriod};
use crate::filters::{
    account_type_predicate, accounting_book_predicate, combine, elimination_predicate, monthly_only_predicate,
    name_excludes_predicates, name_includes_predicate, posting_predicate, segment_predicates,
};
use crate::sign::sign_multiplier_expr;

#[derive(Debug, Clone)]
pub struct ScalarQuery {
    pub sql: String,
}

/// A cumulative balance-sheet component as of a single target date:
/// assets, liabilities, or posted equity (optionally excluding accounts
/// whose name matches any of `exclude_name_substrings`).
#[allow(clippy::too_many_arguments)]
pub fn cumulative_balance_component_query(
    account_types: &[AccountType],
    as_of: NaiveDate,
    rate_period_id: i64,
    filters: &FilterBundle,
    active_subsidiary_count: usize,
    target_subsidiary: i64,
    exclude_name_substrings: &[String],
) -> ScalarQuery {
    let amount_expr = consolidated_amount_expr(
        "tal.amount",
        active_subsidiary_count,
        target_subsidiary,
        RatePeriod::ReportingPeriod(rate_period_id),
    );
    let sign_expr = sign_multiplier_expr("a.accttype", "a.custrecord_special_tag");

    let mut predicates = vec![
        posting_predicate().to_string(),
        accounting_book_predicate(filters),
        account_type_predicate(account_types, false),
        elimination_predicate().to_string(),
        monthly_only_predicate("ap"),
        format!("ap.startdate <= DATE '{}'", as_of.format("%Y-%m-%d")),
    ];
    predicates.extend(name_excludes_predicates("a.fullname", exclude_name_substrings));
    predicates.extend(segment_predicates(filters));

    let sql = format!(
        "SELECT SUM({amount_expr} * ({sign_expr})) AS amount\n\
         FROM transactionaccountingline tal\n\
         JOIN transactionline tl ON tal.transaction = tl.transaction AND tal.transactionline = tl.id\n\
         JOIN transaction t ON tl.transaction = t.id\n\
         JOIN account a ON tal.account = a.id\n\
         JOIN accountingperiod ap ON t.postingperiod = ap.id\n\
         WHERE {where_clause}",
        where_clause = combine(predicates),
    );

    ScalarQuery { sql }
}

/// Journal entries posted directly to `RetainedEarnings`-type accounts
/// whose full name matches `%retained earnings%`, cumulative through
/// `as_of` (`spec.md` §4.4 `RE_manual`).
pub fn retained_earnings_manual_entries_query(
    as_of: NaiveDate,
    rate_period_id: i64,
    filters: &FilterBundle,
    active_subsidiary_count: usize,
    target_subsidiary: i64,
    name_substring: &str,
) -> ScalarQuery {
    let amount_expr = consolidated_amount_expr(
        "tal.amount",
        active_subsidiary_count,
        target_subsidiary,
        RatePeriod::ReportingPeriod(rate_period_id),
    );
    let sign_expr = sign_multiplier_expr("a.accttype", "a.custrecord_special_tag");

    let mut predicates = vec![
        posting_predicate().to_string(),
        accounting_book_predicate(filters),
        account_type_predicate(&[AccountType::RetainedEarnings], false),
        elimination_predicate().to_string(),
        monthly_only_predicate("ap"),
        format!("ap.startdate <= DATE '{}'", as_of.format("%Y-%m-%d")),
        name_includes_predicate("a.fullname", name_substring),
    ];
    predicates.extend(segment_predicates(filters));

    let sql = format!(
        "SELECT SUM({amount_expr} * ({sign_expr})) AS amount\n\
         FROM transactionaccountingline tal\n\
         JOIN transactionline tl ON tal.transaction = tl.transaction AND tal.transactionline = tl.id\n\
         JOIN transaction t ON tl.transaction = t.id\n\
         JOIN account a ON tal.account = a.id\n\
         JOIN accountingperiod ap ON t.postingperiod = ap.id\n\
         WHERE {where_clause}",
        where_clause = combine(predicates),
    );

    ScalarQuery { sql }
}

/// Cumulative P&L activity over `[lower_bound, upper_bound]` (net income
/// and the retained-earnings roll both take this shape; `RE_roll` simply
/// passes `lower_bound = None`).
pub fn pl_activity_range_query(
    lower_bound: Option<NaiveDate>,
    upper_bound: NaiveDate,
    rate_period_id: i64,
    filters: &FilterBundle,
    active_subsidiary_count: usize,
    target_subsidiary: i64,
) -> ScalarQuery {
    use crate::pl::PL_TYPES;

    let amount_expr = consolidated_amount_expr(
        "tal.amount",
        active_subsidiary_count,
        target_subsidiary,
        RatePeriod::ReportingPeriod(rate_period_id),
    );
    let sign_expr = sign_multiplier_expr("a.accttype", "a.custrecord_special_tag");

    let mut predicates = vec![
        posting_predicate().to_string(),
        accounting_book_predicate(filters),
        account_type_predicate(&PL_TYPES, false),
        elimination_predicate().to_string(),
        monthly_only_predicate("ap"),
        format!("ap.startdate <= DATE '{}'", upper_bound.format("%Y-%m-%d")),
    ];
    if let Some(lower) = lower_bound {
        predicates.push(format!("ap.startdate >= DATE '{}'", lower.format("%Y-%m-%d")));
    }
    predicates.extend(segment_predicates(filters));

    let sql = format!(
        "SELECT SUM({amount_expr} * ({sign_expr})) AS amount\n\
         FROM transactionaccountingline tal\n\
         JOIN transactionline tl ON tal.transaction = tl.transaction AND tal.transactionline = tl.id\n\
         JOIN transaction t ON tl.transaction = t.id\n\
         JOIN account a ON tal.account = a.id\n\
         JOIN accountingperiod ap ON t.postingperiod = ap.id\n\
         WHERE {where_clause}",
        where_clause = combine(predicates),
    );

    ScalarQuery { sql }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance_sheet::BALANCE_SHEET_TYPES;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn posted_equity_query_excludes_configured_name_substrings() {
        let query = cumulative_balance_component_query(
            &[AccountType::Equity],
            date(2024, 12, 31),
            100,
            &FilterBundle::default(),
            1,
            1,
            &["retained earnings".to_string(), "cta".to_string()],
        );
        assert!(query.sql.contains("NOT LIKE LOWER('%retained earnings%')"));
        assert!(query.sql.contains("NOT LIKE LOWER('%cta%')"));
    }

    #[test]
    fn assets_and_liabilities_use_disjoint_type_sets() {
        let assets = [
            AccountType::Bank,
            AccountType::AcctRec,
            AccountType::OthCurrAsset,
            AccountType::FixedAsset,
            AccountType::OthAsset,
            AccountType::DeferExpense,
            AccountType::UnbilledRec,
        ];
        for t in assets {
            assert!(BALANCE_SHEET_TYPES.contains(&t));
        }
    }

    #[test]
    fn retained_earnings_manual_query_matches_name_substring_and_type() {
        let query = retained_earnings_manual_entries_query(
            date(2024, 12, 31),
            100,
            &FilterBundle::default(),
            1,
            1,
            "retained earnings",
        );
        assert!(query.sql.contains("a.accttype IN ('RetainedEarnings')"));
        assert!(query.sql.contains("LOWER(a.fullname) LIKE LOWER('%retained earnings%')"));
    }

    #[test]
    fn retained_earnings_manual_query_applies_segment_filters() {
        let filters = FilterBundle {
            class: Some(7),
            department: Some(8),
            ..FilterBundle::default()
        };
        let query = retained_earnings_manual_entries_query(date(2024, 12, 31), 100, &filters, 1, 1, "retained earnings");
        assert!(query.sql.contains("tl.class = 7"));
        assert!(query.sql.contains("tl.department = 8"));
    }

    #[test]
    fn net_income_query_bounds_both_ends_of_fiscal_year() {
        let query = pl_activity_range_query(
            Some(date(2025, 1, 1)),
            date(2025, 6, 30),
            100,
            &FilterBundle::default(),
            1,
            1,
        );
        assert!(query.sql.contains("ap.startdate >= DATE '2025-01-01'"));
        assert!(query.sql.contains("ap.startdate <= DATE '2025-06-30'"));
    }

    #[test]
    fn retained_earnings_roll_query_has_no_lower_bound() {
        let query = pl_activity_range_query(None, date(2024, 12, 31), 100, &FilterBundle::default(), 1, 1);
        assert!(!query.sql.contains("ap.startdate >="));
    }
}
