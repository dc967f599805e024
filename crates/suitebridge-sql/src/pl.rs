//! P&L query builders (`spec.md` §4.2 "P&L full-year query" and the
//! targeted multi-month pivot used outside the hot path).

use suitebridge_core::{AccountType, FilterBundle};

use crate::consolidation::{consolidated_amount_expr, RatePeriod};
use crate::filters::{
    account_type_predicate, accounting_book_predicate, combine, elimination_predicate, monthly_only_predicate,
    posting_predicate, segment_predicates,
};
use crate::sign::sign_multiplier_expr;

/// The account-type tags that belong to the income-statement side of the
/// P&L/balance-sheet split (`spec.md` §3).
pub const PL_TYPES: [AccountType; 6] = [
    AccountType::Income,
    AccountType::OthIncome,
    AccountType::Cogs,
    AccountType::CostOfGoodsSold,
    AccountType::Expense,
    AccountType::OthExpense,
];

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// The SQL text for a multi-period query plus the mapping from each
/// generated pivot column alias back to the period name it represents, so
/// the caller never has to reverse-engineer column naming conventions.
#[derive(Debug, Clone)]
pub struct PivotQuery {
    pub sql: String,
    /// `(column_alias, period_name)` in the order the columns appear.
    pub period_columns: Vec<(String, String)>,
}

/// Build the full-year P&L pivot: one row per account, twelve monthly
/// columns, for a single fiscal year. This is the hot path — the
/// consolidation builtin is evaluated once per raw line inside an inner
/// subquery, not once per output group (`spec.md` §4.2).
pub fn full_year_pl_query(
    fiscal_year: i32,
    filters: &FilterBundle,
    active_subsidiary_count: usize,
    target_subsidiary: i64,
) -> PivotQuery {
    let amount_expr = consolidated_amount_expr(
        "tal.amount",
        active_subsidiary_count,
        target_subsidiary,
        RatePeriod::TransactionPosting,
    );
    let sign_expr = sign_multiplier_expr("a.accttype", "a.custrecord_special_tag");

    let mut inner_predicates = vec![
        posting_predicate().to_string(),
        accounting_book_predicate(filters),
        account_type_predicate(&PL_TYPES, false),
        elimination_predicate().to_string(),
        monthly_only_predicate("ap"),
        format!("TO_CHAR(ap.startdate, 'YYYY') = '{fiscal_year}'"),
    ];
    inner_predicates.extend(segment_predicates(filters));

    let mut period_columns = Vec::with_capacity(12);
    let mut pivot_columns = Vec::with_capacity(12);
    for (index, abbrev) in MONTH_ABBREVIATIONS.iter().enumerate() {
        let month_number = index + 1;
        let column_alias = format!("m{month_number:02}");
        let period_name = format!("{} {fiscal_year}", month_name(index));
        pivot_columns.push(format!(
            "SUM(CASE WHEN line.month_number = {month_number} THEN line.signed_amount ELSE 0 END) AS {column_alias}"
        ));
        period_columns.push((column_alias, period_name));
        let _ = abbrev;
    }

    let sql = format!(
        "SELECT line.acctnumber, line.accttype, {pivot_cols}\n\
         FROM (\n\
         \x20 SELECT a.acctnumber AS acctnumber, a.accttype AS accttype,\n\
         \x20        TO_NUMBER(TO_CHAR(ap.startdate, 'MM')) AS month_number,\n\
         \x20        {amount_expr} * ({sign_expr}) AS signed_amount\n\
         \x20 FROM transactionaccountingline tal\n\
         \x20 JOIN transactionline tl ON tal.transaction = tl.transaction AND tal.transactionline = tl.id\n\
         \x20 JOIN transaction t ON tl.transaction = t.id\n\
         \x20 JOIN account a ON tal.account = a.id\n\
         \x20 JOIN accountingperiod ap ON t.postingperiod = ap.id\n\
         \x20 WHERE {inner_where}\n\
         ) line\n\
         GROUP BY line.acctnumber, line.accttype\n\
         ORDER BY line.acctnumber",
        pivot_cols = pivot_columns.join(",\n       "),
        inner_where = combine(inner_predicates),
    );

    PivotQuery { sql, period_columns }
}

/// Build a targeted multi-month P&L pivot over an explicit set of
/// canonical `Mon YYYY` periods, all within a single fiscal year (callers
/// split by year before invoking this; `spec.md` §4.3).
pub fn targeted_pl_pivot_query(
    periods: &[(i32, u32, String)],
    filters: &FilterBundle,
    active_subsidiary_count: usize,
    target_subsidiary: i64,
) -> PivotQuery {
    let amount_expr = consolidated_amount_expr(
        "tal.amount",
        active_subsidiary_count,
        target_subsidiary,
        RatePeriod::TransactionPosting,
    );
    let sign_expr = sign_multiplier_expr("a.accttype", "a.custrecord_special_tag");

    let period_name_list = periods
        .iter()
        .map(|(_, _, name)| format!("'{name}'", name = name.replace('\'', "''")))
        .collect::<Vec<_>>()
        .join(", ");

    let mut inner_predicates = vec![
        posting_predicate().to_string(),
        accounting_book_predicate(filters),
        account_type_predicate(&PL_TYPES, false),
        elimination_predicate().to_string(),
        monthly_only_predicate("ap"),
        format!("ap.periodname IN ({period_name_list})"),
    ];
    inner_predicates.extend(segment_predicates(filters));

    let mut period_columns = Vec::with_capacity(periods.len());
    let mut pivot_columns = Vec::with_capacity(periods.len());
    for (year, month, name) in periods {
        let column_alias = format!("pl_{year:04}_{month:02}");
        pivot_columns.push(format!(
            "SUM(CASE WHEN line.periodname = '{escaped}' THEN line.signed_amount ELSE 0 END) AS {column_alias}",
            escaped = name.replace('\'', "''"),
        ));
        period_columns.push((column_alias, name.clone()));
    }

    let sql = format!(
        "SELECT line.acctnumber, line.accttype, {pivot_cols}\n\
         FROM (\n\
         \x20 SELECT a.acctnumber AS acctnumber, a.accttype AS accttype, ap.periodname AS periodname,\n\
         \x20        {amount_expr} * ({sign_expr}) AS signed_amount\n\
         \x20 FROM transactionaccountingline tal\n\
         \x20 JOIN transactionline tl ON tal.transaction = tl.transaction AND tal.transactionline = tl.id\n\
         \x20 JOIN transaction t ON tl.transaction = t.id\n\
         \x20 JOIN account a ON tal.account = a.id\n\
         \x20 JOIN accountingperiod ap ON t.postingperiod = ap.id\n\
         \x20 WHERE {inner_where}\n\
         ) line\n\
         GROUP BY line.acctnumber, line.accttype\n\
         ORDER BY line.acctnumber",
        pivot_cols = pivot_columns.join(",\n       "),
        inner_where = combine(inner_predicates),
    );

    PivotQuery { sql, period_columns }
}

fn month_name(zero_based_index: usize) -> &'static str {
    const NAMES: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    NAMES[zero_based_index]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_year_query_filters_by_year_and_has_twelve_columns() {
        let query = full_year_pl_query(2025, &FilterBundle::default(), 1, 1);
        assert_eq!(query.period_columns.len(), 12);
        assert!(query.sql.contains("TO_CHAR(ap.startdate, 'YYYY') = '2025'"));
        assert_eq!(query.period_columns[0], ("m01".to_string(), "Jan 2025".to_string()));
        assert_eq!(query.period_columns[11], ("m12".to_string(), "Dec 2025".to_string()));
    }

    #[test]
    fn full_year_query_consolidates_inside_the_inner_subquery() {
        let query = full_year_pl_query(2025, &FilterBundle::default(), 3, 1);
        let inner_start = query.sql.find("FROM (").unwrap();
        let consolidate_pos = query.sql.find("CONSOLIDATE(").unwrap();
        assert!(consolidate_pos > inner_start, "CONSOLIDATE must appear inside the inner subquery");
    }

    #[test]
    fn full_year_query_uses_transaction_posting_period_for_rate() {
        let query = full_year_pl_query(2025, &FilterBundle::default(), 2, 7);
        assert!(query.sql.contains("t.postingperiod"));
    }

    #[test]
    fn targeted_query_keys_columns_by_exact_period_name() {
        let periods = vec![
            (2025, 1, "Jan 2025".to_string()),
            (2025, 2, "Feb 2025".to_string()),
        ];
        let query = targeted_pl_pivot_query(&periods, &FilterBundle::default(), 1, 1);
        assert_eq!(query.period_columns[0].1, "Jan 2025");
        assert!(query.sql.contains("ap.periodname IN ('Jan 2025', 'Feb 2025')"));
    }

    #[test]
    fn segment_filters_propagate_into_inner_where() {
        let filters = FilterBundle {
            class: Some(5),
            ..Default::default()
        };
        let query = full_year_pl_query(2025, &filters, 1, 1);
        assert!(query.sql.contains("tl.class = 5"));
    }
}
