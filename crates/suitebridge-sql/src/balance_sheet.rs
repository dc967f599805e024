//! Balance-sheet multi-period pivot query (`spec.md` §4.2 "Balance-sheet
//! multi-period query").
//!
//! Unlike the P&L hot path, each pivot column needs its own consolidation
//! call: the rate-period id is the *reporting* month's period id, which
//! differs per column, so the builtin cannot be factored into a shared
//! inner subquery.

use suitebridge_core::normalize::canonical_period_year_month;
use suitebridge_core::{AccountType, FilterBundle, GatewayResult};

use crate::consolidation::{consolidated_amount_expr, RatePeriod};
use crate::filters::{
    account_type_predicate, accounting_book_predicate, combine, elimination_predicate, monthly_only_predicate,
    posting_predicate, segment_predicates,
};
use crate::pl::PivotQuery;
use crate::sign::sign_multiplier_expr;

/// Account types on the balance-sheet side of the P&L/balance-sheet split.
pub const BALANCE_SHEET_TYPES: [AccountType; 14] = [
    AccountType::Bank,
    AccountType::AcctRec,
    AccountType::OthCurrAsset,
    AccountType::FixedAsset,
    AccountType::OthAsset,
    AccountType::DeferExpense,
    AccountType::UnbilledRec,
    AccountType::AcctPay,
    AccountType::CredCard,
    AccountType::OthCurrLiab,
    AccountType::LongTermLiab,
    AccountType::DeferRevenue,
    AccountType::Equity,
    AccountType::RetainedEarnings,
];

fn period_alias(year: i32, month: u32) -> String {
    format!("p_{year:04}_{month:02}")
}

/// Needs an `(id, end_date)` lookup per requested period so the generated
/// SQL can reference each target month's ERP-assigned period id directly
/// rather than re-deriving it via another subquery. Supplied by the
/// lookup bootstrapper / period cache upstream.
pub struct TargetPeriod {
    pub name: String,
    pub year: i32,
    pub month: u32,
    pub period_id: i64,
}

/// Build the cumulative, multi-period balance-sheet pivot. `periods` need
/// not be sorted — the chronologically latest one determines the outer
/// `WHERE` clause's cumulative bound regardless of input order
/// (`spec.md` §8).
pub fn balance_sheet_multi_period_query(
    periods: &[TargetPeriod],
    filters: &FilterBundle,
    active_subsidiary_count: usize,
    target_subsidiary: i64,
) -> GatewayResult<PivotQuery> {
    let sign_expr = sign_multiplier_expr("a.accttype", "a.custrecord_special_tag");

    let latest = periods
        .iter()
        .map(|p| canonical_period_year_month(&p.name).map(|ym| (ym, p)))
        .collect::<GatewayResult<Vec<_>>>()?
        .into_iter()
        .max_by_key(|(ym, _)| *ym)
        .map(|(_, p)| p)
        .expect("caller guarantees at least one period");

    let latest_alias = period_alias(latest.year, latest.month);

    let mut cross_joins = Vec::with_capacity(periods.len());
    let mut alias_predicates = Vec::with_capacity(periods.len());
    let mut pivot_columns = Vec::with_capacity(periods.len());
    let mut period_columns = Vec::with_capacity(periods.len());

    for period in periods {
        let alias = period_alias(period.year, period.month);
        cross_joins.push(format!("CROSS JOIN accountingperiod {alias}"));
        alias_predicates.push(format!("{alias}.id = {}", period.period_id));
        alias_predicates.push(monthly_only_predicate(&alias));

        let amount_expr = consolidated_amount_expr(
            "tal.amount",
            active_subsidiary_count,
            target_subsidiary,
            RatePeriod::ReportingPeriod(period.period_id),
        );
        let column_alias = format!("bal_{:04}_{:02}", period.year, period.month);
        pivot_columns.push(format!(
            "SUM(CASE WHEN ap.startdate <= {alias}.enddate THEN {amount_expr} * ({sign_expr}) ELSE 0 END) AS {column_alias}"
        ));
        period_columns.push((column_alias, period.name.clone()));
    }

    let mut predicates = vec![
        posting_predicate().to_string(),
        accounting_book_predicate(filters),
        account_type_predicate(&BALANCE_SHEET_TYPES, false),
        elimination_predicate().to_string(),
        monthly_only_predicate("ap"),
        format!("ap.startdate <= {latest_alias}.enddate"),
    ];
    predicates.extend(alias_predicates);
    predicates.extend(segment_predicates(filters));

    let sql = format!(
        "SELECT a.acctnumber, a.accttype, {pivot_cols}\n\
         FROM transactionaccountingline tal\n\
         JOIN transactionline tl ON tal.transaction = tl.transaction AND tal.transactionline = tl.id\n\
         JOIN transaction t ON tl.transaction = t.id\n\
         JOIN account a ON tal.account = a.id\n\
         JOIN accountingperiod ap ON t.postingperiod = ap.id\n\
         {cross_joins}\n\
         WHERE {where_clause}\n\
         GROUP BY a.acctnumber, a.accttype\n\
         ORDER BY a.acctnumber",
        pivot_cols = pivot_columns.join(",\n       "),
        cross_joins = cross_joins.join("\n"),
        where_clause = combine(predicates),
    );

    Ok(PivotQuery { sql, period_columns })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period(name: &str, year: i32, month: u32, id: i64) -> TargetPeriod {
        TargetPeriod {
            name: name.to_string(),
            year,
            month,
            period_id: id,
        }
    }

    #[test]
    fn cumulative_bound_uses_chronologically_latest_month_regardless_of_input_order() {
        let periods = vec![
            period("Jan 2025", 2025, 1, 101),
            period("Dec 2024", 2024, 12, 100),
            period("Feb 2025", 2025, 2, 102),
        ];
        let query = balance_sheet_multi_period_query(&periods, &FilterBundle::default(), 1, 1).unwrap();
        assert!(query.sql.contains("ap.startdate <= p_2025_02.enddate"));
    }

    #[test]
    fn output_columns_are_keyed_by_exact_period_name() {
        let periods = vec![period("Feb 2025", 2025, 2, 102), period("Jan 2025", 2025, 1, 101)];
        let query = balance_sheet_multi_period_query(&periods, &FilterBundle::default(), 1, 1).unwrap();
        let names: Vec<&str> = query.period_columns.iter().map(|(_, n)| n.as_str()).collect();
        assert!(names.contains(&"Jan 2025"));
        assert!(names.contains(&"Feb 2025"));
    }

    #[test]
    fn each_column_consolidates_at_its_own_reporting_period_rate() {
        let periods = vec![period("Jan 2025", 2025, 1, 101), period("Feb 2025", 2025, 2, 102)];
        let query = balance_sheet_multi_period_query(&periods, &FilterBundle::default(), 3, 9).unwrap();
        assert!(query.sql.contains("CONSOLIDATE(tal.amount, 'LEDGER', 'DEFAULT', 'DEFAULT', 9, 101, 'DEFAULT')"));
        assert!(query.sql.contains("CONSOLIDATE(tal.amount, 'LEDGER', 'DEFAULT', 'DEFAULT', 9, 102, 'DEFAULT')"));
    }

    #[test]
    fn single_subsidiary_skips_consolidation_in_every_column() {
        let periods = vec![period("Jan 2025", 2025, 1, 101)];
        let query = balance_sheet_multi_period_query(&periods, &FilterBundle::default(), 1, 1).unwrap();
        assert!(!query.sql.contains("CONSOLIDATE("));
    }
}
