//! Budget single-cell query (`spec.md` §6 `GET /budget`): the sum of a
//! single account's budget lines over `[from_period, to_period]`, the
//! budget-table counterpart of an actuals balance query.

use suitebridge_core::{FilterBundle, GatewayResult};

use crate::filters::{accounting_book_predicate, combine};
use crate::literal::checked_escaped;

/// `budgetmainline` carries its own subsidiary/class/department/location
/// columns directly (it has no transaction line to join against), so
/// these predicates are built against the `bml` alias rather than
/// [`crate::filters::segment_predicates`]'s `t`/`tl` aliases.
fn budget_segment_predicates(filters: &FilterBundle) -> Vec<String> {
    let mut predicates = Vec::new();
    if let Some(subsidiary) = filters.subsidiary {
        predicates.push(format!("bml.subsidiary = {subsidiary}"));
    }
    if let Some(class) = filters.class {
        predicates.push(format!("bml.class = {class}"));
    }
    if let Some(department) = filters.department {
        predicates.push(format!("bml.department = {department}"));
    }
    if let Some(location) = filters.location {
        predicates.push(format!("bml.location = {location}"));
    }
    predicates
}

/// Budget amounts post one line per category per period and do not carry
/// an account-type sign flip — the add-in displays them as stored.
pub fn budget_query(account_number: &str, from_period: &str, to_period: &str, filters: &FilterBundle) -> GatewayResult<String> {
    let account_literal = checked_escaped(account_number)?.render();
    let from_literal = checked_escaped(from_period)?.render();
    let to_literal = checked_escaped(to_period)?.render();

    let mut predicates = vec![
        accounting_book_predicate(filters),
        format!("a.acctnumber = {account_literal}"),
        format!(
            "ap.startdate >= (SELECT startdate FROM accountingperiod WHERE periodname = {from_literal})"
        ),
        format!(
            "ap.enddate <= (SELECT enddate FROM accountingperiod WHERE periodname = {to_literal})"
        ),
    ];
    predicates.extend(budget_segment_predicates(filters));

    Ok(format!(
        "SELECT SUM(bml.amount) AS amount\n\
         FROM budgetmainline bml\n\
         JOIN account a ON bml.account = a.id\n\
         JOIN accountingperiod ap ON bml.period = ap.id\n\
         WHERE {where_clause}",
        where_clause = combine(predicates),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_to_a_single_account_and_period_range() {
        let sql = budget_query("4220", "Jan 2025", "Jan 2025", &FilterBundle::default()).unwrap();
        assert!(sql.contains("a.acctnumber = '4220'"));
        assert!(sql.contains("periodname = 'Jan 2025'"));
    }

    #[test]
    fn segment_filters_propagate() {
        let filters = FilterBundle {
            location: Some(7),
            ..Default::default()
        };
        let sql = budget_query("4220", "Jan 2025", "Dec 2025", &filters).unwrap();
        assert!(sql.contains("bml.location = 7"));
    }

    #[test]
    fn nul_byte_in_account_number_is_rejected() {
        assert!(budget_query("bad\0", "Jan 2025", "Jan 2025", &FilterBundle::default()).is_err());
    }
}
