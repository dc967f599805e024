//! Common `WHERE`-clause fragments shared by every query builder
//! (`spec.md` §4.2 "Filters (enumerated semantics)").
//!
//! Table aliases are fixed across the whole builder: `tal` is the
//! transaction-accounting-line fact table, `tl` the transaction line (the
//! only surface segment filters may join against), `t` the transaction
//! header, `a` the account dimension, `ap` an accounting-period alias used
//! for bucketing.

use suitebridge_core::{AccountType, FilterBundle};

/// Both halves of the posting flag are always required.
pub fn posting_predicate() -> &'static str {
    "t.posting = 'T' AND tal.posting = 'T'"
}

pub fn accounting_book_predicate(filters: &FilterBundle) -> String {
    format!("tal.accountingbook = {}", filters.accounting_book_or_default())
}

/// Elimination accounts are excluded unless the caller asked to include
/// them (derived-equity roll-ups run with `include_eliminations = true`
/// turned off by default just like ordinary balance queries — the field
/// exists to document the one call site in `spec.md` §4.2 that keeps
/// elimination accounts for roll-ups).
pub fn elimination_predicate() -> &'static str {
    "COALESCE(a.eliminate, 'F') = 'F'"
}

/// `isyear = 'F' AND isquarter = 'F'` restricts an `accountingperiod`
/// alias to genuine monthly buckets.
pub fn monthly_only_predicate(period_alias: &str) -> String {
    format!("{period_alias}.isyear = 'F' AND {period_alias}.isquarter = 'F'")
}

/// `accttype IN (...)` / `NOT IN (...)` over the closed account-type tag
/// set. `negate` selects the complement (used to build the "everything
/// else" side of a P&L-vs-balance-sheet split).
pub fn account_type_predicate(types: &[AccountType], negate: bool) -> String {
    let tags = types
        .iter()
        .map(|t| format!("'{}'", t.erp_tag()))
        .collect::<Vec<_>>()
        .join(", ");
    let op = if negate { "NOT IN" } else { "IN" };
    format!("a.accttype {op} ({tags})")
}

/// Optional equality filters: `subsidiary` joins against the transaction
/// header; `class`, `department`, `location` must join against the
/// transaction line, never the accounting line (`spec.md` §4.2's
/// "well-known hazard").
pub fn segment_predicates(filters: &FilterBundle) -> Vec<String> {
    let mut predicates = Vec::new();
    if let Some(subsidiary) = filters.subsidiary {
        predicates.push(format!("t.subsidiary = {subsidiary}"));
    }
    if let Some(class) = filters.class {
        predicates.push(format!("tl.class = {class}"));
    }
    if let Some(department) = filters.department {
        predicates.push(format!("tl.department = {department}"));
    }
    if let Some(location) = filters.location {
        predicates.push(format!("tl.location = {location}"));
    }
    predicates
}

/// `LOWER(column) NOT LIKE LOWER('%substr%')` for each substring, ANDed
/// together — used by the derived-equity engine to exclude posted-equity
/// accounts whose name matches a retained-earnings/CTA-ish substring
/// (`spec.md` §4.4).
pub fn name_excludes_predicates(column: &str, substrings: &[String]) -> Vec<String> {
    substrings
        .iter()
        .map(|needle| format!("LOWER({column}) NOT LIKE LOWER('%{}%')", crate::literal::escape_string(needle)))
        .collect()
}

/// `LOWER(column) LIKE LOWER('%substr%')` for the single substring the
/// retained-earnings "manual journal entries" sub-query matches against
/// (`spec.md` §4.4).
pub fn name_includes_predicate(column: &str, needle: &str) -> String {
    format!("LOWER({column}) LIKE LOWER('%{}%')", crate::literal::escape_string(needle))
}

/// Join all of the above predicates into one `WHERE` clause body.
pub fn combine(predicates: impl IntoIterator<Item = String>) -> String {
    predicates.into_iter().collect::<Vec<_>>().join("\n  AND ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_filters_join_on_transaction_line_not_accounting_line() {
        let filters = FilterBundle {
            class: Some(5),
            department: Some(9),
            location: Some(2),
            subsidiary: Some(1),
            accounting_book: None,
        };
        for predicate in segment_predicates(&filters) {
            if predicate.contains("class") || predicate.contains("department") || predicate.contains("location") {
                assert!(predicate.starts_with("tl."), "{predicate} must join on tl");
            }
        }
    }

    #[test]
    fn subsidiary_filter_joins_on_transaction_header() {
        let filters = FilterBundle {
            subsidiary: Some(3),
            ..Default::default()
        };
        let predicates = segment_predicates(&filters);
        assert_eq!(predicates, vec!["t.subsidiary = 3".to_string()]);
    }

    #[test]
    fn unset_filters_produce_no_predicates() {
        assert!(segment_predicates(&FilterBundle::default()).is_empty());
    }

    #[test]
    fn account_type_predicate_negates_for_complement_set() {
        let expr = account_type_predicate(&[AccountType::Income], true);
        assert_eq!(expr, "a.accttype NOT IN ('Income')");
    }

    #[test]
    fn name_excludes_predicates_cover_every_configured_substring() {
        let predicates = name_excludes_predicates(
            "a.fullname",
            &["retained earnings".to_string(), "cta".to_string()],
        );
        assert_eq!(predicates.len(), 2);
        assert!(predicates[0].contains("NOT LIKE LOWER('%retained earnings%')"));
    }

    #[test]
    fn name_includes_predicate_matches_case_insensitively() {
        let predicate = name_includes_predicate("a.fullname", "Retained Earnings");
        assert_eq!(predicate, "LOWER(a.fullname) LIKE LOWER('%Retained Earnings%')");
    }
}
