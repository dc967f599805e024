//! Subsidiary hierarchy and dimension filter types.

use serde::{Deserialize, Serialize};

/// Suffix appended to a parent subsidiary's display name as a presentation
/// affordance for the add-in; never appears in generated SQL.
pub const CONSOLIDATED_SUFFIX: &str = " (Consolidated)";

/// A legal entity in the subsidiary tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subsidiary {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    pub is_inactive: bool,
    pub is_elimination: bool,
}

/// A simple `{id, name}` dimension value: department, location, class, or
/// accounting book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    pub id: i64,
    pub name: String,
}

/// Default accounting book id ("the primary book") per `spec.md` §3.
pub const DEFAULT_ACCOUNTING_BOOK: i64 = 1;

/// The optional filter dimensions every balance/budget/equity operation
/// accepts (`spec.md` §6).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterBundle {
    pub subsidiary: Option<i64>,
    pub department: Option<i64>,
    pub location: Option<i64>,
    pub class: Option<i64>,
    #[serde(default)]
    pub accounting_book: Option<i64>,
}

impl FilterBundle {
    /// The accounting book to filter on, defaulting to the primary book.
    pub fn accounting_book_or_default(&self) -> i64 {
        self.accounting_book.unwrap_or(DEFAULT_ACCOUNTING_BOOK)
    }

    /// Canonical cache-key material: every filter id as a string, in a
    /// fixed field order, so the derived cache key is stable across process
    /// runs (`spec.md` §4.5).
    pub fn canonical_parts(&self) -> Vec<(&'static str, String)> {
        vec![
            ("subsidiary", opt_to_string(self.subsidiary)),
            ("department", opt_to_string(self.department)),
            ("location", opt_to_string(self.location)),
            ("class", opt_to_string(self.class)),
            ("accounting_book", self.accounting_book_or_default().to_string()),
        ]
    }
}

fn opt_to_string(id: Option<i64>) -> String {
    id.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_bundle_uses_primary_book() {
        let bundle = FilterBundle::default();
        assert_eq!(bundle.accounting_book_or_default(), 1);
    }

    #[test]
    fn explicit_accounting_book_overrides_default() {
        let bundle = FilterBundle {
            accounting_book: Some(2),
            ..Default::default()
        };
        assert_eq!(bundle.accounting_book_or_default(), 2);
    }

    #[test]
    fn canonical_parts_are_stable_field_order() {
        let bundle = FilterBundle {
            subsidiary: Some(3),
            department: None,
            location: Some(7),
            class: None,
            accounting_book: None,
        };
        let parts = bundle.canonical_parts();
        assert_eq!(
            parts,
            vec![
                ("subsidiary", "3".to_string()),
                ("department", "".to_string()),
                ("location", "7".to_string()),
                ("class", "".to_string()),
                ("accounting_book", "1".to_string()),
            ]
        );
    }
}
