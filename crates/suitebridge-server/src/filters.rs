//! Resolves the caller-supplied filter bundle — ids or display names,
//! interchangeably — against the bootstrap [`Lookups`] dictionaries.

use serde::Deserialize;
use suitebridge_coordinator::{DimensionKind, Lookups};
use suitebridge_core::{FilterBundle, GatewayResult};

/// The filter fields every endpoint accepts, before resolution. Present as
/// raw strings since a caller may send either a dimension id or its
/// display name (`spec.md` §6, §8 scenario 6).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawFilters {
    pub subsidiary: Option<String>,
    pub department: Option<String>,
    pub location: Option<String>,
    pub class: Option<String>,
    #[serde(rename = "accountingBook")]
    pub accounting_book: Option<String>,
}

impl RawFilters {
    pub fn resolve(&self, lookups: &Lookups) -> GatewayResult<FilterBundle> {
        Ok(FilterBundle {
            subsidiary: resolve_one(lookups, DimensionKind::Subsidiary, self.subsidiary.as_deref())?,
            department: resolve_one(lookups, DimensionKind::Department, self.department.as_deref())?,
            location: resolve_one(lookups, DimensionKind::Location, self.location.as_deref())?,
            class: resolve_one(lookups, DimensionKind::Class, self.class.as_deref())?,
            accounting_book: resolve_one(lookups, DimensionKind::AccountingBook, self.accounting_book.as_deref())?,
        })
    }
}

fn resolve_one(lookups: &Lookups, kind: DimensionKind, input: Option<&str>) -> GatewayResult<Option<i64>> {
    match input {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => lookups.resolve_dimension(kind, value).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use suitebridge_core::Subsidiary;

    fn lookups_with_one_subsidiary() -> Lookups {
        let mut lookups = Lookups::default();
        lookups.subsidiaries.insert(
            3,
            Subsidiary {
                id: 3,
                name: "Acme Corp.".to_string(),
                parent_id: None,
                is_inactive: false,
                is_elimination: false,
            },
        );
        lookups
    }

    #[test]
    fn absent_filters_resolve_to_none() {
        let lookups = Lookups::default();
        let resolved = RawFilters::default().resolve(&lookups).unwrap();
        assert_eq!(resolved, FilterBundle::default());
    }

    #[test]
    fn consolidated_suffix_resolves_to_parent_id() {
        let lookups = lookups_with_one_subsidiary();
        let raw = RawFilters {
            subsidiary: Some("Acme Corp. (Consolidated)".to_string()),
            ..Default::default()
        };
        assert_eq!(raw.resolve(&lookups).unwrap().subsidiary, Some(3));
    }

    #[test]
    fn bare_id_string_passes_through() {
        let lookups = Lookups::default();
        let raw = RawFilters {
            subsidiary: Some("42".to_string()),
            ..Default::default()
        };
        assert_eq!(raw.resolve(&lookups).unwrap().subsidiary, Some(42));
    }
}
