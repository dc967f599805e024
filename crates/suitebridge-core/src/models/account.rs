//! GL account identity and metadata.

use serde::{Deserialize, Serialize};

use super::account_type::AccountType;

/// Prefix that marks an account's `special_tag` as a "matching" FX
/// revaluation contra account (`spec.md` §3, §4.2).
pub const MATCHING_TAG_PREFIX: &str = "Matching";

/// Identifies a GL account.
///
/// `number` is the public identity; `internal_id` is used only in joins
/// against the ERP's internal tables and must never be shown to a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub number: String,
    pub internal_id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub parent_number: Option<String>,
    pub is_eliminate: bool,
    pub special_tag: Option<String>,
}

impl Account {
    /// An account is a "matching" contra account (used for FX revaluation
    /// elimination) when its special tag begins with `Matching`.
    pub fn is_matching_contra(&self) -> bool {
        self.special_tag
            .as_deref()
            .is_some_and(|tag| tag.starts_with(MATCHING_TAG_PREFIX))
    }

    /// The combined sign multiplier the SQL builder's outer projection must
    /// apply: the type's display flip composed with the matching-contra
    /// flip. Both multiply; see `spec.md` §4.2.
    pub fn sign_multiplier(&self) -> i32 {
        let mut sign = if self.account_type.display_flip() { -1 } else { 1 };
        if self.is_matching_contra() {
            sign *= -1;
        }
        sign
    }

    /// True when this account's full name matches any of the substrings the
    /// derived-equity engine excludes from "posted equity" when computing
    /// the CTA plug (`spec.md` §4.4). Matching is case-insensitive.
    pub fn name_matches_any(&self, needles: &[&str]) -> bool {
        let lower = self.name.to_lowercase();
        needles.iter().any(|needle| lower.contains(&needle.to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(name: &str, account_type: AccountType, special_tag: Option<&str>) -> Account {
        Account {
            number: "4000".to_string(),
            internal_id: 1,
            name: name.to_string(),
            account_type,
            parent_number: None,
            is_eliminate: false,
            special_tag: special_tag.map(str::to_string),
        }
    }

    #[test]
    fn matching_contra_inverts_sign_relative_to_non_matching() {
        let plain = account("FX Revaluation Gain", AccountType::OthIncome, None);
        let matching = account(
            "FX Revaluation Gain",
            AccountType::OthIncome,
            Some("MatchingFxGain"),
        );
        assert_eq!(plain.sign_multiplier(), -1);
        assert_eq!(matching.sign_multiplier(), 1);
        assert_eq!(plain.sign_multiplier(), -matching.sign_multiplier());
    }

    #[test]
    fn special_tag_must_begin_with_matching_prefix() {
        let not_matching = account("Other", AccountType::Income, Some("Foo"));
        assert!(!not_matching.is_matching_contra());
        let matching = account("Other", AccountType::Income, Some("MatchingFoo"));
        assert!(matching.is_matching_contra());
    }

    #[test]
    fn name_matches_any_is_case_insensitive() {
        let acct = account("Cumulative Translation Adjustment", AccountType::Equity, None);
        assert!(acct.name_matches_any(&["%translation%".trim_matches('%')]));
        assert!(acct.name_matches_any(&["CUMULATIVE TRANSLATION"]));
        assert!(!acct.name_matches_any(&["retained earnings"]));
    }
}
