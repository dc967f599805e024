//! Sign-normalization expression generation (`spec.md` §3, §4.2).
//!
//! The outer projection multiplies the consolidated amount by `-1` for
//! every account type whose display sign is flipped, and again by `-1`
//! when the account's `special_tag` begins with `Matching`. Both
//! multipliers compose.

use suitebridge_core::AccountType;

/// ERP tags whose display sign is flipped, in the canonical order of
/// `spec.md` §3's type table.
const FLIP_TAGS: [&str; 4] = ["AcctPay", "CredCard", "OthCurrLiab", "LongTermLiab"];

fn flip_tags() -> Vec<&'static str> {
    let mut tags: Vec<&'static str> = FLIP_TAGS.to_vec();
    for t in [
        AccountType::DeferRevenue,
        AccountType::Equity,
        AccountType::RetainedEarnings,
        AccountType::Income,
        AccountType::OthIncome,
    ] {
        tags.push(t.erp_tag());
    }
    tags
}

/// A `CASE` expression computing the combined sign multiplier for a row,
/// given the column expressions for the account's type tag and special
/// tag. Multiplies the type-table flip by the matching-contra flip.
pub fn sign_multiplier_expr(account_type_column: &str, special_tag_column: &str) -> String {
    let tags = flip_tags()
        .into_iter()
        .map(|tag| format!("'{tag}'"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "(CASE WHEN {account_type_column} IN ({tags}) THEN -1 ELSE 1 END) \
         * (CASE WHEN {special_tag_column} LIKE 'Matching%' THEN -1 ELSE 1 END)"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_set_matches_type_table_liabilities_equity_income() {
        let tags = flip_tags();
        for expected in ["AcctPay", "CredCard", "OthCurrLiab", "LongTermLiab", "DeferRevenue", "Equity", "RetainedEarnings", "Income", "OthIncome"] {
            assert!(tags.contains(&expected), "missing {expected}");
        }
        for excluded in ["Bank", "FixedAsset", "COGS", "Expense", "OthExpense"] {
            assert!(!tags.contains(&excluded), "should not flip {excluded}");
        }
    }

    #[test]
    fn expression_references_both_columns() {
        let expr = sign_multiplier_expr("a.accttype", "a.custrecord_special_tag");
        assert!(expr.contains("a.accttype IN"));
        assert!(expr.contains("a.custrecord_special_tag LIKE 'Matching%'"));
    }
}
