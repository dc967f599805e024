//! The closed set of GL account type tags and their sign/classification rules.

use serde::{Deserialize, Serialize};

/// Broad class an [`AccountType`] belongs to, used to route a request to the
/// P&L query path or the balance-sheet query path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountClass {
    BalanceSheetAsset,
    BalanceSheetLiability,
    BalanceSheetEquity,
    ProfitAndLossIncome,
    ProfitAndLossExpense,
    /// `NonPosting` / `Stat` accounts: excluded from every aggregate.
    Excluded,
}

impl AccountClass {
    /// Balance-sheet accounts (asset, liability, or equity) roll up through
    /// the cumulative balance-sheet query path; everything else is P&L.
    pub fn is_balance_sheet(&self) -> bool {
        matches!(
            self,
            Self::BalanceSheetAsset | Self::BalanceSheetLiability | Self::BalanceSheetEquity
        )
    }

    pub fn is_profit_and_loss(&self) -> bool {
        matches!(self, Self::ProfitAndLossIncome | Self::ProfitAndLossExpense)
    }
}

/// The account type tags the ERP exposes on the account dimension table.
///
/// Tag spellings are case-sensitive and must match exactly; a mismatch
/// silently drops accounts from every aggregate built over them. `Cogs` and
/// `CostOfGoodsSold` are two distinct ERP spellings for the same class and
/// must both map to [`AccountClass::ProfitAndLossExpense`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountType {
    Bank,
    AcctRec,
    OthCurrAsset,
    FixedAsset,
    OthAsset,
    DeferExpense,
    UnbilledRec,
    AcctPay,
    CredCard,
    OthCurrLiab,
    LongTermLiab,
    DeferRevenue,
    Equity,
    RetainedEarnings,
    Income,
    OthIncome,
    Cogs,
    CostOfGoodsSold,
    Expense,
    OthExpense,
    NonPosting,
    Stat,
}

impl AccountType {
    /// Parse the ERP's exact (case-sensitive) tag spelling.
    pub fn from_erp_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "Bank" => Self::Bank,
            "AcctRec" => Self::AcctRec,
            "OthCurrAsset" => Self::OthCurrAsset,
            "FixedAsset" => Self::FixedAsset,
            "OthAsset" => Self::OthAsset,
            "DeferExpense" => Self::DeferExpense,
            "UnbilledRec" => Self::UnbilledRec,
            "AcctPay" => Self::AcctPay,
            "CredCard" => Self::CredCard,
            "OthCurrLiab" => Self::OthCurrLiab,
            "LongTermLiab" => Self::LongTermLiab,
            "DeferRevenue" => Self::DeferRevenue,
            "Equity" => Self::Equity,
            "RetainedEarnings" => Self::RetainedEarnings,
            "Income" => Self::Income,
            "OthIncome" => Self::OthIncome,
            "COGS" => Self::Cogs,
            "Cost of Goods Sold" => Self::CostOfGoodsSold,
            "Expense" => Self::Expense,
            "OthExpense" => Self::OthExpense,
            "NonPosting" => Self::NonPosting,
            "Stat" => Self::Stat,
            _ => return None,
        })
    }

    /// The ERP tag spelling this variant was parsed from, for round-tripping
    /// into generated SQL (e.g. `account_type IN ('COGS', 'Expense', ...)`).
    pub fn erp_tag(&self) -> &'static str {
        match self {
            Self::Bank => "Bank",
            Self::AcctRec => "AcctRec",
            Self::OthCurrAsset => "OthCurrAsset",
            Self::FixedAsset => "FixedAsset",
            Self::OthAsset => "OthAsset",
            Self::DeferExpense => "DeferExpense",
            Self::UnbilledRec => "UnbilledRec",
            Self::AcctPay => "AcctPay",
            Self::CredCard => "CredCard",
            Self::OthCurrLiab => "OthCurrLiab",
            Self::LongTermLiab => "LongTermLiab",
            Self::DeferRevenue => "DeferRevenue",
            Self::Equity => "Equity",
            Self::RetainedEarnings => "RetainedEarnings",
            Self::Income => "Income",
            Self::OthIncome => "OthIncome",
            Self::Cogs => "COGS",
            Self::CostOfGoodsSold => "Cost of Goods Sold",
            Self::Expense => "Expense",
            Self::OthExpense => "OthExpense",
            Self::NonPosting => "NonPosting",
            Self::Stat => "Stat",
        }
    }

    pub fn class(&self) -> AccountClass {
        match self {
            Self::Bank
            | Self::AcctRec
            | Self::OthCurrAsset
            | Self::FixedAsset
            | Self::OthAsset
            | Self::DeferExpense
            | Self::UnbilledRec => AccountClass::BalanceSheetAsset,

            Self::AcctPay | Self::CredCard | Self::OthCurrLiab | Self::LongTermLiab | Self::DeferRevenue => {
                AccountClass::BalanceSheetLiability
            }

            Self::Equity | Self::RetainedEarnings => AccountClass::BalanceSheetEquity,

            Self::Income | Self::OthIncome => AccountClass::ProfitAndLossIncome,

            Self::Cogs | Self::CostOfGoodsSold | Self::Expense | Self::OthExpense => {
                AccountClass::ProfitAndLossExpense
            }

            Self::NonPosting | Self::Stat => AccountClass::Excluded,
        }
    }

    /// Whether the outer projection must multiply the raw consolidated
    /// amount by `-1` to present the type's natural credit/debit balance in
    /// the user's conventional (always-positive-for-a-normal-balance)
    /// reading. See `spec.md` §3's "Display flip" column; `Income` and
    /// `OthIncome` are the only P&L types that flip.
    pub fn display_flip(&self) -> bool {
        matches!(
            self.class(),
            AccountClass::BalanceSheetLiability
                | AccountClass::BalanceSheetEquity
                | AccountClass::ProfitAndLossIncome
        )
    }
}
