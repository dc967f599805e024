//! Consolidation-builtin wrapping (`spec.md` §4.2).
//!
//! Whether a raw amount is wrapped in the ERP's consolidation builtin is
//! decided once, at query-build time, from the active-subsidiary count the
//! lookup bootstrapper already cached — never by a runtime `CASE` in the
//! generated SQL.

/// Which posting-period id the consolidation builtin's rate-period
/// argument should reference.
#[derive(Debug, Clone, Copy)]
pub enum RatePeriod {
    /// P&L: the transaction's own posting period (historical rate).
    TransactionPosting,
    /// Balance sheet: the reporting (target) month's period id.
    ReportingPeriod(i64),
}

impl RatePeriod {
    fn render(&self) -> String {
        match self {
            Self::TransactionPosting => "t.postingperiod".to_string(),
            Self::ReportingPeriod(id) => id.to_string(),
        }
    }
}

/// Wrap `amount_expr` in the consolidation builtin, or return it unwrapped
/// when only one active subsidiary exists.
pub fn consolidated_amount_expr(
    amount_expr: &str,
    active_subsidiary_count: usize,
    target_subsidiary: i64,
    rate_period: RatePeriod,
) -> String {
    if active_subsidiary_count <= 1 {
        return amount_expr.to_string();
    }
    format!(
        "CONSOLIDATE({amount_expr}, 'LEDGER', 'DEFAULT', 'DEFAULT', {target_subsidiary}, {}, 'DEFAULT')",
        rate_period.render()
    )
}
