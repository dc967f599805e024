//! Transaction drill-down query (`spec.md` §6 `GET /transactions`): the
//! individual postings behind a single account/period cell, for the
//! add-in's "show me the transactions" affordance.

use suitebridge_core::{FilterBundle, GatewayResult};

use crate::filters::{
    accounting_book_predicate, combine, elimination_predicate, posting_predicate, segment_predicates,
};
use crate::literal::checked_escaped;

/// Every posting line for `account_number` in `period_name`, signed exactly
/// as stored (no display-flip — the add-in shows raw debit/credit columns
/// for this view, not a rolled-up balance).
pub fn transactions_query(account_number: &str, period_name: &str, filters: &FilterBundle) -> GatewayResult<String> {
    let account_literal = checked_escaped(account_number)?.render();
    let period_literal = checked_escaped(period_name)?.render();

    let mut predicates = vec![
        posting_predicate().to_string(),
        accounting_book_predicate(filters),
        elimination_predicate().to_string(),
        format!("a.acctnumber = {account_literal}"),
        format!("ap.periodname = {period_literal}"),
    ];
    predicates.extend(segment_predicates(filters));

    Ok(format!(
        "SELECT t.trandate AS transaction_date, t.type AS transaction_type, t.tranid AS transaction_number,\n\
         \x20      t.entity AS entity_name, tl.memo AS memo,\n\
         \x20      tal.debitamount AS debit, tal.creditamount AS credit, tal.amount AS net_amount,\n\
         \x20      a.acctnumber AS account_number\n\
         FROM transactionaccountingline tal\n\
         JOIN transactionline tl ON tal.transaction = tl.transaction AND tal.transactionline = tl.id\n\
         JOIN transaction t ON tl.transaction = t.id\n\
         JOIN account a ON tal.account = a.id\n\
         JOIN accountingperiod ap ON t.postingperiod = ap.id\n\
         WHERE {where_clause}\n\
         ORDER BY t.trandate",
        where_clause = combine(predicates),
    ))
}
