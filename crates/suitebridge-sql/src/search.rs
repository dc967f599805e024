//! Account search (`spec.md` §6 `/accounts/search`, §9 wildcard resolution).
//!
//! A lone `*` must match every active account; anywhere else in the
//! pattern, `*` becomes SQL `%` and everything else is escaped literally
//! so a caller's `_` or `%` cannot smuggle an unintended wildcard in.

use crate::literal::escape_string;

/// Translate the caller's search syntax into a SQL `LIKE` pattern: `%` and
/// `_` are escaped (doubled as literal via `ESCAPE '\'` convention) unless
/// the input contains `*`, in which case only `*` is converted to `%` and
/// the rest of the pattern is left as typed.
pub fn wildcard_pattern(input: &str) -> String {
    if input.contains('*') {
        input.replace('*', "%")
    } else {
        input.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
    }
}

/// Search active (or all) accounts by name pattern.
pub fn account_search_query(pattern: &str, active_only: bool) -> String {
    let like_pattern = wildcard_pattern(pattern);
    let escaped = escape_string(&like_pattern);
    let active_predicate = if active_only { "AND a.isinactive = 'F'" } else { "" };
    format!(
        "SELECT a.id, a.acctnumber AS accountnumber, a.fullname AS accountname, a.accttype\n\
         FROM account a\n\
         WHERE LOWER(a.fullname) LIKE LOWER('{escaped}') ESCAPE '\\'\n\
         \x20 {active_predicate}\n\
         ORDER BY a.acctnumber"
    )
}
