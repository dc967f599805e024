//! Period resolution query (`spec.md` §3 `Period`, §4.2): the balance-sheet
//! pivot and every derived-equity sub-query need the ERP's own period id to
//! drive the consolidation builtin's rate-period argument, not just the
//! canonical `Mon YYYY` name.

use suitebridge_core::GatewayResult;

use crate::literal::in_list_escaped;

/// `periodname → (id, startdate, enddate)` for the given set of canonical
/// period names. Restricted to monthly buckets — year/quarter rows with
/// the same name prefix must never satisfy a caller's lookup.
pub fn period_resolution_query(period_names: &[String]) -> GatewayResult<String> {
    let list = in_list_escaped(period_names.iter().map(String::as_str))?;
    Ok(format!(
        "SELECT ap.id, ap.periodname, ap.startdate, ap.enddate\n\
         FROM accountingperiod ap\n\
         WHERE ap.periodname IN {list}\n\
         \x20 AND ap.isyear = 'F' AND ap.isquarter = 'F'\n\
         ORDER BY ap.startdate"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_query_covers_the_whole_period_set() {
        let sql = period_resolution_query(&["Jan 2025".to_string(), "Feb 2025".to_string()]).unwrap();
        assert!(sql.contains("IN ('Jan 2025', 'Feb 2025')"));
        assert!(sql.contains("isyear = 'F'"));
        assert!(sql.contains("isquarter = 'F'"));
    }

    #[test]
    fn nul_byte_in_period_name_is_rejected() {
        assert!(period_resolution_query(&["bad\0".to_string()]).is_err());
    }
}
