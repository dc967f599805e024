//! Account type resolution query (`spec.md` §4.3): a single query over an
//! entire unknown-account set, never one query per account.

use suitebridge_core::GatewayResult;

use crate::literal::in_list_escaped;

/// `acctnumber → accttype` for the given set of account numbers. Also
/// returns `internal_id`, `name`, `parentnumber`, `eliminate`, and
/// `custrecord_special_tag` so a single round trip fully populates the
/// account cache for every number it resolves.
pub fn account_type_resolution_query(account_numbers: &[String]) -> GatewayResult<String> {
    let list = in_list_escaped(account_numbers.iter().map(String::as_str))?;
    Ok(format!(
        "SELECT a.acctnumber, a.id AS internal_id, a.fullname AS name, a.accttype,\n\
         \x20      a.parent AS parentnumber, a.eliminate, a.custrecord_special_tag\n\
         FROM account a\n\
         WHERE a.acctnumber IN {list}\n\
         ORDER BY a.acctnumber"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_query_covers_the_whole_unknown_set() {
        let sql = account_type_resolution_query(&["4000".to_string(), "4010".to_string()]).unwrap();
        assert!(sql.contains("IN ('4000', '4010')"));
    }

    #[test]
    fn nul_byte_in_account_number_is_rejected() {
        assert!(account_type_resolution_query(&["bad\0".to_string()]).is_err());
    }
}
