//! Bootstrap dimension queries (`spec.md` §4.6): one query per dimension,
//! run once at process start, never parameterized by a caller.

/// `id`, `name`, `isinactive` for every class.
pub fn classes_query() -> &'static str {
    "SELECT id, name, isinactive FROM classification ORDER BY name"
}

/// `id`, `name`, `isinactive` for every location.
pub fn locations_query() -> &'static str {
    "SELECT id, name, isinactive FROM location ORDER BY name"
}

/// `id`, `name`, `isinactive` for every department.
pub fn departments_query() -> &'static str {
    "SELECT id, name, isinactive FROM department ORDER BY name"
}

/// `id`, `name`, `parent`, `isinactive`, `iselimination` for every
/// subsidiary, so the caller can both resolve names to ids and determine
/// which ids are parents (for the "(Consolidated)" display suffix).
pub fn subsidiaries_query() -> &'static str {
    "SELECT id, name, parent, isinactive, iselimination FROM subsidiary ORDER BY id"
}

/// `id`, `name` for every accounting book.
pub fn accounting_books_query() -> &'static str {
    "SELECT id, name FROM accountingbook ORDER BY id"
}

/// The first active subsidiary with no parent, which the fallback path
/// (id `1`) guards when this returns empty (`spec.md` §4.6).
pub fn consolidation_root_query() -> &'static str {
    "SELECT id, name FROM subsidiary\n\
     WHERE parent IS NULL AND isinactive = 'F'\n\
     ORDER BY id\n\
     FETCH FIRST 1 ROWS ONLY"
}

/// `acctnumber → fullname` for every active account, priming the title
/// cache ahead of the first `/account/{num}/name` lookup.
pub fn account_titles_query() -> &'static str {
    "SELECT acctnumber, fullname FROM account WHERE isinactive = 'F' ORDER BY acctnumber"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consolidation_root_query_excludes_inactive_and_limits_to_one_row() {
        let sql = consolidation_root_query();
        assert!(sql.contains("parent IS NULL"));
        assert!(sql.contains("isinactive = 'F'"));
        assert!(sql.contains("FETCH FIRST 1 ROWS ONLY"));
    }

    #[test]
    fn subsidiaries_query_selects_parent_and_elimination_flag() {
        let sql = subsidiaries_query();
        assert!(sql.contains("parent"));
        assert!(sql.contains("iselimination"));
    }
}
