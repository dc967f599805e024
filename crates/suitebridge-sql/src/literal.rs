//! Typed SQL literals.
//!
//! Every value interpolated into a generated statement goes through one of
//! these three constructors rather than raw string formatting, so a caller
//! cannot accidentally splice an unescaped string into the builder's output
//! (`spec.md` §9: "model every literal through a small `SqlLiteral` sum
//! type").

use suitebridge_core::error::{GatewayError, GatewayResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlLiteral {
    /// A bare integer, rendered without quotes.
    Int(i64),
    /// A string literal, rendered single-quoted with embedded quotes
    /// doubled. Rejects NUL bytes.
    Escaped(String),
    /// A fragment the caller asserts is already safe SQL (a column
    /// reference, a builtin call, a keyword) — never derived from request
    /// input.
    Raw(String),
}

impl SqlLiteral {
    pub fn render(&self) -> String {
        match self {
            Self::Int(n) => n.to_string(),
            Self::Escaped(s) => format!("'{}'", escape_string(s)),
            Self::Raw(s) => s.clone(),
        }
    }
}

/// Duplicate single quotes and reject NUL bytes, per `spec.md` §4.1's
/// shared escape helper.
pub fn escape_string(input: &str) -> String {
    input.replace('\'', "''")
}

/// Validate a string literal before it is embedded, rejecting NULs the way
/// the ERP client's shared escape helper does.
pub fn checked_escaped(input: impl Into<String>) -> GatewayResult<SqlLiteral> {
    let input = input.into();
    if input.contains('\0') {
        return Err(GatewayError::validation("SQL literal contains a NUL byte"));
    }
    Ok(SqlLiteral::Escaped(input))
}

/// Render a comma-separated `IN (...)` list of escaped string literals.
pub fn in_list_escaped<'a>(values: impl IntoIterator<Item = &'a str>) -> GatewayResult<String> {
    let mut rendered = Vec::new();
    for value in values {
        rendered.push(checked_escaped(value)?.render());
    }
    Ok(format!("({})", rendered.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_literal_has_no_quotes() {
        assert_eq!(SqlLiteral::Int(42).render(), "42");
    }

    #[test]
    fn escaped_literal_doubles_embedded_quotes() {
        let literal = SqlLiteral::Escaped("O'Brien".to_string());
        assert_eq!(literal.render(), "'O''Brien'");
    }

    #[test]
    fn raw_literal_passes_through_unquoted() {
        assert_eq!(SqlLiteral::Raw("a.acctnumber".to_string()).render(), "a.acctnumber");
    }

    #[test]
    fn nul_byte_is_rejected() {
        assert!(checked_escaped("bad\0value").is_err());
    }

    #[test]
    fn in_list_renders_escaped_members() {
        let list = in_list_escaped(["Jan 2025", "O'Brien"]).unwrap();
        assert_eq!(list, "('Jan 2025', 'O''Brien')");
    }
}
