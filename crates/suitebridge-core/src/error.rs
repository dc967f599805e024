//! Error kinds shared across the gateway.
//!
//! Every component converts its own failures into [`GatewayError`] at the
//! point it hands control back to a caller outside its crate. The HTTP
//! surface is the only place the kind is mapped to a status code (see
//! `suitebridge-server::error`); everything upstream of that only needs the
//! kind and a human-readable detail.

use thiserror::Error;

/// Unified error type for the gateway, one variant per `spec.md` §7 kind.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The request shape is malformed (missing period, non-string account,
    /// unparseable date).
    #[error("validation error: {0}")]
    Validation(String),

    /// OAuth signature rejected or token revoked.
    #[error("ERP authentication failed: {0}")]
    Auth(String),

    /// ERP returned 429 after the client's own retry budget was exhausted.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// A per-operation deadline was exceeded.
    #[error("operation timed out: {0}")]
    Timeout(String),

    /// Any non-retryable ERP error (bad SQL, missing table, unknown column).
    #[error("ERP backend error: {0}")]
    Backend(String),

    /// A lookup that required a single answer came back empty.
    #[error("not found: {0}")]
    NotFound(String),
}

impl GatewayError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Short machine-readable tag used in the `{error, detail}` JSON body.
    pub fn kind_tag(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION",
            Self::Auth(_) => "AUTH",
            Self::RateLimited(_) => "RATE_LIMITED",
            Self::Timeout(_) => "TIMEOUT",
            Self::Backend(_) => "BACKEND",
            Self::NotFound(_) => "NOT_FOUND",
        }
    }

    pub fn detail(&self) -> String {
        match self {
            Self::Validation(d)
            | Self::Auth(d)
            | Self::RateLimited(d)
            | Self::Timeout(d)
            | Self::Backend(d)
            | Self::NotFound(d) => d.clone(),
        }
    }
}

/// Result alias used throughout the gateway.
pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tag_matches_spec_names() {
        assert_eq!(GatewayError::validation("x").kind_tag(), "VALIDATION");
        assert_eq!(GatewayError::auth("x").kind_tag(), "AUTH");
        assert_eq!(GatewayError::rate_limited("x").kind_tag(), "RATE_LIMITED");
        assert_eq!(GatewayError::timeout("x").kind_tag(), "TIMEOUT");
        assert_eq!(GatewayError::backend("x").kind_tag(), "BACKEND");
        assert_eq!(GatewayError::not_found("x").kind_tag(), "NOT_FOUND");
    }

    #[test]
    fn detail_roundtrips_message() {
        let err = GatewayError::backend("ORA-00904: invalid column name");
        assert_eq!(err.detail(), "ORA-00904: invalid column name");
    }
}
