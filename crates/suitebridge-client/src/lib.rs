//! # suitebridge-client
//!
//! OAuth1-HMAC-SHA256 signed execution of SuiteQL-style statements against
//! the ERP's REST SQL endpoint, with pagination and retry/backoff.

pub mod client;
pub mod retry;
pub mod signing;

pub use client::{to_number, ErpClient, Row};
pub use retry::{RetryReason, RetryState};
pub use signing::{authorization_header, generate_nonce, OAuthParams};
