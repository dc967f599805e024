//! # suitebridge-core
//!
//! Domain model and normalization primitives shared by every other crate in
//! the gateway: the GL account/period/subsidiary/dimension types of
//! `spec.md` §3, the coordinator's normalized request and result shapes,
//! and the period/account-number normalizers every ingress path runs
//! through before touching the rest of the system.

pub mod error;
pub mod models;
pub mod normalize;

pub use error::{GatewayError, GatewayResult};
pub use models::*;
