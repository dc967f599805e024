//! # suitebridge-server
//!
//! The HTTP surface (`spec.md` §4.7, §6): binds the axum router built from
//! [`routes::build`] to [`state::AppState`] — a coordinator, an equity
//! engine, and the loaded configuration, each shared across requests.

pub mod error;
pub mod filters;
pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::build;
pub use state::AppState;
