//! # suitebridge-config
//!
//! Configuration schema, environment/file loading, and validation for the
//! ERP query gateway.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::load;
pub use schema::*;
pub use validation::validate;
