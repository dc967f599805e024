//! # suitebridge-test-utils
//!
//! A stub ERP SQL endpoint and fixtures for integration-testing the
//! coordinator, equity engine, and HTTP surface without a real ERP
//! account.

pub mod fixtures;
pub mod server;
pub mod stub_erp;

pub use server::{get_test_port, is_healthy, wait_for_health, TestHttpClient, TestServerConfig, TestServerError};
pub use stub_erp::{StubErpServer, StubResponse};
