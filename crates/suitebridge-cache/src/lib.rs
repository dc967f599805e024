//! # suitebridge-cache
//!
//! The server-side TTL cache and in-flight request coalescer (`spec.md`
//! §4.5): per-key coalescing of concurrent identical computations, and a
//! canonical key derivation shared by every cacheable operation.

pub mod cache;
pub mod inflight;
pub mod key;

pub use cache::Cache;
pub use inflight::InflightMap;
pub use key::{cache_key, Operation};
