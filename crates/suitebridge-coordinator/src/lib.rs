//! # suitebridge-coordinator
//!
//! The batch coordinator: startup lookup bootstrap, lazily-populated
//! account/period caches, and the fan-out/zero-fill logic that turns a
//! normalized request into the minimum number of ERP queries its
//! classification allows (`spec.md` §4.3).

pub mod accounts;
pub mod coordinator;
pub mod lookups;
pub mod periods;

pub use accounts::AccountCache;
pub use coordinator::{widen_with_prefetch, Coordinator};
pub use lookups::{DimensionKind, Lookups};
pub use periods::PeriodCache;
