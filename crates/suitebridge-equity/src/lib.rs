//! # suitebridge-equity
//!
//! The derived-equity engine: retained earnings, net income, and the CTA
//! balance-sheet plug, each composed from the coordinator's cumulative and
//! targeted scalar sub-queries (`spec.md` §4.4).

pub mod engine;

pub use engine::EquityEngine;
