//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! infrastructure. Each sub-module groups adapters by concern.
//!
//! Adapter categories:
//! - `console`: JSON-lines request loop driving the registry
//! - `ledger`: in-memory multi-asset token ledger
//! - `metrics`: Prometheus counters and gauges
//! - `native`: in-memory native currency rail
//! - `persistence`: offer book snapshots and the settlement journal

pub mod console;
pub mod ledger;
pub mod metrics;
pub mod native;
pub mod persistence;
