//! Ledger Adapters - Asset Ledger Implementations
//!
//! Provides the in-memory multi-asset ledger used by the binary and
//! the test suites.

pub mod memory;

pub use memory::{AssetInfo, InMemoryLedger};
