//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the usecases layer requires
//! from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `AssetLedger`: token balances, allowances and delegated transfers
//! - `NativeCurrency`: the runtime's value transfer primitive
//! - `Repository`: offer book snapshots and the settlement journal

pub mod asset_ledger;
pub mod native_currency;
pub mod repository;

pub use asset_ledger::AssetLedger;
pub use native_currency::NativeCurrency;
pub use repository::{BookSnapshot, Repository};
