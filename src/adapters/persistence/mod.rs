//! Persistence Adapters - File-based Registry Storage
//!
//! Implements the Repository port with an atomic JSON snapshot of the
//! offer book and append-only JSONL files for settlements.

pub mod repository_impl;
pub mod settlements;
pub mod state;

pub use repository_impl::RepositoryImpl;
pub use settlements::SettlementJournal;
pub use state::BookStore;
