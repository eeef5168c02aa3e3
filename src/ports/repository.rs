//! Repository Port - Registry State Persistence Interface
//!
//! Defines the trait for persisting the offer book and the settlement
//! journal. The book is stored as a whole snapshot; settlements are an
//! append-only log for audit and reconciliation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::offer::{Offer, Settlement};

/// Offer book snapshot for restart recovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSnapshot {
  /// Version of the snapshot format.
  pub version: String,
  /// Timestamp of snapshot (Unix ms).
  pub timestamp_ms: u64,
  /// Active offers, grouped by asset, in slot order.
  pub offers: Vec<Offer>,
}

impl BookSnapshot {
  /// Current snapshot format version.
  pub const VERSION: &'static str = "1";

  pub fn new(offers: Vec<Offer>) -> Self {
    Self {
      version: Self::VERSION.to_string(),
      timestamp_ms: chrono::Utc::now().timestamp_millis().max(0) as u64,
      offers,
    }
  }
}

/// Trait for registry state persistence providers.
#[async_trait]
pub trait Repository: Send + Sync + 'static {
  /// Replace the stored offer book snapshot.
  async fn save_book(&self, snapshot: &BookSnapshot) -> anyhow::Result<()>;

  /// Load the most recent offer book snapshot, if any.
  async fn load_book(&self) -> anyhow::Result<Option<BookSnapshot>>;

  /// Append a settlement to the journal.
  async fn append_settlement(&self, settlement: &Settlement) -> anyhow::Result<()>;

  /// Load every journaled settlement, oldest first.
  async fn load_settlements(&self) -> anyhow::Result<Vec<Settlement>>;

  /// Check if the repository is healthy (directory writable).
  async fn is_healthy(&self) -> bool;
}
