//! Asset Ledger Port - Fungible Token Balances and Allowances
//!
//! Defines the capability set the registry consumes from the external
//! token ledger. Sellers grant the registry an allowance directly on the
//! ledger; the registry only spends it through `transfer_from`.

use async_trait::async_trait;

pub use crate::domain::error::LedgerError;
use crate::domain::offer::{AccountId, Amount, AssetId};

/// Trait for fungible-token ledgers with ERC-20 style allowances.
///
/// Each call is atomic from the caller's point of view: it either fully
/// applies or leaves every balance and allowance untouched.
#[async_trait]
pub trait AssetLedger: Send + Sync + 'static {
  /// Balance of `account` in `asset`.
  async fn balance_of(&self, asset: AssetId, account: AccountId) -> Result<Amount, LedgerError>;

  /// Remaining amount `spender` may move out of `owner`'s balance.
  async fn allowance(
    &self,
    asset: AssetId,
    owner: AccountId,
    spender: AccountId,
  ) -> Result<Amount, LedgerError>;

  /// Move `quantity` from `owner` to `recipient`, spending `spender`'s allowance.
  ///
  /// # Errors
  /// Fails without side effects when the allowance or the owner's
  /// balance is insufficient, or the asset is unknown.
  async fn transfer_from(
    &self,
    asset: AssetId,
    spender: AccountId,
    owner: AccountId,
    recipient: AccountId,
    quantity: Amount,
  ) -> Result<(), LedgerError>;
}
