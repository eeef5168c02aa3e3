//! Native Currency Port - Runtime Value Transfer Primitive
//!
//! The registry uses this to accept the value attached to a `fulfil`
//! call into its own account, forward it to the seller, and move it back
//! when a later settlement step fails.

use async_trait::async_trait;

pub use crate::domain::error::PaymentError;
use crate::domain::offer::{AccountId, Amount};

#[async_trait]
pub trait NativeCurrency: Send + Sync + 'static {
  /// Native balance of `account`.
  async fn balance_of(&self, account: AccountId) -> Result<Amount, PaymentError>;

  /// Move exactly `amount` from `from` to `to`.
  ///
  /// # Errors
  /// Fails without side effects if `from` cannot cover `amount`.
  async fn transfer(&self, from: AccountId, to: AccountId, amount: Amount) -> Result<(), PaymentError>;

  /// Move back `amount` that an earlier `transfer` in the same call
  /// delivered from `to` to `from`.
  ///
  /// Recipients cannot refuse a refund; only a shortfall on `from` or an
  /// unavailable rail fails it.
  async fn refund(&self, from: AccountId, to: AccountId, amount: Amount) -> Result<(), PaymentError>;
}
