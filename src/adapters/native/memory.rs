//! In-Memory Native Currency - Account Balances and Exact Transfers
//!
//! Implements the `NativeCurrency` port over process-local balances.
//! Accounts can be flagged to refuse deposits, modelling recipients that
//! cannot accept native value.

use std::collections::{HashMap, HashSet};

use alloy::primitives::U256;
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::domain::offer::{AccountId, Amount};
use crate::ports::native_currency::{NativeCurrency, PaymentError};

#[derive(Debug, Default)]
struct Balances {
  accounts: HashMap<AccountId, Amount>,
  total_supply: Amount,
  refusing: HashSet<AccountId>,
}

impl Balances {
  fn balance(&self, account: &AccountId) -> Amount {
    self.accounts.get(account).copied().unwrap_or(U256::ZERO)
  }

  /// Debit `from` and credit `to`, optionally honouring deposit refusal.
  fn move_value(
    &mut self,
    from: AccountId,
    to: AccountId,
    amount: Amount,
    honour_refusal: bool,
  ) -> Result<(), PaymentError> {
    let available = self.balance(&from);
    if available < amount {
      return Err(PaymentError::InsufficientFunds {
        account: from,
        available,
        required: amount,
      });
    }
    if honour_refusal && self.refusing.contains(&to) {
      return Err(PaymentError::DepositRefused { account: to });
    }
    if from == to {
      return Ok(());
    }

    let credited = self
      .balance(&to)
      .checked_add(amount)
      .ok_or(PaymentError::Overflow { account: to })?;
    self.accounts.insert(from, available - amount);
    self.accounts.insert(to, credited);
    debug!(%from, %to, %amount, honour_refusal, "Native value moved");
    Ok(())
  }
}

/// Process-local native currency rail.
#[derive(Debug, Default)]
pub struct InMemoryCurrency {
  state: RwLock<Balances>,
}

impl InMemoryCurrency {
  pub fn new() -> Self {
    Self::default()
  }

  /// Create `amount` of native currency in `account` (genesis funding).
  pub async fn credit(&self, account: AccountId, amount: Amount) -> Result<(), PaymentError> {
    let mut state = self.state.write().await;
    let supply = state
      .total_supply
      .checked_add(amount)
      .ok_or(PaymentError::Overflow { account })?;
    // Balances sum to the supply, so no single balance can overflow here.
    let balance = state.balance(&account) + amount;
    state.total_supply = supply;
    state.accounts.insert(account, balance);
    Ok(())
  }

  /// Make transfers into `account` fail, or accept them again.
  pub async fn set_refuse_deposits(&self, account: AccountId, refuse: bool) {
    let mut state = self.state.write().await;
    if refuse {
      state.refusing.insert(account);
    } else {
      state.refusing.remove(&account);
    }
  }

  pub async fn total_supply(&self) -> Amount {
    self.state.read().await.total_supply
  }
}

#[async_trait]
impl NativeCurrency for InMemoryCurrency {
  async fn balance_of(&self, account: AccountId) -> Result<Amount, PaymentError> {
    Ok(self.state.read().await.balance(&account))
  }

  #[instrument(skip(self))]
  async fn transfer(&self, from: AccountId, to: AccountId, amount: Amount) -> Result<(), PaymentError> {
    self.state.write().await.move_value(from, to, amount, true)
  }

  #[instrument(skip(self))]
  async fn refund(&self, from: AccountId, to: AccountId, amount: Amount) -> Result<(), PaymentError> {
    self.state.write().await.move_value(from, to, amount, false)
  }
}
