//! In-Memory Asset Ledger - Multi-Asset ERC-20 Semantics
//!
//! Implements the `AssetLedger` port over process-local state. Each
//! registered asset carries its own balances, allowances and supply.
//! Used by the binary and as the reference fake in tests.
//!
//! Allowance semantics follow ERC-20: `approve` sets (not adds) the
//! allowance, and an allowance of `U256::MAX` is never decremented.

use std::collections::HashMap;

use alloy::primitives::U256;
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::domain::offer::{AccountId, Amount, AssetId};
use crate::ports::asset_ledger::{AssetLedger, LedgerError};

/// Book-keeping for a single asset.
#[derive(Debug, Clone, Default)]
struct AssetAccounts {
  symbol: String,
  decimals: u8,
  total_supply: Amount,
  balances: HashMap<AccountId, Amount>,
  /// (owner, spender) → remaining allowance.
  allowances: HashMap<(AccountId, AccountId), Amount>,
}

impl AssetAccounts {
  fn balance(&self, account: &AccountId) -> Amount {
    self.balances.get(account).copied().unwrap_or(U256::ZERO)
  }

  fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount {
    self
      .allowances
      .get(&(*owner, *spender))
      .copied()
      .unwrap_or(U256::ZERO)
  }

  /// Move `amount` between accounts after checking the debit side.
  fn move_balance(
    &mut self,
    asset: AssetId,
    from: AccountId,
    to: AccountId,
    amount: Amount,
  ) -> Result<(), LedgerError> {
    let available = self.balance(&from);
    if available < amount {
      return Err(LedgerError::InsufficientBalance {
        asset,
        owner: from,
        available,
        required: amount,
      });
    }
    if from == to {
      return Ok(());
    }
    let credited = self
      .balance(&to)
      .checked_add(amount)
      .ok_or(LedgerError::Overflow { asset, account: to })?;
    self.balances.insert(from, available - amount);
    self.balances.insert(to, credited);
    Ok(())
  }
}

/// Descriptive metadata for a registered asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetInfo {
  pub asset: AssetId,
  pub symbol: String,
  pub decimals: u8,
  pub total_supply: Amount,
}

/// Process-local multi-asset token ledger.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
  assets: RwLock<HashMap<AssetId, AssetAccounts>>,
}

impl InMemoryLedger {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a new asset with no supply.
  pub async fn register_asset(
    &self,
    asset: AssetId,
    symbol: &str,
    decimals: u8,
  ) -> Result<(), LedgerError> {
    let mut assets = self.assets.write().await;
    if assets.contains_key(&asset) {
      return Err(LedgerError::AlreadyRegistered { asset });
    }
    assets.insert(
      asset,
      AssetAccounts {
        symbol: symbol.to_string(),
        decimals,
        ..AssetAccounts::default()
      },
    );
    info!(%asset, symbol, decimals, "Asset registered");
    Ok(())
  }

  /// Create `amount` new units of `asset` in `to`'s balance.
  #[instrument(skip(self))]
  pub async fn mint(&self, asset: AssetId, to: AccountId, amount: Amount) -> Result<(), LedgerError> {
    let mut assets = self.assets.write().await;
    let accounts = assets
      .get_mut(&asset)
      .ok_or(LedgerError::UnknownAsset { asset })?;
    let supply = accounts
      .total_supply
      .checked_add(amount)
      .ok_or(LedgerError::Overflow { asset, account: to })?;
    // Balances sum to the supply, so no single balance can overflow here.
    let balance = accounts.balance(&to) + amount;
    accounts.total_supply = supply;
    accounts.balances.insert(to, balance);
    Ok(())
  }

  /// Move `amount` from the caller's own balance.
  #[instrument(skip(self))]
  pub async fn transfer(
    &self,
    asset: AssetId,
    from: AccountId,
    to: AccountId,
    amount: Amount,
  ) -> Result<(), LedgerError> {
    let mut assets = self.assets.write().await;
    let accounts = assets
      .get_mut(&asset)
      .ok_or(LedgerError::UnknownAsset { asset })?;
    accounts.move_balance(asset, from, to, amount)
  }

  /// Set the amount `spender` may move out of `owner`'s balance.
  #[instrument(skip(self))]
  pub async fn approve(
    &self,
    asset: AssetId,
    owner: AccountId,
    spender: AccountId,
    amount: Amount,
  ) -> Result<(), LedgerError> {
    let mut assets = self.assets.write().await;
    let accounts = assets
      .get_mut(&asset)
      .ok_or(LedgerError::UnknownAsset { asset })?;
    accounts.allowances.insert((owner, spender), amount);
    debug!(%asset, %owner, %spender, %amount, "Allowance set");
    Ok(())
  }

  pub async fn info(&self, asset: AssetId) -> Result<AssetInfo, LedgerError> {
    let assets = self.assets.read().await;
    let accounts = assets.get(&asset).ok_or(LedgerError::UnknownAsset { asset })?;
    Ok(AssetInfo {
      asset,
      symbol: accounts.symbol.clone(),
      decimals: accounts.decimals,
      total_supply: accounts.total_supply,
    })
  }

  /// Smallest-unit multiplier for one whole token of `asset`.
  pub async fn unit(&self, asset: AssetId) -> Result<Amount, LedgerError> {
    let decimals = self.info(asset).await?.decimals;
    U256::from(10u64)
      .checked_pow(U256::from(decimals))
      .ok_or_else(|| LedgerError::Unavailable(format!("{decimals} decimals exceed 256-bit range")))
  }
}

#[async_trait]
impl AssetLedger for InMemoryLedger {
  async fn balance_of(&self, asset: AssetId, account: AccountId) -> Result<Amount, LedgerError> {
    let assets = self.assets.read().await;
    let accounts = assets.get(&asset).ok_or(LedgerError::UnknownAsset { asset })?;
    Ok(accounts.balance(&account))
  }

  async fn allowance(
    &self,
    asset: AssetId,
    owner: AccountId,
    spender: AccountId,
  ) -> Result<Amount, LedgerError> {
    let assets = self.assets.read().await;
    let accounts = assets.get(&asset).ok_or(LedgerError::UnknownAsset { asset })?;
    Ok(accounts.allowance(&owner, &spender))
  }

  #[instrument(skip(self))]
  async fn transfer_from(
    &self,
    asset: AssetId,
    spender: AccountId,
    owner: AccountId,
    recipient: AccountId,
    quantity: Amount,
  ) -> Result<(), LedgerError> {
    let mut assets = self.assets.write().await;
    let accounts = assets
      .get_mut(&asset)
      .ok_or(LedgerError::UnknownAsset { asset })?;

    let allowed = accounts.allowance(&owner, &spender);
    if allowed < quantity {
      return Err(LedgerError::InsufficientAllowance {
        asset,
        owner,
        spender,
        available: allowed,
        required: quantity,
      });
    }

    accounts.move_balance(asset, owner, recipient, quantity)?;

    if allowed != U256::MAX {
      accounts.allowances.insert((owner, spender), allowed - quantity);
    }
    Ok(())
  }
}
