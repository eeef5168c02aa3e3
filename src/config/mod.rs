//! Configuration Module - TOML-based Registry Configuration
//!
//! Loads and validates configuration from `config.toml`. The registry's
//! own account, the offer policy, persistence and the genesis state of
//! the in-memory ledger and currency rail all live here; nothing is
//! hardcoded in the domain layer.

pub mod loader;

use alloy::primitives::{Address, U256};
use anyhow::{Context, Result};
use serde::Deserialize;

use crate::domain::offer::OfferPolicy;

/// Decimals of the native currency (smallest unit = 10^-18).
pub const NATIVE_DECIMALS: u8 = 18;

/// Top-level registry configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Registry identity and logging.
  pub registry: RegistryConfig,
  /// Offer acceptance rules.
  #[serde(default)]
  pub policy: OfferPolicy,
  /// Offer book snapshot and settlement journal.
  #[serde(default)]
  pub persistence: PersistenceConfig,
  /// Prometheus counters.
  #[serde(default)]
  pub metrics: MetricsConfig,
  /// Assets registered on the ledger at startup.
  #[serde(default)]
  pub assets: Vec<AssetConfig>,
  /// Native currency balances at startup.
  #[serde(default)]
  pub accounts: Vec<AccountConfig>,
}

impl AppConfig {
  /// The registry's own account address.
  pub fn registry_address(&self) -> Result<Address> {
    parse_address(&self.registry.address).context("registry.address")
  }
}

/// Registry identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
  /// Human-readable registry name.
  pub name: String,
  /// Account the registry acts as (allowance spender, payment relay).
  pub address: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
}

/// Persistence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
  /// Persist the book and journal settlements.
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Directory for `offers.json` and `settlements/`.
  #[serde(default = "default_data_dir")]
  pub data_dir: String,
}

impl Default for PersistenceConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      data_dir: default_data_dir(),
    }
  }
}

/// Metrics configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
  #[serde(default = "default_true")]
  pub enabled: bool,
}

impl Default for MetricsConfig {
  fn default() -> Self {
    Self { enabled: true }
  }
}

/// A fungible asset created on the in-memory ledger at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetConfig {
  /// Ticker symbol.
  pub symbol: String,
  /// Asset identifier.
  pub address: String,
  #[serde(default = "default_decimals")]
  pub decimals: u8,
  /// Initial balances in whole tokens.
  #[serde(default)]
  pub holders: Vec<HolderConfig>,
}

/// Initial token balance of one account, in whole tokens.
#[derive(Debug, Clone, Deserialize)]
pub struct HolderConfig {
  pub account: String,
  pub amount: u64,
}

/// Initial native balance of one account, in whole currency units.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
  pub address: String,
  pub native_balance: u64,
}

/// Parse a `0x`-prefixed 20-byte hex address.
pub fn parse_address(raw: &str) -> Result<Address> {
  raw
    .trim()
    .parse::<Address>()
    .with_context(|| format!("invalid address: {raw:?}"))
}

/// Scale `whole` units by `10^decimals`.
pub fn scale(whole: u64, decimals: u8) -> Result<U256> {
  U256::from(10u64)
    .checked_pow(U256::from(decimals))
    .and_then(|unit| unit.checked_mul(U256::from(whole)))
    .with_context(|| format!("{whole} × 10^{decimals} overflows 256 bits"))
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_true() -> bool {
  true
}

fn default_data_dir() -> String {
  "data".to_string()
}

fn default_decimals() -> u8 {
  18
}
