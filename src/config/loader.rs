//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::{parse_address, scale, AppConfig, NATIVE_DECIMALS};

/// Highest token precision accepted for genesis assets.
const MAX_DECIMALS: u8 = 36;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)?;

  info!(
    registry = %config.registry.name,
    assets = config.assets.len(),
    accounts = config.accounts.len(),
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig =
    toml::from_str(content).with_context(|| "Failed to parse config.toml")?;
  validate_config(&config)?;
  Ok(config)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Well-formed, non-zero addresses everywhere
/// - Unique asset identifiers, distinct from the registry account
/// - Decimals and genesis amounts that fit in 256 bits
fn validate_config(config: &AppConfig) -> Result<()> {
  anyhow::ensure!(
    !config.registry.name.is_empty(),
    "registry.name must not be empty"
  );

  let registry = config.registry_address()?;
  anyhow::ensure!(!registry.is_zero(), "registry.address must not be the zero address");

  anyhow::ensure!(
    !config.registry.log_level.is_empty(),
    "registry.log_level must not be empty"
  );

  if config.persistence.enabled {
    anyhow::ensure!(
      !config.persistence.data_dir.is_empty(),
      "persistence.data_dir must not be empty when persistence is enabled"
    );
  }

  let mut seen = HashSet::new();
  for (i, asset) in config.assets.iter().enumerate() {
    let address = parse_address(&asset.address)
      .with_context(|| format!("Asset {} ({}) address", i, asset.symbol))?;
    anyhow::ensure!(
      !address.is_zero(),
      "Asset {} ({}) has the zero address",
      i,
      asset.symbol
    );
    anyhow::ensure!(
      address != registry,
      "Asset {} ({}) collides with the registry address",
      i,
      asset.symbol
    );
    anyhow::ensure!(
      seen.insert(address),
      "Asset {} ({}) address is configured twice",
      i,
      asset.symbol
    );
    anyhow::ensure!(
      asset.decimals <= MAX_DECIMALS,
      "Asset {} ({}) decimals must be <= {}, got {}",
      i,
      asset.symbol,
      MAX_DECIMALS,
      asset.decimals
    );
    for holder in &asset.holders {
      parse_address(&holder.account)
        .with_context(|| format!("Asset {} ({}) holder", i, asset.symbol))?;
      scale(holder.amount, asset.decimals)?;
    }
  }

  for (i, account) in config.accounts.iter().enumerate() {
    parse_address(&account.address).with_context(|| format!("Account {i} address"))?;
    scale(account.native_balance, NATIVE_DECIMALS)?;
  }

  Ok(())
}
