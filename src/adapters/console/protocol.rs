//! Console Protocol - JSON Lines Request/Reply Types
//!
//! One request object per input line, tagged by `op`. Addresses and
//! amounts travel as strings (amounts in decimal or `0x` hex) and are
//! parsed here, so malformed identifiers surface as `InvalidInput`.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::domain::error::RegistryError;
use crate::domain::offer::Amount;

/// A request read from the console.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
  /// Post or replace the caller's offer.
  Post {
    caller: String,
    asset: String,
    quantity: String,
    price: String,
  },
  /// Fulfil an offer, attaching `value` of native currency.
  Fulfil {
    caller: String,
    asset: String,
    seller: String,
    #[serde(default)]
    value: Option<String>,
  },
  /// List active offers for an asset.
  Query { asset: String },
  /// Check whether an offer is currently fulfillable.
  Readiness { asset: String, seller: String },
  /// Grant an allowance on the ledger (defaults to the registry as spender).
  Approve {
    caller: String,
    asset: String,
    #[serde(default)]
    spender: Option<String>,
    quantity: String,
  },
  /// Move tokens out of the caller's own ledger balance.
  Transfer {
    caller: String,
    asset: String,
    to: String,
    quantity: String,
  },
  /// Token balance of an account.
  Balance { asset: String, account: String },
  /// Native currency balance of an account.
  NativeBalance { account: String },
  /// Prometheus text rendering of registry metrics.
  Metrics,
}

impl Command {
  /// Parse one input line.
  pub fn parse(line: &str) -> Result<Self, RegistryError> {
    serde_json::from_str(line)
      .map_err(|e| RegistryError::InvalidInput(format!("malformed request: {e}")))
  }

  /// Operation name used in logs and metric labels.
  pub const fn name(&self) -> &'static str {
    match self {
      Self::Post { .. } => "post",
      Self::Fulfil { .. } => "fulfil",
      Self::Query { .. } => "query",
      Self::Readiness { .. } => "readiness",
      Self::Approve { .. } => "approve",
      Self::Transfer { .. } => "transfer",
      Self::Balance { .. } => "balance",
      Self::NativeBalance { .. } => "native_balance",
      Self::Metrics => "metrics",
    }
  }
}

/// Error part of a failed reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyError {
  pub kind: String,
  pub message: String,
}

/// One reply line written to the console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
  pub ok: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub result: Option<serde_json::Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<ReplyError>,
}

impl Reply {
  pub const fn success(result: serde_json::Value) -> Self {
    Self {
      ok: true,
      result: Some(result),
      error: None,
    }
  }

  pub fn failure(err: &RegistryError) -> Self {
    Self {
      ok: false,
      result: None,
      error: Some(ReplyError {
        kind: err.kind().to_string(),
        message: err.to_string(),
      }),
    }
  }

  /// Serialize to a single JSON line (no trailing newline).
  pub fn to_line(&self) -> String {
    serde_json::to_string(self).unwrap_or_else(|e| {
      format!(r#"{{"ok":false,"error":{{"kind":"Internal","message":"{e}"}}}}"#)
    })
  }
}

/// Parse an address field, naming the field on failure.
pub fn parse_address(field: &str, raw: &str) -> Result<Address, RegistryError> {
  raw
    .trim()
    .parse::<Address>()
    .map_err(|e| RegistryError::InvalidInput(format!("{field}: {raw:?} is not an address ({e})")))
}

/// Parse an amount field given in decimal or `0x` hex.
pub fn parse_amount(field: &str, raw: &str) -> Result<Amount, RegistryError> {
  raw
    .trim()
    .parse::<Amount>()
    .map_err(|e| RegistryError::InvalidInput(format!("{field}: {raw:?} is not an amount ({e})")))
}
