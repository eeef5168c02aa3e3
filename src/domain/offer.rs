//! Core offer domain types.
//!
//! Defines the entities the registry trades in: account and asset
//! identifiers, amounts, standing offers, the posting policy, and the
//! settlement record produced by a successful fulfilment.

use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::RegistryError;

// ────────────────────────────────────────────
// Type aliases consumed by ports and adapters
// ────────────────────────────────────────────

/// Identity of an account (seller, buyer, or the registry itself).
pub type AccountId = Address;

/// Identifier of a fungible asset held in the Asset Ledger.
pub type AssetId = Address;

/// Quantity of an asset or of native currency, in smallest units.
pub type Amount = U256;

/// A seller's standing terms to sell `quantity` of `asset` for `price`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    /// Account that posted the offer; the only one allowed to replace it.
    pub seller: AccountId,
    /// Asset being sold.
    pub asset: AssetId,
    /// Amount of `asset` on offer, in the asset's smallest unit.
    pub quantity: Amount,
    /// Exact native-currency amount required to fulfil.
    pub price: Amount,
}

impl Offer {
    pub const fn new(seller: AccountId, asset: AssetId, quantity: Amount, price: Amount) -> Self {
        Self {
            seller,
            asset,
            quantity,
            price,
        }
    }
}

/// Acceptance rules applied to `post` before an offer reaches the book.
///
/// Zero-quantity offers hand out nothing for any price and are refused
/// unless explicitly allowed. Zero-price offers (giveaways) are allowed
/// by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfferPolicy {
    pub allow_zero_quantity: bool,
    pub allow_zero_price: bool,
}

impl Default for OfferPolicy {
    fn default() -> Self {
        Self {
            allow_zero_quantity: false,
            allow_zero_price: true,
        }
    }
}

impl OfferPolicy {
    /// Check an incoming offer against the policy and identifier rules.
    pub fn check(&self, offer: &Offer) -> Result<(), RegistryError> {
        if offer.asset.is_zero() {
            return Err(RegistryError::InvalidInput(
                "asset identifier must not be the zero address".to_string(),
            ));
        }
        if offer.seller.is_zero() {
            return Err(RegistryError::InvalidInput(
                "seller must not be the zero address".to_string(),
            ));
        }
        if offer.quantity.is_zero() && !self.allow_zero_quantity {
            return Err(RegistryError::InvalidInput(
                "offer quantity must be greater than zero".to_string(),
            ));
        }
        if offer.price.is_zero() && !self.allow_zero_price {
            return Err(RegistryError::InvalidInput(
                "offer price must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Caller identity and attached native value of one registry invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub caller: AccountId,
    pub value: Amount,
}

impl CallContext {
    pub const fn new(caller: AccountId, value: Amount) -> Self {
        Self { caller, value }
    }

    /// A call carrying no native value.
    pub const fn without_value(caller: AccountId) -> Self {
        Self {
            caller,
            value: U256::ZERO,
        }
    }
}

/// Outcome of a `post` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Posting {
    /// The seller had no active offer for this asset.
    Created,
    /// An existing offer was overwritten in place.
    Replaced { previous: Offer },
}

impl Posting {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Replaced { .. } => "replaced",
        }
    }
}

/// Record of a completed fulfilment, for the caller and the journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    /// Unique settlement identifier.
    pub id: Uuid,
    pub asset: AssetId,
    pub seller: AccountId,
    pub buyer: AccountId,
    /// Asset units delivered to the buyer.
    pub quantity: Amount,
    /// Native currency delivered to the seller.
    pub price: Amount,
    pub settled_at: DateTime<Utc>,
}

impl Settlement {
    pub fn from_offer(offer: &Offer, buyer: AccountId) -> Self {
        Self {
            id: Uuid::new_v4(),
            asset: offer.asset,
            seller: offer.seller,
            buyer,
            quantity: offer.quantity,
            price: offer.price,
            settled_at: Utc::now(),
        }
    }
}
