//! Error types for the registry and its collaborators.
//!
//! Every failure aborts the whole call. The registry never swallows a
//! collaborator error: ledger refusals surface as `TransferRejected`,
//! currency refusals as `PaymentRejected`.

use thiserror::Error;

use super::offer::{AccountId, Amount, AssetId};

/// Refusal reported by the Asset Ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("asset {asset} is not known to the ledger")]
    UnknownAsset { asset: AssetId },

    #[error("account {owner} holds {available} of asset {asset}, {required} required")]
    InsufficientBalance {
        asset: AssetId,
        owner: AccountId,
        available: Amount,
        required: Amount,
    },

    #[error("spender {spender} may move {available} of {owner}'s asset {asset}, {required} required")]
    InsufficientAllowance {
        asset: AssetId,
        owner: AccountId,
        spender: AccountId,
        available: Amount,
        required: Amount,
    },

    #[error("asset {asset} is already registered")]
    AlreadyRegistered { asset: AssetId },

    #[error("balance overflow crediting {account} with asset {asset}")]
    Overflow { asset: AssetId, account: AccountId },

    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Refusal reported by the native-currency transfer primitive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    #[error("account {account} holds {available}, {required} required")]
    InsufficientFunds {
        account: AccountId,
        available: Amount,
        required: Amount,
    },

    #[error("account {account} does not accept native deposits")]
    DepositRefused { account: AccountId },

    #[error("balance overflow crediting {account}")]
    Overflow { account: AccountId },

    #[error("currency rail unavailable: {0}")]
    Unavailable(String),
}

/// Errors returned by the offer registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("no active offer for asset {asset} from seller {seller}")]
    OfferNotFound { asset: AssetId, seller: AccountId },

    #[error("attached payment {attached} does not match offer price {expected}")]
    PaymentMismatch { expected: Amount, attached: Amount },

    #[error("asset transfer rejected: {0}")]
    TransferRejected(#[from] LedgerError),

    #[error("payment rejected: {0}")]
    PaymentRejected(#[from] PaymentError),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A registry-side facility needed by the request is not available.
    #[error("unavailable: {0}")]
    Unavailable(String),
}

impl RegistryError {
    /// Stable name of the error kind, used in protocol replies and metric labels.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::OfferNotFound { .. } => "OfferNotFound",
            Self::PaymentMismatch { .. } => "PaymentMismatch",
            Self::TransferRejected(_) => "TransferRejected",
            Self::PaymentRejected(_) => "PaymentRejected",
            Self::InvalidInput(_) => "InvalidInput",
            Self::Unavailable(_) => "Unavailable",
        }
    }
}
