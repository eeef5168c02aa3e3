//! Domain layer - Offers, the offer book, and error types.
//!
//! Pure state and rules for the registry. Nothing in here performs I/O
//! or talks to a collaborator; the usecases layer does that through ports.

pub mod book;
pub mod error;
pub mod offer;

// Re-export core types for convenience
pub use book::{OfferBook, OfferListing, StagedRemoval};
pub use error::{LedgerError, PaymentError, RegistryError};
pub use offer::{
    AccountId, Amount, AssetId, CallContext, Offer, OfferPolicy, Posting, Settlement,
};
