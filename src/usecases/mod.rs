//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces.
//!
//! Use cases:
//! - `OfferRegistry`: post, fulfil and query standing OTC offers

pub mod registry;

pub use registry::{OfferReadiness, OfferRegistry};
