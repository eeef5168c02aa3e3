//! Offer book - per-asset ordered seller slots.
//!
//! Holds at most one active offer per `(asset, seller)`. Within an asset,
//! slots keep the order in which sellers first posted; replacing an
//! offer keeps its slot, removing it closes the slot, and a later post by
//! the same seller opens a new slot at the end.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::offer::{AccountId, Amount, AssetId, Offer, Posting};

/// Active offers for one asset, as three aligned sequences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferListing {
    pub asset: AssetId,
    pub sellers: Vec<AccountId>,
    pub quantities: Vec<Amount>,
    pub prices: Vec<Amount>,
}

impl OfferListing {
    fn from_offers(asset: AssetId, offers: &[Offer]) -> Self {
        Self {
            asset,
            sellers: offers.iter().map(|o| o.seller).collect(),
            quantities: offers.iter().map(|o| o.quantity).collect(),
            prices: offers.iter().map(|o| o.price).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.sellers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sellers.is_empty()
    }
}

/// An offer taken out of the book but not yet committed as removed.
///
/// Dropping it commits the removal; `OfferBook::restore` puts the offer
/// back at its original slot.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a staged removal is either committed by dropping it or restored"]
pub struct StagedRemoval {
    offer: Offer,
    slot: usize,
}

impl StagedRemoval {
    pub const fn offer(&self) -> &Offer {
        &self.offer
    }
}

/// The registry's state: asset → ordered offers, one per seller.
#[derive(Debug, Clone, Default)]
pub struct OfferBook {
    assets: HashMap<AssetId, Vec<Offer>>,
}

impl OfferBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the seller's offer for the asset.
    pub fn upsert(&mut self, offer: Offer) -> Posting {
        let slots = self.assets.entry(offer.asset).or_default();
        match slots.iter_mut().find(|o| o.seller == offer.seller) {
            Some(existing) => {
                let previous = *existing;
                existing.quantity = offer.quantity;
                existing.price = offer.price;
                Posting::Replaced { previous }
            }
            None => {
                slots.push(offer);
                Posting::Created
            }
        }
    }

    pub fn get(&self, asset: &AssetId, seller: &AccountId) -> Option<&Offer> {
        self.assets
            .get(asset)?
            .iter()
            .find(|o| o.seller == *seller)
    }

    /// Take the offer out of its slot, remembering where it was.
    pub fn stage_removal(&mut self, asset: &AssetId, seller: &AccountId) -> Option<StagedRemoval> {
        let slots = self.assets.get_mut(asset)?;
        let slot = slots.iter().position(|o| o.seller == *seller)?;
        let offer = slots.remove(slot);
        if slots.is_empty() {
            self.assets.remove(asset);
        }
        Some(StagedRemoval { offer, slot })
    }

    /// Undo a staged removal, putting the offer back at its original slot.
    pub fn restore(&mut self, staged: StagedRemoval) {
        let slots = self.assets.entry(staged.offer.asset).or_default();
        let slot = staged.slot.min(slots.len());
        slots.insert(slot, staged.offer);
    }

    /// Offers for an asset in slot order.
    pub fn offers(&self, asset: &AssetId) -> &[Offer] {
        self.assets.get(asset).map_or(&[], Vec::as_slice)
    }

    pub fn listing(&self, asset: &AssetId) -> OfferListing {
        OfferListing::from_offers(*asset, self.offers(asset))
    }

    /// Total number of active offers across all assets.
    pub fn len(&self) -> usize {
        self.assets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }

    /// Flatten the book into a list that `from_offers` rebuilds exactly.
    ///
    /// Assets are emitted in address order so snapshots are reproducible.
    pub fn to_offers(&self) -> Vec<Offer> {
        let mut assets: Vec<&AssetId> = self.assets.keys().collect();
        assets.sort();
        assets
            .into_iter()
            .flat_map(|a| self.assets[a].iter().copied())
            .collect()
    }

    /// Rebuild a book by posting every offer in order.
    pub fn from_offers(offers: impl IntoIterator<Item = Offer>) -> Self {
        let mut book = Self::new();
        for offer in offers {
            let _ = book.upsert(offer);
        }
        book
    }
}
