//! Offer Registry Use Case - Post, Fulfil, Query
//!
//! The registry records standing offers and settles them. It never takes
//! custody of a seller's tokens: on fulfilment it spends the allowance
//! the seller granted it on the Asset Ledger and relays the buyer's
//! attached payment to the seller within the same call.
//!
//! Fulfilment flow:
//! 1. Stage the offer removal and check the attached value
//! 2. Accept the attached value into the registry account
//! 3. Forward it to the seller
//! 4. Pull the asset from seller to buyer through the ledger
//! 5. Commit the removal, or undo steps 2-3 in reverse and restore the offer

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};

use crate::domain::book::{OfferBook, OfferListing, StagedRemoval};
use crate::domain::error::{PaymentError, RegistryError};
use crate::domain::offer::{
  AccountId, Amount, AssetId, CallContext, Offer, OfferPolicy, Posting, Settlement,
};
use crate::ports::asset_ledger::AssetLedger;
use crate::ports::native_currency::NativeCurrency;

/// Money movement completed during a fulfilment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Leg {
  /// Buyer's attached value moved into the registry account.
  Attached { buyer: AccountId, amount: Amount },
  /// Registry account paid the seller.
  Forwarded { seller: AccountId, amount: Amount },
}

/// Whether an offer could be fulfilled right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OfferReadiness {
  pub offer: Offer,
  /// Allowance the seller has granted the registry.
  pub allowance: Amount,
  /// Seller's current balance of the asset.
  pub seller_balance: Amount,
  pub fulfillable: bool,
}

/// Process-wide offer registry backed by an Asset Ledger and a native
/// currency rail.
///
/// Every operation holds the book lock for its whole duration, so calls
/// are serialized and a fulfilment's effects are never observed half-done.
pub struct OfferRegistry<L: AssetLedger, N: NativeCurrency> {
  /// The registry's own account: ledger spender and payment relay.
  address: AccountId,
  ledger: Arc<L>,
  currency: Arc<N>,
  policy: OfferPolicy,
  book: Mutex<OfferBook>,
}

impl<L: AssetLedger, N: NativeCurrency> OfferRegistry<L, N> {
  /// Create an empty registry with the default offer policy.
  pub fn new(address: AccountId, ledger: Arc<L>, currency: Arc<N>) -> Self {
    Self::with_policy(address, ledger, currency, OfferPolicy::default())
  }

  /// Create an empty registry with a custom offer policy.
  pub fn with_policy(
    address: AccountId,
    ledger: Arc<L>,
    currency: Arc<N>,
    policy: OfferPolicy,
  ) -> Self {
    Self {
      address,
      ledger,
      currency,
      policy,
      book: Mutex::new(OfferBook::new()),
    }
  }

  pub const fn address(&self) -> AccountId {
    self.address
  }

  pub const fn policy(&self) -> OfferPolicy {
    self.policy
  }

  /// Post or replace the caller's offer for `asset`.
  ///
  /// No balance or allowance check happens here; the seller only needs
  /// both in place by the time someone fulfils.
  #[instrument(skip(self), fields(registry = %self.address))]
  pub async fn post(
    &self,
    seller: AccountId,
    asset: AssetId,
    quantity: Amount,
    price: Amount,
  ) -> Result<Posting, RegistryError> {
    let offer = Offer::new(seller, asset, quantity, price);
    self.policy.check(&offer)?;

    let posting = self.book.lock().await.upsert(offer);

    match posting {
      Posting::Created => info!(%seller, %asset, %quantity, %price, "Offer posted"),
      Posting::Replaced { previous } => info!(
        %seller,
        %asset,
        %quantity,
        %price,
        previous_quantity = %previous.quantity,
        previous_price = %previous.price,
        "Offer replaced"
      ),
    }

    Ok(posting)
  }

  /// Fulfil `seller`'s offer for `asset`, paying with the attached value.
  ///
  /// # Errors
  /// - `OfferNotFound` if the slot is empty
  /// - `PaymentMismatch` if the attached value differs from the price
  /// - `PaymentRejected` if the buyer cannot cover the value or the
  ///   forward to the seller fails
  /// - `TransferRejected` if the ledger refuses the pull
  ///
  /// On any error the book, balances and allowances are as before the call.
  #[instrument(skip(self), fields(registry = %self.address, buyer = %call.caller, value = %call.value))]
  pub async fn fulfil(
    &self,
    call: CallContext,
    asset: AssetId,
    seller: AccountId,
  ) -> Result<Settlement, RegistryError> {
    ensure_identifier(asset, "asset")?;
    ensure_identifier(seller, "seller")?;
    let buyer = call.caller;
    if buyer == seller {
      return Err(RegistryError::InvalidInput(
        "a seller cannot fulfil its own offer".to_string(),
      ));
    }

    let mut book = self.book.lock().await;

    let staged = book
      .stage_removal(&asset, &seller)
      .ok_or(RegistryError::OfferNotFound { asset, seller })?;
    let offer = *staged.offer();

    if call.value != offer.price {
      book.restore(staged);
      warn!(%asset, %seller, expected = %offer.price, attached = %call.value, "Payment mismatch");
      return Err(RegistryError::PaymentMismatch {
        expected: offer.price,
        attached: call.value,
      });
    }

    let mut legs = Vec::with_capacity(2);

    if let Err(e) = self.currency.transfer(buyer, self.address, call.value).await {
      return Err(self.abort(&mut book, staged, legs, e.into()).await);
    }
    legs.push(Leg::Attached {
      buyer,
      amount: call.value,
    });

    if let Err(e) = self.currency.transfer(self.address, seller, offer.price).await {
      return Err(self.abort(&mut book, staged, legs, e.into()).await);
    }
    legs.push(Leg::Forwarded {
      seller,
      amount: offer.price,
    });

    if let Err(e) = self
      .ledger
      .transfer_from(asset, self.address, seller, buyer, offer.quantity)
      .await
    {
      return Err(self.abort(&mut book, staged, legs, e.into()).await);
    }

    // Commit: the staged removal is simply not restored.
    drop(staged);

    let settlement = Settlement::from_offer(&offer, buyer);
    info!(
      settlement_id = %settlement.id,
      %asset,
      %seller,
      quantity = %offer.quantity,
      price = %offer.price,
      "Offer fulfilled"
    );

    Ok(settlement)
  }

  /// Active offers for `asset` as aligned seller/quantity/price sequences.
  pub async fn query(&self, asset: AssetId) -> Result<OfferListing, RegistryError> {
    ensure_identifier(asset, "asset")?;
    Ok(self.book.lock().await.listing(&asset))
  }

  /// Active offers for `asset` as records, in the same order as `query`.
  pub async fn offers(&self, asset: AssetId) -> Result<Vec<Offer>, RegistryError> {
    ensure_identifier(asset, "asset")?;
    Ok(self.book.lock().await.offers(&asset).to_vec())
  }

  /// Check the seller's allowance and balance against an active offer.
  #[instrument(skip(self))]
  pub async fn readiness(
    &self,
    asset: AssetId,
    seller: AccountId,
  ) -> Result<OfferReadiness, RegistryError> {
    ensure_identifier(asset, "asset")?;
    let book = self.book.lock().await;
    let offer = *book
      .get(&asset, &seller)
      .ok_or(RegistryError::OfferNotFound { asset, seller })?;

    let allowance = self.ledger.allowance(asset, seller, self.address).await?;
    let seller_balance = self.ledger.balance_of(asset, seller).await?;

    Ok(OfferReadiness {
      offer,
      allowance,
      seller_balance,
      fulfillable: allowance >= offer.quantity && seller_balance >= offer.quantity,
    })
  }

  /// Number of active offers across all assets.
  pub async fn offer_count(&self) -> usize {
    self.book.lock().await.len()
  }

  /// Export every active offer in a reproducible order.
  pub async fn snapshot(&self) -> Vec<Offer> {
    self.book.lock().await.to_offers()
  }

  /// Replace the book with the given offers, re-posting them in order.
  ///
  /// Offers the policy would refuse are skipped with a warning.
  #[instrument(skip(self, offers))]
  pub async fn restore(&self, offers: Vec<Offer>) -> usize {
    let total = offers.len();
    let accepted: Vec<Offer> = offers
      .into_iter()
      .filter(|o| match self.policy.check(o) {
        Ok(()) => true,
        Err(e) => {
          warn!(seller = %o.seller, asset = %o.asset, error = %e, "Skipping restored offer");
          false
        }
      })
      .collect();

    let book = OfferBook::from_offers(accepted);
    let restored = book.len();
    *self.book.lock().await = book;

    info!(restored, skipped = total - restored, "Offer book restored");
    restored
  }

  /// Undo completed legs in reverse, put the offer back, and pick the
  /// error to report.
  async fn abort(
    &self,
    book: &mut OfferBook,
    staged: StagedRemoval,
    legs: Vec<Leg>,
    cause: RegistryError,
  ) -> RegistryError {
    let offer = *staged.offer();
    book.restore(staged);

    warn!(
      asset = %offer.asset,
      seller = %offer.seller,
      kind = cause.kind(),
      error = %cause,
      "Fulfilment aborted, rolling back"
    );

    match self.compensate(legs).await {
      Ok(()) => cause,
      Err(e) => {
        error!(
          asset = %offer.asset,
          seller = %offer.seller,
          error = %e,
          "Compensation failed; attached payment not returned"
        );
        RegistryError::PaymentRejected(e)
      }
    }
  }

  async fn compensate(&self, legs: Vec<Leg>) -> Result<(), PaymentError> {
    for leg in legs.into_iter().rev() {
      match leg {
        Leg::Forwarded { seller, amount } => {
          self.currency.refund(seller, self.address, amount).await?;
        }
        Leg::Attached { buyer, amount } => {
          self.currency.refund(self.address, buyer, amount).await?;
        }
      }
    }
    Ok(())
  }
}

fn ensure_identifier(id: AccountId, what: &str) -> Result<(), RegistryError> {
  if id.is_zero() {
    return Err(RegistryError::InvalidInput(format!(
      "{what} must not be the zero address"
    )));
  }
  Ok(())
}
