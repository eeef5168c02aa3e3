//! Integration Tests - Registry Against Mocked Collaborators
//!
//! Tests the interaction between the registry use case, its ports and
//! the console session. Uses mockall for trait mocking and tokio::test
//! for async tests.

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use mockall::predicate::*;
use mockall::{mock, Sequence};

use otc_offer_registry::adapters::console::Session;
use otc_offer_registry::adapters::ledger::InMemoryLedger;
use otc_offer_registry::adapters::native::InMemoryCurrency;
use otc_offer_registry::domain::{CallContext, LedgerError, PaymentError, RegistryError};
use otc_offer_registry::usecases::OfferRegistry;

// ---- Mock Definitions ----

mock! {
    pub Ledger {}

    #[async_trait::async_trait]
    impl otc_offer_registry::ports::asset_ledger::AssetLedger for Ledger {
        async fn balance_of(
            &self,
            asset: Address,
            account: Address,
        ) -> Result<U256, LedgerError>;

        async fn allowance(
            &self,
            asset: Address,
            owner: Address,
            spender: Address,
        ) -> Result<U256, LedgerError>;

        async fn transfer_from(
            &self,
            asset: Address,
            spender: Address,
            owner: Address,
            recipient: Address,
            quantity: U256,
        ) -> Result<(), LedgerError>;
    }
}

mock! {
    pub Currency {}

    #[async_trait::async_trait]
    impl otc_offer_registry::ports::native_currency::NativeCurrency for Currency {
        async fn balance_of(&self, account: Address) -> Result<U256, PaymentError>;
        async fn transfer(&self, from: Address, to: Address, amount: U256) -> Result<(), PaymentError>;
        async fn refund(&self, from: Address, to: Address, amount: U256) -> Result<(), PaymentError>;
    }
}

mock! {
    pub Repo {}

    #[async_trait::async_trait]
    impl otc_offer_registry::ports::repository::Repository for Repo {
        async fn save_book(&self, snapshot: &otc_offer_registry::ports::BookSnapshot)
            -> anyhow::Result<()>;
        async fn load_book(&self)
            -> anyhow::Result<Option<otc_offer_registry::ports::BookSnapshot>>;
        async fn append_settlement(&self, settlement: &otc_offer_registry::domain::Settlement)
            -> anyhow::Result<()>;
        async fn load_settlements(&self)
            -> anyhow::Result<Vec<otc_offer_registry::domain::Settlement>>;
        async fn is_healthy(&self) -> bool;
    }
}

const REGISTRY: Address = Address::repeat_byte(0xee);
const TOKEN: Address = Address::repeat_byte(0x70);
const SELLER: Address = Address::repeat_byte(0x01);
const BUYER: Address = Address::repeat_byte(0x02);

fn amount(n: u64) -> U256 {
    U256::from(n)
}

fn registry(ledger: MockLedger, currency: MockCurrency) -> OfferRegistry<MockLedger, MockCurrency> {
    OfferRegistry::new(REGISTRY, Arc::new(ledger), Arc::new(currency))
}

/// Expect one native transfer in sequence.
fn expect_transfer(
    currency: &mut MockCurrency,
    seq: &mut Sequence,
    from: Address,
    to: Address,
    value: U256,
    result: Result<(), PaymentError>,
) {
    currency
        .expect_transfer()
        .with(eq(from), eq(to), eq(value))
        .times(1)
        .in_sequence(seq)
        .return_once(move |_, _, _| result);
}

/// Expect one compensating refund in sequence.
fn expect_refund(
    currency: &mut MockCurrency,
    seq: &mut Sequence,
    from: Address,
    to: Address,
    value: U256,
    result: Result<(), PaymentError>,
) {
    currency
        .expect_refund()
        .with(eq(from), eq(to), eq(value))
        .times(1)
        .in_sequence(seq)
        .return_once(move |_, _, _| result);
}

// ---- Integration Tests ----

#[tokio::test]
async fn test_happy_path_calls_collaborators_in_order() {
    let mut ledger = MockLedger::new();
    let mut currency = MockCurrency::new();
    let mut seq = Sequence::new();
    let price = amount(1337);

    expect_transfer(&mut currency, &mut seq, BUYER, REGISTRY, price, Ok(()));
    expect_transfer(&mut currency, &mut seq, REGISTRY, SELLER, price, Ok(()));
    ledger
        .expect_transfer_from()
        .with(eq(TOKEN), eq(REGISTRY), eq(SELLER), eq(BUYER), eq(amount(42)))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _, _, _, _| Ok(()));

    let registry = registry(ledger, currency);
    registry.post(SELLER, TOKEN, amount(42), price).await.unwrap();

    let settlement = registry
        .fulfil(CallContext::new(BUYER, price), TOKEN, SELLER)
        .await
        .unwrap();

    assert_eq!(settlement.buyer, BUYER);
    assert_eq!(settlement.seller, SELLER);
    assert_eq!(settlement.quantity, amount(42));
    assert_eq!(registry.offer_count().await, 0);
}

#[tokio::test]
async fn test_payment_mismatch_never_touches_collaborators() {
    // No expectations: any ledger or currency call panics.
    let registry = registry(MockLedger::new(), MockCurrency::new());
    registry.post(SELLER, TOKEN, amount(10), amount(100)).await.unwrap();

    for attached in [amount(99), amount(101), U256::ZERO] {
        let err = registry
            .fulfil(CallContext::new(BUYER, attached), TOKEN, SELLER)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::PaymentMismatch {
                expected: amount(100),
                attached,
            }
        );
    }
    assert_eq!(registry.query(TOKEN).await.unwrap().sellers, vec![SELLER]);
}

#[tokio::test]
async fn test_ledger_rejection_compensates_in_reverse() {
    let mut ledger = MockLedger::new();
    let mut currency = MockCurrency::new();
    let mut seq = Sequence::new();
    let price = amount(7);

    expect_transfer(&mut currency, &mut seq, BUYER, REGISTRY, price, Ok(()));
    expect_transfer(&mut currency, &mut seq, REGISTRY, SELLER, price, Ok(()));
    ledger
        .expect_transfer_from()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|asset, spender, owner, _, quantity| {
            Err(LedgerError::InsufficientAllowance {
                asset,
                owner,
                spender,
                available: U256::ZERO,
                required: quantity,
            })
        });
    expect_refund(&mut currency, &mut seq, SELLER, REGISTRY, price, Ok(()));
    expect_refund(&mut currency, &mut seq, REGISTRY, BUYER, price, Ok(()));

    let registry = registry(ledger, currency);
    registry.post(SELLER, TOKEN, amount(5), price).await.unwrap();

    let err = registry
        .fulfil(CallContext::new(BUYER, price), TOKEN, SELLER)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "TransferRejected");
    assert!(matches!(
        err,
        RegistryError::TransferRejected(LedgerError::InsufficientAllowance { .. })
    ));
    assert_eq!(registry.offer_count().await, 1);
}

#[tokio::test]
async fn test_forward_failure_refunds_buyer_and_skips_ledger() {
    let ledger = MockLedger::new();
    let mut currency = MockCurrency::new();
    let mut seq = Sequence::new();
    let price = amount(3);

    expect_transfer(&mut currency, &mut seq, BUYER, REGISTRY, price, Ok(()));
    expect_transfer(
        &mut currency,
        &mut seq,
        REGISTRY,
        SELLER,
        price,
        Err(PaymentError::DepositRefused { account: SELLER }),
    );
    expect_refund(&mut currency, &mut seq, REGISTRY, BUYER, price, Ok(()));

    let registry = registry(ledger, currency);
    registry.post(SELLER, TOKEN, amount(1), price).await.unwrap();

    let err = registry
        .fulfil(CallContext::new(BUYER, price), TOKEN, SELLER)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        RegistryError::PaymentRejected(PaymentError::DepositRefused { account: SELLER })
    );
    assert_eq!(registry.offer_count().await, 1);
}

#[tokio::test]
async fn test_rail_outage_during_refund_is_reported() {
    let mut ledger = MockLedger::new();
    let mut currency = MockCurrency::new();
    let mut seq = Sequence::new();
    let price = amount(9);

    expect_transfer(&mut currency, &mut seq, BUYER, REGISTRY, price, Ok(()));
    expect_transfer(&mut currency, &mut seq, REGISTRY, SELLER, price, Ok(()));
    ledger
        .expect_transfer_from()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _, _, _, _| Err(LedgerError::Unavailable("ledger down".to_string())));
    expect_refund(
        &mut currency,
        &mut seq,
        SELLER,
        REGISTRY,
        price,
        Err(PaymentError::Unavailable("rail down".to_string())),
    );

    let registry = registry(ledger, currency);
    registry.post(SELLER, TOKEN, amount(1), price).await.unwrap();

    let err = registry
        .fulfil(CallContext::new(BUYER, price), TOKEN, SELLER)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        RegistryError::PaymentRejected(PaymentError::Unavailable("rail down".to_string()))
    );
    assert_eq!(registry.offer_count().await, 1);
}

#[tokio::test]
async fn test_readiness_queries_registry_allowance() {
    let mut ledger = MockLedger::new();
    ledger
        .expect_allowance()
        .with(eq(TOKEN), eq(SELLER), eq(REGISTRY))
        .returning(|_, _, _| Ok(U256::from(10u64)));
    ledger
        .expect_balance_of()
        .with(eq(TOKEN), eq(SELLER))
        .returning(|_, _| Ok(U256::from(4u64)));

    let registry = registry(ledger, MockCurrency::new());
    registry.post(SELLER, TOKEN, amount(5), amount(1)).await.unwrap();

    let readiness = registry.readiness(TOKEN, SELLER).await.unwrap();
    assert_eq!(readiness.allowance, amount(10));
    assert_eq!(readiness.seller_balance, amount(4));
    assert!(!readiness.fulfillable);
}

#[tokio::test]
async fn test_session_persists_book_after_post() {
    let ledger = Arc::new(InMemoryLedger::new());
    let currency = Arc::new(InMemoryCurrency::new());
    let registry = Arc::new(OfferRegistry::new(
        REGISTRY,
        Arc::clone(&ledger),
        Arc::clone(&currency),
    ));

    let mut repo = MockRepo::new();
    repo.expect_save_book()
        .withf(|snapshot| snapshot.offers.len() == 1 && snapshot.offers[0].seller == SELLER)
        .times(1)
        .returning(|_| Ok(()));

    let session = Session::new(registry, ledger, currency).with_repository(Arc::new(repo));

    let request = format!(
        r#"{{"op":"post","caller":"{SELLER}","asset":"{TOKEN}","quantity":"5","price":"5"}}"#
    );
    let reply = session.handle_line(&request).await;
    assert!(reply.contains(r#""ok":true"#), "{reply}");
}

#[tokio::test]
async fn test_session_survives_repository_failure() {
    let ledger = Arc::new(InMemoryLedger::new());
    let currency = Arc::new(InMemoryCurrency::new());
    let registry = Arc::new(OfferRegistry::new(
        REGISTRY,
        Arc::clone(&ledger),
        Arc::clone(&currency),
    ));

    let mut repo = MockRepo::new();
    repo.expect_save_book()
        .returning(|_| Err(anyhow::anyhow!("disk full")));

    let session = Session::new(Arc::clone(&registry), ledger, currency)
        .with_repository(Arc::new(repo));

    let request = format!(
        r#"{{"op":"post","caller":"{SELLER}","asset":"{TOKEN}","quantity":"5","price":"5"}}"#
    );
    let reply = session.handle_line(&request).await;
    assert!(reply.contains(r#""ok":true"#), "{reply}");
    assert_eq!(registry.offer_count().await, 1);
}
