//! Offer Book Benchmarks - Registry Hot-Path Performance
//!
//! Benchmarks the book operations every `post`, `fulfil` and `query`
//! runs while holding the registry lock.
//!
//! Run with: cargo bench --bench offer_book_bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use alloy::primitives::{Address, U256};
use otc_offer_registry::domain::{Offer, OfferBook};

const TOKEN: Address = Address::repeat_byte(0x70);

/// A book with `sellers` offers on a single asset.
fn crowded_book(sellers: u16) -> OfferBook {
    let mut book = OfferBook::new();
    for i in 0..sellers {
        let mut bytes = [0u8; 20];
        bytes[18..].copy_from_slice(&(i + 1).to_be_bytes());
        book.upsert(Offer::new(
            Address::from(bytes),
            TOKEN,
            U256::from(u64::from(i) + 1),
            U256::from(1_000u64),
        ));
    }
    book
}

/// Benchmark replacing an existing offer in a 1,000-seller slot list.
fn bench_upsert_replace(c: &mut Criterion) {
    let mut book = crowded_book(1_000);
    let last = *book.offers(&TOKEN).last().expect("book is populated");

    c.bench_function("offer_book_upsert_replace_1000", |b| {
        b.iter(|| {
            let _posting = book.upsert(black_box(last));
        });
    });
}

/// Benchmark the stage + restore pair of an aborted fulfilment.
fn bench_stage_restore(c: &mut Criterion) {
    let mut book = crowded_book(1_000);
    let middle = book.offers(&TOKEN)[500];

    c.bench_function("offer_book_stage_restore_1000", |b| {
        b.iter(|| {
            let staged = book
                .stage_removal(black_box(&middle.asset), black_box(&middle.seller))
                .expect("offer present");
            book.restore(staged);
        });
    });
}

/// Benchmark building the aligned query listing.
fn bench_listing(c: &mut Criterion) {
    let book = crowded_book(1_000);

    c.bench_function("offer_book_listing_1000", |b| {
        b.iter(|| {
            let _listing = book.listing(black_box(&TOKEN));
        });
    });
}

criterion_group!(
    benches,
    bench_upsert_replace,
    bench_stage_restore,
    bench_listing,
);
criterion_main!(benches);
