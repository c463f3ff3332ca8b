//! Matching engine throughput benchmarks, grounded on the teacher crate's
//! `benches/order_book/mass_cancel.rs` setup-then-measure shape.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use dauction_core::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn resting_limit(side: Side, price: Decimal) -> Order {
    Order::new(UserId::new(), "BTC-USD", side, OrderKind::Limit, dec!(1), Some(price), None, TimeInForce::Gtc)
}

fn populated_book(levels: usize) -> MatchingEngine {
    let engine = MatchingEngine::new("BTC-USD");
    for i in 0..levels {
        let price = Decimal::from(1000 + i as i64);
        engine.submit(resting_limit(Side::Sell, price)).unwrap();
        engine.submit(resting_limit(Side::Buy, price - dec!(500))).unwrap();
    }
    engine
}

fn bench_resting_admission(c: &mut Criterion) {
    let mut group = c.benchmark_group("MatchingEngine - admit resting limit");
    for &levels in &[100usize, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::new("submit_gtc", levels), &levels, |b, &levels| {
            b.iter_with_setup(
                || populated_book(levels),
                |engine| {
                    let price = Decimal::from(2000 + levels as i64);
                    black_box(engine.submit(resting_limit(Side::Buy, price)).unwrap());
                },
            );
        });
    }
    group.finish();
}

fn bench_crossing_market_order(c: &mut Criterion) {
    let mut group = c.benchmark_group("MatchingEngine - market order crossing");
    for &levels in &[100usize, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::new("market_sweep", levels), &levels, |b, &levels| {
            b.iter_with_setup(
                || populated_book(levels),
                |engine| {
                    let order = Order::new(
                        UserId::new(),
                        "BTC-USD",
                        Side::Buy,
                        OrderKind::Market,
                        Decimal::from(levels as i64),
                        None,
                        None,
                        TimeInForce::Gtc,
                    );
                    black_box(engine.submit(order).unwrap());
                },
            );
        });
    }
    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let engine = populated_book(10_000);
    c.bench_function("MatchingEngine - snapshot depth 20", |b| {
        b.iter(|| black_box(engine.snapshot(20)));
    });
}

criterion_group!(benches, bench_resting_admission, bench_crossing_market_order, bench_snapshot);
criterion_main!(benches);
