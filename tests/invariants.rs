//! Invariants G1-G5 from the testable-properties section, plus the
//! IOC/FOK time-in-force behaviors the specification requires be enforced
//! (design note: the legacy code only supported GTC).

use dauction_core::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn limit_tif(side: Side, qty: Decimal, price: Decimal, tif: TimeInForce) -> Order {
    Order::new(UserId::new(), "BTC-USD", side, OrderKind::Limit, qty, Some(price), None, tif)
}

fn limit(side: Side, qty: Decimal, price: Decimal) -> Order {
    limit_tif(side, qty, price, TimeInForce::Gtc)
}

#[test]
fn g2_price_time_priority_never_crossed_by_worse_price() {
    let engine = MatchingEngine::new("BTC-USD");
    engine.submit(limit(Side::Buy, dec!(1), dec!(100))).unwrap();
    engine.submit(limit(Side::Buy, dec!(1), dec!(101))).unwrap();
    assert_eq!(engine.best_bid(), Some(dec!(101)));
}

#[test]
fn g3_no_cross_after_resting_on_both_sides() {
    let engine = MatchingEngine::new("BTC-USD");
    engine.submit(limit(Side::Buy, dec!(1), dec!(99))).unwrap();
    engine.submit(limit(Side::Sell, dec!(1), dec!(100))).unwrap();
    assert!(engine.best_bid().unwrap() < engine.best_ask().unwrap());
}

#[test]
fn g4_quantity_conservation_across_a_fill() {
    let engine = MatchingEngine::new("BTC-USD");
    let maker = engine.submit(limit(Side::Sell, dec!(2), dec!(100))).unwrap().order;
    let outcome = engine.submit(limit(Side::Buy, dec!(0.5), dec!(100))).unwrap();

    assert_eq!(outcome.trades[0].quantity, dec!(0.5));
    assert!(outcome.trades[0].quantity <= maker.remaining_qty);
    assert!(outcome.trades[0].quantity <= outcome.order.quantity);
    assert_eq!(outcome.order.filled_quantity, dec!(0.5));
}

#[test]
fn g4_status_consistency_remaining_zero_iff_filled() {
    let engine = MatchingEngine::new("BTC-USD");
    engine.submit(limit(Side::Sell, dec!(1), dec!(100))).unwrap();
    let outcome = engine.submit(limit(Side::Buy, dec!(1), dec!(100))).unwrap();
    assert_eq!(outcome.order.remaining_qty, Decimal::ZERO);
    assert_eq!(outcome.order.status, OrderStatus::Filled);
}

#[test]
fn snapshot_total_equals_resting_quantity() {
    let engine = MatchingEngine::new("BTC-USD");
    engine.submit(limit(Side::Buy, dec!(1), dec!(99))).unwrap();
    engine.submit(limit(Side::Buy, dec!(2), dec!(99))).unwrap();
    engine.submit(limit(Side::Buy, dec!(3), dec!(98))).unwrap();

    let snapshot = engine.snapshot(usize::MAX);
    let total: Decimal = snapshot.bids.iter().map(|l| l.quantity).sum();
    assert_eq!(total, dec!(6));
}

#[test]
fn ioc_residual_is_cancelled_not_rested() {
    let engine = MatchingEngine::new("BTC-USD");
    engine.submit(limit(Side::Sell, dec!(0.3), dec!(100))).unwrap();

    let outcome = engine
        .submit(limit_tif(Side::Buy, dec!(1), dec!(100), TimeInForce::Ioc))
        .unwrap();

    assert_eq!(outcome.trades.len(), 1);
    assert_eq!(outcome.order.filled_quantity, dec!(0.3));
    assert_eq!(outcome.order.remaining_qty, dec!(0.7));
    assert_eq!(outcome.order.status, OrderStatus::Cancelled);
    assert!(engine.best_bid().is_none(), "IOC residual must never rest");
}

#[test]
fn fok_rejected_entirely_when_not_fully_fillable() {
    let engine = MatchingEngine::new("BTC-USD");
    engine.submit(limit(Side::Sell, dec!(0.3), dec!(100))).unwrap();

    let outcome = engine
        .submit(limit_tif(Side::Buy, dec!(1), dec!(100), TimeInForce::Fok))
        .unwrap();

    assert!(outcome.trades.is_empty());
    assert_eq!(outcome.order.status, OrderStatus::Rejected);
    assert_eq!(outcome.order.filled_quantity, Decimal::ZERO);

    let maker = engine.snapshot(10);
    assert_eq!(maker.asks[0].quantity, dec!(0.3), "FOK rejection must not mutate the book");
}

#[test]
fn fok_fills_completely_when_fully_fillable() {
    let engine = MatchingEngine::new("BTC-USD");
    engine.submit(limit(Side::Sell, dec!(1), dec!(100))).unwrap();

    let outcome = engine
        .submit(limit_tif(Side::Buy, dec!(1), dec!(100), TimeInForce::Fok))
        .unwrap();

    assert_eq!(outcome.trades.len(), 1);
    assert_eq!(outcome.order.status, OrderStatus::Filled);
}

#[test]
fn market_residual_is_terminal_cancelled_not_partial() {
    let engine = MatchingEngine::new("BTC-USD");
    engine.submit(limit(Side::Sell, dec!(0.2), dec!(100))).unwrap();

    let market_order = Order::new(
        UserId::new(),
        "BTC-USD",
        Side::Buy,
        OrderKind::Market,
        dec!(1),
        None,
        None,
        TimeInForce::Gtc,
    );
    let outcome = engine.submit(market_order).unwrap();

    assert_eq!(outcome.order.filled_quantity, dec!(0.2));
    assert_eq!(outcome.order.remaining_qty, dec!(0.8));
    assert_eq!(
        outcome.order.status,
        OrderStatus::Cancelled,
        "a residual MARKET order must be terminal, never left PARTIAL"
    );
}
