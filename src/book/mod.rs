//! Order book: two price-ordered priority structures (bids, asks) per
//! symbol, plus aggregation into depth snapshots (spec §4.A).

mod error;
mod level;

pub use error::BookError;
pub use level::PriceLevel;

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::model::{Order, OrderBookLevel, OrderId, Side};

/// Per-side priority structure keyed by `(price, created_at)`.
///
/// Bids are kept in a `BTreeMap` and walked in reverse (highest price
/// first); asks are walked forward (lowest price first). Both sides sit
/// behind the single engine-wide lock described in spec §5, so there is no
/// need for the lock-free skip-list the teacher crate uses for per-level
/// concurrent access — see DESIGN.md.
#[derive(Debug, Default)]
pub struct OrderBook {
    bids: BTreeMap<Decimal, PriceLevel>,
    asks: BTreeMap<Decimal, PriceLevel>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    fn side_map(&self, side: Side) -> &BTreeMap<Decimal, PriceLevel> {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn side_map_mut(&mut self, side: Side) -> &mut BTreeMap<Decimal, PriceLevel> {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// Best-priority resting order on `side` (`BTreeMap`'s edge lookup,
    /// O(log n) in the number of distinct price levels).
    pub fn peek(&self, side: Side) -> Option<&Order> {
        match side {
            Side::Buy => self.bids.iter().next_back(),
            Side::Sell => self.asks.iter().next(),
        }
        .and_then(|(_, level)| level.peek())
    }

    pub fn peek_mut(&mut self, side: Side) -> Option<&mut Order> {
        match side {
            Side::Buy => self.bids.iter_mut().next_back(),
            Side::Sell => self.asks.iter_mut().next(),
        }
        .and_then(|(_, level)| level.peek_mut())
    }

    /// Removes the top-priority order on `side` and returns it, dropping the
    /// price level if it becomes empty.
    pub fn pop(&mut self, side: Side) -> Option<Order> {
        let price = match side {
            Side::Buy => *self.bids.iter().next_back()?.0,
            Side::Sell => *self.asks.iter().next()?.0,
        };
        let map = self.side_map_mut(side);
        let level = map.get_mut(&price)?;
        let order = level.peek().cloned();
        level.pop_front();
        if level.is_empty() {
            map.remove(&price);
        }
        order
    }

    /// Admits a resting order onto its side, keyed by `order.price`.
    pub fn push(&mut self, order: Order) {
        let side = order.side;
        let price = order.price.expect("resting order must carry a price");
        self.side_map_mut(side)
            .entry(price)
            .or_insert_with(PriceLevel::new)
            .push(order);
    }

    /// Cancellation primitive: scans both books for `id`, removes it if
    /// found. O(levels × level depth), matching spec §4.A's O(n) bound.
    pub fn remove_by_id(&mut self, id: OrderId) -> Option<Order> {
        for side in [Side::Buy, Side::Sell] {
            let map = self.side_map_mut(side);
            let mut empty_price = None;
            for (price, level) in map.iter_mut() {
                if let Some(order) = level.remove_by_id(id) {
                    if level.is_empty() {
                        empty_price = Some(*price);
                    }
                    if let Some(p) = empty_price {
                        map.remove(&p);
                    }
                    return Some(order);
                }
            }
        }
        None
    }

    /// Re-heapifies nothing (a `BTreeMap` keeps its invariant automatically);
    /// exposed so callers that mutate the top order in place (partial fills)
    /// have an explicit point to call after mutation, matching spec §4.B's
    /// "re-heapify at position 0" step conceptually.
    pub fn resort_top(&mut self, _side: Side) {}

    /// Walks a side from best to worst price, grouping resting orders into
    /// [`OrderBookLevel`]s, returning at most `depth` levels in best-first
    /// order. Deterministic: levels are always produced in sorted price
    /// order, never map-iteration order (spec §9's "snapshot aggregation
    /// order" note).
    pub fn aggregate_levels(&self, side: Side, depth: usize) -> Vec<OrderBookLevel> {
        let map = self.side_map(side);
        let iter: Box<dyn Iterator<Item = (&Decimal, &PriceLevel)>> = match side {
            Side::Buy => Box::new(map.iter().rev()),
            Side::Sell => Box::new(map.iter()),
        };
        iter.take(depth)
            .map(|(price, level)| OrderBookLevel {
                price: *price,
                quantity: level.total_quantity(),
                orders: level.len(),
            })
            .collect()
    }

    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.keys().next_back().copied()
    }

    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.keys().next().copied()
    }

    /// `best_ask - best_bid`, or `None` if either side is empty.
    pub fn spread(&self) -> Option<Decimal> {
        Some(self.best_ask()? - self.best_bid()?)
    }

    /// G3: best bid strictly below best ask whenever both sides are
    /// non-empty.
    #[must_use]
    pub fn is_crossed(&self) -> bool {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => bid >= ask,
            _ => false,
        }
    }

    /// Sums resting quantity on the book opposite `incoming_side` that would
    /// cross `price_limit` (`None` means "no limit", i.e. a market order),
    /// stopping as soon as `target` is reached. Used for a non-mutating
    /// Fill-Or-Kill pre-check (spec §9: FOK "reject entirely unless fully
    /// fillable at submission").
    pub fn matchable_quantity(
        &self,
        incoming_side: Side,
        price_limit: Option<Decimal>,
        target: Decimal,
    ) -> Decimal {
        let opposite = incoming_side.opposite();
        let map = self.side_map(opposite);
        let iter: Box<dyn Iterator<Item = (&Decimal, &PriceLevel)>> = match opposite {
            Side::Buy => Box::new(map.iter().rev()),
            Side::Sell => Box::new(map.iter()),
        };
        let mut total = Decimal::ZERO;
        for (price, level) in iter {
            if total >= target {
                break;
            }
            if let Some(limit) = price_limit {
                let crosses = match incoming_side {
                    Side::Buy => limit >= *price,
                    Side::Sell => limit <= *price,
                };
                if !crosses {
                    break;
                }
            }
            total += level.total_quantity();
        }
        total
    }

    pub fn is_empty_side(&self, side: Side) -> bool {
        self.side_map(side).is_empty()
    }

    pub fn len(&self, side: Side) -> usize {
        self.side_map(side).values().map(PriceLevel::len).sum()
    }
}

impl Clone for OrderBook {
    fn clone(&self) -> Self {
        let clone_side = |map: &BTreeMap<Decimal, PriceLevel>| {
            map.iter()
                .map(|(p, lvl)| {
                    let mut new_level = PriceLevel::new();
                    for order in lvl.iter() {
                        new_level.push(order.clone());
                    }
                    (*p, new_level)
                })
                .collect()
        };
        Self {
            bids: clone_side(&self.bids),
            asks: clone_side(&self.asks),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OrderKind, TimeInForce, UserId};
    use rust_decimal_macros::dec;

    fn resting(side: Side, price: Decimal, qty: Decimal, created_at: i64) -> Order {
        let mut o = Order::new(
            UserId::new(),
            "BTC-USD",
            side,
            OrderKind::Limit,
            qty,
            Some(price),
            None,
            TimeInForce::Gtc,
        );
        o.created_at = created_at;
        o
    }

    #[test]
    fn price_time_priority_bid_side() {
        let mut book = OrderBook::new();
        book.push(resting(Side::Buy, dec!(100), dec!(1), 1));
        book.push(resting(Side::Buy, dec!(101), dec!(1), 2)); // better price, later time
        let top = book.peek(Side::Buy).unwrap();
        assert_eq!(top.price, Some(dec!(101)));
    }

    #[test]
    fn price_time_priority_tiebreak_by_earlier_time() {
        let mut book = OrderBook::new();
        let first = resting(Side::Sell, dec!(100), dec!(1), 1);
        let first_id = first.id;
        book.push(first);
        book.push(resting(Side::Sell, dec!(100), dec!(1), 2));
        assert_eq!(book.peek(Side::Sell).unwrap().id, first_id);
    }

    #[test]
    fn aggregate_levels_best_first_deterministic() {
        let mut book = OrderBook::new();
        book.push(resting(Side::Buy, dec!(99), dec!(1), 1));
        book.push(resting(Side::Buy, dec!(101), dec!(2), 2));
        book.push(resting(Side::Buy, dec!(100), dec!(3), 3));
        let levels = book.aggregate_levels(Side::Buy, 10);
        let prices: Vec<Decimal> = levels.iter().map(|l| l.price).collect();
        assert_eq!(prices, vec![dec!(101), dec!(100), dec!(99)]);
    }

    #[test]
    fn aggregate_levels_respects_depth_cap() {
        let mut book = OrderBook::new();
        for i in 0..5 {
            book.push(resting(Side::Sell, dec!(100) + Decimal::from(i), dec!(1), i as i64));
        }
        let levels = book.aggregate_levels(Side::Sell, 2);
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[0].price, dec!(100));
        assert_eq!(levels[1].price, dec!(101));
    }

    #[test]
    fn remove_by_id_drops_empty_level() {
        let mut book = OrderBook::new();
        let order = resting(Side::Buy, dec!(100), dec!(1), 1);
        let id = order.id;
        book.push(order);
        let removed = book.remove_by_id(id);
        assert!(removed.is_some());
        assert!(book.is_empty_side(Side::Buy));
    }

    #[test]
    fn not_crossed_when_bid_below_ask() {
        let mut book = OrderBook::new();
        book.push(resting(Side::Buy, dec!(99), dec!(1), 1));
        book.push(resting(Side::Sell, dec!(100), dec!(1), 2));
        assert!(!book.is_crossed());
    }

    #[test]
    fn spread_is_ask_minus_bid() {
        let mut book = OrderBook::new();
        assert_eq!(book.spread(), None);
        book.push(resting(Side::Buy, dec!(99), dec!(1), 1));
        assert_eq!(book.spread(), None);
        book.push(resting(Side::Sell, dec!(101), dec!(1), 2));
        assert_eq!(book.spread(), Some(dec!(2)));
    }

    #[test]
    fn snapshot_total_equals_resting_quantity() {
        let mut book = OrderBook::new();
        book.push(resting(Side::Buy, dec!(99), dec!(1), 1));
        book.push(resting(Side::Buy, dec!(99), dec!(2), 2));
        book.push(resting(Side::Buy, dec!(98), dec!(3), 3));
        let levels = book.aggregate_levels(Side::Buy, usize::MAX);
        let total: Decimal = levels.iter().map(|l| l.quantity).sum();
        assert_eq!(total, dec!(6));
    }
}
