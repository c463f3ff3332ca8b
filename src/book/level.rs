//! A single price level: a FIFO queue of resting orders at one price.
//!
//! Mutation always happens under the owning [`super::OrderBook`]'s engine
//! lock (spec §5), so the queue itself needs no internal synchronization —
//! unlike the teacher crate's lock-free `PriceLevel`, which had to be
//! concurrency-safe on its own because many threads could touch one level
//! without a coarse lock. See DESIGN.md for this divergence.

use rust_decimal::Decimal;

use crate::model::{Order, OrderId};

/// Orders resting at one price, in time priority (earliest first).
#[derive(Debug, Default)]
pub struct PriceLevel {
    orders: Vec<Order>,
}

impl PriceLevel {
    pub fn new() -> Self {
        Self { orders: Vec::new() }
    }

    /// Appends an order to the back of the queue (it was admitted last).
    pub fn push(&mut self, order: Order) {
        self.orders.push(order);
    }

    /// The order with highest time priority (earliest `created_at`).
    pub fn peek(&self) -> Option<&Order> {
        self.orders.first()
    }

    pub fn peek_mut(&mut self) -> Option<&mut Order> {
        self.orders.first_mut()
    }

    /// Removes and returns the top-priority order.
    pub fn pop_front(&mut self) {
        if !self.orders.is_empty() {
            self.orders.remove(0);
        }
    }

    /// Removes an order by id, preserving the relative order of the rest.
    /// O(n) in the level's depth, per spec §4.A.
    pub fn remove_by_id(&mut self, id: OrderId) -> Option<Order> {
        let pos = self.orders.iter().position(|o| o.id == id)?;
        Some(self.orders.remove(pos))
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Sum of `remaining_qty` across all resting orders at this level.
    pub fn total_quantity(&self) -> Decimal {
        self.orders.iter().map(|o| o.remaining_qty).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }
}
