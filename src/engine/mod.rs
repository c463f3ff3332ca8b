//! Single-symbol matching engine: price-time priority limit order book with
//! market, limit, and stop-limit orders (spec §4.B).

mod error;
mod matching;

pub use error::EngineError;
pub use matching::{BookSnapshot, SubmitOutcome};

use std::collections::VecDeque;

use parking_lot::RwLock;
use rust_decimal::Decimal;

use crate::book::OrderBook;
use crate::model::{Order, Trade};

/// Internal state guarded by the single engine-wide lock (spec §4.B,§5):
/// both order books, the stop-limit wait-list, and both egress queues.
pub(crate) struct EngineState {
    pub(crate) book: OrderBook,
    pub(crate) stop_wait_list: Vec<Order>,
    pub(crate) trade_queue: VecDeque<Trade>,
    pub(crate) order_update_queue: VecDeque<Order>,
}

impl EngineState {
    fn new() -> Self {
        Self {
            book: OrderBook::new(),
            stop_wait_list: Vec::new(),
            trade_queue: VecDeque::new(),
            order_update_queue: VecDeque::new(),
        }
    }
}

/// One matching engine per symbol. Cheap to construct; intended to be
/// wrapped in an `Arc` by the [`crate::coordinator::ExchangeCoordinator`].
pub struct MatchingEngine {
    pub symbol: String,
    pub(crate) state: RwLock<EngineState>,
}

impl MatchingEngine {
    #[must_use]
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            state: RwLock::new(EngineState::new()),
        }
    }

    /// Drains and returns all trades queued since the last call. The lock
    /// is held only long enough to swap the queue out (spec §5: never held
    /// across calls out of the engine).
    pub fn drain_trades(&self) -> Vec<Trade> {
        let mut state = self.state.write();
        state.trade_queue.drain(..).collect()
    }

    /// Drains and returns all order-status updates queued since the last
    /// call, in emission order (monotonic `updated_at`, spec §4.C).
    pub fn drain_order_updates(&self) -> Vec<Order> {
        let mut state = self.state.write();
        state.order_update_queue.drain(..).collect()
    }

    pub fn best_bid(&self) -> Option<Decimal> {
        self.state.read().book.best_bid()
    }

    pub fn best_ask(&self) -> Option<Decimal> {
        self.state.read().book.best_ask()
    }

    pub fn spread(&self) -> Option<Decimal> {
        self.state.read().book.spread()
    }

    /// Number of resting stop-limit orders still parked on the wait-list.
    pub fn pending_stop_count(&self) -> usize {
        self.state.read().stop_wait_list.len()
    }
}
