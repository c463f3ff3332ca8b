//! Core matching logic: admission, limit/market crossing, stop-limit
//! trigger/resubmission, cancellation, and book snapshots (spec §4.B).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{EngineError, EngineState, MatchingEngine};
use crate::model::{now_millis, Order, OrderBookLevel, OrderId, OrderKind, OrderStatus, Side, TimeInForce, Trade};

/// A point-in-time depth snapshot (spec §4.B `snapshot(depth)`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub symbol: String,
    pub bids: Vec<OrderBookLevel>,
    pub asks: Vec<OrderBookLevel>,
    pub timestamp: i64,
}

/// Outcome of admitting an order: its final (post-match) state plus any
/// trades produced during this submission.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub order: Order,
    pub trades: Vec<Trade>,
}

fn validate(order: &Order) -> Result<(), EngineError> {
    if order.quantity <= Decimal::ZERO {
        return Err(EngineError::NonPositiveQuantity(order.quantity));
    }
    match order.kind {
        OrderKind::Limit => match order.price {
            None => return Err(EngineError::MissingPrice),
            Some(p) if p <= Decimal::ZERO => return Err(EngineError::NonPositivePrice(p)),
            Some(_) => {}
        },
        OrderKind::StopLimit => {
            match order.price {
                None => return Err(EngineError::MissingPrice),
                Some(p) if p <= Decimal::ZERO => return Err(EngineError::NonPositivePrice(p)),
                Some(_) => {}
            }
            match order.stop_price {
                None => return Err(EngineError::MissingStopPrice),
                Some(p) if p <= Decimal::ZERO => return Err(EngineError::NonPositiveStopPrice(p)),
                Some(_) => {}
            }
        }
        OrderKind::Market => {}
    }
    Ok(())
}

fn execute_fill(
    state: &mut EngineState,
    symbol: &str,
    taker: &mut Order,
    maker_side: Side,
    now: i64,
) -> Option<Trade> {
    let top_price = state.book.peek(maker_side)?.price?;
    let maker_remaining = state.book.peek(maker_side)?.remaining_qty;
    let qty = taker.remaining_qty.min(maker_remaining);

    let maker_snapshot = {
        let maker = state.book.peek_mut(maker_side).expect("checked above");
        maker.filled_quantity += qty;
        maker.remaining_qty -= qty;
        maker.updated_at = now;
        maker.status = if maker.remaining_qty.is_zero() {
            OrderStatus::Filled
        } else {
            OrderStatus::Partial
        };
        maker.clone()
    };

    taker.filled_quantity += qty;
    taker.remaining_qty -= qty;
    taker.updated_at = now;

    let (buy_order_id, sell_order_id, buyer_id, seller_id, maker_order_id, taker_order_id) =
        match taker.side {
            Side::Buy => (
                taker.id,
                maker_snapshot.id,
                taker.user_id,
                maker_snapshot.user_id,
                maker_snapshot.id,
                taker.id,
            ),
            Side::Sell => (
                maker_snapshot.id,
                taker.id,
                maker_snapshot.user_id,
                taker.user_id,
                maker_snapshot.id,
                taker.id,
            ),
        };

    let trade = Trade {
        id: OrderId::new(),
        symbol: symbol.to_string(),
        price: top_price,
        quantity: qty,
        buy_order_id,
        sell_order_id,
        buyer_id,
        seller_id,
        maker_order_id,
        taker_order_id,
        executed_at: now,
    };

    state.trade_queue.push_back(trade.clone());
    state.order_update_queue.push_back(maker_snapshot.clone());

    if maker_snapshot.status == OrderStatus::Filled {
        state.book.pop(maker_side);
    }

    Some(trade)
}

/// Crosses `taker` against the opposite book while `price_limit` allows it
/// (`None` = market order, always crosses). Mutates both sides in place and
/// returns every trade produced, in execution order (spec §4.B).
fn match_against_book(
    state: &mut EngineState,
    symbol: &str,
    taker: &mut Order,
    price_limit: Option<Decimal>,
    now: i64,
) -> Vec<Trade> {
    let maker_side = taker.side.opposite();
    let mut trades = Vec::new();

    while taker.remaining_qty > Decimal::ZERO {
        let Some(top) = state.book.peek(maker_side) else {
            break;
        };
        let top_price = top.price.expect("resting order carries a price");
        if let Some(limit) = price_limit {
            let crosses = match taker.side {
                Side::Buy => limit >= top_price,
                Side::Sell => limit <= top_price,
            };
            if !crosses {
                break;
            }
        }
        match execute_fill(state, symbol, taker, maker_side, now) {
            Some(trade) => trades.push(trade),
            None => break,
        }
    }

    trades
}

/// Finalizes a LIMIT order once matching has run to completion: parks any
/// GTC residual, cancels an IOC/FOK residual, or marks it FILLED.
fn finalize_limit(state: &mut EngineState, mut order: Order, now: i64) -> Order {
    if order.remaining_qty > Decimal::ZERO {
        match order.time_in_force {
            TimeInForce::Gtc => {
                order.status = if order.filled_quantity > Decimal::ZERO {
                    OrderStatus::Partial
                } else {
                    OrderStatus::Pending
                };
                state.book.push(order.clone());
            }
            TimeInForce::Ioc | TimeInForce::Fok => {
                order.status = OrderStatus::Cancelled;
            }
        }
    } else {
        order.status = OrderStatus::Filled;
    }
    state.order_update_queue.push_back(order.clone());
    order
}

/// Finalizes a MARKET order: never parked. A residual is terminal
/// (`Cancelled`), correcting the spec §9 design note rather than leaving a
/// partially filled market order non-terminal.
fn finalize_market(state: &mut EngineState, mut order: Order) -> Order {
    order.status = if order.remaining_qty.is_zero() {
        OrderStatus::Filled
    } else {
        OrderStatus::Cancelled
    };
    state.order_update_queue.push_back(order.clone());
    order
}

impl MatchingEngine {
    /// Admits a new order (spec §4.B). Assigns `created_at`/`updated_at`
    /// under the engine lock so it is a monotonic time-priority tiebreaker
    /// (spec §5). Validation failures leave all state untouched.
    pub fn submit(&self, mut order: Order) -> Result<SubmitOutcome, EngineError> {
        validate(&order)?;

        let mut state = self.state.write();
        let now = now_millis();
        order.created_at = now;
        order.updated_at = now;

        match order.kind {
            OrderKind::StopLimit => {
                state.stop_wait_list.push(order.clone());
                state.order_update_queue.push_back(order.clone());
                Ok(SubmitOutcome {
                    order,
                    trades: Vec::new(),
                })
            }
            OrderKind::Limit => {
                if order.time_in_force == TimeInForce::Fok {
                    let available =
                        state
                            .book
                            .matchable_quantity(order.side, order.price, order.quantity);
                    if available < order.quantity {
                        order.status = OrderStatus::Rejected;
                        state.order_update_queue.push_back(order.clone());
                        return Ok(SubmitOutcome {
                            order,
                            trades: Vec::new(),
                        });
                    }
                }
                let limit_price = order.price;
                let trades = match_against_book(&mut state, &self.symbol, &mut order, limit_price, now);
                let order = finalize_limit(&mut state, order, now);
                assert!(!state.book.is_crossed(), "post-match cross on {}", self.symbol);
                Ok(SubmitOutcome { order, trades })
            }
            OrderKind::Market => {
                if order.time_in_force == TimeInForce::Fok {
                    let available = state.book.matchable_quantity(order.side, None, order.quantity);
                    if available < order.quantity {
                        order.status = OrderStatus::Rejected;
                        state.order_update_queue.push_back(order.clone());
                        return Ok(SubmitOutcome {
                            order,
                            trades: Vec::new(),
                        });
                    }
                }
                let trades = match_against_book(&mut state, &self.symbol, &mut order, None, now);
                let order = finalize_market(&mut state, order);
                assert!(!state.book.is_crossed(), "post-match cross on {}", self.symbol);
                Ok(SubmitOutcome { order, trades })
            }
        }
    }

    /// Re-submits a triggered stop order through the LIMIT path, preserving
    /// its original `created_at` (spec §9: "the triggered orders carry
    /// their original `created_at`").
    fn resubmit_triggered(&self, mut order: Order) -> SubmitOutcome {
        order.kind = OrderKind::Limit;
        let mut state = self.state.write();
        let now = now_millis();
        order.updated_at = now;
        let limit_price = order.price;
        let trades = match_against_book(&mut state, &self.symbol, &mut order, limit_price, now);
        let order = finalize_limit(&mut state, order, now);
        assert!(!state.book.is_crossed(), "post-match cross on {}", self.symbol);
        SubmitOutcome { order, trades }
    }

    /// Evaluates the stop-limit wait-list against `current_price`,
    /// converting and re-submitting every order whose trigger condition is
    /// met (spec §4.B `check_stops`).
    ///
    /// The selection phase runs under the write lock; the lock is released
    /// before each triggered order is resubmitted, to avoid self-deadlock
    /// (spec §5). Orders newly parked during this call are not considered
    /// in the same call (spec §5).
    pub fn check_stops(&self, current_price: Decimal) -> Vec<SubmitOutcome> {
        let triggered = {
            let mut state = self.state.write();
            let mut triggered = Vec::new();
            state.stop_wait_list.retain(|o| {
                let stop = o.stop_price.expect("stop-limit order carries a stop price");
                let fires = match o.side {
                    Side::Buy => current_price >= stop,
                    Side::Sell => current_price <= stop,
                };
                if fires {
                    triggered.push(o.clone());
                }
                !fires
            });
            triggered
        };

        triggered
            .into_iter()
            .map(|order| self.resubmit_triggered(order))
            .collect()
    }

    /// Cancels a resting order or parked stop order by id (spec §4.B
    /// `cancel(id)`). Returns `false` if `id` is not found resting anywhere
    /// — including for an already-terminal order, which by construction is
    /// no longer resting.
    pub fn cancel(&self, id: OrderId) -> bool {
        let mut state = self.state.write();
        let now = now_millis();

        if let Some(mut order) = state.book.remove_by_id(id) {
            order.status = OrderStatus::Cancelled;
            order.updated_at = now;
            state.order_update_queue.push_back(order);
            return true;
        }

        if let Some(pos) = state.stop_wait_list.iter().position(|o| o.id == id) {
            let mut order = state.stop_wait_list.remove(pos);
            order.status = OrderStatus::Cancelled;
            order.updated_at = now;
            state.order_update_queue.push_back(order);
            return true;
        }

        false
    }

    /// Best-effort snapshot of both sides, aggregated to `depth` levels
    /// (spec §4.B `snapshot(depth)`). Taken under a read lock; may race
    /// with an in-flight fill.
    pub fn snapshot(&self, depth: usize) -> BookSnapshot {
        let state = self.state.read();
        BookSnapshot {
            symbol: self.symbol.clone(),
            bids: state.book.aggregate_levels(Side::Buy, depth),
            asks: state.book.aggregate_levels(Side::Sell, depth),
            timestamp: now_millis(),
        }
    }
}
