//! Exchange coordinator: multiplexes symbols, routes submissions, drains
//! egress queues into persistence/settlement/the bus, and supervises stop
//! orders (spec §4.C).

mod error;
pub mod collaborators;

pub use error::CoordinatorError;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use dashmap::DashMap;
use rust_decimal::Decimal;
use tracing::{error, info, warn};

use crate::bus::{BusEvent, FanoutBus};
use crate::config::ExchangeConfig;
use crate::coordinator::collaborators::{BalanceStore, Persistence};
use crate::engine::{MatchingEngine, SubmitOutcome};
use crate::model::{Order, OrderId};
use crate::settlement;

/// Multi-symbol coordinator. Owns one [`MatchingEngine`] per registered
/// symbol plus the shared collaborators (spec §4.C).
pub struct ExchangeCoordinator {
    engines: DashMap<String, Arc<MatchingEngine>>,
    default_depth: usize,
    persistence: Arc<dyn Persistence>,
    balances: Arc<dyn BalanceStore>,
    bus: Arc<FanoutBus>,
}

impl ExchangeCoordinator {
    #[must_use]
    pub fn new(
        config: &ExchangeConfig,
        persistence: Arc<dyn Persistence>,
        balances: Arc<dyn BalanceStore>,
        bus: Arc<FanoutBus>,
    ) -> Self {
        let engines = DashMap::new();
        for symbol_config in &config.symbols {
            info!(symbol = %symbol_config.symbol, "registering engine");
            engines.insert(
                symbol_config.symbol.clone(),
                Arc::new(MatchingEngine::new(symbol_config.symbol.clone())),
            );
        }
        Self {
            engines,
            default_depth: config.default_depth,
            persistence,
            balances,
            bus,
        }
    }

    pub fn engine(&self, symbol: &str) -> Option<Arc<MatchingEngine>> {
        self.engines.get(symbol).map(|r| Arc::clone(r.value()))
    }

    pub fn symbols(&self) -> Vec<String> {
        self.engines.iter().map(|r| r.key().clone()).collect()
    }

    /// Admits `order` (spec §4.C): persist first so the client-visible id is
    /// durable even if the engine call fails, then forward to the engine for
    /// the unregistered-symbol case this rejects, matching, and parking.
    ///
    /// Unlike the legacy behavior (spec §9's flagged defect), an order for
    /// an unregistered symbol is rejected before any persistence write.
    pub async fn submit(&self, order: Order) -> Result<Order, CoordinatorError> {
        let engine = self
            .engine(&order.symbol)
            .ok_or_else(|| CoordinatorError::UnknownSymbol(order.symbol.clone()))?;

        self.persistence
            .save_order(&order)
            .await
            .map_err(CoordinatorError::Persistence)?;

        let outcome = self.run_submit(&engine, order)?;

        self.drain_trades(&engine).await;
        self.drain_order_updates(&engine).await;

        Ok(outcome.order)
    }

    /// Runs `engine.submit` isolated behind `catch_unwind` (SPEC_FULL §7): a
    /// panicking match pass (an internal invariant violation, e.g. a
    /// post-match cross) faults only this symbol's engine, not the whole
    /// coordinator.
    fn run_submit(
        &self,
        engine: &Arc<MatchingEngine>,
        order: Order,
    ) -> Result<SubmitOutcome, CoordinatorError> {
        let symbol = engine.symbol.clone();
        let engine = Arc::clone(engine);
        std::panic::catch_unwind(AssertUnwindSafe(move || engine.submit(order)))
            .unwrap_or_else(|_panic| {
                error!(symbol, "engine panicked during submit; symbol faulted");
                Err(crate::engine::EngineError::Faulted)
            })
            .map_err(CoordinatorError::Engine)
    }

    pub fn cancel(&self, symbol: &str, id: OrderId) -> Result<bool, CoordinatorError> {
        let engine = self
            .engine(symbol)
            .ok_or_else(|| CoordinatorError::UnknownSymbol(symbol.to_string()))?;
        Ok(engine.cancel(id))
    }

    /// Delegates to the engine's `check_stops` (spec §4.C), called from the
    /// external price-feed collaborator whenever `symbol`'s last-trade price
    /// moves.
    pub async fn on_price(&self, symbol: &str, price: Decimal) {
        let Some(engine) = self.engine(symbol) else {
            warn!(symbol, "on_price for unregistered symbol, ignoring");
            return;
        };
        let _outcomes = engine.check_stops(price);
        self.drain_trades(&engine).await;
        self.drain_order_updates(&engine).await;
    }

    /// Drains one engine's trade queue: persist, settle, then publish, in
    /// that order (spec §4.C egress draining). A failed persistence or
    /// settlement write is logged and does not abort the remaining trades
    /// (spec §7 propagation policy) — the trade is authoritative once
    /// emitted by the engine.
    async fn drain_trades(&self, engine: &Arc<MatchingEngine>) {
        let trades = engine.drain_trades();
        if trades.is_empty() {
            return;
        }
        info!(symbol = %engine.symbol, count = trades.len(), "draining trades");
        for trade in trades {
            if let Err(e) = self.persistence.save_trade(&trade).await {
                error!(trade_id = %trade.id, error = %e, "failed to persist trade");
            }
            if let Err(e) = settlement::settle(self.balances.as_ref(), &trade).await {
                error!(trade_id = %trade.id, error = %e, "settlement failed, trade remains authoritative");
            }
            self.bus.publish(BusEvent::Trade(trade));
        }
    }

    /// Drains one engine's order-update queue: persist, then publish, in
    /// emission order so the Bus sees monotonic `updated_at` per order
    /// (spec §4.C ordering guarantee). Because `drain_trades` is always
    /// called first within a single `submit`/`on_price` invocation, any
    /// FILLED/PARTIAL update reaches the bus after its Trade.
    async fn drain_order_updates(&self, engine: &Arc<MatchingEngine>) {
        let updates = engine.drain_order_updates();
        for order in updates {
            if let Err(e) = self.persistence.update_order(&order).await {
                error!(order_id = %order.id, error = %e, "failed to persist order update");
            }
            self.bus.publish(BusEvent::OrderUpdate(order));
        }
    }

    /// Aggregated book snapshot for `symbol` at the configured default
    /// depth, or `None` if the symbol is unregistered.
    pub fn snapshot(&self, symbol: &str) -> Option<crate::engine::BookSnapshot> {
        self.engine(symbol).map(|e| e.snapshot(self.default_depth))
    }
}
