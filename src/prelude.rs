//! Convenience re-exports of the crate's most commonly used types.

pub use crate::book::{BookError, OrderBook, PriceLevel};
pub use crate::bus::{BusEvent, FanoutBus, SubscriptionId};
pub use crate::config::{BusConfig, ExchangeConfig, SymbolConfig};
pub use crate::coordinator::collaborators::{BalanceStore, MemoryBalanceStore, MemoryPersistence, Persistence};
pub use crate::coordinator::{CoordinatorError, ExchangeCoordinator};
pub use crate::engine::{BookSnapshot, EngineError, MatchingEngine, SubmitOutcome};
pub use crate::error::ExchangeError;
pub use crate::model::{
    Balance, Id, Order, OrderBookLevel, OrderId, OrderKind, OrderStatus, Side, Ticker, TimeInForce,
    Trade, TradeId, UserId,
};
pub use crate::settlement::SettlementError;
