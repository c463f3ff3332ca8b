//! Shared data model: orders, trades, book levels, tickers, balances.
//!
//! Mirrors spec §3 exactly. Money fields use [`rust_decimal::Decimal`] rather
//! than floats so that conservation invariants (G4, G5) hold by exact
//! equality instead of up to floating-point epsilon.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque unique identifier shared by orders and trades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id(pub Uuid);

impl Id {
    /// Generates a new random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for Id {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order identifier. Distinct type alias from [`TradeId`] for readability at
/// call sites; both are backed by [`Id`].
pub type OrderId = Id;
/// Trade identifier.
pub type TradeId = Id;
/// Opaque user identifier.
pub type UserId = Id;

/// Side of an order or trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// The side that rests on the opposite side of the book from this one.
    #[must_use]
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Order type, per spec §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderKind {
    Limit,
    Market,
    StopLimit,
}

/// Time-in-force policy, per spec §3 and the §9 design note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Good-Till-Cancelled: residual rests on the book.
    #[default]
    Gtc,
    /// Immediate-Or-Cancel: any residual after crossing is cancelled.
    Ioc,
    /// Fill-Or-Kill: the whole order is rejected unless fully fillable now.
    Fok,
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeInForce::Gtc => write!(f, "GTC"),
            TimeInForce::Ioc => write!(f, "IOC"),
            TimeInForce::Fok => write!(f, "FOK"),
        }
    }
}

/// Lifecycle status of an order, per spec §3. `Filled`, `Cancelled`, and
/// `Rejected` are terminal: no further mutation occurs once an order reaches
/// one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Partial,
    Filled,
    Cancelled,
    Rejected,
}

impl OrderStatus {
    /// Terminal statuses never mutate further (spec §3 lifecycle note).
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }
}

/// An order, admitted into a single symbol's matching engine.
///
/// `created_at` MUST be assigned at engine admission (spec §3), never by the
/// client — it doubles as the time-priority tiebreaker (G2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub symbol: String,
    pub side: Side,
    pub kind: OrderKind,
    /// Original quantity, immutable after admission.
    pub quantity: Decimal,
    /// Limit price; ignored for `Market` orders.
    pub price: Option<Decimal>,
    /// Trigger price; only meaningful for `StopLimit` orders.
    pub stop_price: Option<Decimal>,
    pub filled_quantity: Decimal,
    pub remaining_qty: Decimal,
    pub status: OrderStatus,
    pub time_in_force: TimeInForce,
    /// Monotonic admission timestamp (milliseconds), assigned by the engine.
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    /// Constructs a new order request prior to admission. `created_at` /
    /// `updated_at` are set to 0 here; the engine overwrites them on
    /// admission (spec §3, §4.B).
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: UserId,
        symbol: impl Into<String>,
        side: Side,
        kind: OrderKind,
        quantity: Decimal,
        price: Option<Decimal>,
        stop_price: Option<Decimal>,
        time_in_force: TimeInForce,
    ) -> Self {
        Self {
            id: OrderId::new(),
            user_id,
            symbol: symbol.into(),
            side,
            kind,
            quantity,
            price,
            stop_price,
            filled_quantity: Decimal::ZERO,
            remaining_qty: quantity,
            status: OrderStatus::Pending,
            time_in_force,
            created_at: 0,
            updated_at: 0,
        }
    }

    /// Invariant check used in tests and `debug_assert!`s: `filled_quantity +
    /// remaining_qty == quantity` (spec §3).
    #[must_use]
    pub fn quantity_is_conserved(&self) -> bool {
        self.filled_quantity + self.remaining_qty == self.quantity
    }
}

/// An immutable trade record, emitted by the matching engine.
///
/// `buy_order_id`/`sell_order_id` are normalized by side (not by role);
/// `maker_order_id`/`taker_order_id` identify which side was resting vs
/// aggressing (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub symbol: String,
    pub price: Decimal,
    pub quantity: Decimal,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub maker_order_id: OrderId,
    pub taker_order_id: OrderId,
    pub executed_at: i64,
}

/// A single aggregated price level, derived from resting orders — never
/// stored (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBookLevel {
    pub price: Decimal,
    pub quantity: Decimal,
    pub orders: usize,
}

/// Rolling 24h ticker. The core only reads `price` (to feed stop checks);
/// maintaining the rolling stats is an external concern (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: String,
    pub price: Decimal,
    pub high_24h: Decimal,
    pub low_24h: Decimal,
    pub volume_24h: Decimal,
    pub change_24h: Decimal,
    pub updated_at: i64,
}

/// A user's holdings of one asset. Keyed externally by `(user_id, asset)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub available: Decimal,
    pub locked: Decimal,
}

impl Balance {
    #[must_use]
    pub fn zero() -> Self {
        Self {
            available: Decimal::ZERO,
            locked: Decimal::ZERO,
        }
    }

    /// Sum of `available + locked`, used by the conservation check (G5).
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.available + self.locked
    }
}

/// Monotonic millisecond clock used for `created_at`/`updated_at` timestamps.
///
/// A dedicated function (rather than scattering `SystemTime::now()` calls)
/// keeps the single admission-time clock read auditable, matching the
/// teacher crate's `current_time_millis` convention.
#[must_use]
pub fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn side_opposite_round_trips() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }

    #[test]
    fn order_status_terminal_classification() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Partial.is_terminal());
        assert!(OrderStatus::Filled.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(OrderStatus::Rejected.is_terminal());
    }

    #[test]
    fn new_order_starts_pending_with_full_remaining() {
        let order = Order::new(
            UserId::new(),
            "BTC-USD",
            Side::Buy,
            OrderKind::Limit,
            dec!(1.0),
            Some(dec!(100.0)),
            None,
            TimeInForce::Gtc,
        );
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.remaining_qty, dec!(1.0));
        assert_eq!(order.filled_quantity, Decimal::ZERO);
        assert!(order.quantity_is_conserved());
    }

    #[test]
    fn balance_total_sums_available_and_locked() {
        let balance = Balance {
            available: dec!(10),
            locked: dec!(5),
        };
        assert_eq!(balance.total(), dec!(15));
    }
}
