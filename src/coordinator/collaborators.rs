//! External collaborator traits (spec §6) and in-memory stand-ins.
//!
//! Persistence, the balance ledger, and the price feed all live outside the
//! core crate's scope (spec §1). These traits narrow the contract to what
//! the coordinator and settlement path actually call; the `Memory*` structs
//! below exist so the coordinator is fully exercisable in tests without a
//! real database.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::model::{Balance, Order, OrderId, Ticker, Trade, UserId};

/// Order/trade/ticker/balance durability, out of scope for this crate
/// (spec §1, §6). Implementers back this with a real database.
#[async_trait]
pub trait Persistence: Send + Sync {
    async fn save_order(&self, order: &Order) -> Result<(), String>;
    async fn update_order(&self, order: &Order) -> Result<(), String>;
    async fn get_order(&self, id: OrderId) -> Option<Order>;
    async fn get_orders_by_user(&self, user_id: UserId, limit: usize) -> Vec<Order>;
    async fn get_open_orders(&self, symbol: &str) -> Vec<Order>;
    async fn save_trade(&self, trade: &Trade) -> Result<(), String>;
    async fn get_recent_trades(&self, symbol: &str, limit: usize) -> Vec<Trade>;
    async fn get_user_trades(&self, user_id: UserId, limit: usize) -> Vec<Trade>;
    async fn get_ticker(&self, symbol: &str) -> Option<Ticker>;
    async fn update_ticker(&self, ticker: &Ticker) -> Result<(), String>;
    async fn get_all_tickers(&self) -> Vec<Ticker>;
}

/// The funds ledger (spec §4.D, §6). `settle_trade` expresses the "single
/// transaction touching four rows" requirement as one trait method so an
/// implementer can make the whole mutation atomic, rather than exposing
/// four independent calls the coordinator would have to sequence itself.
#[async_trait]
pub trait BalanceStore: Send + Sync {
    async fn get_balance(&self, user_id: UserId, asset: &str) -> Balance;
    async fn update_balance(&self, user_id: UserId, asset: &str, available: Decimal, locked: Decimal);
    async fn lock_balance(&self, user_id: UserId, asset: &str, amount: Decimal) -> Result<(), String>;
    async fn unlock_balance(&self, user_id: UserId, asset: &str, amount: Decimal) -> Result<(), String>;

    /// Applies all four settlement mutations for one trade atomically
    /// (spec §4.D): buyer loses `quote` notional and gains `base` quantity;
    /// seller is the mirror image.
    async fn settle_trade(
        &self,
        buyer_id: UserId,
        seller_id: UserId,
        base_asset: &str,
        quote_asset: &str,
        quantity: Decimal,
        notional: Decimal,
    ) -> Result<(), String>;
}

/// `DashMap`-backed in-memory `Persistence`, for tests and as a stand-in for
/// the out-of-scope database collaborator (spec §1).
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    orders: DashMap<OrderId, Order>,
    trades_by_symbol: DashMap<String, Vec<Trade>>,
    tickers: DashMap<String, Ticker>,
}

impl MemoryPersistence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Persistence for MemoryPersistence {
    async fn save_order(&self, order: &Order) -> Result<(), String> {
        self.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn update_order(&self, order: &Order) -> Result<(), String> {
        self.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Option<Order> {
        self.orders.get(&id).map(|r| r.clone())
    }

    async fn get_orders_by_user(&self, user_id: UserId, limit: usize) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.clone())
            .collect();
        orders.sort_by_key(|o| std::cmp::Reverse(o.created_at));
        orders.truncate(limit);
        orders
    }

    async fn get_open_orders(&self, symbol: &str) -> Vec<Order> {
        self.orders
            .iter()
            .filter(|r| r.symbol == symbol && !r.status.is_terminal())
            .map(|r| r.clone())
            .collect()
    }

    async fn save_trade(&self, trade: &Trade) -> Result<(), String> {
        self.trades_by_symbol
            .entry(trade.symbol.clone())
            .or_default()
            .push(trade.clone());
        Ok(())
    }

    async fn get_recent_trades(&self, symbol: &str, limit: usize) -> Vec<Trade> {
        self.trades_by_symbol
            .get(symbol)
            .map(|trades| {
                let mut trades = trades.clone();
                trades.reverse();
                trades.truncate(limit);
                trades
            })
            .unwrap_or_default()
    }

    async fn get_user_trades(&self, user_id: UserId, limit: usize) -> Vec<Trade> {
        let mut trades: Vec<Trade> = self
            .trades_by_symbol
            .iter()
            .flat_map(|entry| entry.value().clone())
            .filter(|t| t.buyer_id == user_id || t.seller_id == user_id)
            .collect();
        trades.sort_by_key(|t| std::cmp::Reverse(t.executed_at));
        trades.truncate(limit);
        trades
    }

    async fn get_ticker(&self, symbol: &str) -> Option<Ticker> {
        self.tickers.get(symbol).map(|r| r.clone())
    }

    async fn update_ticker(&self, ticker: &Ticker) -> Result<(), String> {
        self.tickers.insert(ticker.symbol.clone(), ticker.clone());
        Ok(())
    }

    async fn get_all_tickers(&self) -> Vec<Ticker> {
        self.tickers.iter().map(|r| r.clone()).collect()
    }
}

/// `DashMap`-backed in-memory `BalanceStore`. Row-level locking per
/// `(user_id, asset)` is a `parking_lot::Mutex` guarding that row's
/// `Balance`, wrapped in an `Arc` so a row's lock can be acquired after the
/// `DashMap` shard guard that produced it has already been dropped —
/// `DashMap`'s `RefMut` is not re-entrant, so holding more than one at a time
/// risks a same-shard self-deadlock when two of the four settlement keys
/// happen to hash to the same shard. `settle_trade` clones out each row's
/// `Arc` one at a time, then locks all four (sorted by key to avoid
/// lock-order deadlock across threads) only once every shard guard is gone.
#[derive(Debug, Default)]
pub struct MemoryBalanceStore {
    rows: DashMap<(UserId, String), Arc<Mutex<Balance>>>,
}

impl MemoryBalanceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the row for `(user_id, asset)`, inserting a zero balance if
    /// absent. The `DashMap` shard guard is dropped before returning.
    fn row(&self, user_id: UserId, asset: &str) -> Arc<Mutex<Balance>> {
        Arc::clone(
            &self
                .rows
                .entry((user_id, asset.to_string()))
                .or_insert_with(|| Arc::new(Mutex::new(Balance::zero()))),
        )
    }

    /// Test/seed helper: sets a user's balance for one asset directly.
    pub fn seed(&self, user_id: UserId, asset: impl Into<String>, balance: Balance) {
        self.rows
            .insert((user_id, asset.into()), Arc::new(Mutex::new(balance)));
    }
}

#[async_trait]
impl BalanceStore for MemoryBalanceStore {
    async fn get_balance(&self, user_id: UserId, asset: &str) -> Balance {
        self.rows
            .get(&(user_id, asset.to_string()))
            .map(|row| *row.lock())
            .unwrap_or_else(Balance::zero)
    }

    async fn update_balance(&self, user_id: UserId, asset: &str, available: Decimal, locked: Decimal) {
        let row = self.row(user_id, asset);
        let mut balance = row.lock();
        balance.available = available;
        balance.locked = locked;
    }

    async fn lock_balance(&self, user_id: UserId, asset: &str, amount: Decimal) -> Result<(), String> {
        let row = self.row(user_id, asset);
        let mut balance = row.lock();
        if balance.available < amount {
            return Err(format!(
                "insufficient {asset} balance for user {user_id}: have {}, need {amount}",
                balance.available
            ));
        }
        balance.available -= amount;
        balance.locked += amount;
        Ok(())
    }

    async fn unlock_balance(&self, user_id: UserId, asset: &str, amount: Decimal) -> Result<(), String> {
        let row = self.row(user_id, asset);
        let mut balance = row.lock();
        balance.locked -= amount;
        balance.available += amount;
        Ok(())
    }

    async fn settle_trade(
        &self,
        buyer_id: UserId,
        seller_id: UserId,
        base_asset: &str,
        quote_asset: &str,
        quantity: Decimal,
        notional: Decimal,
    ) -> Result<(), String> {
        // Lock ordering: sort the four row keys so concurrent settlements
        // never acquire the same pair of rows in opposite orders.
        let mut keys = vec![
            (buyer_id, quote_asset.to_string()),
            (buyer_id, base_asset.to_string()),
            (seller_id, quote_asset.to_string()),
            (seller_id, base_asset.to_string()),
        ];
        keys.sort();
        keys.dedup();

        // Clone each row's Arc out one at a time so no two DashMap shard
        // guards are ever held simultaneously, then lock all rows in the
        // sorted key order above.
        let rows: Vec<Arc<Mutex<Balance>>> = keys
            .iter()
            .map(|(user_id, asset)| self.row(*user_id, asset))
            .collect();
        let mut guards: Vec<_> = rows.iter().map(|row| row.lock()).collect();

        let index_of = |key: &(UserId, String)| keys.iter().position(|k| k == key).expect("key present");
        guards[index_of(&(buyer_id, quote_asset.to_string()))].available -= notional;
        guards[index_of(&(buyer_id, base_asset.to_string()))].available += quantity;
        guards[index_of(&(seller_id, quote_asset.to_string()))].available += notional;
        guards[index_of(&(seller_id, base_asset.to_string()))].available -= quantity;

        Ok(())
    }
}
