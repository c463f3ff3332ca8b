//! # dauction-core
//!
//! Matching engine, exchange coordinator, settlement, and real-time fan-out
//! bus for a multi-symbol continuous double-auction exchange.
//!
//! ## Key Features
//!
//! - **Price-time priority matching**: one [`engine::MatchingEngine`] per
//!   symbol, `LIMIT`/`MARKET`/`STOP_LIMIT` order types, `GTC`/`IOC`/`FOK`
//!   time-in-force semantics.
//! - **Exact-decimal money**: every price, quantity, and balance field is a
//!   [`rust_decimal::Decimal`], so conservation invariants hold by exact
//!   equality rather than floating-point epsilon.
//! - **Coarse per-engine locking**: one `parking_lot::RwLock` per symbol
//!   guards its book, stop wait-list, and egress queues; never held across a
//!   call into a collaborator.
//! - **Narrow collaborator traits**: [`coordinator::collaborators::Persistence`]
//!   and [`coordinator::collaborators::BalanceStore`] keep durability and the
//!   funds ledger out of this crate's scope, with in-memory implementations
//!   for tests.
//!
//! ## Status
//!
//! This crate implements the matching/settlement/fan-out core only; the
//! REST/WebSocket transport and real database/cache layers are out of scope
//! and are expected to be built against the traits this crate exposes.

pub mod book;
pub mod bus;
pub mod config;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod model;
pub mod prelude;
pub mod settlement;

pub use error::ExchangeError;
