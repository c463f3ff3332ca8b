//! Exchange coordinator error types.

use thiserror::Error;

/// Errors raised by [`super::ExchangeCoordinator::submit`] and friends.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CoordinatorError {
    /// An order was submitted for a symbol with no registered engine. The
    /// legacy behavior silently accepted these (spec §9's flagged defect);
    /// this is the corrected, rejecting behavior.
    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("engine rejected order: {0}")]
    Engine(#[from] crate::engine::EngineError),

    #[error("persistence failure while admitting order: {0}")]
    Persistence(String),
}
