//! Matching engine error types.

use rust_decimal::Decimal;
use thiserror::Error;

/// Validation errors raised by [`super::MatchingEngine::submit`] before any
/// state mutation occurs (spec §7: "Validation... do not mutate state").
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EngineError {
    #[error("order quantity must be positive, got {0}")]
    NonPositiveQuantity(Decimal),

    #[error("limit/stop-limit order must carry a positive price, got {0:?}")]
    NonPositivePrice(Decimal),

    #[error("stop-limit order must carry a positive stop price, got {0:?}")]
    NonPositiveStopPrice(Decimal),

    #[error("limit/stop-limit order submitted without a price")]
    MissingPrice,

    #[error("stop-limit order submitted without a stop price")]
    MissingStopPrice,

    /// Raised by the coordinator, not the engine itself, when a match pass
    /// panics (an internal invariant violation, e.g. a post-match cross)
    /// and the symbol's engine must be treated as faulted (spec §7).
    #[error("engine faulted: an internal invariant was violated during matching")]
    Faulted,
}
