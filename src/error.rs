//! Top-level error type aggregating every module's error enum.

use thiserror::Error;

use crate::book::BookError;
use crate::coordinator::CoordinatorError;
use crate::engine::EngineError;
use crate::settlement::SettlementError;

/// Crate-wide error, composed from each module's `thiserror` enum (spec §7).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExchangeError {
    #[error(transparent)]
    Book(#[from] BookError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),

    #[error(transparent)]
    Settlement(#[from] SettlementError),
}
