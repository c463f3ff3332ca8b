//! Order book error types.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::model::{OrderId, Side};

/// Errors raised directly by [`super::OrderBook`] operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BookError {
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("order quantity must be positive, got {0}")]
    NonPositiveQuantity(Decimal),

    #[error("limit/stop-limit order price must be positive, got {0}")]
    NonPositivePrice(Decimal),

    #[error("post-match cross detected on {side} book: best {side} {price} would cross")]
    CrossDetected { side: Side, price: Decimal },
}
