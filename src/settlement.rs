//! Settlement: turns a [`Trade`] into the four balance mutations spec §4.D
//! requires, applied atomically through the [`BalanceStore`] collaborator.

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::trace;

use crate::coordinator::collaborators::BalanceStore;
use crate::model::Trade;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SettlementError {
    #[error("malformed symbol for settlement: {0}")]
    MalformedSymbol(String),

    #[error("balance store rejected settlement: {0}")]
    Store(String),
}

/// Splits a `BASE-QUOTE` symbol (e.g. `BTC-USD`) into its two asset legs.
fn split_symbol(symbol: &str) -> Result<(&str, &str), SettlementError> {
    symbol
        .split_once('-')
        .ok_or_else(|| SettlementError::MalformedSymbol(symbol.to_string()))
}

/// Settles one trade: `tv = price × quantity`; buyer pays `tv` quote and
/// receives `quantity` base, seller is the mirror image (spec §4.D).
///
/// Funds were already reserved at admission time by the out-of-scope
/// fund-lock collaborator; this function does not re-check sufficiency, it
/// only moves already-locked/available balances per the settlement rule.
pub async fn settle(store: &dyn BalanceStore, trade: &Trade) -> Result<(), SettlementError> {
    let (base, quote) = split_symbol(&trade.symbol)?;
    let notional = trade.price * trade.quantity;

    trace!(
        trade_id = %trade.id,
        symbol = %trade.symbol,
        quantity = %trade.quantity,
        notional = %notional,
        "settling trade"
    );

    store
        .settle_trade(
            trade.buyer_id,
            trade.seller_id,
            base,
            quote,
            trade.quantity,
            notional,
        )
        .await
        .map_err(SettlementError::Store)
}
