//! Static exchange configuration: which symbols are registered and at what
//! tick/lot granularity (SPEC_FULL §6). Replaces spec.md §6's
//! environment-variable transport-layer surface, which configures the
//! out-of-scope HTTP/DB layer, not this crate.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One registered trading symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolConfig {
    pub symbol: String,
    /// Minimum price increment, if enforced. Not validated by the core
    /// matching loop (spec §9 leaves granularity enforcement to the
    /// transport/validation layer); carried here for that layer's use.
    pub tick_size: Option<Decimal>,
    /// Minimum order-size increment, if enforced.
    pub lot_size: Option<Decimal>,
}

impl SymbolConfig {
    #[must_use]
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            tick_size: None,
            lot_size: None,
        }
    }
}

/// Bus sizing knobs (SPEC_FULL §6).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BusConfig {
    /// Per-subscriber bounded channel capacity.
    pub subscriber_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            subscriber_capacity: 1024,
        }
    }
}

/// Top-level exchange configuration: the symbol directory plus defaults
/// (SPEC_FULL §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    pub symbols: Vec<SymbolConfig>,
    /// Default depth used when a caller requests `snapshot` without an
    /// explicit depth (spec §6's REST surface default of 20).
    pub default_depth: usize,
    pub bus: BusConfig,
}

impl ExchangeConfig {
    #[must_use]
    pub fn new(symbols: Vec<SymbolConfig>) -> Self {
        Self {
            symbols,
            default_depth: 20,
            bus: BusConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_depth_matches_rest_surface_default() {
        let config = ExchangeConfig::new(vec![SymbolConfig::new("BTC-USD")]);
        assert_eq!(config.default_depth, 20);
        assert_eq!(config.symbols.len(), 1);
    }
}
