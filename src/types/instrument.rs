//! Instrument identification.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Asset class of an instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    /// Spot market
    Spot,
    /// Margin market
    Margin,
    /// Dated futures
    Futures,
    /// Perpetual swaps
    PerpetualSwap,
    /// Options
    Options,
    /// Index
    Index,
}

impl AssetClass {
    /// Wire name of the asset class
    pub fn as_str(self) -> &'static str {
        match self {
            AssetClass::Spot => "spot",
            AssetClass::Margin => "margin",
            AssetClass::Futures => "futures",
            AssetClass::PerpetualSwap => "perpetual_swap",
            AssetClass::Options => "options",
            AssetClass::Index => "index",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one orderbook: venue + trading pair + asset class
///
/// # Example
///
/// ```rust
/// use orderbook_replica::types::{AssetClass, InstrumentKey};
///
/// let key = InstrumentKey::new("okx", "BTC-USDT", AssetClass::PerpetualSwap);
/// assert_eq!(key.to_string(), "okx BTC-USDT perpetual_swap");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstrumentKey {
    /// Venue name, e.g. `kraken`
    pub venue: String,
    /// Trading pair, e.g. `BTC-USD`
    pub pair: String,
    /// Asset class
    pub asset: AssetClass,
}

impl InstrumentKey {
    /// Create a new instrument key
    pub fn new(venue: impl Into<String>, pair: impl Into<String>, asset: AssetClass) -> Self {
        Self {
            venue: venue.into(),
            pair: pair.into(),
            asset,
        }
    }

    /// Returns the name of the first unset component, if any
    pub(crate) fn missing_component(&self) -> Option<&'static str> {
        if self.venue.trim().is_empty() {
            Some("venue")
        } else if self.pair.trim().is_empty() {
            Some("pair")
        } else {
            None
        }
    }

    /// Check that venue and pair are both set
    pub fn is_populated(&self) -> bool {
        self.missing_component().is_none()
    }
}

impl fmt::Display for InstrumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.venue, self.pair, self.asset)
    }
}
