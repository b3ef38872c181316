//! Bar — the fundamental market data unit.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Raw OHLCV bar for a single symbol at a single timestamp.
///
/// Bars arrive already cleaned from the data layer: the simulation core never
/// sees NaN prices. Volume is carried for completeness; the engine itself only
/// reads `high` (signals) and `close` (transactions, NAV).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub ts: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Basic OHLCV sanity check: high >= low, high bounds open/close, positive prices.
    pub fn is_sane(&self) -> bool {
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
            && self.volume >= 0.0
            && !self.open.is_nan()
            && !self.high.is_nan()
            && !self.low.is_nan()
            && !self.close.is_nan()
    }
}
