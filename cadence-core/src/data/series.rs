//! Validated raw price series, one per symbol.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Bar, Symbol};

/// Validation errors for a raw series.
#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("{symbol}: timestamps out of order at {ts}")]
    OutOfOrder { symbol: Symbol, ts: NaiveDateTime },

    #[error("{symbol}: duplicate timestamp {ts}")]
    DuplicateTimestamp { symbol: Symbol, ts: NaiveDateTime },

    #[error("{symbol}: invalid OHLCV bar at {ts}")]
    InsaneBar { symbol: Symbol, ts: NaiveDateTime },
}

/// An ordered OHLCV time series for a single symbol.
///
/// Construction validates the input collaborator's contract: unique,
/// strictly increasing timestamps, volume >= 0 and OHLC sanity. An empty
/// series is legal — such a symbol participates in a run with zero units
/// for its entire lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: Symbol,
    bars: Vec<Bar>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<Symbol>, bars: Vec<Bar>) -> Result<Self, SeriesError> {
        let symbol = symbol.into();
        for bar in &bars {
            if !bar.is_sane() {
                return Err(SeriesError::InsaneBar {
                    symbol,
                    ts: bar.ts,
                });
            }
        }
        for pair in bars.windows(2) {
            if pair[1].ts == pair[0].ts {
                return Err(SeriesError::DuplicateTimestamp {
                    symbol,
                    ts: pair[1].ts,
                });
            }
            if pair[1].ts < pair[0].ts {
                return Err(SeriesError::OutOfOrder {
                    symbol,
                    ts: pair[1].ts,
                });
            }
        }
        Ok(Self { symbol, bars })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}
