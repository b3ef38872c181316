//! Dataset fingerprinting.
//!
//! A BLAKE3 hash over every raw series, stable across runs, recorded in
//! results so two backtests can be compared knowing they saw the same data.

use std::collections::BTreeMap;

use crate::data::PriceSeries;
use crate::domain::Symbol;

/// Content hash of the full input dataset (symbols + bars).
pub fn dataset_fingerprint(series: &BTreeMap<Symbol, PriceSeries>) -> String {
    let mut hasher = blake3::Hasher::new();
    for (symbol, series) in series {
        hasher.update(symbol.as_bytes());
        for bar in series.bars() {
            hasher.update(&bar.ts.and_utc().timestamp().to_le_bytes());
            hasher.update(&bar.open.to_le_bytes());
            hasher.update(&bar.high.to_le_bytes());
            hasher.update(&bar.low.to_le_bytes());
            hasher.update(&bar.close.to_le_bytes());
            hasher.update(&bar.volume.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}
