//! Seeded synthetic OHLCV generation.
//!
//! A developer-only stand-in for real market data: a bounded random walk,
//! deterministic per (symbol, seed). Results produced on synthetic data are
//! tagged `has_synthetic` and should never be mistaken for research output.

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use cadence_core::data::PriceSeries;
use cadence_core::domain::Bar;

/// Daily bars between `start` and `end` inclusive for one symbol.
///
/// The per-symbol stream is derived from the seed and the symbol name, so
/// adding a symbol to the universe never reshuffles the others.
pub fn synthetic_series(symbol: &str, start: NaiveDate, end: NaiveDate, seed: u64) -> PriceSeries {
    let mut rng = StdRng::seed_from_u64(seed ^ symbol_salt(symbol));
    let mut price = rng.gen_range(5.0..500.0_f64);
    let mut bars = Vec::new();
    let mut day = start;
    while day <= end {
        let drift: f64 = rng.gen_range(-0.04..0.04);
        let open = price;
        let close = (price * (1.0 + drift)).max(0.01);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.02));
        let low = (open.min(close) * (1.0 - rng.gen_range(0.0..0.02))).max(0.001);
        let volume = rng.gen_range(10_000.0..5_000_000.0_f64);
        bars.push(Bar {
            ts: day.and_hms_opt(0, 0, 0).expect("midnight is always valid"),
            open,
            high,
            low,
            close,
            volume,
        });
        price = close;
        day += chrono::Duration::days(1);
    }
    PriceSeries::new(symbol, bars).expect("synthetic bars are well-formed by construction")
}

fn symbol_salt(symbol: &str) -> u64 {
    let hash = blake3::hash(symbol.as_bytes());
    u64::from_le_bytes(
        hash.as_bytes()[..8]
            .try_into()
            .expect("blake3 output is at least 8 bytes"),
    )
}
