//! Signal generation and the mandatory one-bar lag.
//!
//! Strategies are price-only: `evaluate` receives the aligned series and an
//! index and may read `bars[..=idx]` only — never portfolio state, never
//! bars past the index. The engine consumes *lagged* series: the value
//! exposed at step `t` is the strategy's value as of `t-1`, so a transaction
//! sized at `t`'s close only ever acts on information available strictly
//! before that close.

pub mod breakout;

use std::collections::BTreeMap;

use crate::data::AlignedSeries;
use crate::domain::{Signal, Symbol};

pub use breakout::Breakout;

/// A signal-generation capability, polymorphic over implementations.
///
/// # Architecture invariant
/// `evaluate` must only use `series.bars[..=idx]`. Implementations that
/// peek past the index introduce lookahead bias; the lookahead test suite
/// exercises this contract.
pub trait SignalStrategy: Send + Sync {
    /// Human-readable name (e.g. "breakout_5_20").
    fn name(&self) -> String;

    /// Number of defined bars needed before the strategy can produce a
    /// non-default signal.
    fn warmup_bars(&self) -> usize;

    /// Exposure intent at `idx`, computed from history up to and including
    /// `idx`.
    fn evaluate(&self, series: &AlignedSeries, idx: usize) -> Signal;

    /// The whole unlagged signal series, same length as the calendar.
    fn generate(&self, series: &AlignedSeries) -> Vec<Signal> {
        (0..series.len()).map(|idx| self.evaluate(series, idx)).collect()
    }
}

/// Shift a signal series by one step, seeding the first step with `Flat`.
///
/// This is the adapter between strategy output and the state machine: the
/// lag is mandatory, not an option.
pub fn lag_signals(raw: &[Signal]) -> Vec<Signal> {
    let mut lagged = Vec::with_capacity(raw.len());
    if raw.is_empty() {
        return lagged;
    }
    lagged.push(Signal::Flat);
    lagged.extend_from_slice(&raw[..raw.len() - 1]);
    lagged
}

/// Generate and lag signals for every symbol.
///
/// Sequential; the runner fans this out per symbol since each series is
/// independent.
pub fn lagged_signals(
    strategy: &dyn SignalStrategy,
    aligned: &BTreeMap<Symbol, AlignedSeries>,
) -> BTreeMap<Symbol, Vec<Signal>> {
    aligned
        .iter()
        .map(|(symbol, series)| (symbol.clone(), lag_signals(&strategy.generate(series))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lag_shifts_by_one_and_seeds_flat() {
        let raw = vec![Signal::Long, Signal::Long, Signal::Flat, Signal::Long];
        let lagged = lag_signals(&raw);
        assert_eq!(
            lagged,
            vec![Signal::Flat, Signal::Long, Signal::Long, Signal::Flat]
        );
    }

    #[test]
    fn lag_of_empty_is_empty() {
        assert!(lag_signals(&[]).is_empty());
    }

    #[test]
    fn lag_drops_final_value() {
        // the strategy's value at the last step is never observable
        let raw = vec![Signal::Flat, Signal::Long];
        let lagged = lag_signals(&raw);
        assert_eq!(lagged.last(), Some(&Signal::Flat));
    }
}
