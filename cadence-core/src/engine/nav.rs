//! NAV accumulation and reconciliation.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::domain::{PortfolioLedger, Symbol, SymbolLedger};

/// Relative tolerance for NAV reconciliation.
pub const NAV_REL_TOLERANCE: f64 = 1e-9;

/// NAV reconciliation mismatch beyond floating-point tolerance.
///
/// Raised by `audit` (and the test suites); the engine never swallows one.
#[derive(Debug, Error)]
#[error("NAV reconciliation failed at step {step}: ledger has {ledger_nav}, recomputed {recomputed_nav}")]
pub struct InvariantViolation {
    pub step: usize,
    pub ledger_nav: f64,
    pub recomputed_nav: f64,
}

/// Net asset value: cash plus units-weighted closes.
///
/// Pure function, callable at every step and independently for
/// verification. A `None` close contributes nothing; that case is only
/// reachable while the corresponding units are zero.
pub fn compute<I>(cash: f64, holdings: I) -> f64
where
    I: IntoIterator<Item = (f64, Option<f64>)>,
{
    let mut total = cash;
    for (units, close) in holdings {
        match close {
            Some(close) => total += units * close,
            None => debug_assert!(units == 0.0, "held units with no known close"),
        }
    }
    total
}

/// Recompute NAV at one step from the symbol ledgers.
pub fn compute_at(symbols: &BTreeMap<Symbol, SymbolLedger>, cash: f64, idx: usize) -> f64 {
    compute(
        cash,
        symbols.values().map(|ledger| {
            let step = ledger.step(idx);
            (step.units, step.close)
        }),
    )
}

/// Verify `nav == cash + Σ units·close` at every step of a finished run.
pub fn audit(
    portfolio: &PortfolioLedger,
    symbols: &BTreeMap<Symbol, SymbolLedger>,
) -> Result<(), InvariantViolation> {
    for idx in 0..portfolio.len() {
        let row = portfolio.step(idx);
        let recomputed = compute_at(symbols, row.cash, idx);
        let scale = 1.0_f64.max(row.nav.abs()).max(recomputed.abs());
        if (row.nav - recomputed).abs() > NAV_REL_TOLERANCE * scale {
            return Err(InvariantViolation {
                step: idx,
                ledger_nav: row.nav,
                recomputed_nav: recomputed,
            });
        }
    }
    Ok(())
}
