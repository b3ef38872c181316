//! Per-step transition: carry-forward, event reset, NAV refresh.

use std::collections::BTreeMap;

use crate::domain::{PortfolioLedger, Symbol, SymbolLedger};

use super::nav;

/// Advance every ledger from `prev` to `curr`: copy the state fields, zero
/// the event fields, then recompute NAV at `curr` from the carried-forward
/// holdings and `curr`'s closes. Runs at every step, rebalance or not.
pub(crate) fn advance(
    portfolio: &mut PortfolioLedger,
    symbols: &mut BTreeMap<Symbol, SymbolLedger>,
    prev: usize,
    curr: usize,
) {
    portfolio.carry_forward(prev, curr);
    for ledger in symbols.values_mut() {
        ledger.carry_forward(prev, curr);
    }
    mark_nav(portfolio, symbols, curr);
}

/// Write the recomputed NAV into the portfolio row at `idx`.
pub(crate) fn mark_nav(
    portfolio: &mut PortfolioLedger,
    symbols: &BTreeMap<Symbol, SymbolLedger>,
    idx: usize,
) {
    let cash = portfolio.step(idx).cash;
    portfolio.step_mut(idx).nav = nav::compute_at(symbols, cash, idx);
}
