//! The close/open/reallocate protocol executed at rebalance steps.

use std::collections::BTreeMap;

use crate::domain::{PortfolioLedger, RebalancePolicy, Signal, Symbol, SymbolLedger};

use super::step;

/// Run the rebalance protocol at `curr`, with `prev` the immediately
/// preceding calendar step.
///
/// Symbols whose aligned close is undefined at `curr` sit the step out
/// entirely: no signal-state update, no close, no open. Per-symbol closes
/// are independent of one another; portfolio totals are accumulated as each
/// symbol settles, and the iteration order (lexicographic, from the
/// `BTreeMap`) makes runs reproducible byte for byte.
pub(crate) fn execute(
    policy: RebalancePolicy,
    fee: f64,
    portfolio: &mut PortfolioLedger,
    symbols: &mut BTreeMap<Symbol, SymbolLedger>,
    signals: &BTreeMap<Symbol, Vec<Signal>>,
    prev: usize,
    curr: usize,
) {
    let total_symbols = symbols.len();

    // Classification: lagged signal at curr vs carried signal state at prev.
    let mut to_close: Vec<Symbol> = Vec::new();
    let mut to_open: Vec<Symbol> = Vec::new();
    for (symbol, ledger) in symbols.iter_mut() {
        if ledger.step(curr).close.is_none() {
            continue;
        }
        let prev_signal = ledger.step(prev).signal;
        let curr_signal = signals
            .get(symbol)
            .and_then(|s| s.get(curr))
            .copied()
            .unwrap_or(Signal::Flat);
        ledger.step_mut(curr).signal = curr_signal;
        match (prev_signal, curr_signal) {
            (Signal::Long, Signal::Flat) if ledger.step(prev).units > 0.0 => {
                to_close.push(symbol.clone());
            }
            (Signal::Flat, Signal::Long) => to_open.push(symbol.clone()),
            _ => {}
        }
    }

    // Close phase: sell everything flagged, net of fee, independently per
    // symbol.
    for symbol in &to_close {
        let Some(ledger) = symbols.get_mut(symbol) else {
            continue;
        };
        let units = ledger.step(prev).units;
        let cost_of_acquisition = ledger.step(prev).purchase_price * units;
        let Some(close) = ledger.step(curr).close else {
            continue;
        };
        let sale = units * close * (1.0 - fee);
        let realized_pnl = sale - cost_of_acquisition;
        let row = ledger.step_mut(curr);
        row.sale = sale;
        row.realized_pnl = realized_pnl;
        row.units = 0.0;
        let prow = portfolio.step_mut(curr);
        prow.total_sales += sale;
        prow.total_realized_pnl += realized_pnl;
        prow.closed_positions += 1;
        prow.nb_positions -= 1;
    }

    // Cash pool from the carried balance plus this step's sales.
    let cash_available = portfolio.step(prev).cash + portfolio.step(curr).total_sales;

    // Allocation weight per newly opened symbol. Opens are suppressed when
    // the pool is empty under either policy: a zero-cash "open" would create
    // a zero-unit position and break the nb_positions invariant.
    let weight = match policy {
        RebalancePolicy::ProRataActive => {
            if cash_available > 0.0 {
                for _ in &to_open {
                    let prow = portfolio.step_mut(curr);
                    prow.opened_positions += 1;
                    prow.nb_positions += 1;
                }
            }
            let opened = portfolio.step(curr).opened_positions;
            if opened > 0 {
                // Unfilled slots: total symbols minus positions still held
                // after this step's closes. This-step opens are not
                // subtracted.
                let slots = total_symbols as i64
                    - i64::from(portfolio.step(prev).nb_positions)
                    + i64::from(portfolio.step(curr).closed_positions);
                debug_assert!(slots >= i64::from(opened));
                1.0 / slots as f64
            } else {
                0.0
            }
        }
        RebalancePolicy::FullActive => {
            if cash_available > 0.0 {
                for _ in &to_open {
                    let prow = portfolio.step_mut(curr);
                    prow.opened_positions += 1;
                    prow.nb_positions += 1;
                }
            }
            let opened = portfolio.step(curr).opened_positions;
            if opened > 0 {
                1.0 / f64::from(opened)
            } else {
                0.0
            }
        }
    };
    let alloc_per_new_signal = cash_available * weight;

    // Open phase: fee grossed up into the cost basis.
    if weight > 0.0 {
        for symbol in &to_open {
            let Some(ledger) = symbols.get_mut(symbol) else {
                continue;
            };
            let Some(close) = ledger.step(curr).close else {
                continue;
            };
            let purchase_price = close / (1.0 - fee);
            let row = ledger.step_mut(curr);
            row.purchase_price = purchase_price;
            row.units = alloc_per_new_signal / purchase_price;
            row.purchase = alloc_per_new_signal;
            portfolio.step_mut(curr).total_purchases += alloc_per_new_signal;
        }
    }

    // Cash settle, then mark NAV after all opens and closes.
    portfolio.step_mut(curr).cash = cash_available - portfolio.step(curr).total_purchases;
    step::mark_nav(portfolio, symbols, curr);
}
