//! The portfolio state machine: sequential, deterministic replay over the
//! simulation calendar.
//!
//! Each step runs two explicit sub-steps — carry-forward of state fields and
//! reset of event fields — followed by a NAV refresh; rebalance steps then
//! execute the close/open/reallocate protocol. Steps are processed strictly
//! in calendar order because every transition reads the previous step's
//! settled state.

pub mod nav;
pub(crate) mod rebalance;
pub(crate) mod step;

use std::collections::BTreeMap;

use crate::calendar::{RebalanceSchedule, SimulationCalendar};
use crate::config::{ConfigError, SimParams};
use crate::data::{align_to_calendar, AlignedSeries, PriceSeries};
use crate::domain::{PortfolioLedger, Signal, Symbol, SymbolLedger};
use crate::signals::{lagged_signals, SignalStrategy};

pub use nav::{audit, InvariantViolation};

/// The two ledger kinds produced by one run.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub portfolio: PortfolioLedger,
    pub symbols: BTreeMap<Symbol, SymbolLedger>,
}

/// A full backtest: the time axis it ran on plus the ledgers it produced.
#[derive(Debug)]
pub struct Backtest {
    pub calendar: SimulationCalendar,
    pub schedule: RebalanceSchedule,
    pub result: SimulationResult,
}

/// Replay the calendar against pre-aligned prices and pre-lagged signals.
///
/// `params` must already be validated; alignment and lagging are the
/// caller's responsibility (see [`simulate`] for the assembled pipeline).
/// Step 0 is the initial state: cash = nav = initial capital, no positions,
/// every signal `Flat`. No rebalance runs at step 0 — the transition is
/// defined on `prev -> curr` pairs and under the one-bar lag every step-0
/// signal is `Flat` anyway.
pub fn run_simulation(
    params: &SimParams,
    calendar: &SimulationCalendar,
    schedule: &RebalanceSchedule,
    aligned: &BTreeMap<Symbol, AlignedSeries>,
    signals: &BTreeMap<Symbol, Vec<Signal>>,
) -> SimulationResult {
    debug_assert!(params.validate().is_ok());

    let len = calendar.len();
    let mut portfolio = PortfolioLedger::new(len, params.initial_capital);
    let mut symbols: BTreeMap<Symbol, SymbolLedger> = aligned
        .iter()
        .map(|(symbol, series)| {
            (
                symbol.clone(),
                SymbolLedger::new(symbol.clone(), &series.closes()),
            )
        })
        .collect();

    for curr in 1..len {
        let prev = curr - 1;
        step::advance(&mut portfolio, &mut symbols, prev, curr);
        if schedule.is_rebalance(curr) {
            rebalance::execute(
                params.policy,
                params.fee,
                &mut portfolio,
                &mut symbols,
                signals,
                prev,
                curr,
            );
        }
    }

    SimulationResult { portfolio, symbols }
}

/// Assembled pipeline: calendar, alignment, signal generation + lag, replay.
///
/// Sequential per symbol; callers that want parallel data preparation can
/// run alignment and signal generation themselves and call
/// [`run_simulation`] directly.
pub fn simulate(
    params: &SimParams,
    series: &BTreeMap<Symbol, PriceSeries>,
    strategy: &dyn SignalStrategy,
) -> Result<Backtest, ConfigError> {
    params.validate()?;
    let calendar =
        SimulationCalendar::build(params.start_date, params.end_date, &params.granularity)?;
    let schedule = RebalanceSchedule::build(&calendar, params.frequency_days)?;

    let aligned: BTreeMap<Symbol, AlignedSeries> = series
        .iter()
        .map(|(symbol, series)| (symbol.clone(), align_to_calendar(series, &calendar)))
        .collect();
    let signals = lagged_signals(strategy, &aligned);

    let result = run_simulation(params, &calendar, &schedule, &aligned, &signals);
    Ok(Backtest {
        calendar,
        schedule,
        result,
    })
}
