//! Backtest runner — wires together config, data, engine and metrics.
//!
//! Two entry points:
//! - `run_backtest()`: loads series from the data directory, then runs.
//!   Used by the CLI.
//! - `run_backtest_from_data()`: takes pre-loaded data. Used by tests and
//!   callers that manage their own I/O.
//!
//! Alignment and signal generation are pure per symbol and fan out across
//! threads; the simulation pass itself is strictly sequential.

use std::collections::BTreeMap;
use std::path::Path;

use rayon::prelude::*;
use thiserror::Error;

use cadence_core::calendar::{RebalanceSchedule, SimulationCalendar};
use cadence_core::data::{align_to_calendar, AlignedSeries};
use cadence_core::domain::{Signal, Symbol};
use cadence_core::engine::{audit, run_simulation, InvariantViolation};
use cadence_core::signals::{lag_signals, SignalStrategy};

use crate::config::{ConfigError, RunConfig};
use crate::data_loader::{load_series, LoadError, LoadOptions, LoadedData};
use crate::metrics::{PerformanceMetrics, DEFAULT_RISK_FREE_RATE};
use crate::result::{BacktestResult, SCHEMA_VERSION};
use crate::benchmark::buy_and_hold_curve;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("symbol '{0}' not found in loaded data")]
    SymbolNotFound(Symbol),
    #[error("accounting invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
}

/// Run a single backtest, loading series from `data_dir`.
pub fn run_backtest(
    config: &RunConfig,
    data_dir: &Path,
    opts: &LoadOptions,
) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let loaded = load_series(&config.backtest.symbols, data_dir, opts)?;
    run_backtest_from_data(config, &loaded)
}

/// Run a backtest on pre-loaded data — no I/O.
pub fn run_backtest_from_data(
    config: &RunConfig,
    loaded: &LoadedData,
) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let params = config.to_sim_params();
    let strategy = config.strategy.build()?;

    let calendar =
        SimulationCalendar::build(params.start_date, params.end_date, &params.granularity)
            .map_err(ConfigError::Core)?;
    let schedule =
        RebalanceSchedule::build(&calendar, params.frequency_days).map_err(ConfigError::Core)?;

    // Per-symbol data preparation is embarrassingly parallel.
    let prepared: Vec<(Symbol, AlignedSeries, Vec<Signal>)> = config
        .backtest
        .symbols
        .par_iter()
        .map(|symbol| {
            let series = loaded
                .series
                .get(symbol)
                .ok_or_else(|| RunError::SymbolNotFound(symbol.clone()))?;
            let aligned = align_to_calendar(series, &calendar);
            let lagged = lag_signals(&strategy.generate(&aligned));
            Ok((symbol.clone(), aligned, lagged))
        })
        .collect::<Result<_, RunError>>()?;

    let mut aligned: BTreeMap<Symbol, AlignedSeries> = BTreeMap::new();
    let mut signals: BTreeMap<Symbol, Vec<Signal>> = BTreeMap::new();
    let mut data_gap_steps: BTreeMap<Symbol, usize> = BTreeMap::new();
    for (symbol, series, lagged) in prepared {
        data_gap_steps.insert(symbol.clone(), series.undefined_steps());
        aligned.insert(symbol.clone(), series);
        signals.insert(symbol, lagged);
    }

    // The sequential replay.
    let result = run_simulation(&params, &calendar, &schedule, &aligned, &signals);
    audit(&result.portfolio, &result.symbols)?;

    let benchmark_curve =
        buy_and_hold_curve(params.initial_capital, &calendar, &schedule, &aligned);
    let nb_days = (calendar.last() - calendar.first()).num_days();
    let metrics = PerformanceMetrics::compute(
        &result,
        &benchmark_curve,
        params.initial_capital,
        nb_days,
        DEFAULT_RISK_FREE_RATE,
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id: config.run_id(),
        strategy_name: strategy.name(),
        symbols: config.backtest.symbols.clone(),
        start_date: params.start_date,
        end_date: params.end_date,
        initial_capital: params.initial_capital,
        policy: params.policy,
        timestamps: calendar.timestamps().to_vec(),
        rebalance_indices: schedule.indices().to_vec(),
        portfolio: result.portfolio,
        ledgers: result.symbols,
        benchmark_curve,
        metrics,
        dataset_fingerprint: loaded.dataset_fingerprint.clone(),
        has_synthetic: loaded.has_synthetic,
        data_gap_steps,
    })
}

/// Latest unlagged signal per symbol — the "what would it do today" view.
pub fn current_signals(
    config: &RunConfig,
    loaded: &LoadedData,
) -> Result<BTreeMap<Symbol, Signal>, RunError> {
    config.validate()?;
    let params = config.to_sim_params();
    let strategy = config.strategy.build()?;
    let calendar =
        SimulationCalendar::build(params.start_date, params.end_date, &params.granularity)
            .map_err(ConfigError::Core)?;

    let mut out = BTreeMap::new();
    for symbol in &config.backtest.symbols {
        let series = loaded
            .series
            .get(symbol)
            .ok_or_else(|| RunError::SymbolNotFound(symbol.clone()))?;
        let aligned = align_to_calendar(series, &calendar);
        // the calendar is non-empty by construction
        let signal = strategy.evaluate(&aligned, calendar.len() - 1);
        out.insert(symbol.clone(), signal);
    }
    Ok(out)
}
