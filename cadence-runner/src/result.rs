//! Backtest result: everything reporting needs, serializable as one unit.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use cadence_core::domain::{PortfolioLedger, RebalancePolicy, Symbol, SymbolLedger};

use crate::config::RunId;
use crate::metrics::PerformanceMetrics;

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
///
/// Carries the full ledgers over the whole calendar — the runner does not
/// decide what reporting keeps, it hands everything over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub strategy_name: String,
    pub symbols: Vec<Symbol>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    pub policy: RebalancePolicy,
    /// The simulation calendar the ledgers are indexed by.
    pub timestamps: Vec<NaiveDateTime>,
    /// Calendar indices at which the rebalance protocol ran.
    pub rebalance_indices: Vec<usize>,
    pub portfolio: PortfolioLedger,
    pub ledgers: BTreeMap<Symbol, SymbolLedger>,
    /// Equal-weight buy-and-hold NAV, same index as the calendar.
    pub benchmark_curve: Vec<f64>,
    pub metrics: PerformanceMetrics,
    /// BLAKE3 over all input bar data.
    pub dataset_fingerprint: String,
    /// Whether any symbol ran on synthetic data.
    pub has_synthetic: bool,
    /// Leading calendar steps with no price, per symbol (data-gap report).
    pub data_gap_steps: BTreeMap<Symbol, usize>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl BacktestResult {
    /// The strategy NAV series.
    pub fn nav_curve(&self) -> Vec<f64> {
        self.portfolio.nav_curve()
    }
}
