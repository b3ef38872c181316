//! Performance metrics — pure functions that compute strategy statistics.
//!
//! Every metric is a pure function: NAV curve and/or ledgers in, scalar
//! out. No dependencies on the runner or the data pipeline. Conventions:
//! returns are annualized with years = days/365.25, volatility with √252,
//! and drawdown is reported in currency units (the deepest NAV shortfall
//! below its running peak, as a non-positive number).

use serde::{Deserialize, Serialize};

use cadence_core::engine::SimulationResult;

/// Annualization factor for per-bar volatility (daily bars assumed).
const PERIODS_PER_YEAR: f64 = 252.0;

/// Default risk-free rate used by the Sharpe computation.
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.05;

/// Aggregate performance metrics for a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub annualized_return: f64,
    pub annualized_vol: f64,
    pub sharpe: f64,
    pub max_drawdown: f64,
    pub hit_rate: f64,
    pub avg_realized_pnl: f64,
    pub avg_cash_allocation: f64,
    pub nb_opened: u32,
    pub nb_closed: u32,
    pub nb_current_positions: u32,
    pub nb_days: i64,
    pub benchmark_annualized_return: f64,
    pub benchmark_annualized_vol: f64,
    pub benchmark_sharpe: f64,
    pub benchmark_max_drawdown: f64,
}

impl PerformanceMetrics {
    /// Compute all metrics from a finished run and its benchmark curve.
    pub fn compute(
        result: &SimulationResult,
        benchmark: &[f64],
        initial_capital: f64,
        nb_days: i64,
        risk_free_rate: f64,
    ) -> Self {
        let nav = result.portfolio.nav_curve();
        let strategy_return = annualized_return(&nav, initial_capital, nb_days);
        let strategy_vol = annualized_vol(&nav);
        let benchmark_return = annualized_return(benchmark, initial_capital, nb_days);
        let benchmark_vol = annualized_vol(benchmark);

        let (wins, samples) = hit_counts(result);
        let nb_closed: u32 = result
            .portfolio
            .steps()
            .iter()
            .map(|s| s.closed_positions)
            .sum();
        let nb_opened: u32 = result
            .portfolio
            .steps()
            .iter()
            .map(|s| s.opened_positions)
            .sum();
        let total_realized: f64 = result
            .portfolio
            .steps()
            .iter()
            .map(|s| s.total_realized_pnl)
            .sum();

        Self {
            annualized_return: strategy_return,
            annualized_vol: strategy_vol,
            sharpe: sharpe(strategy_return, strategy_vol, risk_free_rate),
            max_drawdown: max_drawdown(&nav),
            hit_rate: if samples > 0 {
                wins as f64 / samples as f64
            } else {
                0.0
            },
            avg_realized_pnl: if nb_closed > 0 {
                total_realized / f64::from(nb_closed)
            } else {
                0.0
            },
            avg_cash_allocation: avg_cash_allocation(result),
            nb_opened,
            nb_closed,
            nb_current_positions: current_positions(result),
            nb_days,
            benchmark_annualized_return: benchmark_return,
            benchmark_annualized_vol: benchmark_vol,
            benchmark_sharpe: sharpe(benchmark_return, benchmark_vol, risk_free_rate),
            benchmark_max_drawdown: max_drawdown(benchmark),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Geometric annualized return: (final/initial)^(1/years) - 1.
pub fn annualized_return(curve: &[f64], initial_capital: f64, nb_days: i64) -> f64 {
    let Some(&final_value) = curve.last() else {
        return 0.0;
    };
    if initial_capital <= 0.0 || final_value <= 0.0 {
        return 0.0;
    }
    let years = if nb_days > 0 {
        nb_days as f64 / 365.25
    } else {
        1.0
    };
    (final_value / initial_capital).powf(1.0 / years) - 1.0
}

/// Annualized volatility of log returns (√252 scaling, sample std).
pub fn annualized_vol(curve: &[f64]) -> f64 {
    let returns = log_returns(curve);
    if returns.len() < 2 {
        return 0.0;
    }
    std_dev(&returns) * PERIODS_PER_YEAR.sqrt()
}

/// Sharpe ratio over annualized figures; 0 when volatility vanishes.
pub fn sharpe(annualized_return: f64, annualized_vol: f64, risk_free_rate: f64) -> f64 {
    if annualized_vol < 1e-15 {
        return 0.0;
    }
    (annualized_return - risk_free_rate) / annualized_vol
}

/// Deepest shortfall below the running peak, in currency units (<= 0).
pub fn max_drawdown(curve: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    for &value in curve {
        peak = peak.max(value);
        worst = worst.min(value - peak);
    }
    worst
}

/// Time-averaged share of NAV parked in cash.
pub fn avg_cash_allocation(result: &SimulationResult) -> f64 {
    let total_cash: f64 = result.portfolio.steps().iter().map(|s| s.cash).sum();
    let total_nav: f64 = result.portfolio.steps().iter().map(|s| s.nav).sum();
    if total_nav.abs() < 1e-15 {
        0.0
    } else {
        total_cash / total_nav
    }
}

/// Log returns of a curve, skipping non-positive values.
fn log_returns(curve: &[f64]) -> Vec<f64> {
    curve
        .windows(2)
        .filter(|w| w[0] > 0.0 && w[1] > 0.0)
        .map(|w| (w[1] / w[0]).ln())
        .collect()
}

/// Sample standard deviation (n - 1 denominator).
fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

/// Positions still open at the final step.
fn current_positions(result: &SimulationResult) -> u32 {
    let Some(last) = result.portfolio.len().checked_sub(1) else {
        return 0;
    };
    result
        .symbols
        .values()
        .filter(|ledger| ledger.step(last).units > 0.0)
        .count() as u32
}

/// Wins and samples for the hit rate: every realized close counts by the
/// sign of its PnL, and positions still open at the end count by the sign
/// of their unrealized PnL.
fn hit_counts(result: &SimulationResult) -> (u32, u32) {
    let mut wins = 0u32;
    let mut samples = 0u32;
    for ledger in result.symbols.values() {
        for idx in 0..ledger.len() {
            let step = ledger.step(idx);
            if step.sale != 0.0 {
                samples += 1;
                if step.realized_pnl > 0.0 {
                    wins += 1;
                }
            }
        }
        if let Some(last) = ledger.len().checked_sub(1) {
            let step = ledger.step(last);
            if step.units > 0.0 {
                samples += 1;
                if let Some(close) = step.close {
                    if step.units * (close - step.purchase_price) > 0.0 {
                        wins += 1;
                    }
                }
            }
        }
    }
    (wins, samples)
}
