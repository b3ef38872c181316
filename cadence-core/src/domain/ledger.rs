//! Ledgers — time-indexed state and event records for the portfolio and each symbol.
//!
//! Every ledger row distinguishes *state* fields (carried forward from the
//! previous step) from *event* fields (reset to zero every step, written only
//! when a transaction happens at that step). The engine's carry-forward is an
//! explicit copy of the state fields plus an explicit event reset; nothing
//! defaults implicitly.

use serde::{Deserialize, Serialize};

use super::signal::Signal;

/// One row of a symbol's ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolStep {
    /// Last known close at or before this step. `None` until the symbol's
    /// first raw observation; the engine treats `None` as "no trading
    /// allowed this step".
    pub close: Option<f64>,
    /// Units held. State field, non-negative.
    pub units: f64,
    /// Effective entry price including fee. State field, meaningful only
    /// while `units > 0`.
    pub purchase_price: f64,
    /// Lagged exposure intent as of the last rebalance. State field.
    pub signal: Signal,
    /// Cash spent opening this step. Event field.
    pub purchase: f64,
    /// Cash received closing this step, net of fee. Event field.
    pub sale: f64,
    /// Realized PnL from a close this step. Event field.
    pub realized_pnl: f64,
}

impl SymbolStep {
    fn flat(close: Option<f64>) -> Self {
        Self {
            close,
            units: 0.0,
            purchase_price: 0.0,
            signal: Signal::Flat,
            purchase: 0.0,
            sale: 0.0,
            realized_pnl: 0.0,
        }
    }
}

/// Full ledger for one traded symbol, one row per calendar step.
///
/// Created at calendar-build time with closes prefilled from the aligned
/// series, mutated exclusively by the engine during the simulation pass,
/// immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolLedger {
    pub symbol: String,
    steps: Vec<SymbolStep>,
}

impl SymbolLedger {
    /// Build a ledger with every row flat and closes taken from `closes`.
    pub fn new(symbol: impl Into<String>, closes: &[Option<f64>]) -> Self {
        Self {
            symbol: symbol.into(),
            steps: closes.iter().map(|c| SymbolStep::flat(*c)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, idx: usize) -> &SymbolStep {
        &self.steps[idx]
    }

    pub fn step_mut(&mut self, idx: usize) -> &mut SymbolStep {
        &mut self.steps[idx]
    }

    pub fn steps(&self) -> &[SymbolStep] {
        &self.steps
    }

    /// Copy state fields from `prev` to `curr` and zero the event fields at
    /// `curr`. The `close` column is per-step data and is left untouched.
    pub fn carry_forward(&mut self, prev: usize, curr: usize) {
        let (units, purchase_price, signal) = {
            let p = &self.steps[prev];
            (p.units, p.purchase_price, p.signal)
        };
        let c = &mut self.steps[curr];
        c.units = units;
        c.purchase_price = purchase_price;
        c.signal = signal;
        c.purchase = 0.0;
        c.sale = 0.0;
        c.realized_pnl = 0.0;
    }
}

/// One row of the portfolio ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioStep {
    /// Settled cash. State field, non-negative in normal operation.
    pub cash: f64,
    /// Net asset value: cash + mark-to-market of all holdings. Recomputed
    /// every step.
    pub nav: f64,
    /// Count of symbols with units > 0. State field.
    pub nb_positions: u32,
    /// Positions opened this step. Event field.
    pub opened_positions: u32,
    /// Positions closed this step. Event field.
    pub closed_positions: u32,
    /// Sum of purchases this step. Event field.
    pub total_purchases: f64,
    /// Sum of sale proceeds this step. Event field.
    pub total_sales: f64,
    /// Sum of realized PnL this step. Event field.
    pub total_realized_pnl: f64,
}

impl PortfolioStep {
    fn initial(cash: f64) -> Self {
        Self {
            cash,
            nav: cash,
            nb_positions: 0,
            opened_positions: 0,
            closed_positions: 0,
            total_purchases: 0.0,
            total_sales: 0.0,
            total_realized_pnl: 0.0,
        }
    }
}

/// Aggregate ledger for one run, one row per calendar step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioLedger {
    steps: Vec<PortfolioStep>,
}

impl PortfolioLedger {
    /// Build a ledger of `len` rows; row 0 holds the initial state
    /// (cash = nav = initial capital, no positions, no events).
    pub fn new(len: usize, initial_capital: f64) -> Self {
        Self {
            steps: vec![PortfolioStep::initial(initial_capital); len],
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, idx: usize) -> &PortfolioStep {
        &self.steps[idx]
    }

    pub fn step_mut(&mut self, idx: usize) -> &mut PortfolioStep {
        &mut self.steps[idx]
    }

    pub fn steps(&self) -> &[PortfolioStep] {
        &self.steps
    }

    /// Copy state fields from `prev` to `curr` and zero the event fields at
    /// `curr`. `nav` is recomputed by the engine right after.
    pub fn carry_forward(&mut self, prev: usize, curr: usize) {
        let (cash, nb_positions) = {
            let p = &self.steps[prev];
            (p.cash, p.nb_positions)
        };
        let c = &mut self.steps[curr];
        c.cash = cash;
        c.nb_positions = nb_positions;
        c.opened_positions = 0;
        c.closed_positions = 0;
        c.total_purchases = 0.0;
        c.total_sales = 0.0;
        c.total_realized_pnl = 0.0;
    }

    /// The NAV column as a plain series, for metrics and reporting.
    pub fn nav_curve(&self) -> Vec<f64> {
        self.steps.iter().map(|s| s.nav).collect()
    }
}
