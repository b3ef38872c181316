//! Simulation parameters and the fatal configuration error taxonomy.
//!
//! Every `ConfigError` is raised before the first simulation step runs; the
//! engine itself never produces one.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calendar::Granularity;
use crate::domain::RebalancePolicy;

/// Fatal configuration errors, surfaced before any simulation work.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unrecognized granularity '{0}' (expected <n>d, <n>h or <n>m, e.g. \"1d\", \"4h\", \"15m\")")]
    BadGranularity(String),

    #[error("empty simulation calendar: start {start} is after end {end}")]
    EmptyCalendar { start: NaiveDate, end: NaiveDate },

    #[error("rebalance frequency must be a positive number of days, got {0}")]
    BadFrequency(i64),

    #[error("fee rate must satisfy 0 <= fee < 1, got {0}")]
    BadFee(f64),

    #[error("initial capital must be positive, got {0}")]
    BadCapital(f64),

    #[error("unknown rebalancing policy '{0}' (expected \"pro-rata-active\" or \"full-active\")")]
    UnknownPolicy(String),
}

/// Parameters consumed by the simulation core.
///
/// `validate()` must pass before the calendar is built or the engine runs;
/// the runner calls it once when translating its file-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimParams {
    pub initial_capital: f64,
    /// Flat proportional fee charged once per transaction leg.
    pub fee: f64,
    /// Granularity token, e.g. "1d", "4h", "15m".
    pub granularity: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Rebalance interval in calendar days, anchored at the first timestamp.
    pub frequency_days: u32,
    pub policy: RebalancePolicy,
}

impl SimParams {
    /// Fail-fast check of every fatal precondition.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.initial_capital > 0.0) {
            return Err(ConfigError::BadCapital(self.initial_capital));
        }
        if self.fee.is_nan() || !(0.0..1.0).contains(&self.fee) {
            return Err(ConfigError::BadFee(self.fee));
        }
        Granularity::parse(&self.granularity)?;
        if self.frequency_days == 0 {
            return Err(ConfigError::BadFrequency(0));
        }
        if self.start_date > self.end_date {
            return Err(ConfigError::EmptyCalendar {
                start: self.start_date,
                end: self.end_date,
            });
        }
        Ok(())
    }
}
