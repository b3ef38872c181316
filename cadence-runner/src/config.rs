//! Serializable run configuration.
//!
//! A TOML file fully describes one backtest: the universe, the money
//! parameters, the calendar, and the strategy. Two identical files produce
//! the same content-addressed run id and therefore byte-identical results.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use cadence_core::config::SimParams;
use cadence_core::domain::RebalancePolicy;
use cadence_core::signals::{Breakout, SignalStrategy};

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

/// Errors from loading or translating a run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("config has no symbols")]
    EmptyUniverse,

    #[error("invalid strategy parameters: {0}")]
    InvalidStrategy(String),

    #[error(transparent)]
    Core(#[from] cadence_core::config::ConfigError),
}

/// Top-level configuration for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub backtest: BacktestSection,
    pub strategy: StrategyConfig,
}

/// The `[backtest]` section: universe, capital, calendar, policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSection {
    pub symbols: Vec<String>,
    pub initial_capital: f64,
    pub fee: f64,
    pub granularity: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub frequency_days: u32,
    pub rebalancing: RebalancePolicy,
}

/// The `[strategy]` section (serializable tagged enum).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyConfig {
    /// Short-window high vs long-window high breakout.
    Breakout { short_window: usize, long_window: usize },
}

impl StrategyConfig {
    /// Instantiate the strategy, rejecting degenerate window parameters.
    pub fn build(&self) -> Result<Box<dyn SignalStrategy>, ConfigError> {
        match *self {
            StrategyConfig::Breakout {
                short_window,
                long_window,
            } => {
                if short_window < 1 {
                    return Err(ConfigError::InvalidStrategy(
                        "short_window must be >= 1".into(),
                    ));
                }
                if long_window < short_window {
                    return Err(ConfigError::InvalidStrategy(
                        "long_window must be >= short_window".into(),
                    ));
                }
                Ok(Box::new(Breakout::new(short_window, long_window)))
            }
        }
    }
}

impl RunConfig {
    /// Load and parse a TOML config file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Translate to the core's simulation parameters.
    pub fn to_sim_params(&self) -> SimParams {
        SimParams {
            initial_capital: self.backtest.initial_capital,
            fee: self.backtest.fee,
            granularity: self.backtest.granularity.clone(),
            start_date: self.backtest.start_date,
            end_date: self.backtest.end_date,
            frequency_days: self.backtest.frequency_days,
            policy: self.backtest.rebalancing,
        }
    }

    /// Full fail-fast validation: core parameters, universe, strategy.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backtest.symbols.is_empty() {
            return Err(ConfigError::EmptyUniverse);
        }
        self.to_sim_params().validate()?;
        self.strategy.build()?;
        Ok(())
    }

    /// Computes a deterministic hash ID for this configuration.
    ///
    /// Two runs with identical configs share a RunId, so their artifacts
    /// land in the same directory and can be compared or deduplicated.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_string(self).expect("RunConfig serialization failed");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}
