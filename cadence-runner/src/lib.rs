//! Cadence Runner — backtest orchestration on top of `cadence-core`.
//!
//! This crate provides:
//! - TOML run configuration with content-addressed run ids
//! - CSV data loading with validation and seeded synthetic fallback
//! - The single-backtest runner with parallel per-symbol data preparation
//! - Equal-weight buy-and-hold benchmark
//! - Performance metrics
//! - Artifact export (CSV, Parquet, JSON, manifest)

pub mod benchmark;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod result;
pub mod runner;
pub mod synthetic;

pub use benchmark::buy_and_hold_curve;
pub use config::{BacktestSection, ConfigError, RunConfig, RunId, StrategyConfig};
pub use data_loader::{load_series, DataSource, LoadError, LoadOptions, LoadedData};
pub use export::{save_artifacts, ArtifactPaths};
pub use metrics::PerformanceMetrics;
pub use result::{BacktestResult, SCHEMA_VERSION};
pub use runner::{current_signals, run_backtest, run_backtest_from_data, RunError};
pub use synthetic::synthetic_series;

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<RunConfig>();
        assert_sync::<RunConfig>();
        assert_send::<LoadOptions>();
        assert_sync::<LoadOptions>();
    }

    #[test]
    fn result_types_are_send_sync() {
        assert_send::<BacktestResult>();
        assert_sync::<BacktestResult>();
        assert_send::<PerformanceMetrics>();
        assert_sync::<PerformanceMetrics>();
    }
}
