//! End-to-end tests for the runner: config file → data dir → result →
//! artifacts on disk.

use std::io::Write;
use std::path::Path;

use chrono::NaiveDate;

use cadence_core::domain::RebalancePolicy;
use cadence_runner::{
    load_series, run_backtest, run_backtest_from_data, save_artifacts, BacktestSection,
    LoadOptions, RunConfig, StrategyConfig,
};

fn write_csv(dir: &Path, symbol: &str, days: u32, base_close: f64) {
    let path = dir.join(format!("{symbol}.csv"));
    let mut file = std::fs::File::create(path).unwrap();
    writeln!(file, "timestamp,open,high,low,close,volume").unwrap();
    let start = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
    for i in 0..days {
        // gentle uptrend so the breakout strategy eventually fires
        let close = base_close * (1.0 + 0.01 * i as f64);
        writeln!(
            file,
            "{},{:.4},{:.4},{:.4},{:.4},{}",
            start + chrono::Duration::days(i as i64),
            close * 0.99,
            close * 1.01,
            close * 0.98,
            close,
            1_000 + i,
        )
        .unwrap();
    }
}

fn sample_config() -> RunConfig {
    RunConfig {
        backtest: BacktestSection {
            symbols: vec!["AAAUSDT".into(), "BBBUSDT".into()],
            initial_capital: 1000.0,
            fee: 0.001,
            granularity: "1d".into(),
            start_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 7, 31).unwrap(),
            frequency_days: 7,
            rebalancing: RebalancePolicy::ProRataActive,
        },
        strategy: StrategyConfig::Breakout {
            short_window: 3,
            long_window: 10,
        },
    }
}

fn load_opts(config: &RunConfig, synthetic: bool) -> LoadOptions {
    LoadOptions {
        start: config.backtest.start_date,
        end: config.backtest.end_date,
        synthetic,
        seed: 42,
    }
}

#[test]
fn runs_end_to_end_from_csv_files() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(dir.path(), "AAAUSDT", 61, 100.0);
    write_csv(dir.path(), "BBBUSDT", 61, 5.0);

    let config = sample_config();
    let result = run_backtest(&config, dir.path(), &load_opts(&config, false)).unwrap();

    assert_eq!(result.timestamps.len(), 61);
    assert_eq!(result.portfolio.len(), 61);
    assert_eq!(result.ledgers.len(), 2);
    assert!(!result.has_synthetic);
    assert_eq!(result.run_id, config.run_id());

    // the uptrend must have opened both symbols at some point
    assert!(result.metrics.nb_opened >= 2);
    // NAV starts at capital
    assert_eq!(result.portfolio.step(0).nav, 1000.0);
}

#[test]
fn identical_runs_are_identical() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(dir.path(), "AAAUSDT", 61, 100.0);
    write_csv(dir.path(), "BBBUSDT", 61, 5.0);

    let config = sample_config();
    let a = run_backtest(&config, dir.path(), &load_opts(&config, false)).unwrap();
    let b = run_backtest(&config, dir.path(), &load_opts(&config, false)).unwrap();
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

#[test]
fn synthetic_fallback_is_tagged_and_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let config = sample_config();
    let opts = load_opts(&config, true);

    let a = run_backtest(&config, dir.path(), &opts).unwrap();
    let b = run_backtest(&config, dir.path(), &opts).unwrap();
    assert!(a.has_synthetic);
    assert_eq!(a.dataset_fingerprint, b.dataset_fingerprint);
    assert_eq!(
        serde_json::to_string(&a.portfolio).unwrap(),
        serde_json::to_string(&b.portfolio).unwrap()
    );
}

#[test]
fn missing_data_without_synthetic_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = sample_config();
    let err = run_backtest(&config, dir.path(), &load_opts(&config, false)).unwrap_err();
    assert!(err.to_string().contains("AAAUSDT"));
}

#[test]
fn artifacts_land_on_disk_and_round_trip() {
    let data_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    write_csv(data_dir.path(), "AAAUSDT", 61, 100.0);
    write_csv(data_dir.path(), "BBBUSDT", 61, 5.0);

    let config = sample_config();
    let result = run_backtest(&config, data_dir.path(), &load_opts(&config, false)).unwrap();
    let paths = save_artifacts(out_dir.path(), &result).unwrap();

    assert!(paths.portfolio_csv.is_file());
    assert!(paths.portfolio_parquet.is_file());
    assert!(paths.metrics_json.is_file());
    assert!(paths.manifest.is_file());
    assert_eq!(paths.symbol_csvs.len(), 2);

    // row count = header + one row per calendar step
    let portfolio_text = std::fs::read_to_string(&paths.portfolio_csv).unwrap();
    assert_eq!(portfolio_text.lines().count(), 61 + 1);

    // the full result deserializes back equal
    let json = std::fs::read_to_string(&paths.result_json).unwrap();
    let back: cadence_runner::BacktestResult = serde_json::from_str(&json).unwrap();
    assert_eq!(
        serde_json::to_string(&back).unwrap(),
        serde_json::to_string(&result).unwrap()
    );
}

#[test]
fn from_data_rejects_unknown_symbols() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(dir.path(), "AAAUSDT", 61, 100.0);

    let mut config = sample_config();
    let loaded = load_series(
        &["AAAUSDT".to_string()],
        dir.path(),
        &load_opts(&config, false),
    )
    .unwrap();
    // config asks for a symbol the loaded data does not have
    config.backtest.symbols = vec!["AAAUSDT".into(), "MISSING".into()];
    let err = run_backtest_from_data(&config, &loaded).unwrap_err();
    assert!(matches!(err, cadence_runner::RunError::SymbolNotFound(_)));
}

#[test]
fn invalid_config_fails_before_touching_data() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = sample_config();
    config.backtest.fee = 2.0;
    // no data files exist, but the config error must surface first
    let err = run_backtest(&config, dir.path(), &load_opts(&config, false)).unwrap_err();
    assert!(matches!(err, cadence_runner::RunError::Config(_)));
}
