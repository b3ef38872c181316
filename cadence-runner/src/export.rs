//! Artifact export: one directory per run, tabular ledgers plus metadata.
//!
//! Layout under `<output_dir>/<short run id>/`:
//! - `portfolio.csv` / `portfolio.parquet` — the portfolio ledger
//! - `symbols/<SYMBOL>.csv` — one ledger per symbol
//! - `metrics.json` — the aggregate metrics
//! - `result.json` — the full serialized result
//! - `manifest.json` — run identity and file inventory

use anyhow::{Context, Result};
use polars::prelude::{Column, DataFrame, NamedFrom, ParquetWriter, Series};
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::result::BacktestResult;

/// Paths of everything `save_artifacts` wrote.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub run_dir: PathBuf,
    pub portfolio_csv: PathBuf,
    pub portfolio_parquet: PathBuf,
    pub symbol_csvs: Vec<PathBuf>,
    pub metrics_json: PathBuf,
    pub result_json: PathBuf,
    pub manifest: PathBuf,
}

/// Manifest written next to the artifacts.
#[derive(Debug, Serialize)]
struct Manifest<'a> {
    schema_version: u32,
    run_id: &'a str,
    strategy: &'a str,
    symbols: &'a [String],
    start_date: String,
    end_date: String,
    dataset_fingerprint: &'a str,
    has_synthetic: bool,
    files: Vec<String>,
}

/// Write every artifact for a finished run.
pub fn save_artifacts(output_dir: impl AsRef<Path>, result: &BacktestResult) -> Result<ArtifactPaths> {
    let short_id: String = result.run_id.chars().take(12).collect();
    let run_dir = output_dir.as_ref().join(short_id);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create {}", run_dir.display()))?;

    let portfolio_csv = run_dir.join("portfolio.csv");
    write_portfolio_csv(&portfolio_csv, result)?;

    let portfolio_parquet = run_dir.join("portfolio.parquet");
    write_portfolio_parquet(&portfolio_parquet, result)?;

    let symbols_dir = run_dir.join("symbols");
    std::fs::create_dir_all(&symbols_dir)
        .with_context(|| format!("failed to create {}", symbols_dir.display()))?;
    let mut symbol_csvs = Vec::new();
    for (symbol, ledger) in &result.ledgers {
        let path = symbols_dir.join(format!("{symbol}.csv"));
        write_symbol_csv(&path, result, ledger)?;
        symbol_csvs.push(path);
    }

    let metrics_json = run_dir.join("metrics.json");
    write_json(&metrics_json, &result.metrics)?;

    let result_json = run_dir.join("result.json");
    write_json(&result_json, result)?;

    let manifest = run_dir.join("manifest.json");
    let files: Vec<String> = ["portfolio.csv", "portfolio.parquet", "metrics.json", "result.json"]
        .into_iter()
        .map(str::to_string)
        .chain(result.ledgers.keys().map(|s| format!("symbols/{s}.csv")))
        .collect();
    write_json(
        &manifest,
        &Manifest {
            schema_version: result.schema_version,
            run_id: &result.run_id,
            strategy: &result.strategy_name,
            symbols: &result.symbols,
            start_date: result.start_date.to_string(),
            end_date: result.end_date.to_string(),
            dataset_fingerprint: &result.dataset_fingerprint,
            has_synthetic: result.has_synthetic,
            files,
        },
    )?;

    Ok(ArtifactPaths {
        run_dir,
        portfolio_csv,
        portfolio_parquet,
        symbol_csvs,
        metrics_json,
        result_json,
        manifest,
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("failed to serialize {}", path.display()))?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn write_portfolio_csv(path: &Path, result: &BacktestResult) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    writer.write_record([
        "timestamp",
        "nav",
        "cash",
        "nb_positions",
        "opened_positions",
        "closed_positions",
        "total_purchases",
        "total_sales",
        "total_realized_pnl",
        "benchmark",
    ])?;
    for (idx, step) in result.portfolio.steps().iter().enumerate() {
        writer.write_record([
            result.timestamps[idx].to_string(),
            format!("{:.6}", step.nav),
            format!("{:.6}", step.cash),
            step.nb_positions.to_string(),
            step.opened_positions.to_string(),
            step.closed_positions.to_string(),
            format!("{:.6}", step.total_purchases),
            format!("{:.6}", step.total_sales),
            format!("{:.6}", step.total_realized_pnl),
            format!("{:.6}", result.benchmark_curve[idx]),
        ])?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;
    Ok(())
}

fn write_symbol_csv(
    path: &Path,
    result: &BacktestResult,
    ledger: &cadence_core::domain::SymbolLedger,
) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    writer.write_record([
        "timestamp",
        "close",
        "units",
        "purchase_price",
        "signal",
        "purchase",
        "sale",
        "realized_pnl",
    ])?;
    for (idx, step) in ledger.steps().iter().enumerate() {
        writer.write_record([
            result.timestamps[idx].to_string(),
            step.close.map(|c| format!("{c:.6}")).unwrap_or_default(),
            format!("{:.8}", step.units),
            format!("{:.6}", step.purchase_price),
            step.signal.as_str().to_string(),
            format!("{:.6}", step.purchase),
            format!("{:.6}", step.sale),
            format!("{:.6}", step.realized_pnl),
        ])?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;
    Ok(())
}

fn write_portfolio_parquet(path: &Path, result: &BacktestResult) -> Result<()> {
    let timestamps: Vec<String> = result.timestamps.iter().map(|t| t.to_string()).collect();
    let navs: Vec<f64> = result.portfolio.steps().iter().map(|s| s.nav).collect();
    let cash: Vec<f64> = result.portfolio.steps().iter().map(|s| s.cash).collect();
    let positions: Vec<u32> = result
        .portfolio
        .steps()
        .iter()
        .map(|s| s.nb_positions)
        .collect();

    let mut df = DataFrame::new(vec![
        Column::Series(Series::new("timestamp".into(), timestamps).into()),
        Column::Series(Series::new("nav".into(), navs).into()),
        Column::Series(Series::new("cash".into(), cash).into()),
        Column::Series(Series::new("nb_positions".into(), positions).into()),
        Column::Series(Series::new("benchmark".into(), result.benchmark_curve.clone()).into()),
    ])
    .context("failed to build portfolio dataframe")?;

    let mut file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    ParquetWriter::new(&mut file)
        .finish(&mut df)
        .context("failed to write portfolio parquet")?;
    Ok(())
}
