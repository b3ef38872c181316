//! Cadence CLI — run backtests, inspect signals, generate sample data.
//!
//! Commands:
//! - `run` — execute a backtest from a TOML config file and export artifacts
//! - `signals` — print the latest signal per symbol for a config's universe
//! - `synth` — write seeded synthetic CSVs for offline experimentation

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

use cadence_core::domain::{Signal, Symbol};
use cadence_runner::{
    current_signals, load_series, run_backtest, save_artifacts, synthetic_series, LoadOptions,
    RunConfig,
};

#[derive(Parser)]
#[command(
    name = "cadence",
    about = "Cadence CLI — periodic-rebalance backtesting engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Directory holding one `<SYMBOL>.csv` per symbol.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Output directory for result artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Generate synthetic data for symbols with no CSV file.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Seed for the synthetic generator.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Skip artifact export, print the summary only.
        #[arg(long, default_value_t = false)]
        no_export: bool,

        /// Print the metrics as JSON instead of the summary table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the latest signal per symbol for a config's universe.
    Signals {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Directory holding one `<SYMBOL>.csv` per symbol.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Generate synthetic data for symbols with no CSV file.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Seed for the synthetic generator.
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Write seeded synthetic CSVs for offline experimentation.
    Synth {
        /// Symbols to generate (e.g. BTCUSDT ETHUSDT).
        #[arg(required = true)]
        symbols: Vec<String>,

        /// Start date (YYYY-MM-DD). Defaults to one year before end.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Generator seed.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Directory to write `<SYMBOL>.csv` files into.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            config,
            data_dir,
            output_dir,
            synthetic,
            seed,
            no_export,
            json,
        } => run_cmd(config, data_dir, output_dir, synthetic, seed, no_export, json),
        Commands::Signals {
            config,
            data_dir,
            synthetic,
            seed,
        } => signals_cmd(config, data_dir, synthetic, seed),
        Commands::Synth {
            symbols,
            start,
            end,
            seed,
            data_dir,
        } => synth_cmd(symbols, start, end, seed, data_dir),
    }
}

fn load_options(config: &RunConfig, synthetic: bool, seed: u64) -> LoadOptions {
    LoadOptions {
        start: config.backtest.start_date,
        end: config.backtest.end_date,
        synthetic,
        seed,
    }
}

#[allow(clippy::too_many_arguments)]
fn run_cmd(
    config_path: PathBuf,
    data_dir: PathBuf,
    output_dir: PathBuf,
    synthetic: bool,
    seed: u64,
    no_export: bool,
    json: bool,
) -> Result<()> {
    let config = RunConfig::from_toml_file(&config_path)?;
    let opts = load_options(&config, synthetic, seed);

    if !json {
        println!(
            "Running {} on {} symbol(s), {} → {} ({}, every {}d)",
            match config.strategy {
                cadence_runner::StrategyConfig::Breakout {
                    short_window,
                    long_window,
                } => format!("breakout_{short_window}_{long_window}"),
            },
            config.backtest.symbols.len(),
            config.backtest.start_date,
            config.backtest.end_date,
            config.backtest.rebalancing,
            config.backtest.frequency_days,
        );
    }

    let result = run_backtest(&config, &data_dir, &opts)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result.metrics)?);
        if !no_export {
            let paths = save_artifacts(&output_dir, &result)?;
            eprintln!("Artifacts saved to: {}", paths.run_dir.display());
        }
        return Ok(());
    }

    let final_nav = result.nav_curve().last().copied().unwrap_or_default();
    let m = &result.metrics;
    println!();
    println!("Run id:          {}", &result.run_id[..12]);
    println!("Final NAV:       {final_nav:.2} (capital {:.2})", result.initial_capital);
    println!("Ann. return:     {:+.2}%", m.annualized_return * 100.0);
    println!("Ann. vol:        {:.2}%", m.annualized_vol * 100.0);
    println!("Sharpe:          {:.2}", m.sharpe);
    println!("Max drawdown:    {:.2}", m.max_drawdown);
    println!("Hit rate:        {:.1}%", m.hit_rate * 100.0);
    println!(
        "Positions:       {} opened, {} closed, {} still open",
        m.nb_opened, m.nb_closed, m.nb_current_positions
    );
    println!(
        "Benchmark:       {:+.2}% ann., sharpe {:.2}",
        m.benchmark_annualized_return * 100.0,
        m.benchmark_sharpe
    );
    if result.has_synthetic {
        println!("NOTE: run includes synthetic data — not research output");
    }

    if no_export {
        return Ok(());
    }
    let paths = save_artifacts(&output_dir, &result)?;
    println!();
    println!("Artifacts saved to: {}", paths.run_dir.display());
    Ok(())
}

fn signals_cmd(config_path: PathBuf, data_dir: PathBuf, synthetic: bool, seed: u64) -> Result<()> {
    let config = RunConfig::from_toml_file(&config_path)?;
    let opts = load_options(&config, synthetic, seed);
    let loaded = load_series(&config.backtest.symbols, &data_dir, &opts)?;
    let signals: BTreeMap<Symbol, Signal> = current_signals(&config, &loaded)?;

    println!("Signals as of {}:", config.backtest.end_date);
    for (symbol, signal) in &signals {
        println!("  {symbol:<12} {}", signal.as_str());
    }
    Ok(())
}

fn synth_cmd(
    symbols: Vec<String>,
    start: Option<String>,
    end: Option<String>,
    seed: u64,
    data_dir: PathBuf,
) -> Result<()> {
    let end = match end {
        Some(text) => parse_date(&text)?,
        None => chrono::Utc::now().date_naive(),
    };
    let start = match start {
        Some(text) => parse_date(&text)?,
        None => end - chrono::Duration::days(365),
    };
    if start > end {
        bail!("start {start} is after end {end}");
    }

    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create {}", data_dir.display()))?;
    for symbol in &symbols {
        let series = synthetic_series(symbol, start, end, seed);
        let path = data_dir.join(format!("{symbol}.csv"));
        let mut file = std::fs::File::create(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        writeln!(file, "timestamp,open,high,low,close,volume")?;
        for bar in series.bars() {
            writeln!(
                file,
                "{},{:.6},{:.6},{:.6},{:.6},{:.2}",
                bar.ts.date(),
                bar.open,
                bar.high,
                bar.low,
                bar.close,
                bar.volume,
            )?;
        }
        println!("Wrote {} ({} bars)", path.display(), series.len());
    }
    Ok(())
}

fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{text}' (expected YYYY-MM-DD)"))
}
