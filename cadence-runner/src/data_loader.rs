//! Series loading and data resolution for the runner.
//!
//! Given a list of symbols, loads one CSV per symbol from the data
//! directory and returns validated series. Fallback policy:
//! 1. If `<data_dir>/<SYMBOL>.csv` exists → parse and validate it
//! 2. If not and `synthetic` is set → generate seeded synthetic bars (tagged)
//! 3. Otherwise → fail with a clear error
//!
//! Expected CSV schema: `timestamp,open,high,low,close,volume` with
//! timestamps as `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use cadence_core::data::{PriceSeries, SeriesError};
use cadence_core::domain::{Bar, Symbol};
use cadence_core::fingerprint::dataset_fingerprint;

use crate::synthetic::synthetic_series;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no data file for '{symbol}' at {} (use --synthetic for generated data)", path.display())]
    MissingFile { symbol: Symbol, path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{} record {record}: {message}", path.display())]
    Malformed {
        path: PathBuf,
        record: usize,
        message: String,
    },

    #[error(transparent)]
    Series(#[from] SeriesError),
}

/// Options controlling how series are loaded.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Start date, used to bound synthetic generation.
    pub start: NaiveDate,
    /// End date, used to bound synthetic generation.
    pub end: NaiveDate,
    /// Generate synthetic bars for symbols with no data file.
    pub synthetic: bool,
    /// Seed for the synthetic generator.
    pub seed: u64,
}

/// Where one symbol's data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DataSource {
    CsvImport,
    Synthetic,
}

/// Result of loading series, including provenance.
#[derive(Debug)]
pub struct LoadedData {
    pub series: BTreeMap<Symbol, PriceSeries>,
    pub sources: BTreeMap<Symbol, DataSource>,
    /// BLAKE3 over all bar data, for result fingerprinting.
    pub dataset_fingerprint: String,
    /// Whether any symbol used synthetic data.
    pub has_synthetic: bool,
}

/// Load series for a set of symbols from `data_dir`, with synthetic
/// fallback when requested.
pub fn load_series(
    symbols: &[String],
    data_dir: &Path,
    opts: &LoadOptions,
) -> Result<LoadedData, LoadError> {
    let mut series = BTreeMap::new();
    let mut sources = BTreeMap::new();
    let mut has_synthetic = false;

    for symbol in symbols {
        let path = data_dir.join(format!("{symbol}.csv"));
        if path.is_file() {
            series.insert(symbol.clone(), read_csv_series(symbol, &path)?);
            sources.insert(symbol.clone(), DataSource::CsvImport);
        } else if opts.synthetic {
            series.insert(
                symbol.clone(),
                synthetic_series(symbol, opts.start, opts.end, opts.seed),
            );
            sources.insert(symbol.clone(), DataSource::Synthetic);
            has_synthetic = true;
        } else {
            return Err(LoadError::MissingFile {
                symbol: symbol.clone(),
                path,
            });
        }
    }

    let dataset_fingerprint = dataset_fingerprint(&series);
    Ok(LoadedData {
        series,
        sources,
        dataset_fingerprint,
        has_synthetic,
    })
}

/// Parse one `timestamp,open,high,low,close,volume` CSV into a validated
/// series.
pub fn read_csv_series(symbol: &str, path: &Path) -> Result<PriceSeries, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let mut bars = Vec::new();
    for (record_idx, record) in reader.records().enumerate() {
        let record = record.map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let malformed = |message: String| LoadError::Malformed {
            path: path.to_path_buf(),
            record: record_idx + 1,
            message,
        };
        if record.len() < 6 {
            return Err(malformed(format!(
                "expected 6 columns (timestamp,open,high,low,close,volume), got {}",
                record.len()
            )));
        }
        let ts = parse_timestamp(&record[0])
            .ok_or_else(|| malformed(format!("bad timestamp '{}'", &record[0])))?;
        let mut fields = [0.0_f64; 5];
        for (i, field) in fields.iter_mut().enumerate() {
            *field = record[i + 1]
                .parse::<f64>()
                .map_err(|_| malformed(format!("bad number '{}'", &record[i + 1])))?;
        }
        let [open, high, low, close, volume] = fields;
        bars.push(Bar {
            ts,
            open,
            high,
            low,
            close,
            volume,
        });
    }

    Ok(PriceSeries::new(symbol, bars)?)
}

fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    if let Ok(ts) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return Some(ts);
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
