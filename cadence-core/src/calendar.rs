//! Simulation calendar and rebalance schedule.
//!
//! The calendar is the single time axis shared by every ledger and aligned
//! series in a run: a strictly increasing, regularly spaced sequence of
//! timestamps between two immutable bounds. The rebalance schedule is the
//! subset of calendar steps where the close/open/reallocate protocol runs,
//! spaced a fixed number of calendar days apart and anchored at the first
//! timestamp.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Parsed bar granularity: a positive multiple of a day/hour/minute unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Granularity {
    pub multiple: u32,
    pub unit: GranularityUnit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GranularityUnit {
    Day,
    Hour,
    Minute,
}

impl Granularity {
    /// Parse a token like `"1d"`, `"4h"`, `"15m"`. A bare unit (`"d"`) means
    /// a multiple of one. Unknown units and non-positive multiples are
    /// rejected.
    pub fn parse(token: &str) -> Result<Self, ConfigError> {
        let bad = || ConfigError::BadGranularity(token.to_string());
        let lower = token.trim().to_ascii_lowercase();
        let unit = match lower.chars().last() {
            Some('d') => GranularityUnit::Day,
            Some('h') => GranularityUnit::Hour,
            Some('m') => GranularityUnit::Minute,
            _ => return Err(bad()),
        };
        let digits = &lower[..lower.len() - 1];
        let multiple = if digits.is_empty() {
            1
        } else {
            digits.parse::<u32>().map_err(|_| bad())?
        };
        if multiple == 0 {
            return Err(bad());
        }
        Ok(Self { multiple, unit })
    }

    /// The spacing between consecutive calendar timestamps.
    pub fn step(&self) -> Duration {
        let m = i64::from(self.multiple);
        match self.unit {
            GranularityUnit::Day => Duration::days(m),
            GranularityUnit::Hour => Duration::hours(m),
            GranularityUnit::Minute => Duration::minutes(m),
        }
    }
}

/// The ordered sequence of simulation timestamps.
///
/// Invariants: non-empty, strictly increasing, spaced exactly one
/// granularity step apart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationCalendar {
    timestamps: Vec<NaiveDateTime>,
    granularity: Granularity,
}

impl SimulationCalendar {
    /// Build the grid from start-midnight to end-midnight inclusive,
    /// stepping by the parsed granularity.
    pub fn build(
        start: NaiveDate,
        end: NaiveDate,
        granularity: &str,
    ) -> Result<Self, ConfigError> {
        let granularity = Granularity::parse(granularity)?;
        if start > end {
            return Err(ConfigError::EmptyCalendar { start, end });
        }
        let step = granularity.step();
        let bound = end.and_hms_opt(0, 0, 0).expect("midnight is always valid");
        let mut t = start.and_hms_opt(0, 0, 0).expect("midnight is always valid");
        let mut timestamps = Vec::new();
        while t <= bound {
            timestamps.push(t);
            t = t + step;
        }
        debug_assert!(!timestamps.is_empty());
        Ok(Self {
            timestamps,
            granularity,
        })
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn first(&self) -> NaiveDateTime {
        self.timestamps[0]
    }

    pub fn last(&self) -> NaiveDateTime {
        *self.timestamps.last().expect("calendar is non-empty")
    }

    /// Index of an exact grid timestamp, if present.
    pub fn position_of(&self, ts: NaiveDateTime) -> Option<usize> {
        self.timestamps.binary_search(&ts).ok()
    }
}

/// Calendar indices at which the rebalance protocol runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebalanceSchedule {
    indices: Vec<usize>,
    mask: Vec<bool>,
}

impl RebalanceSchedule {
    /// Timestamps `calendar[0] + k * frequency_days` that land on the grid.
    ///
    /// For day-multiple granularities every target lands on the grid; for
    /// sub-daily grids whose step does not divide a day, off-grid targets
    /// are dropped, preserving the invariant that every rebalance step is a
    /// calendar member.
    pub fn build(
        calendar: &SimulationCalendar,
        frequency_days: u32,
    ) -> Result<Self, ConfigError> {
        if frequency_days == 0 {
            return Err(ConfigError::BadFrequency(0));
        }
        let anchor = calendar.first();
        let last = calendar.last();
        let mut indices = Vec::new();
        let mut mask = vec![false; calendar.len()];
        let mut k: i64 = 0;
        loop {
            let target = anchor + Duration::days(k * i64::from(frequency_days));
            if target > last {
                break;
            }
            if let Some(idx) = calendar.position_of(target) {
                indices.push(idx);
                mask[idx] = true;
            }
            k += 1;
        }
        Ok(Self { indices, mask })
    }

    pub fn is_rebalance(&self, idx: usize) -> bool {
        self.mask.get(idx).copied().unwrap_or(false)
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}
