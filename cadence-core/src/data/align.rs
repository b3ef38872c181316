//! As-of alignment of raw series onto the simulation calendar.
//!
//! For every calendar timestamp, each symbol gets the most recent raw
//! observation at or before that timestamp. Before a symbol's first
//! observation the aligned slot is `None` — no value is ever substituted,
//! and the engine treats `None` as "no trading allowed this step". The
//! transform is pure and independent per symbol.

use serde::{Deserialize, Serialize};

use super::series::PriceSeries;
use crate::calendar::SimulationCalendar;
use crate::domain::{Bar, Symbol};

/// One symbol's price series reindexed onto the calendar.
///
/// `bars` has exactly the calendar's length. Once a slot is `Some`, every
/// later slot is `Some` too (as-of semantics forward-fill by construction).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignedSeries {
    pub symbol: Symbol,
    bars: Vec<Option<Bar>>,
}

impl AlignedSeries {
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bar(&self, idx: usize) -> Option<&Bar> {
        self.bars[idx].as_ref()
    }

    pub fn close(&self, idx: usize) -> Option<f64> {
        self.bars[idx].as_ref().map(|b| b.close)
    }

    /// The close column over the whole calendar.
    pub fn closes(&self) -> Vec<Option<f64>> {
        self.bars.iter().map(|b| b.as_ref().map(|b| b.close)).collect()
    }

    /// First calendar index with a defined observation, if any.
    pub fn first_defined(&self) -> Option<usize> {
        self.bars.iter().position(|b| b.is_some())
    }

    /// Number of leading calendar steps with no observation.
    pub fn undefined_steps(&self) -> usize {
        self.first_defined().unwrap_or(self.bars.len())
    }
}

/// Reindex one raw series onto the calendar with latest-at-or-before
/// semantics.
pub fn align_to_calendar(series: &PriceSeries, calendar: &SimulationCalendar) -> AlignedSeries {
    let raw = series.bars();
    let mut aligned = Vec::with_capacity(calendar.len());
    // Two-pointer walk: raw and calendar are both sorted ascending.
    let mut cursor: usize = 0;
    let mut latest: Option<&Bar> = None;
    for &ts in calendar.timestamps() {
        while cursor < raw.len() && raw[cursor].ts <= ts {
            latest = Some(&raw[cursor]);
            cursor += 1;
        }
        aligned.push(latest.cloned());
    }
    AlignedSeries {
        symbol: series.symbol().to_string(),
        bars: aligned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(day: u32, close: f64) -> Bar {
        Bar {
            ts: NaiveDate::from_ymd_opt(2025, 7, day)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            open: close - 1.0,
            high: close + 1.0,
            low: close - 2.0,
            close,
            volume: 1000.0,
        }
    }

    fn calendar(from: u32, to: u32) -> SimulationCalendar {
        SimulationCalendar::build(
            NaiveDate::from_ymd_opt(2025, 7, from).unwrap(),
            NaiveDate::from_ymd_opt(2025, 7, to).unwrap(),
            "1d",
        )
        .unwrap()
    }

    #[test]
    fn forward_fills_gaps() {
        let series =
            PriceSeries::new("BTCUSDT", vec![bar(1, 100.0), bar(2, 101.0), bar(5, 104.0)])
                .unwrap();
        let aligned = align_to_calendar(&series, &calendar(1, 6));
        assert_eq!(aligned.len(), 6);
        assert_eq!(aligned.close(0), Some(100.0));
        assert_eq!(aligned.close(1), Some(101.0));
        // gap on the 3rd and 4th: latest known value carries
        assert_eq!(aligned.close(2), Some(101.0));
        assert_eq!(aligned.close(3), Some(101.0));
        assert_eq!(aligned.close(4), Some(104.0));
        assert_eq!(aligned.close(5), Some(104.0));
    }

    #[test]
    fn undefined_before_first_observation() {
        let series = PriceSeries::new("SOLUSDT", vec![bar(4, 20.0)]).unwrap();
        let aligned = align_to_calendar(&series, &calendar(1, 6));
        assert_eq!(aligned.close(0), None);
        assert_eq!(aligned.close(2), None);
        assert_eq!(aligned.close(3), Some(20.0));
        assert_eq!(aligned.first_defined(), Some(3));
        assert_eq!(aligned.undefined_steps(), 3);
    }

    #[test]
    fn empty_series_aligns_to_all_none() {
        let series = PriceSeries::new("PUMPUSDT", vec![]).unwrap();
        let aligned = align_to_calendar(&series, &calendar(1, 6));
        assert_eq!(aligned.len(), 6);
        assert!(aligned.closes().iter().all(|c| c.is_none()));
        assert_eq!(aligned.undefined_steps(), 6);
    }

    #[test]
    fn once_defined_always_defined() {
        let series = PriceSeries::new("ETHUSDT", vec![bar(3, 50.0)]).unwrap();
        let aligned = align_to_calendar(&series, &calendar(1, 6));
        let first = aligned.first_defined().unwrap();
        for idx in first..aligned.len() {
            assert!(aligned.close(idx).is_some());
        }
    }

    #[test]
    fn observation_after_calendar_is_ignored() {
        let series = PriceSeries::new("BTCUSDT", vec![bar(10, 999.0)]).unwrap();
        let aligned = align_to_calendar(&series, &calendar(1, 6));
        assert!(aligned.closes().iter().all(|c| c.is_none()));
    }
}
