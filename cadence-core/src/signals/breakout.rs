//! Breakout strategy — short-window high versus long-window high.

use crate::data::AlignedSeries;
use crate::domain::Signal;

use super::SignalStrategy;

/// Long when the max high over the trailing `short_window` bars reaches the
/// max high over the trailing `long_window` bars.
///
/// Both windows end at the evaluated index inclusive. During warmup (fewer
/// than `long_window` defined bars available) the strategy stays `Flat`.
#[derive(Debug, Clone)]
pub struct Breakout {
    pub short_window: usize,
    pub long_window: usize,
}

impl Breakout {
    pub fn new(short_window: usize, long_window: usize) -> Self {
        assert!(short_window >= 1, "short_window must be >= 1");
        assert!(
            long_window >= short_window,
            "long_window must be >= short_window"
        );
        Self {
            short_window,
            long_window,
        }
    }

    pub fn default_params() -> Self {
        Self::new(5, 20)
    }

    fn window_max_high(series: &AlignedSeries, start: usize, end: usize) -> Option<f64> {
        let mut max = f64::NEG_INFINITY;
        for idx in start..=end {
            max = max.max(series.bar(idx)?.high);
        }
        Some(max)
    }
}

impl SignalStrategy for Breakout {
    fn name(&self) -> String {
        format!("breakout_{}_{}", self.short_window, self.long_window)
    }

    fn warmup_bars(&self) -> usize {
        self.long_window
    }

    fn evaluate(&self, series: &AlignedSeries, idx: usize) -> Signal {
        if idx + 1 < self.long_window {
            return Signal::Flat;
        }
        let long_start = idx + 1 - self.long_window;
        let short_start = idx + 1 - self.short_window;
        let long_high = Self::window_max_high(series, long_start, idx);
        let short_high = Self::window_max_high(series, short_start, idx);
        match (short_high, long_high) {
            (Some(s), Some(l)) if s >= l => Signal::Long,
            _ => Signal::Flat,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::SimulationCalendar;
    use crate::data::{align_to_calendar, PriceSeries};
    use crate::domain::Bar;
    use chrono::NaiveDate;

    fn aligned_from_highs(highs: &[f64]) -> AlignedSeries {
        let base = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let bars: Vec<Bar> = highs
            .iter()
            .enumerate()
            .map(|(i, &high)| Bar {
                ts: (base + chrono::Duration::days(i as i64))
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
                open: high - 1.0,
                high,
                low: high - 2.0,
                close: high - 0.5,
                volume: 1000.0,
            })
            .collect();
        let end = base + chrono::Duration::days(highs.len() as i64 - 1);
        let calendar = SimulationCalendar::build(base, end, "1d").unwrap();
        align_to_calendar(&PriceSeries::new("BTCUSDT", bars).unwrap(), &calendar)
    }

    #[test]
    fn flat_during_warmup() {
        let strat = Breakout::new(2, 4);
        let series = aligned_from_highs(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        assert_eq!(strat.evaluate(&series, 0), Signal::Flat);
        assert_eq!(strat.evaluate(&series, 2), Signal::Flat);
        // first index with a full long window
        assert_eq!(strat.evaluate(&series, 3), Signal::Long);
    }

    #[test]
    fn long_when_recent_high_leads() {
        let strat = Breakout::new(2, 4);
        // rising highs: the short window always contains the long max
        let series = aligned_from_highs(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0]);
        assert_eq!(strat.evaluate(&series, 5), Signal::Long);
    }

    #[test]
    fn flat_when_old_high_dominates() {
        let strat = Breakout::new(2, 4);
        // spike early, fade after: long max sits outside the short window
        let series = aligned_from_highs(&[10.0, 50.0, 12.0, 11.0, 10.5, 10.2]);
        assert_eq!(strat.evaluate(&series, 4), Signal::Flat);
    }

    #[test]
    fn flat_when_window_reaches_undefined_bars() {
        let strat = Breakout::new(2, 3);
        let base = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let calendar = SimulationCalendar::build(
            base,
            NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            "1d",
        )
        .unwrap();
        // first observation on the 4th: indices 0..=2 are undefined
        let bars = vec![Bar {
            ts: NaiveDate::from_ymd_opt(2025, 1, 4)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            open: 9.0,
            high: 10.0,
            low: 8.0,
            close: 9.5,
            volume: 1.0,
        }];
        let series = align_to_calendar(&PriceSeries::new("SOLUSDT", bars).unwrap(), &calendar);
        // index 4 needs defined bars at 2..=4, but 2 is undefined
        assert_eq!(strat.evaluate(&series, 4), Signal::Flat);
        // index 5 sees forward-filled bars at 3..=5
        assert_eq!(strat.evaluate(&series, 5), Signal::Long);
    }

    #[test]
    fn name_carries_windows() {
        assert_eq!(Breakout::new(5, 20).name(), "breakout_5_20");
    }
}
