//! Equal-weight buy-and-hold benchmark.
//!
//! Capital is split evenly across the universe and invested at the second
//! rebalance timestamp (the first one a lagged strategy could realistically
//! act on); before the anchor the benchmark sits in cash. Symbols with no
//! known price at the anchor keep their slice in cash for the whole run.

use std::collections::BTreeMap;

use cadence_core::calendar::{RebalanceSchedule, SimulationCalendar};
use cadence_core::data::AlignedSeries;
use cadence_core::domain::Symbol;

/// The benchmark NAV series, one value per calendar step.
pub fn buy_and_hold_curve(
    initial_capital: f64,
    calendar: &SimulationCalendar,
    schedule: &RebalanceSchedule,
    aligned: &BTreeMap<Symbol, AlignedSeries>,
) -> Vec<f64> {
    let len = calendar.len();
    if aligned.is_empty() {
        return vec![initial_capital; len];
    }

    let anchor = schedule.indices().get(1).copied().unwrap_or(0);
    let slice = initial_capital / aligned.len() as f64;

    // units per symbol, bought at the anchor close; un-priced slices stay cash
    let mut units: BTreeMap<&Symbol, f64> = BTreeMap::new();
    let mut cash = 0.0;
    for (symbol, series) in aligned {
        match series.close(anchor) {
            Some(close) => {
                units.insert(symbol, slice / close);
            }
            None => cash += slice,
        }
    }

    (0..len)
        .map(|idx| {
            if idx < anchor {
                initial_capital
            } else {
                cash + units
                    .iter()
                    .map(|(symbol, &u)| {
                        let close = aligned[*symbol].close(idx).unwrap_or_default();
                        u * close
                    })
                    .sum::<f64>()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::data::{align_to_calendar, PriceSeries};
    use cadence_core::domain::Bar;
    use chrono::NaiveDate;

    fn setup(closes: &[(&str, f64)]) -> (SimulationCalendar, RebalanceSchedule, BTreeMap<Symbol, AlignedSeries>) {
        let start = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 7, 15).unwrap();
        let calendar = SimulationCalendar::build(start, end, "1d").unwrap();
        let schedule = RebalanceSchedule::build(&calendar, 7).unwrap();
        let aligned = closes
            .iter()
            .map(|(symbol, close)| {
                let bars: Vec<Bar> = (0..15)
                    .map(|i| Bar {
                        ts: (start + chrono::Duration::days(i))
                            .and_hms_opt(0, 0, 0)
                            .unwrap(),
                        open: *close,
                        high: close + 1.0,
                        low: close - 1.0,
                        close: *close,
                        volume: 1.0,
                    })
                    .collect();
                let series = PriceSeries::new(*symbol, bars).unwrap();
                (symbol.to_string(), align_to_calendar(&series, &calendar))
            })
            .collect();
        (calendar, schedule, aligned)
    }

    #[test]
    fn flat_prices_hold_initial_capital_after_anchor() {
        let (calendar, schedule, aligned) = setup(&[("AAA", 10.0), ("BBB", 50.0)]);
        let curve = buy_and_hold_curve(1000.0, &calendar, &schedule, &aligned);
        assert_eq!(curve.len(), calendar.len());
        for value in &curve {
            assert!((value - 1000.0).abs() < 1e-9);
        }
    }

    #[test]
    fn cash_before_the_anchor() {
        let (calendar, schedule, aligned) = setup(&[("AAA", 10.0)]);
        let curve = buy_and_hold_curve(1000.0, &calendar, &schedule, &aligned);
        let anchor = schedule.indices()[1];
        for value in curve.iter().take(anchor) {
            assert_eq!(*value, 1000.0);
        }
    }

    #[test]
    fn empty_universe_is_all_cash() {
        let start = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 7, 10).unwrap();
        let calendar = SimulationCalendar::build(start, end, "1d").unwrap();
        let schedule = RebalanceSchedule::build(&calendar, 7).unwrap();
        let curve = buy_and_hold_curve(1000.0, &calendar, &schedule, &BTreeMap::new());
        assert!(curve.iter().all(|v| *v == 1000.0));
    }
}
