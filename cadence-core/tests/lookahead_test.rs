//! Look-ahead contamination tests.
//!
//! Invariant: nothing the state machine does at step t may depend on price
//! data from step t or later, except the close used to price the
//! transaction itself. Signals in particular are lagged by one full bar.
//!
//! Method: run the pipeline on a full series and on the same series with the
//! tail mutated; every ledger row before the mutation point must be
//! identical. Any difference means future data leaked into past decisions.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use cadence_core::config::SimParams;
use cadence_core::data::{align_to_calendar, PriceSeries};
use cadence_core::domain::{Bar, RebalancePolicy, Signal, Symbol};
use cadence_core::engine::simulate;
use cadence_core::signals::{lag_signals, Breakout, SignalStrategy};

/// Deterministic pseudo-random walk using a simple LCG.
fn make_bars(n: usize) -> Vec<Bar> {
    let base = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    let mut price = 100.0_f64;
    let mut bars = Vec::with_capacity(n);
    for i in 0..n {
        let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1);
        let change = ((seed % 200) as f64 - 100.0) * 0.05;
        price = (price + change).max(10.0);
        bars.push(Bar {
            ts: (base + chrono::Duration::days(i as i64))
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            open: price - 0.5,
            high: price + 2.0,
            low: price - 2.0,
            close: price,
            volume: 1000.0,
        });
    }
    bars
}

fn params(days: usize) -> SimParams {
    let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    SimParams {
        initial_capital: 1000.0,
        fee: 0.001,
        granularity: "1d".into(),
        start_date: start,
        end_date: start + chrono::Duration::days(days as i64 - 1),
        frequency_days: 7,
        policy: RebalancePolicy::ProRataActive,
    }
}

#[test]
fn mutating_the_final_bar_leaves_all_earlier_rows_unchanged() {
    let days = 60;
    let p = params(days);
    let strategy = Breakout::new(5, 20);

    let bars = make_bars(days);
    let mut mutated = bars.clone();
    {
        let last = mutated.last_mut().unwrap();
        last.close *= 10.0;
        last.high *= 10.0;
        last.open *= 10.0;
        last.low *= 10.0;
    }

    let mut series_a: BTreeMap<Symbol, PriceSeries> = BTreeMap::new();
    series_a.insert("AAA".into(), PriceSeries::new("AAA", bars).unwrap());
    let mut series_b: BTreeMap<Symbol, PriceSeries> = BTreeMap::new();
    series_b.insert("AAA".into(), PriceSeries::new("AAA", mutated).unwrap());

    let a = simulate(&p, &series_a, &strategy).unwrap();
    let b = simulate(&p, &series_b, &strategy).unwrap();

    for idx in 0..days - 1 {
        assert_eq!(
            a.result.symbols["AAA"].step(idx),
            b.result.symbols["AAA"].step(idx),
            "symbol row {idx} depends on the final bar"
        );
        assert_eq!(
            a.result.portfolio.step(idx),
            b.result.portfolio.step(idx),
            "portfolio row {idx} depends on the final bar"
        );
    }
}

#[test]
fn lagged_signal_ignores_the_bar_it_is_exposed_at() {
    let days = 40;
    let p = params(days);
    let strategy = Breakout::new(5, 20);
    let calendar = cadence_core::calendar::SimulationCalendar::build(
        p.start_date,
        p.end_date,
        &p.granularity,
    )
    .unwrap();

    let bars = make_bars(days);
    let mut spiked = bars.clone();
    {
        // a huge spike on the final bar flips the raw signal there
        let last = spiked.last_mut().unwrap();
        last.high *= 100.0;
        last.close = last.high - 1.0;
        last.open = last.close;
        last.low = last.close - 1.0;
    }

    let aligned_a = align_to_calendar(&PriceSeries::new("AAA", bars).unwrap(), &calendar);
    let aligned_b = align_to_calendar(&PriceSeries::new("AAA", spiked).unwrap(), &calendar);

    let lagged_a = lag_signals(&strategy.generate(&aligned_a));
    let lagged_b = lag_signals(&strategy.generate(&aligned_b));

    // the raw signal differs at the last step, the lagged one cannot
    assert_eq!(
        lagged_a.last(),
        lagged_b.last(),
        "lagged signal at t observed data from t"
    );
}

#[test]
fn spike_on_a_rebalance_bar_does_not_open_on_that_bar() {
    // steadily falling highs keep the strategy Flat; a breakout spike lands
    // exactly on a rebalance step. The raw signal flips Long on that bar,
    // but the lagged signal is still Flat, so nothing opens there.
    let days = 29;
    let p = params(days);
    let strategy = Breakout::new(2, 5);

    let base = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    let bars: Vec<Bar> = (0..days)
        .map(|i| {
            let close = if i == 14 { 500.0 } else { 200.0 - i as f64 };
            Bar {
                ts: (base + chrono::Duration::days(i as i64))
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1.0,
            }
        })
        .collect();

    let mut series: BTreeMap<Symbol, PriceSeries> = BTreeMap::new();
    series.insert("AAA".into(), PriceSeries::new("AAA", bars).unwrap());
    let backtest = simulate(&p, &series, &strategy).unwrap();

    // at the spike rebalance the exposed signal is the one from step 13
    let row14 = backtest.result.symbols["AAA"].step(14);
    assert_eq!(row14.signal, Signal::Flat);
    assert_eq!(row14.units, 0.0);
    assert_eq!(backtest.result.portfolio.step(14).opened_positions, 0);
    // the raw signal has decayed again by the next rebalance, so the spike
    // never buys anything at all
    for idx in 0..days {
        assert_eq!(backtest.result.symbols["AAA"].step(idx).units, 0.0);
    }
}
