//! Window behaviour of the momentum and reversal signals on synthetic panels.

use approx::assert_relative_eq;
use cadiz_signals::{SignalConfig, SignalEngine};
use cadiz_traits::{
    Date, InMemoryDataSource,
    frame::{f64_values, str_values},
};
use chrono::Days;
use polars::prelude::*;
use rstest::rstest;

fn day(offset: usize) -> Date {
    Date::from_ymd_opt(2020, 1, 1)
        .unwrap()
        .checked_add_days(Days::new(offset as u64))
        .unwrap()
}

/// One row per day per asset with a constant daily return.
fn constant_panel(assets: &[(&str, f64)], days: usize) -> DataFrame {
    let mut dates = Vec::new();
    let mut names = Vec::new();
    let mut returns = Vec::new();
    for (asset, r) in assets {
        for t in 0..days {
            dates.push(day(t));
            names.push(*asset);
            returns.push(*r);
        }
    }
    let n = dates.len();
    df! {
        "date" => dates,
        "asset" => names,
        "return" => returns,
        "predicted_beta" => vec![1.0; n],
        "specific_risk" => vec![25.0; n],
    }
    .unwrap()
}

fn signal_values(raw: &DataFrame, name: &str) -> Vec<Option<f64>> {
    let names = str_values(raw, "name").unwrap();
    f64_values(raw, "signal")
        .unwrap()
        .into_iter()
        .zip(names)
        .filter(|(_, n)| n.as_deref() == Some(name))
        .map(|(v, _)| v)
        .collect()
}

#[rstest]
#[case(0.5)]
#[case(-1.25)]
#[case(2.0)]
fn momentum_equals_window_times_log_return(#[case] r: f64) {
    let engine = SignalEngine::new(SignalConfig::default()).unwrap();
    let raw = engine.compute_raw(&constant_panel(&[("A", r)], 300)).unwrap();
    let momentum = signal_values(&raw, "momentum");

    // full 230-day window at index 229, shifted by 22
    assert!(momentum[..251].iter().all(Option::is_none));
    let expected = 230.0 * (1.0 + r / 100.0).ln();
    for value in &momentum[251..] {
        assert_relative_eq!(value.unwrap(), expected, epsilon = 1e-10);
    }
}

#[rstest]
#[case(5, 3)]
#[case(22, 0)]
fn reversal_window_is_configurable(#[case] window: usize, #[case] extra: usize) {
    let config = SignalConfig {
        reversal_window: window,
        ..Default::default()
    };
    let engine = SignalEngine::new(config).unwrap();
    let raw = engine
        .compute_raw(&constant_panel(&[("A", 1.0)], window + extra))
        .unwrap();
    let reversal = signal_values(&raw, "reversal");

    assert!(reversal[..window - 1].iter().all(Option::is_none));
    let expected = -(window as f64) * 1.01_f64.ln();
    for value in &reversal[window - 1..] {
        assert_relative_eq!(value.unwrap(), expected, epsilon = 1e-10);
    }
}

#[test]
fn windows_do_not_cross_assets() {
    let engine = SignalEngine::new(SignalConfig {
        reversal_window: 3,
        ..Default::default()
    })
    .unwrap();
    let raw = engine
        .compute_raw(&constant_panel(&[("A", 1.0), ("B", -1.0)], 4))
        .unwrap();
    let reversal = signal_values(&raw, "reversal");

    // rows are ordered A then B, each with two warm-up nulls
    assert_eq!(reversal.len(), 8);
    assert!(reversal[0].is_none() && reversal[1].is_none());
    assert!(reversal[4].is_none() && reversal[5].is_none());
    assert!(reversal[2].unwrap() < 0.0);
    assert!(reversal[6].unwrap() > 0.0);
}

#[test]
fn run_trims_to_requested_dates_and_scores() {
    // log returns of +x, 0, -x give z-scores of exactly 1, 0, -1
    let x: f64 = 0.002;
    let panel = constant_panel(
        &[("A", 100.0 * x.exp_m1()), ("B", 0.0), ("C", 100.0 * (-x).exp_m1())],
        420,
    );
    let source = InMemoryDataSource::new().with_assets(panel).unwrap();
    let engine = SignalEngine::new(SignalConfig::default()).unwrap();

    let start = day(400);
    let end = day(410);
    let alphas = engine.run(&source, start, end).unwrap();

    // 11 days × 3 assets × 3 signals
    assert_eq!(alphas.height(), 99);
    let momentum_alphas: Vec<f64> = signal_values(
        &alphas
            .clone()
            .lazy()
            .select([col("date"), col("asset"), col("name"), col("alpha").alias("signal")])
            .collect()
            .unwrap(),
        "momentum",
    )
    .into_iter()
    .map(Option::unwrap)
    .collect();

    // sorted by asset: A has the highest momentum, C the lowest
    assert!(momentum_alphas[0] > 0.0);
    assert!(momentum_alphas[32] < 0.0);
    assert_relative_eq!(momentum_alphas[0], 0.05 * 25.0, epsilon = 1e-9);
}
