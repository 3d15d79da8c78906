//! Signal computation command implementation.

use std::path::Path;

use anyhow::Result;
use cadiz_signals::{SignalConfig, SignalEngine, build_signal};
use cadiz_traits::InMemoryDataSource;
use chrono::NaiveDate;
use polars::prelude::*;

use super::banner;
use crate::data::write_csv;

/// Compute signals and alphas for `[start, end]`.
///
/// An empty `names` list runs every registered signal.
pub(crate) fn signals(
    source: &InMemoryDataSource,
    config: &SignalConfig,
    names: &[String],
    start: NaiveDate,
    end: NaiveDate,
    output: Option<&Path>,
) -> Result<()> {
    banner("Signal Alphas");

    let engine = if names.is_empty() {
        SignalEngine::new(config.clone())?
    } else {
        let signals = names
            .iter()
            .map(|name| build_signal(name, config))
            .collect::<cadiz_traits::Result<Vec<_>>>()?;
        SignalEngine::with_signals(config.clone(), signals)?
    };

    println!("Signals:  {}", engine.signal_names().join(", "));
    println!("Period:   {start} to {end}");
    println!("Lookback: {} trading days\n", engine.lookback());

    let mut alphas = engine.run(source, start, end)?;

    let summary = alphas
        .clone()
        .lazy()
        .group_by([col("name")])
        .agg([
            len().alias("rows"),
            col("alpha").count().alias("scored"),
            col("date").n_unique().alias("dates"),
        ])
        .sort(["name"], Default::default())
        .collect()?;
    println!("{summary}");

    if let Some(path) = output {
        write_csv(&mut alphas, path)?;
        println!("\nWritten to {}", path.display());
    }
    println!();
    Ok(())
}
