//! Composite alpha command implementation.

use std::path::Path;

use anyhow::Result;
use cadiz_combine::{Combiner, PaperPortfolioBuilder, RiskParityBlender};
use cadiz_traits::InMemoryDataSource;
use polars::prelude::*;

use super::banner;
use crate::{config::CadizConfig, data};

/// Blend signal alphas by inverse paper-portfolio volatility.
///
/// Paper weights are read from `weights` when given, otherwise built.
pub(crate) fn blend(
    source: &InMemoryDataSource,
    config: &CadizConfig,
    alphas: &Path,
    weights: Option<&Path>,
    output: Option<&Path>,
) -> Result<()> {
    banner("Risk-Parity Blend");

    let alphas = data::read_csv(alphas)?;
    let weights = match weights {
        Some(path) => data::read_csv(path)?,
        None => PaperPortfolioBuilder::new(config.risk_parity.paper_gamma)
            .with_settings(config.solver.clone())
            .build(source, &alphas)?,
    };

    let blender = RiskParityBlender::new(config.risk_parity.clone());
    println!("Blender:           {}", blender.name());
    println!(
        "Volatility window: {} days\n",
        blender.config().volatility_window
    );

    let mut composite = blender.run_with_weights(source, &alphas, &weights)?;

    let summary = composite
        .clone()
        .lazy()
        .group_by([col("date")])
        .agg([
            len().alias("assets"),
            col("alpha").mean().alias("mean_alpha"),
            col("alpha").std(1).alias("dispersion"),
        ])
        .sort(["date"], Default::default())
        .tail(5)
        .collect()?;
    println!("Composite alphas: {} rows", composite.height());
    println!("{summary}");

    if let Some(path) = output {
        data::write_csv(&mut composite, path)?;
        println!("\nWritten to {}", path.display());
    }
    println!();
    Ok(())
}
