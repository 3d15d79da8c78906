//! Paper portfolio command implementation.

use std::path::Path;

use anyhow::Result;
use cadiz_combine::PaperPortfolioBuilder;
use cadiz_traits::InMemoryDataSource;
use polars::prelude::*;

use super::banner;
use crate::{config::CadizConfig, data};

/// Build the paper portfolio of every signal and date in an alpha file.
pub(crate) fn paper(
    source: &InMemoryDataSource,
    config: &CadizConfig,
    alphas: &Path,
    output: Option<&Path>,
) -> Result<()> {
    banner("Paper Portfolios");

    let alphas = data::read_csv(alphas)?;
    let builder = PaperPortfolioBuilder::new(config.risk_parity.paper_gamma)
        .with_settings(config.solver.clone());

    println!("Gamma:       {}", builder.gamma());
    println!(
        "Constraints: {}\n",
        builder
            .constraints()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );

    let mut weights = builder.build(source, &alphas)?;

    let summary = weights
        .clone()
        .lazy()
        .group_by([col("signal"), col("date")])
        .agg([col("weight").abs().sum().alias("gross")])
        .group_by([col("signal")])
        .agg([
            col("date").count().alias("dates"),
            col("gross").mean().alias("mean_gross"),
        ])
        .sort(["signal"], Default::default())
        .collect()?;
    println!("{summary}");

    if let Some(path) = output {
        data::write_csv(&mut weights, path)?;
        println!("\nWritten to {}", path.display());
    }
    println!();
    Ok(())
}
