//! Portfolio optimization command implementation.

use std::path::Path;

use anyhow::{Result, bail};
use cadiz_optimize::{Constraint, MeanVarianceOptimizer};
use cadiz_traits::{
    Alpha, InMemoryDataSource, Portfolio, benchmark_weights,
    frame::{require_columns, str_values},
};
use chrono::NaiveDate;
use polars::prelude::*;

use super::banner;
use crate::{config::CadizConfig, data};

/// Command-line options of `cadiz optimize`.
#[derive(Debug)]
pub(crate) struct OptimizeArgs<'a> {
    pub(crate) alphas: &'a Path,
    pub(crate) name: Option<&'a str>,
    pub(crate) date: NaiveDate,
    pub(crate) constraints: &'a [Constraint],
    pub(crate) gamma: Option<f64>,
    pub(crate) output: Option<&'a Path>,
}

/// Optimize the portfolio for one date and report its risk.
pub(crate) fn optimize(
    source: &InMemoryDataSource,
    config: &CadizConfig,
    args: OptimizeArgs<'_>,
) -> Result<()> {
    banner("Portfolio Optimization");

    let frame = select_alphas(data::read_csv(args.alphas)?, args.name)?;
    let alpha = Alpha::from_frame(&frame, args.date)?;
    let gamma = args.gamma.unwrap_or(config.gamma);

    println!("Date:        {}", args.date);
    println!("Assets:      {}", alpha.universe().len());
    println!("Gamma:       {gamma}");
    println!(
        "Constraints: {}\n",
        args.constraints
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );

    let (portfolio, covariance) = MeanVarianceOptimizer::new(config.solver.clone())
        .optimize_with_covariance(source, &alpha, args.constraints, gamma)?;

    println!("Net exposure:   {:.4}", portfolio.net_exposure());
    println!("Gross leverage: {:.4}", portfolio.gross_leverage());
    println!("Risk:           {:.2}%", portfolio.risk(&covariance)?);
    println!(
        "Expected alpha: {:.4}%",
        portfolio.weights().dot(alpha.values())
    );

    if let Some(benchmark) = benchmark(source, &portfolio)? {
        println!(
            "Active risk:    {:.2}%",
            portfolio.active_risk(&benchmark, &covariance)?
        );
    }

    let mut ranked: Vec<(&String, f64)> = portfolio
        .universe()
        .iter()
        .zip(portfolio.weights().iter().copied())
        .collect();
    ranked.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
    println!("\n{:<12} {:>10}", "Asset", "Weight");
    println!("{}", "─".repeat(23));
    for (asset, weight) in ranked.iter().take(20) {
        println!("{asset:<12} {weight:>10.4}");
    }
    if ranked.len() > 20 {
        println!("... {} more", ranked.len() - 20);
    }

    if let Some(path) = args.output {
        data::write_csv(&mut portfolio.to_frame()?, path)?;
        println!("\nWritten to {}", path.display());
    }
    println!();
    Ok(())
}

/// Keep the rows of one alpha stream.
///
/// Without a name the file must hold a single stream.
fn select_alphas(frame: DataFrame, name: Option<&str>) -> Result<DataFrame> {
    if frame.column("name").is_err() {
        return Ok(frame);
    }
    if let Some(name) = name {
        return Ok(frame.lazy().filter(col("name").eq(lit(name))).collect()?);
    }
    let mut names: Vec<String> = str_values(&frame, "name")?.into_iter().flatten().collect();
    names.sort_unstable();
    names.dedup();
    if names.len() > 1 {
        bail!(
            "alpha file holds several streams ({}); pick one with --name",
            names.join(", ")
        );
    }
    Ok(frame)
}

/// Market-cap benchmark on the portfolio's date and universe, if available.
fn benchmark(source: &InMemoryDataSource, portfolio: &Portfolio) -> Result<Option<Portfolio>> {
    let Some(assets) = source.assets() else {
        return Ok(None);
    };
    if require_columns(assets, &["market_cap"]).is_err() {
        return Ok(None);
    }
    let weights = benchmark_weights(assets)?;
    let Ok(benchmark) = Portfolio::from_frame(&weights, portfolio.date()) else {
        return Ok(None);
    };
    if benchmark.universe() != portfolio.universe() {
        println!("Active risk:    skipped, benchmark holds different assets");
        return Ok(None);
    }
    Ok(Some(benchmark))
}
