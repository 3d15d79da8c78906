//! Covariance command implementation.

use std::path::Path;

use anyhow::Result;
use cadiz_risk::CovarianceMatrixBuilder;
use cadiz_traits::{AssetDataSource, InMemoryDataSource};
use chrono::NaiveDate;

use super::banner;
use crate::data::write_csv;

/// Build Σ for the assets present on `date` and summarize it.
pub(crate) fn covariance(
    source: &InMemoryDataSource,
    date: NaiveDate,
    output: Option<&Path>,
) -> Result<()> {
    banner("Covariance Matrix");

    let universe = source.universe(date)?;
    let covariance = CovarianceMatrixBuilder::new(source).build(date, &universe)?;

    let vols: Vec<f64> = covariance
        .values()
        .diag()
        .iter()
        .map(|v| v.max(0.0).sqrt())
        .collect();
    let mean_vol = vols.iter().sum::<f64>() / vols.len() as f64;
    let (min_vol, max_vol) = vols
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });

    println!("Date:       {date}");
    println!("Assets:     {}", covariance.len());
    println!("Symmetric:  {}", covariance.is_symmetric(1e-10));
    println!("Volatility: mean {mean_vol:.2}%, min {min_vol:.2}%, max {max_vol:.2}%");

    if let Some(path) = output {
        write_csv(&mut covariance.to_frame()?, path)?;
        println!("\nWritten to {}", path.display());
    }
    println!();
    Ok(())
}
