//! Reshape long-format risk model tables into dense arrays.
//!
//! Rows are placed by looking up the asset in the [`Universe`] and the factor
//! in the factor axis, so the arrays always follow the canonical order no
//! matter how the source table was sorted.

use std::collections::{BTreeSet, HashMap, HashSet};

use cadiz_traits::{
    CadizError, Result, Universe,
    frame::{asset_values, f64_values, require_columns, str_values},
};
use ndarray::{Array1, Array2};
use polars::prelude::DataFrame;
use tracing::{debug, warn};

use crate::symmetrize;

/// Sorted union of the factor names in the exposure and covariance tables.
pub fn factor_axis(exposures: &DataFrame, covariances: &DataFrame) -> Result<Vec<String>> {
    require_columns(exposures, &["factor"])?;
    require_columns(covariances, &["factor_1", "factor_2"])?;

    let mut factors = BTreeSet::new();
    for (frame, column) in [
        (exposures, "factor"),
        (covariances, "factor_1"),
        (covariances, "factor_2"),
    ] {
        factors.extend(str_values(frame, column)?.into_iter().flatten());
    }
    Ok(factors.into_iter().collect())
}

fn factor_index(factors: &[String]) -> HashMap<&str, usize> {
    factors
        .iter()
        .enumerate()
        .map(|(i, f)| (f.as_str(), i))
        .collect()
}

/// Exposure matrix `B` (assets × factors).
///
/// Cells without a row, and null or NaN exposures, are zero. Rows for assets
/// outside the universe are ignored.
///
/// # Errors
///
/// Returns [`CadizError::Misaligned`] if a factor is not on the factor axis
/// and [`CadizError::InvalidData`] if an (asset, factor) pair repeats.
pub fn exposure_matrix(
    exposures: &DataFrame,
    universe: &Universe,
    factors: &[String],
) -> Result<Array2<f64>> {
    require_columns(exposures, &["asset", "factor", "exposure"])?;
    let assets = asset_values(exposures, "asset")?;
    let names = str_values(exposures, "factor")?;
    let values = f64_values(exposures, "exposure")?;
    let factor_pos = factor_index(factors);

    let mut matrix = Array2::zeros((universe.len(), factors.len()));
    let mut seen = HashSet::with_capacity(assets.len());
    let mut covered = vec![false; universe.len()];
    let mut gaps = 0usize;

    for ((asset, factor), value) in assets.iter().zip(names).zip(values) {
        let Some(i) = universe.position(asset) else {
            continue;
        };
        let factor = factor.ok_or_else(|| {
            CadizError::InvalidData(format!("null factor name in exposures of {asset}"))
        })?;
        let j = *factor_pos.get(factor.as_str()).ok_or_else(|| {
            CadizError::misaligned("exposures vs factor axis", format!("unknown factor `{factor}`"))
        })?;
        if !seen.insert((i, j)) {
            return Err(CadizError::InvalidData(format!(
                "duplicate exposure of {asset} to `{factor}`"
            )));
        }
        covered[i] = true;
        match value {
            Some(v) if v.is_finite() => matrix[[i, j]] = v,
            _ => gaps += 1,
        }
    }

    let uncovered = covered.iter().filter(|c| !**c).count();
    if uncovered > 0 {
        warn!(uncovered, "Assets without exposures treated as zero exposure");
    }
    if gaps > 0 {
        debug!(gaps, "Null exposures treated as zero");
    }
    Ok(matrix)
}

/// Symmetric factor covariance matrix `F` over the factor axis.
///
/// The table may hold only one triangle; see [`symmetrize`] for the fill rule.
///
/// # Errors
///
/// Returns [`CadizError::Misaligned`] if a factor is not on the factor axis.
pub fn factor_covariance_matrix(covariances: &DataFrame, factors: &[String]) -> Result<Array2<f64>> {
    require_columns(covariances, &["factor_1", "factor_2", "covariance"])?;
    let firsts = str_values(covariances, "factor_1")?;
    let seconds = str_values(covariances, "factor_2")?;
    let values = f64_values(covariances, "covariance")?;
    let factor_pos = factor_index(factors);

    let lookup = |name: Option<String>| -> Result<usize> {
        let name = name.ok_or_else(|| CadizError::InvalidData("null factor name in covariances".into()))?;
        factor_pos.get(name.as_str()).copied().ok_or_else(|| {
            CadizError::misaligned("covariances vs factor axis", format!("unknown factor `{name}`"))
        })
    };

    let k = factors.len();
    let mut raw = Array2::from_elem((k, k), f64::NAN);
    for ((first, second), value) in firsts.into_iter().zip(seconds).zip(values) {
        let i = lookup(first)?;
        let j = lookup(second)?;
        raw[[i, j]] = value.unwrap_or(f64::NAN);
    }

    let gaps = (0..k)
        .flat_map(|i| (i..k).map(move |j| (i, j)))
        .filter(|&(i, j)| !raw[[i, j]].is_finite() && !raw[[j, i]].is_finite())
        .count();
    if gaps > 0 {
        warn!(gaps, "Factor covariance pairs missing from both triangles set to zero");
    }
    Ok(symmetrize(&raw))
}

/// Specific risk vector `s` in universe order; missing assets are zero.
///
/// # Errors
///
/// Returns [`CadizError::InvalidData`] on a negative specific risk.
pub fn specific_risk_vector(specific_risk: &DataFrame, universe: &Universe) -> Result<Array1<f64>> {
    require_columns(specific_risk, &["asset", "specific_risk"])?;
    let assets = asset_values(specific_risk, "asset")?;
    let values = f64_values(specific_risk, "specific_risk")?;

    let mut vector = Array1::zeros(universe.len());
    let mut covered = vec![false; universe.len()];
    for (asset, value) in assets.iter().zip(values) {
        let Some(i) = universe.position(asset) else {
            continue;
        };
        match value {
            Some(v) if v < 0.0 => {
                return Err(CadizError::InvalidData(format!(
                    "negative specific risk {v} for {asset}"
                )));
            }
            Some(v) if v.is_finite() => {
                vector[i] = v;
                covered[i] = true;
            }
            _ => {}
        }
    }

    let missing = covered.iter().filter(|c| !**c).count();
    if missing > 0 {
        warn!(missing, "Assets without specific risk treated as zero");
    }
    Ok(vector)
}
