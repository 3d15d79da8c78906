//! Record types produced by the pipeline stages.
//!
//! Each record is keyed by a date and a [`Universe`], and stores its values in
//! the universe's canonical order. Records are immutable once built; methods
//! that combine two records check that their universes agree and report a
//! [`CadizError::Misaligned`] error otherwise.

use crate::{
    CadizError, Date, Result, Universe,
    frame::{asset_values, f64_values, require_columns},
};
use ndarray::{Array1, Array2};
use polars::prelude::*;

/// Asset covariance matrix Σ for one date, in percent squared.
#[derive(Debug, Clone, PartialEq)]
pub struct CovarianceMatrix {
    date: Date,
    universe: Universe,
    values: Array2<f64>,
}

impl CovarianceMatrix {
    /// Creates a covariance matrix.
    ///
    /// # Errors
    ///
    /// Returns [`CadizError::ShapeMismatch`] unless `values` is square with
    /// one row per asset.
    pub fn new(date: Date, universe: Universe, values: Array2<f64>) -> Result<Self> {
        let n = universe.len();
        if values.dim() != (n, n) {
            return Err(CadizError::ShapeMismatch(format!(
                "covariance matrix is {:?} for a universe of {n} assets",
                values.dim()
            )));
        }
        Ok(Self {
            date,
            universe,
            values,
        })
    }

    /// Date of the risk model.
    pub const fn date(&self) -> Date {
        self.date
    }

    /// Asset ordering of both axes.
    pub const fn universe(&self) -> &Universe {
        &self.universe
    }

    /// Raw matrix.
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of assets.
    pub fn len(&self) -> usize {
        self.universe.len()
    }

    /// Always false; covariance matrices are built over non-empty universes.
    pub fn is_empty(&self) -> bool {
        self.universe.is_empty()
    }

    /// Covariance between two assets.
    pub fn get(&self, row: &str, column: &str) -> Option<f64> {
        let i = self.universe.position(row)?;
        let j = self.universe.position(column)?;
        Some(self.values[[i, j]])
    }

    /// Whether `|Σ[i][j] - Σ[j][i]| <= tolerance` everywhere.
    pub fn is_symmetric(&self, tolerance: f64) -> bool {
        let n = self.len();
        (0..n).all(|i| (0..i).all(|j| (self.values[[i, j]] - self.values[[j, i]]).abs() <= tolerance))
    }

    /// Variance `wᵀ Σ w` of a weight vector in canonical order.
    ///
    /// # Errors
    ///
    /// Returns [`CadizError::ShapeMismatch`] if the vector length differs.
    pub fn portfolio_variance(&self, weights: &Array1<f64>) -> Result<f64> {
        if weights.len() != self.len() {
            return Err(CadizError::ShapeMismatch(format!(
                "{} weights for a {}-asset covariance matrix",
                weights.len(),
                self.len()
            )));
        }
        Ok(weights.dot(&self.values.dot(weights)))
    }

    /// The same matrix in decimal units, for reporting.
    pub fn to_decimal(&self) -> Self {
        Self {
            date: self.date,
            universe: self.universe.clone(),
            values: &self.values / 1e4,
        }
    }

    /// Long table `date, asset_1, asset_2, covariance`, one row per cell in
    /// row-major canonical order.
    ///
    /// Asset ids stay in the values, so any id is representable.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let n = self.len();
        let mut first = Vec::with_capacity(n * n);
        let mut second = Vec::with_capacity(n * n);
        for row in self.universe.iter() {
            for column in self.universe.iter() {
                first.push(row.as_str());
                second.push(column.as_str());
            }
        }
        Ok(df! {
            "date" => vec![self.date; n * n],
            "asset_1" => first,
            "asset_2" => second,
            "covariance" => self.values.iter().copied().collect::<Vec<f64>>(),
        }?)
    }
}

/// Expected-return scores for one date, aligned to a universe.
#[derive(Debug, Clone, PartialEq)]
pub struct Alpha {
    date: Date,
    universe: Universe,
    values: Array1<f64>,
}

impl Alpha {
    /// Creates an alpha vector.
    ///
    /// # Errors
    ///
    /// Returns [`CadizError::ShapeMismatch`] if the length differs from the
    /// universe, or [`CadizError::InvalidData`] if any value is not finite.
    pub fn new(date: Date, universe: Universe, values: Array1<f64>) -> Result<Self> {
        if values.len() != universe.len() {
            return Err(CadizError::ShapeMismatch(format!(
                "{} alphas for a universe of {} assets",
                values.len(),
                universe.len()
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(CadizError::InvalidData(format!(
                "non-finite alpha on {date}"
            )));
        }
        Ok(Self {
            date,
            universe,
            values,
        })
    }

    /// Select one date from a long table with `date`, `asset`, and `alpha`.
    ///
    /// The universe is the set of assets present on that date.
    ///
    /// # Errors
    ///
    /// Returns [`CadizError::EmptyUniverse`] if the date has no rows, and
    /// [`CadizError::InvalidData`] on duplicated assets or null alphas.
    pub fn from_frame(frame: &DataFrame, date: Date) -> Result<Self> {
        let (universe, values) = vector_for_date(frame, date, "alpha")?;
        Self::new(date, universe, values)
    }

    /// Date of the scores.
    pub const fn date(&self) -> Date {
        self.date
    }

    /// Asset ordering.
    pub const fn universe(&self) -> &Universe {
        &self.universe
    }

    /// Scores in canonical order.
    pub const fn values(&self) -> &Array1<f64> {
        &self.values
    }

    /// Score of a single asset.
    pub fn get(&self, asset: &str) -> Option<f64> {
        self.universe.position(asset).map(|i| self.values[i])
    }

    /// Return `self` after checking it is ordered like `universe`.
    ///
    /// # Errors
    ///
    /// Returns [`CadizError::Misaligned`] if the universes differ.
    pub fn aligned_to(self, universe: &Universe) -> Result<Self> {
        universe.ensure_same(&self.universe, "alpha")?;
        Ok(self)
    }

    /// Long table `date, asset, alpha`.
    pub fn to_frame(&self) -> Result<DataFrame> {
        Ok(df! {
            "date" => vec![self.date; self.universe.len()],
            "asset" => self.universe.assets(),
            "alpha" => self.values.to_vec(),
        }?)
    }
}

/// Optimized weights for one date; one weight per asset of the universe.
#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    date: Date,
    universe: Universe,
    weights: Array1<f64>,
}

impl Portfolio {
    /// Creates a portfolio.
    ///
    /// # Errors
    ///
    /// Returns [`CadizError::ShapeMismatch`] if the length differs from the
    /// universe, or [`CadizError::InvalidData`] if a weight is not finite.
    pub fn new(date: Date, universe: Universe, weights: Array1<f64>) -> Result<Self> {
        if weights.len() != universe.len() {
            return Err(CadizError::ShapeMismatch(format!(
                "{} weights for a universe of {} assets",
                weights.len(),
                universe.len()
            )));
        }
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(CadizError::InvalidData(format!(
                "non-finite portfolio weight on {date}"
            )));
        }
        Ok(Self {
            date,
            universe,
            weights,
        })
    }

    /// Select one date from a long table with `date`, `asset`, and `weight`.
    pub fn from_frame(frame: &DataFrame, date: Date) -> Result<Self> {
        let (universe, weights) = vector_for_date(frame, date, "weight")?;
        Self::new(date, universe, weights)
    }

    /// Portfolio date.
    pub const fn date(&self) -> Date {
        self.date
    }

    /// Asset ordering.
    pub const fn universe(&self) -> &Universe {
        &self.universe
    }

    /// Weights in canonical order.
    pub const fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    /// Weight of a single asset.
    pub fn weight(&self, asset: &str) -> Option<f64> {
        self.universe.position(asset).map(|i| self.weights[i])
    }

    /// Sum of weights.
    pub fn net_exposure(&self) -> f64 {
        self.weights.sum()
    }

    /// Sum of absolute weights.
    pub fn gross_leverage(&self) -> f64 {
        self.weights.iter().map(|w| w.abs()).sum()
    }

    /// Portfolio variance under `covariance`, in percent squared.
    pub fn variance(&self, covariance: &CovarianceMatrix) -> Result<f64> {
        covariance
            .universe()
            .ensure_same(&self.universe, "portfolio vs covariance")?;
        covariance.portfolio_variance(&self.weights)
    }

    /// Portfolio volatility under `covariance`, in percent.
    pub fn risk(&self, covariance: &CovarianceMatrix) -> Result<f64> {
        Ok(self.variance(covariance)?.max(0.0).sqrt())
    }

    /// Weights minus benchmark weights.
    ///
    /// # Errors
    ///
    /// Returns [`CadizError::Misaligned`] if the universes differ.
    pub fn active_weights(&self, benchmark: &Self) -> Result<Self> {
        self.universe
            .ensure_same(&benchmark.universe, "portfolio vs benchmark")?;
        Self::new(
            self.date,
            self.universe.clone(),
            &self.weights - &benchmark.weights,
        )
    }

    /// Volatility of the active weights, in percent.
    pub fn active_risk(&self, benchmark: &Self, covariance: &CovarianceMatrix) -> Result<f64> {
        self.active_weights(benchmark)?.risk(covariance)
    }

    /// Long table `date, asset, weight`.
    pub fn to_frame(&self) -> Result<DataFrame> {
        Ok(df! {
            "date" => vec![self.date; self.universe.len()],
            "asset" => self.universe.assets(),
            "weight" => self.weights.to_vec(),
        }?)
    }
}

/// Market-cap benchmark weights `market_cap / Σ market_cap` per date.
///
/// Input needs `date`, `asset`, and `market_cap`; output is
/// `date, asset, weight`. Rows without a positive market cap are dropped.
pub fn benchmark_weights(assets: &DataFrame) -> Result<DataFrame> {
    require_columns(assets, &["date", "asset", "market_cap"])?;
    Ok(assets
        .clone()
        .lazy()
        .filter(col("market_cap").gt(lit(0.0)))
        .with_column(
            (col("market_cap") / col("market_cap").sum().over([col("date")])).alias("weight"),
        )
        .select([col("date"), col("asset"), col("weight")])
        .sort(["date", "asset"], Default::default())
        .collect()?)
}

fn vector_for_date(frame: &DataFrame, date: Date, column: &str) -> Result<(Universe, Array1<f64>)> {
    require_columns(frame, &["date", "asset", column])?;
    let rows = frame
        .clone()
        .lazy()
        .filter(col("date").eq(lit(date)))
        .select([col("asset"), col(column)])
        .collect()?;

    let assets = asset_values(&rows, "asset")?;
    let values = f64_values(&rows, column)?;
    let universe = Universe::new(assets.iter().cloned())?;
    if universe.len() != assets.len() {
        return Err(CadizError::InvalidData(format!(
            "duplicated assets in `{column}` on {date}"
        )));
    }

    let mut ordered = Array1::zeros(universe.len());
    for (asset, value) in assets.iter().zip(values) {
        let value = value.ok_or_else(|| {
            CadizError::InvalidData(format!("null `{column}` for {asset} on {date}"))
        })?;
        if let Some(i) = universe.position(asset) {
            ordered[i] = value;
        }
    }
    Ok((universe, ordered))
}
