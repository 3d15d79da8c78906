//! Covariance matrix assembly.

use std::fmt;

use cadiz_traits::{CadizError, CovarianceMatrix, Date, Result, RiskModelSource, Universe};
use ndarray::{Array1, Array2};
use polars::prelude::DataFrame;
use tracing::debug;

use crate::loaders::{exposure_matrix, factor_axis, factor_covariance_matrix, specific_risk_vector};

/// Compute `Σ = B · F · Bᵀ + diag(s²)`.
///
/// The result is made exactly symmetric by averaging with its transpose,
/// which leaves already-symmetric cells bit-for-bit unchanged.
///
/// # Errors
///
/// Returns [`CadizError::ShapeMismatch`] if `F` is not `k × k` for the `k`
/// columns of `B`, or `s` does not have one entry per row of `B`.
pub fn assemble(
    exposures: &Array2<f64>,
    factor_covariance: &Array2<f64>,
    specific_risk: &Array1<f64>,
) -> Result<Array2<f64>> {
    let (n, k) = exposures.dim();
    if factor_covariance.dim() != (k, k) {
        return Err(CadizError::ShapeMismatch(format!(
            "factor covariance is {:?} for {k} factors",
            factor_covariance.dim()
        )));
    }
    if specific_risk.len() != n {
        return Err(CadizError::ShapeMismatch(format!(
            "{} specific risks for {n} assets",
            specific_risk.len()
        )));
    }

    let mut sigma = exposures.dot(factor_covariance).dot(&exposures.t());
    for (i, s) in specific_risk.iter().enumerate() {
        sigma[[i, i]] += s * s;
    }
    Ok((&sigma + &sigma.t()) / 2.0)
}

/// Build Σ for `universe` from the three long-format risk model tables.
///
/// The tables use the column layout of [`RiskModelSource`].
pub fn covariance_from_frames(
    date: Date,
    universe: &Universe,
    exposures: &DataFrame,
    factor_covariances: &DataFrame,
    specific_risk: &DataFrame,
) -> Result<CovarianceMatrix> {
    let factors = factor_axis(exposures, factor_covariances)?;
    let b = exposure_matrix(exposures, universe, &factors)?;
    let f = factor_covariance_matrix(factor_covariances, &factors)?;
    let s = specific_risk_vector(specific_risk, universe)?;

    debug!(
        %date,
        assets = universe.len(),
        factors = factors.len(),
        "Assembling covariance matrix"
    );
    CovarianceMatrix::new(date, universe.clone(), assemble(&b, &f, &s)?)
}

/// Builds covariance matrices from a [`RiskModelSource`].
///
/// Each call reads fresh tables for the requested date and universe; nothing
/// is cached between calls.
///
/// # Examples
///
/// ```rust,no_run
/// use cadiz_risk::CovarianceMatrixBuilder;
/// use cadiz_traits::{Date, InMemoryDataSource, Universe};
///
/// let source = InMemoryDataSource::new();
/// let builder = CovarianceMatrixBuilder::new(&source);
/// let universe = Universe::new(["AAPL", "MSFT"]).unwrap();
/// let date = Date::from_ymd_opt(2024, 6, 3).unwrap();
/// let sigma = builder.build(date, &universe).unwrap();
/// assert!(sigma.is_symmetric(1e-9));
/// ```
pub struct CovarianceMatrixBuilder<'a, S: ?Sized> {
    source: &'a S,
}

impl<'a, S: RiskModelSource + ?Sized> CovarianceMatrixBuilder<'a, S> {
    /// Creates a builder reading from `source`.
    pub const fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Assemble Σ for `universe` on `date`.
    pub fn build(&self, date: Date, universe: &Universe) -> Result<CovarianceMatrix> {
        let exposures = self.source.exposures(date, universe)?;
        let factor_covariances = self.source.factor_covariances(date)?;
        let specific_risk = self.source.specific_risk(date, universe)?;
        covariance_from_frames(date, universe, &exposures, &factor_covariances, &specific_risk)
    }
}

impl<S: ?Sized> fmt::Debug for CovarianceMatrixBuilder<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CovarianceMatrixBuilder").finish_non_exhaustive()
    }
}
