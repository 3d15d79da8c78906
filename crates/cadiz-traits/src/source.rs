//! Read interfaces onto the external data layer.
//!
//! The core never loads vendor files or queries databases itself. It reads
//! long-format tables through these traits and receives the data source as an
//! explicit parameter, so several date ranges can be processed side by side
//! without shared state.
//!
//! # Table shapes
//!
//! | method | columns |
//! |---|---|
//! | [`RiskModelSource::exposures`] | `asset`, `factor`, `exposure` |
//! | [`RiskModelSource::factor_covariances`] | `factor_1`, `factor_2`, `covariance` (upper triangle) |
//! | [`RiskModelSource::specific_risk`] | `asset`, `specific_risk` |
//! | [`AssetDataSource::returns_beta`] | `date`, `asset`, `return`, `predicted_beta` |
//! | [`AssetDataSource::predicted_betas`] | `asset`, `predicted_beta` |
//! | [`AssetDataSource::specific_risk_history`] | `date`, `asset`, `specific_risk` |
//!
//! Returns and specific risk are in percent; factor covariances in percent
//! squared.

use crate::{Date, Result, Universe};
use polars::prelude::*;

/// Per-date factor risk model tables.
pub trait RiskModelSource: Send + Sync {
    /// Factor exposures of the universe's assets on `date`.
    ///
    /// Assets or factors absent from the table have zero exposure.
    fn exposures(&self, date: Date, universe: &Universe) -> Result<DataFrame>;

    /// Factor covariances on `date`, typically only the upper triangle.
    fn factor_covariances(&self, date: Date) -> Result<DataFrame>;

    /// Specific risk of the universe's assets on `date`.
    fn specific_risk(&self, date: Date, universe: &Universe) -> Result<DataFrame>;
}

/// Per-asset return and beta history.
pub trait AssetDataSource: Send + Sync {
    /// Assets with data on `date`.
    fn universe(&self, date: Date) -> Result<Universe>;

    /// Return/beta panel over `[start, end]`, optionally restricted to a universe.
    fn returns_beta(&self, start: Date, end: Date, universe: Option<&Universe>)
    -> Result<DataFrame>;

    /// Predicted betas of the universe's assets on `date`.
    fn predicted_betas(&self, date: Date, universe: &Universe) -> Result<DataFrame>;

    /// Specific risk for every asset and date in `[start, end]`.
    fn specific_risk_history(&self, start: Date, end: Date) -> Result<DataFrame>;
}

/// A data layer providing both the risk model and the asset history.
pub trait FactorDataAccess: RiskModelSource + AssetDataSource {}

impl<T: RiskModelSource + AssetDataSource + ?Sized> FactorDataAccess for T {}
