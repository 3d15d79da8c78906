//! In-memory data source backed by Polars DataFrames.
//!
//! Holds three date-keyed tables and answers the [`RiskModelSource`] and
//! [`AssetDataSource`] queries by filtering them. Used by the CLI after
//! reading CSV files and by tests.

use crate::{
    AssetDataSource, CadizError, Date, Result, RiskModelSource, Universe,
    frame::{asset_values, between_dates, require_columns, restrict_to_universe},
};
use polars::prelude::*;
use tracing::debug;

/// Columns of the exposures table.
pub const EXPOSURE_COLUMNS: [&str; 4] = ["date", "asset", "factor", "exposure"];

/// Columns of the factor covariance table.
pub const COVARIANCE_COLUMNS: [&str; 4] = ["date", "factor_1", "factor_2", "covariance"];

/// Columns of the per-asset table.
pub const ASSET_COLUMNS: [&str; 5] = ["date", "asset", "return", "predicted_beta", "specific_risk"];

/// A data source over DataFrames held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataSource {
    exposures: Option<DataFrame>,
    covariances: Option<DataFrame>,
    assets: Option<DataFrame>,
}

impl InMemoryDataSource {
    /// Creates an empty data source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the per-asset table `date, asset, return, predicted_beta, specific_risk`.
    ///
    /// An optional `market_cap` column is kept for benchmark weights.
    pub fn with_assets(mut self, assets: DataFrame) -> Result<Self> {
        require_columns(&assets, &ASSET_COLUMNS)?;
        self.assets = Some(assets);
        Ok(self)
    }

    /// Attach the exposures table `date, asset, factor, exposure`.
    pub fn with_exposures(mut self, exposures: DataFrame) -> Result<Self> {
        require_columns(&exposures, &EXPOSURE_COLUMNS)?;
        self.exposures = Some(exposures);
        Ok(self)
    }

    /// Attach the factor covariance table `date, factor_1, factor_2, covariance`.
    pub fn with_covariances(mut self, covariances: DataFrame) -> Result<Self> {
        require_columns(&covariances, &COVARIANCE_COLUMNS)?;
        self.covariances = Some(covariances);
        Ok(self)
    }

    /// The per-asset table, if loaded.
    pub const fn assets(&self) -> Option<&DataFrame> {
        self.assets.as_ref()
    }

    fn table<'a>(table: &'a Option<DataFrame>, name: &str) -> Result<&'a DataFrame> {
        table
            .as_ref()
            .ok_or_else(|| CadizError::InsufficientData(format!("no {name} table loaded")))
    }

    fn on_date(table: &DataFrame, date: Date) -> LazyFrame {
        table.clone().lazy().filter(col("date").eq(lit(date)))
    }
}

impl RiskModelSource for InMemoryDataSource {
    fn exposures(&self, date: Date, universe: &Universe) -> Result<DataFrame> {
        let table = Self::table(&self.exposures, "exposures")?;
        let frame = restrict_to_universe(Self::on_date(table, date), universe)?
            .select([col("asset"), col("factor"), col("exposure")])
            .collect()?;
        debug!(%date, rows = frame.height(), "Read exposures");
        Ok(frame)
    }

    fn factor_covariances(&self, date: Date) -> Result<DataFrame> {
        let table = Self::table(&self.covariances, "factor covariance")?;
        let frame = Self::on_date(table, date)
            .select([col("factor_1"), col("factor_2"), col("covariance")])
            .collect()?;
        debug!(%date, rows = frame.height(), "Read factor covariances");
        Ok(frame)
    }

    fn specific_risk(&self, date: Date, universe: &Universe) -> Result<DataFrame> {
        let table = Self::table(&self.assets, "asset")?;
        Ok(restrict_to_universe(Self::on_date(table, date), universe)?
            .select([col("asset"), col("specific_risk")])
            .collect()?)
    }
}

impl AssetDataSource for InMemoryDataSource {
    fn universe(&self, date: Date) -> Result<Universe> {
        let table = Self::table(&self.assets, "asset")?;
        let frame = Self::on_date(table, date).select([col("asset")]).collect()?;
        Universe::new(asset_values(&frame, "asset")?)
    }

    fn returns_beta(
        &self,
        start: Date,
        end: Date,
        universe: Option<&Universe>,
    ) -> Result<DataFrame> {
        let table = Self::table(&self.assets, "asset")?;
        let mut frame = between_dates(table.clone().lazy(), start, end);
        if let Some(universe) = universe {
            frame = restrict_to_universe(frame, universe)?;
        }
        let frame = frame
            .select([
                col("date"),
                col("asset"),
                col("return"),
                col("predicted_beta"),
            ])
            .sort(["asset", "date"], SortMultipleOptions::default())
            .collect()?;
        debug!(%start, %end, rows = frame.height(), "Read return/beta panel");
        Ok(frame)
    }

    fn predicted_betas(&self, date: Date, universe: &Universe) -> Result<DataFrame> {
        let table = Self::table(&self.assets, "asset")?;
        Ok(restrict_to_universe(Self::on_date(table, date), universe)?
            .select([col("asset"), col("predicted_beta")])
            .collect()?)
    }

    fn specific_risk_history(&self, start: Date, end: Date) -> Result<DataFrame> {
        let table = Self::table(&self.assets, "asset")?;
        Ok(between_dates(table.clone().lazy(), start, end)
            .select([col("date"), col("asset"), col("specific_risk")])
            .collect()?)
    }
}
