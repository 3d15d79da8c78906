//! Helpers for reading the table-shaped interfaces into plain Rust values.

use crate::{AssetId, CadizError, Date, Result, Universe};
use polars::prelude::*;

/// Days between 0001-01-01 and the Unix epoch.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Convert a Polars physical date (days since the Unix epoch) into a [`Date`].
pub fn date_from_days(days: i32) -> Option<Date> {
    Date::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE)
}

/// Check that every column in `columns` is present in `df`.
///
/// # Errors
///
/// Returns [`CadizError::MissingColumn`] for the first absent column.
pub fn require_columns(df: &DataFrame, columns: &[&str]) -> Result<()> {
    for name in columns {
        if df.column(name).is_err() {
            return Err(CadizError::MissingColumn((*name).to_string()));
        }
    }
    Ok(())
}

/// Read a column as optional strings.
pub fn str_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    require_columns(df, &[name])?;
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::String)?;
    Ok(series
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Read a column as non-null asset identifiers.
///
/// # Errors
///
/// Returns [`CadizError::InvalidData`] if any identifier is null.
pub fn asset_values(df: &DataFrame, name: &str) -> Result<Vec<AssetId>> {
    str_values(df, name)?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.ok_or_else(|| CadizError::InvalidData(format!("null `{name}` at row {row}")))
        })
        .collect()
}

/// Read a column as optional `f64` values, casting numeric types.
pub fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    require_columns(df, &[name])?;
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    Ok(series.f64()?.into_iter().collect())
}

/// Read a column as optional dates.
pub fn date_values(df: &DataFrame, name: &str) -> Result<Vec<Option<Date>>> {
    require_columns(df, &[name])?;
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Date)?
        .cast(&DataType::Int32)?;
    Ok(series
        .i32()?
        .into_iter()
        .map(|d| d.and_then(date_from_days))
        .collect())
}

/// Single-column `asset` frame used to restrict tables to a universe by join.
pub fn universe_frame(universe: &Universe) -> Result<DataFrame> {
    Ok(df!("asset" => universe.assets())?)
}

/// Restrict a lazy table with an `asset` column to the given universe.
pub fn restrict_to_universe(frame: LazyFrame, universe: &Universe) -> Result<LazyFrame> {
    let assets = universe_frame(universe)?.lazy();
    Ok(frame.join(
        assets,
        [col("asset")],
        [col("asset")],
        JoinArgs::new(JoinType::Inner),
    ))
}

/// Keep rows whose `date` column falls in `[start, end]`.
pub fn between_dates(frame: LazyFrame, start: Date, end: Date) -> LazyFrame {
    frame.filter(
        col("date")
            .gt_eq(lit(start))
            .and(col("date").lt_eq(lit(end))),
    )
}
