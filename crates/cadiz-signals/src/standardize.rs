//! Cross-sectional standardization of signal values.

use polars::prelude::*;

/// Z-score of `value_column` within each group of `by`.
///
/// Computes `z = (x - mean(x)) / std(x)` with the sample standard deviation.
/// Nulls are skipped by the mean and standard deviation and stay null. A
/// group with a single value or zero dispersion yields null or non-finite
/// scores; those rows carry no cross-sectional information.
pub fn cross_sectional_zscore(value_column: &str, by: &[&str]) -> Expr {
    let partition: Vec<Expr> = by.iter().map(|c| col(*c)).collect();
    ((col(value_column) - col(value_column).mean()) / col(value_column).std(1)).over(partition)
}
