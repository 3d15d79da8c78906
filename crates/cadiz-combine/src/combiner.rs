//! Core trait definition for alpha combiners.

use cadiz_traits::Result;
use polars::prelude::DataFrame;

/// Blends the alphas of several signals into one composite alpha.
///
/// Combiners read three long tables:
///
/// | table | columns |
/// |---|---|
/// | `alphas` | `date, asset, name, alpha` (as produced by the signal engine) |
/// | `weights` | `date, asset, signal, weight` (one paper portfolio per signal) |
/// | `returns` | `date, asset, return` |
///
/// and produce `date, asset, name, alpha` with `name` set to the combiner's
/// name. Implementations must be thread-safe (Send + Sync).
///
/// # Examples
///
/// ```rust,no_run
/// use cadiz_combine::Combiner;
/// use polars::prelude::*;
///
/// struct FirstSignal;
///
/// impl Combiner for FirstSignal {
///     fn combine(
///         &self,
///         alphas: &DataFrame,
///         _weights: &DataFrame,
///         _returns: &DataFrame,
///     ) -> cadiz_traits::Result<DataFrame> {
///         Ok(alphas
///             .clone()
///             .lazy()
///             .filter(col("name").eq(lit("momentum")))
///             .with_column(lit(self.name()).alias("name"))
///             .collect()?)
///     }
///
///     fn name(&self) -> &str {
///         "first_signal"
///     }
/// }
/// ```
pub trait Combiner: Send + Sync {
    /// Combine per-signal alphas into a composite alpha table.
    ///
    /// # Errors
    ///
    /// Returns an error if an input table lacks a required column.
    fn combine(&self, alphas: &DataFrame, weights: &DataFrame, returns: &DataFrame)
    -> Result<DataFrame>;

    /// Name of this combination strategy, written to the `name` column.
    fn name(&self) -> &str;
}
