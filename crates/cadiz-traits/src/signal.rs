//! Signal trait for computing raw cross-sectional signals.
//!
//! A signal is a column expression evaluated over a return/beta panel sorted
//! by `(asset, date)`. Windowed signals partition their rolling windows by
//! asset, so the same expression can be evaluated over the whole panel at
//! once.

use polars::prelude::*;

/// A raw signal computed from the return/beta panel.
///
/// Implementations must be thread-safe (`Send + Sync`) so a set of signals
/// can be shared across worker threads.
///
/// # Example
///
/// ```
/// use cadiz_traits::Signal;
/// use polars::prelude::*;
///
/// struct NegativeReturn;
///
/// impl Signal for NegativeReturn {
///     fn name(&self) -> &str {
///         "negative_return"
///     }
///
///     fn lookback(&self) -> usize {
///         1
///     }
///
///     fn required_columns(&self) -> &[&str] {
///         &["return"]
///     }
///
///     fn expr(&self) -> Expr {
///         -col("return")
///     }
/// }
///
/// assert_eq!(NegativeReturn.name(), "negative_return");
/// ```
pub trait Signal: Send + Sync {
    /// Unique name, used as the `name` value in long-format signal tables.
    fn name(&self) -> &str;

    /// Trading days of history needed before the first non-null value.
    fn lookback(&self) -> usize;

    /// Panel columns the expression reads.
    fn required_columns(&self) -> &[&str];

    /// Expression producing the raw signal value for every panel row.
    ///
    /// Rows without enough history must evaluate to null, never zero.
    fn expr(&self) -> Expr;
}
