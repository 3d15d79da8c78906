//! Low-beta signal.

use cadiz_traits::Signal;
use polars::prelude::*;

/// Negated predicted beta; no windowing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Beta;

impl Signal for Beta {
    fn name(&self) -> &str {
        "beta"
    }

    fn lookback(&self) -> usize {
        0
    }

    fn required_columns(&self) -> &[&str] {
        &["predicted_beta"]
    }

    fn expr(&self) -> Expr {
        col("predicted_beta") * lit(-1.0)
    }
}
