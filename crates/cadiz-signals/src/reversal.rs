//! Short-term reversal signal.

use cadiz_traits::Signal;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Configuration for the reversal signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReversalConfig {
    /// Trading days summed into the signal (default: 22)
    pub window: usize,
}

impl Default for ReversalConfig {
    fn default() -> Self {
        Self { window: 22 }
    }
}

/// Reversal signal: the negated trailing log return over `window` days,
/// including the current day. Recent losers score high.
#[derive(Debug, Clone, Default)]
pub struct Reversal {
    config: ReversalConfig,
}

impl Reversal {
    /// Create a reversal signal with the given configuration.
    #[must_use]
    pub const fn new(config: ReversalConfig) -> Self {
        Self { config }
    }
}

impl Signal for Reversal {
    fn name(&self) -> &str {
        "reversal"
    }

    fn lookback(&self) -> usize {
        self.config.window
    }

    fn required_columns(&self) -> &[&str] {
        &["asset", "date", "return"]
    }

    fn expr(&self) -> Expr {
        ((col("return") / lit(100.0))
            .log1p()
            .rolling_sum(RollingOptionsFixedWindow {
                window_size: self.config.window,
                min_periods: self.config.window,
                ..Default::default()
            })
            * lit(-1.0))
        .over([col("asset")])
    }
}
