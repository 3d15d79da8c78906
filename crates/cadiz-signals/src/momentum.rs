//! Momentum signal: trailing log return, skipping the most recent month.

use cadiz_traits::Signal;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Configuration for the momentum signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MomentumConfig {
    /// Trading days summed into the signal (default: 230)
    pub window: usize,

    /// Most recent trading days excluded (default: 22 ≈ 1 month)
    pub skip: usize,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            window: 230,
            skip: 22,
        }
    }
}

/// Momentum signal.
///
/// Sums `ln(1 + return / 100)` over a trailing window per asset and lags the
/// sum by `skip` days, so the value on day `t` covers days `t - window - skip
/// + 1` through `t - skip`. With the defaults this is the return from
/// `t - 251` to `t - 22`. Rows with fewer than `window + skip` prior
/// observations are null.
#[derive(Debug, Clone)]
pub struct Momentum {
    config: MomentumConfig,
}

impl Momentum {
    /// Create a momentum signal with the given configuration.
    #[must_use]
    pub const fn new(config: MomentumConfig) -> Self {
        Self { config }
    }

    /// Summation window in trading days.
    #[must_use]
    pub const fn window(&self) -> usize {
        self.config.window
    }

    /// Skipped trading days.
    #[must_use]
    pub const fn skip(&self) -> usize {
        self.config.skip
    }
}

impl Default for Momentum {
    fn default() -> Self {
        Self::new(MomentumConfig::default())
    }
}

impl Signal for Momentum {
    fn name(&self) -> &str {
        "momentum"
    }

    fn lookback(&self) -> usize {
        self.config.window + self.config.skip
    }

    fn required_columns(&self) -> &[&str] {
        &["asset", "date", "return"]
    }

    fn expr(&self) -> Expr {
        (col("return") / lit(100.0))
            .log1p()
            .rolling_sum(RollingOptionsFixedWindow {
                window_size: self.config.window,
                min_periods: self.config.window,
                ..Default::default()
            })
            .shift(lit(self.config.skip as i64))
            .over([col("asset")])
    }
}
