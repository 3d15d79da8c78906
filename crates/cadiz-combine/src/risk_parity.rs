//! Risk-parity blending of signal alphas.

use cadiz_traits::{
    AssetDataSource, CadizError, Date, FactorDataAccess, Result,
    frame::{date_values, require_columns},
};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    combiner::Combiner,
    paper::{DEFAULT_PAPER_GAMMA, PaperPortfolioBuilder},
};

/// Configuration for risk-parity blending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskParityConfig {
    /// Trailing window, in trading days, for realized signal volatility
    pub volatility_window: usize,

    /// Risk aversion of the paper portfolios
    pub paper_gamma: f64,

    /// Name written to the output `name` column
    pub name: String,
}

impl Default for RiskParityConfig {
    fn default() -> Self {
        Self {
            volatility_window: 22,
            paper_gamma: DEFAULT_PAPER_GAMMA,
            name: "risk_parity".to_string(),
        }
    }
}

/// Weights each signal by the inverse of its paper portfolio's volatility.
///
/// For every signal the paper weights are scaled to unit gross leverage per
/// `(asset, signal)` across time and lagged one trading day, so a day's
/// signal return only uses weights known the day before. The realized
/// volatility of those daily returns over `volatility_window` days sets the
/// signal's weight for the date, renormalized to sum to one across signals.
///
/// A signal contributes nothing on a date where its volatility is undefined
/// (warm-up) or zero; the remaining signals are renormalized without it.
///
/// # Examples
///
/// ```rust,no_run
/// use cadiz_combine::{Combiner, RiskParityBlender, RiskParityConfig};
/// # use polars::prelude::DataFrame;
/// # fn run(alphas: &DataFrame, weights: &DataFrame, returns: &DataFrame) {
/// let blender = RiskParityBlender::new(RiskParityConfig::default());
/// let composite = blender.combine(alphas, weights, returns).unwrap();
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct RiskParityBlender {
    config: RiskParityConfig,
}

impl RiskParityBlender {
    /// Create a blender with the given configuration.
    pub const fn new(config: RiskParityConfig) -> Self {
        Self { config }
    }

    /// Blender configuration.
    pub const fn config(&self) -> &RiskParityConfig {
        &self.config
    }

    /// Daily return of each signal's paper portfolio, as `date, signal, return`.
    ///
    /// A signal's first date has no lagged weights and so no return row.
    pub fn signal_returns(&self, weights: &DataFrame, returns: &DataFrame) -> Result<DataFrame> {
        require_columns(weights, &["date", "asset", "signal", "weight"])?;
        require_columns(returns, &["date", "asset", "return"])?;

        let pair = [col("asset"), col("signal")];
        let gross = col("weight").abs().sum().over(pair.clone());

        Ok(returns
            .clone()
            .lazy()
            .select([col("date"), col("asset"), col("return")])
            .join(
                weights
                    .clone()
                    .lazy()
                    .select([col("date"), col("asset"), col("signal"), col("weight")]),
                [col("date"), col("asset")],
                [col("date"), col("asset")],
                JoinArgs::new(JoinType::Inner),
            )
            .sort(["signal", "asset", "date"], Default::default())
            .with_column(
                when(gross.clone().gt(lit(0.0)))
                    .then(col("weight") / gross)
                    .otherwise(lit(0.0))
                    .alias("weight"),
            )
            .with_column(col("weight").shift(lit(1)).over(pair).alias("weight"))
            .filter(col("weight").is_not_null())
            .group_by([col("date"), col("signal")])
            .agg([(col("return") * col("weight")).sum().alias("return")])
            .sort(["signal", "date"], Default::default())
            .collect()?)
    }

    /// Inverse-volatility weight per `(date, signal)`.
    ///
    /// Output is `date, signal, volatility, weight`; dates where a signal's
    /// volatility is null or zero have no row for that signal.
    pub fn signal_weights(&self, signal_returns: &DataFrame) -> Result<DataFrame> {
        require_columns(signal_returns, &["date", "signal", "return"])?;
        let window = self.config.volatility_window;

        let volatility = signal_returns
            .clone()
            .lazy()
            .sort(["signal", "date"], Default::default())
            .with_column(
                col("return")
                    .rolling_std(RollingOptionsFixedWindow {
                        window_size: window,
                        min_periods: window,
                        ..Default::default()
                    })
                    .over([col("signal")])
                    .alias("volatility"),
            )
            .collect()?;

        let flat = volatility
            .clone()
            .lazy()
            .filter(col("volatility").eq(lit(0.0)))
            .collect()?
            .height();
        if flat > 0 {
            warn!(rows = flat, "Signal portfolios with zero volatility excluded");
        }

        Ok(volatility
            .lazy()
            .filter(col("volatility").gt(lit(0.0)))
            .with_column((lit(1.0) / col("volatility")).alias("inverse"))
            .with_column((col("inverse") / col("inverse").sum().over([col("date")])).alias("weight"))
            .select([col("date"), col("signal"), col("volatility"), col("weight")])
            .sort(["date", "signal"], Default::default())
            .collect()?)
    }

    /// Weighted sum of signal alphas per `(date, asset)`.
    ///
    /// Only `(date, signal)` pairs with a weight contribute; null alphas are
    /// skipped. Output is `date, asset, name, alpha`.
    pub fn blend(&self, alphas: &DataFrame, signal_weights: &DataFrame) -> Result<DataFrame> {
        require_columns(alphas, &["date", "asset", "name", "alpha"])?;
        require_columns(signal_weights, &["date", "signal", "weight"])?;

        Ok(alphas
            .clone()
            .lazy()
            .filter(col("alpha").is_not_null())
            .select([
                col("date"),
                col("asset"),
                col("name").alias("signal"),
                col("alpha"),
            ])
            .join(
                signal_weights
                    .clone()
                    .lazy()
                    .select([col("date"), col("signal"), col("weight")]),
                [col("date"), col("signal")],
                [col("date"), col("signal")],
                JoinArgs::new(JoinType::Inner),
            )
            .group_by([col("date"), col("asset")])
            .agg([(col("alpha") * col("weight")).sum().alias("alpha")])
            .select([
                col("date"),
                col("asset"),
                lit(self.config.name.as_str()).alias("name"),
                col("alpha"),
            ])
            .sort(["date", "asset"], Default::default())
            .collect()?)
    }

    /// Build paper portfolios from `source`, then blend.
    pub fn run<D>(&self, source: &D, alphas: &DataFrame) -> Result<DataFrame>
    where
        D: FactorDataAccess + Sync,
    {
        let weights = PaperPortfolioBuilder::new(self.config.paper_gamma).build(source, alphas)?;
        self.run_with_weights(source, alphas, &weights)
    }

    /// Blend with precomputed paper weights.
    ///
    /// Returns are read from `source` for the span of dates in `weights`.
    pub fn run_with_weights<D>(
        &self,
        source: &D,
        alphas: &DataFrame,
        weights: &DataFrame,
    ) -> Result<DataFrame>
    where
        D: AssetDataSource + ?Sized,
    {
        let (start, end) = date_span(weights)?;
        let returns = source.returns_beta(start, end, None)?;
        self.combine(alphas, weights, &returns)
    }
}

impl Combiner for RiskParityBlender {
    fn combine(
        &self,
        alphas: &DataFrame,
        weights: &DataFrame,
        returns: &DataFrame,
    ) -> Result<DataFrame> {
        let signal_returns = self.signal_returns(weights, returns)?;
        let signal_weights = self.signal_weights(&signal_returns)?;
        let composite = self.blend(alphas, &signal_weights)?;
        info!(
            name = %self.config.name,
            weighted_dates = signal_weights.height(),
            rows = composite.height(),
            "Composite alphas produced"
        );
        Ok(composite)
    }

    fn name(&self) -> &str {
        &self.config.name
    }
}

fn date_span(frame: &DataFrame) -> Result<(Date, Date)> {
    let mut known = date_values(frame, "date")?.into_iter().flatten();
    let first = known
        .next()
        .ok_or_else(|| CadizError::InsufficientData("no dated rows".into()))?;
    Ok(known.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadiz_traits::frame::f64_values;

    fn date(offset: u64) -> Date {
        Date::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .checked_add_days(chrono::Days::new(offset))
            .unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = RiskParityConfig::default();
        assert_eq!(config.volatility_window, 22);
        assert_eq!(config.paper_gamma, 2.0);
        assert_eq!(RiskParityBlender::new(config).name(), "risk_parity");
    }

    #[test]
    fn test_weights_are_lagged_and_normalized() {
        let weights = df! {
            "date" => &[date(0), date(1), date(2)],
            "asset" => &["A", "A", "A"],
            "signal" => &["s", "s", "s"],
            "weight" => &[2.0, -1.0, 1.0],
        }
        .unwrap();
        let returns = df! {
            "date" => &[date(0), date(1), date(2)],
            "asset" => &["A", "A", "A"],
            "return" => &[5.0, 1.0, 3.0],
        }
        .unwrap();
        let out = RiskParityBlender::default()
            .signal_returns(&weights, &returns)
            .unwrap();
        // gross 4: weights 0.5, -0.25, 0.25 lagged to null, 0.5, -0.25
        assert_eq!(
            date_values(&out, "date").unwrap(),
            vec![Some(date(1)), Some(date(2))]
        );
        assert_eq!(
            f64_values(&out, "return").unwrap(),
            vec![Some(0.5), Some(-0.75)]
        );
    }

    #[test]
    fn test_first_volatility_needs_a_full_window_of_returns() {
        let days = 30;
        let weights = df! {
            "date" => (0..days).map(date).collect::<Vec<_>>(),
            "asset" => vec!["A"; days as usize],
            "signal" => vec!["s"; days as usize],
            "weight" => vec![1.0; days as usize],
        }
        .unwrap();
        let returns = df! {
            "date" => (0..days).map(date).collect::<Vec<_>>(),
            "asset" => vec!["A"; days as usize],
            "return" => (0..days).map(|t| (t % 3) as f64).collect::<Vec<_>>(),
        }
        .unwrap();
        let blender = RiskParityBlender::default();
        let signal_returns = blender.signal_returns(&weights, &returns).unwrap();
        assert_eq!(signal_returns.height(), days as usize - 1);

        let signal_weights = blender.signal_weights(&signal_returns).unwrap();
        let first = date_values(&signal_weights, "date").unwrap()[0];
        // returns start on day 1, so 22 of them end on day 22
        assert_eq!(first, Some(date(22)));
    }

    #[test]
    fn test_short_history_has_no_weight() {
        let returns = df! {
            "date" => &[date(0), date(1), date(2)],
            "signal" => &["s", "s", "s"],
            "return" => &[1.0, -1.0, 2.0],
        }
        .unwrap();
        let out = RiskParityBlender::default().signal_weights(&returns).unwrap();
        assert_eq!(out.height(), 0);
    }

    #[test]
    fn test_date_span() {
        let frame = df!("date" => &[date(5), date(1), date(9)]).unwrap();
        assert_eq!(date_span(&frame).unwrap(), (date(1), date(9)));
    }
}
