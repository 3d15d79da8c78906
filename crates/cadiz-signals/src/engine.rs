//! Signal engine: raw signals, cross-sectional scores, and alphas.

use std::fmt;

use cadiz_traits::{
    AssetDataSource, CadizError, Date, Result, Signal,
    frame::{between_dates, require_columns},
};
use chrono::Days;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{MomentumConfig, ReversalConfig, default_signals};

/// Configuration for signal computation and alpha scaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Momentum summation window in trading days
    pub momentum_window: usize,

    /// Most recent trading days excluded from momentum
    pub momentum_skip: usize,

    /// Reversal summation window in trading days
    pub reversal_window: usize,

    /// Multiplier from `score × specific_risk` to alpha
    pub alpha_scale: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            momentum_window: 230,
            momentum_skip: 22,
            reversal_window: 22,
            alpha_scale: 0.05,
        }
    }
}

impl SignalConfig {
    /// Momentum settings.
    #[must_use]
    pub const fn momentum(&self) -> MomentumConfig {
        MomentumConfig {
            window: self.momentum_window,
            skip: self.momentum_skip,
        }
    }

    /// Reversal settings.
    #[must_use]
    pub const fn reversal(&self) -> ReversalConfig {
        ReversalConfig {
            window: self.reversal_window,
        }
    }

    /// Check the windows are positive and the scale finite.
    pub fn validate(&self) -> Result<()> {
        if self.momentum_window == 0 || self.reversal_window == 0 {
            return Err(CadizError::InvalidParameter(
                "signal windows must be at least one day".into(),
            ));
        }
        if !self.alpha_scale.is_finite() {
            return Err(CadizError::InvalidParameter(format!(
                "alpha scale {} is not finite",
                self.alpha_scale
            )));
        }
        Ok(())
    }
}

/// Computes signals over a return/beta panel and converts them to alphas.
///
/// Output tables are long format, one row per `(date, asset, name)`:
///
/// | column | meaning |
/// |---|---|
/// | `signal` | raw value; null until the signal's window is full |
/// | `score` | z-score across assets for the date and signal |
/// | `alpha` | `score × alpha_scale × specific_risk`, in percent |
pub struct SignalEngine {
    config: SignalConfig,
    signals: Vec<Box<dyn Signal>>,
}

impl SignalEngine {
    /// Engine with the registered momentum, beta, and reversal signals.
    pub fn new(config: SignalConfig) -> Result<Self> {
        let signals = default_signals(&config);
        Self::with_signals(config, signals)
    }

    /// Engine with a custom signal set.
    ///
    /// # Errors
    ///
    /// Returns [`CadizError::InvalidParameter`] for an invalid configuration,
    /// an empty signal set, or duplicated signal names.
    pub fn with_signals(config: SignalConfig, mut signals: Vec<Box<dyn Signal>>) -> Result<Self> {
        config.validate()?;
        if signals.is_empty() {
            return Err(CadizError::InvalidParameter("no signals configured".into()));
        }
        signals.sort_by(|a, b| a.name().cmp(b.name()));
        if signals.windows(2).any(|w| w[0].name() == w[1].name()) {
            return Err(CadizError::InvalidParameter("duplicate signal names".into()));
        }
        Ok(Self { config, signals })
    }

    /// Engine configuration.
    pub const fn config(&self) -> &SignalConfig {
        &self.config
    }

    /// Signal names in output order.
    pub fn signal_names(&self) -> Vec<&str> {
        self.signals.iter().map(|s| s.name()).collect()
    }

    /// Longest lookback of the configured signals, in trading days.
    pub fn lookback(&self) -> usize {
        self.signals.iter().map(|s| s.lookback()).max().unwrap_or(0)
    }

    /// Raw signals for every row of `panel`, as `date, asset, name, signal`.
    ///
    /// The panel needs `date`, `asset`, and the columns each signal reads.
    /// It is sorted by `(asset, date)` before the windows are applied.
    pub fn compute_raw(&self, panel: &DataFrame) -> Result<DataFrame> {
        let mut required = vec!["date", "asset"];
        for signal in &self.signals {
            required.extend_from_slice(signal.required_columns());
        }
        require_columns(panel, &required)?;

        let wide = panel
            .clone()
            .lazy()
            .sort(["asset", "date"], Default::default())
            .with_columns(
                self.signals
                    .iter()
                    .map(|s| s.expr().cast(DataType::Float64).alias(s.name()))
                    .collect::<Vec<_>>(),
            );

        let long: Vec<LazyFrame> = self
            .signals
            .iter()
            .map(|s| {
                wide.clone().select([
                    col("date"),
                    col("asset"),
                    lit(s.name()).alias("name"),
                    col(s.name()).alias("signal"),
                ])
            })
            .collect();

        let raw = concat(long, UnionArgs::default())?
            .sort(["asset", "date", "name"], Default::default())
            .collect()?;
        debug!(rows = raw.height(), signals = self.signals.len(), "Computed raw signals");
        Ok(raw)
    }

    /// Add `score` and `alpha` to a raw signal table.
    ///
    /// `specific_risk` needs `date`, `asset`, and `specific_risk`. Assets
    /// without a specific risk get a null alpha. Scores are null where the
    /// cross-section has no dispersion.
    pub fn score(&self, raw: &DataFrame, specific_risk: &DataFrame) -> Result<DataFrame> {
        require_columns(raw, &["date", "asset", "name", "signal"])?;
        require_columns(specific_risk, &["date", "asset", "specific_risk"])?;

        let risk = specific_risk
            .clone()
            .lazy()
            .select([col("date"), col("asset"), col("specific_risk")]);

        let scored = raw
            .clone()
            .lazy()
            .with_column(
                col("signal")
                    .std(1)
                    .over([col("date"), col("name")])
                    .alias("dispersion"),
            )
            .with_column(
                when(col("dispersion").gt(lit(0.0)))
                    .then(crate::cross_sectional_zscore("signal", &["date", "name"]))
                    .otherwise(lit(NULL))
                    .alias("score"),
            )
            .join(
                risk,
                [col("date"), col("asset")],
                [col("date"), col("asset")],
                JoinArgs::new(JoinType::Left),
            )
            .with_column(
                (col("score") * lit(self.config.alpha_scale) * col("specific_risk")).alias("alpha"),
            )
            .select([
                col("date"),
                col("asset"),
                col("name"),
                col("signal"),
                col("score"),
                col("alpha"),
            ])
            .sort(["asset", "date", "name"], Default::default())
            .collect()?;
        Ok(scored)
    }

    /// Raw signals, scores, and alphas for `panel`.
    pub fn compute(&self, panel: &DataFrame, specific_risk: &DataFrame) -> Result<DataFrame> {
        self.score(&self.compute_raw(panel)?, specific_risk)
    }

    /// Compute alphas for `[start, end]` from a data source.
    ///
    /// History is read from `lookback × 1.5 + 30` calendar days before
    /// `start` so the windows are warm on the first output date.
    pub fn run<S: AssetDataSource + ?Sized>(&self, source: &S, start: Date, end: Date) -> Result<DataFrame> {
        if start > end {
            return Err(CadizError::InvalidParameter(format!(
                "start {start} is after end {end}"
            )));
        }
        let buffer = (self.lookback() * 3 / 2 + 30) as u64;
        let history_start = start.checked_sub_days(Days::new(buffer)).ok_or_else(|| {
            CadizError::InvalidParameter(format!("cannot look back {buffer} days from {start}"))
        })?;

        let panel = source.returns_beta(history_start, end, None)?;
        if panel.height() == 0 {
            return Err(CadizError::InsufficientData(format!(
                "no returns between {history_start} and {end}"
            )));
        }

        let raw = between_dates(self.compute_raw(&panel)?.lazy(), start, end).collect()?;
        let specific_risk = source.specific_risk_history(start, end)?;
        let alphas = self.score(&raw, &specific_risk)?;

        info!(
            %start,
            %end,
            rows = alphas.height(),
            signals = ?self.signal_names(),
            "Signals computed"
        );
        Ok(alphas)
    }
}

impl fmt::Debug for SignalEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalEngine")
            .field("config", &self.config)
            .field("signals", &self.signal_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Beta;
    use cadiz_traits::frame::{asset_values, f64_values, str_values};
    use approx::assert_relative_eq;

    fn date(offset: u64) -> Date {
        Date::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .checked_add_days(Days::new(offset))
            .unwrap()
    }

    fn beta_panel() -> DataFrame {
        df! {
            "date" => &[date(0), date(0), date(0)],
            "asset" => &["C", "A", "B"],
            "return" => &[0.0, 0.0, 0.0],
            "predicted_beta" => &[1.5, 0.5, 1.0],
        }
        .unwrap()
    }

    #[test]
    fn test_config_validation() {
        let config = SignalConfig {
            reversal_window: 0,
            ..Default::default()
        };
        assert!(matches!(
            SignalEngine::new(config),
            Err(CadizError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_duplicate_signals_rejected() {
        let signals: Vec<Box<dyn Signal>> = vec![Box::new(Beta), Box::new(Beta)];
        assert!(SignalEngine::with_signals(SignalConfig::default(), signals).is_err());
    }

    #[test]
    fn test_long_format_layout() {
        let engine = SignalEngine::new(SignalConfig::default()).unwrap();
        assert_eq!(engine.signal_names(), vec!["beta", "momentum", "reversal"]);
        assert_eq!(engine.lookback(), 252);

        let raw = engine.compute_raw(&beta_panel()).unwrap();
        assert_eq!(raw.height(), 9);
        assert_eq!(
            str_values(&raw, "name").unwrap()[..3],
            [Some("beta".to_string()), Some("momentum".to_string()), Some("reversal".to_string())]
        );
        // windows are not full after one day
        let signals = f64_values(&raw, "signal").unwrap();
        assert_eq!(signals[0], Some(-0.5));
        assert!(signals[1].is_none());
        assert!(signals[2].is_none());
    }

    #[test]
    fn test_scores_and_alphas() {
        let engine =
            SignalEngine::with_signals(SignalConfig::default(), vec![Box::new(Beta)]).unwrap();
        let specific_risk = df! {
            "date" => &[date(0), date(0)],
            "asset" => &["A", "C"],
            "specific_risk" => &[20.0, 40.0],
        }
        .unwrap();

        let out = engine.compute(&beta_panel(), &specific_risk).unwrap();
        assert_eq!(asset_values(&out, "asset").unwrap(), vec!["A", "B", "C"]);

        // beta signal: A -0.5, B -1.0, C -1.5; mean -1.0, sample std 0.5
        let scores = f64_values(&out, "score").unwrap();
        assert_relative_eq!(scores[0].unwrap(), 1.0);
        assert_relative_eq!(scores[1].unwrap(), 0.0);
        assert_relative_eq!(scores[2].unwrap(), -1.0);

        let alphas = f64_values(&out, "alpha").unwrap();
        assert_relative_eq!(alphas[0].unwrap(), 1.0 * 0.05 * 20.0);
        assert!(alphas[1].is_none());
        assert_relative_eq!(alphas[2].unwrap(), -1.0 * 0.05 * 40.0);
    }

    #[test]
    fn test_flat_cross_section_has_no_score() {
        let engine =
            SignalEngine::with_signals(SignalConfig::default(), vec![Box::new(Beta)]).unwrap();
        let panel = df! {
            "date" => &[date(0), date(0)],
            "asset" => &["A", "B"],
            "predicted_beta" => &[1.0, 1.0],
        }
        .unwrap();
        let risk = df!("date" => &[date(0)], "asset" => &["A"], "specific_risk" => &[10.0]).unwrap();
        let out = engine.compute(&panel, &risk).unwrap();
        assert!(f64_values(&out, "score").unwrap().iter().all(Option::is_none));
    }
}
