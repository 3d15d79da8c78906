//! Pipeline configuration for the Cadiz CLI.

use std::{fs, path::Path};

use anyhow::{Context, Result, bail};
use cadiz_combine::RiskParityConfig;
use cadiz_optimize::SolverSettings;
use cadiz_signals::SignalConfig;
use serde::{Deserialize, Serialize};

/// Settings for every pipeline stage, read from an optional JSON file.
///
/// Missing sections and fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct CadizConfig {
    /// Signal windows and alpha scale
    pub(crate) signals: SignalConfig,

    /// Blending settings
    pub(crate) risk_parity: RiskParityConfig,

    /// Quadratic-program solver settings
    pub(crate) solver: SolverSettings,

    /// Risk aversion of the final portfolio
    pub(crate) gamma: f64,
}

impl Default for CadizConfig {
    fn default() -> Self {
        Self {
            signals: SignalConfig::default(),
            risk_parity: RiskParityConfig::default(),
            solver: SolverSettings::default(),
            gamma: 1.0,
        }
    }
}

impl CadizConfig {
    /// Load from `path`, or use defaults when no path is given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        self.signals.validate()?;
        self.solver.validate()?;
        if !(self.gamma.is_finite() && self.gamma > 0.0) {
            bail!("gamma must be positive and finite, got {}", self.gamma);
        }
        if self.risk_parity.volatility_window < 2 {
            bail!(
                "volatility window must span at least two days, got {}",
                self.risk_parity.volatility_window
            );
        }
        Ok(())
    }
}
