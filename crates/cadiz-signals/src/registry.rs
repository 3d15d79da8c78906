//! Signal registry for discovering and constructing signals by name.

use cadiz_traits::{CadizError, Result, Signal};
use serde::{Deserialize, Serialize};

use crate::{Beta, Momentum, Reversal, SignalConfig};

/// Signal category classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalCategory {
    /// Price momentum signals
    Momentum,
    /// Mean reversion and contrarian signals
    Reversion,
    /// Risk-based anomaly signals
    Risk,
}

impl SignalCategory {
    /// Get a human-readable description of the category.
    #[must_use]
    pub const fn description(&self) -> &str {
        match self {
            Self::Momentum => "Price momentum and trend-following signals",
            Self::Reversion => "Mean reversion and contrarian signals",
            Self::Risk => "Risk anomaly signals such as low beta",
        }
    }
}

/// Metadata about a signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalInfo {
    /// Unique identifier for the signal
    pub name: &'static str,

    /// Category classification
    pub category: SignalCategory,

    /// Human-readable description
    pub description: &'static str,

    /// Default lookback in trading days
    pub typical_lookback: usize,
}

/// Information about every available signal, sorted by name.
#[must_use]
pub fn available_signals() -> Vec<SignalInfo> {
    vec![
        SignalInfo {
            name: "beta",
            category: SignalCategory::Risk,
            description: "Negated predicted beta",
            typical_lookback: 0,
        },
        SignalInfo {
            name: "momentum",
            category: SignalCategory::Momentum,
            description: "230-day log return ending 22 days ago",
            typical_lookback: 252,
        },
        SignalInfo {
            name: "reversal",
            category: SignalCategory::Reversion,
            description: "Negated 22-day log return",
            typical_lookback: 22,
        },
    ]
}

/// Get information about a specific signal by name.
#[must_use]
pub fn get_signal_info(name: &str) -> Option<SignalInfo> {
    available_signals()
        .into_iter()
        .find(|info| info.name == name)
}

/// Construct a signal by name using the windows in `config`.
///
/// # Errors
///
/// Returns [`CadizError::UnknownSignal`] if the name is not registered.
pub fn build_signal(name: &str, config: &SignalConfig) -> Result<Box<dyn Signal>> {
    match name {
        "beta" => Ok(Box::new(Beta)),
        "momentum" => Ok(Box::new(Momentum::new(config.momentum()))),
        "reversal" => Ok(Box::new(Reversal::new(config.reversal()))),
        other => Err(CadizError::UnknownSignal(other.to_string())),
    }
}

/// All registered signals, sorted by name.
#[must_use]
pub fn default_signals(config: &SignalConfig) -> Vec<Box<dyn Signal>> {
    available_signals()
        .iter()
        .filter_map(|info| build_signal(info.name, config).ok())
        .collect()
}
