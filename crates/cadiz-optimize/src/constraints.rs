//! The standard portfolio constraint set.

use std::str::FromStr;

use cadiz_traits::{
    AssetDataSource, CadizError, ConstraintConstructor, Date, LinearConstraint, Result, Universe,
    frame::{asset_values, f64_values},
};
use derive_more::Display;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// A named linear constraint on the weight vector `w`.
///
/// | variant | constraint |
/// |---|---|
/// | `FullInvestment` | `Σ w = 1` |
/// | `NoBuyingOnMargin` | `w ≤ 1` elementwise |
/// | `LongOnly` | `w ≥ 0` elementwise |
/// | `UnitBeta` | `Σ w·β = 1` |
/// | `ZeroBeta` | `Σ w·β = 0` |
///
/// The beta constraints read predicted betas for the date from the data
/// source. Conflicting combinations are not rejected here; the optimizer
/// reports them as infeasible.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    /// Weights sum to one
    #[display("full_investment")]
    FullInvestment,
    /// No weight above one
    #[display("no_buying_on_margin")]
    #[serde(alias = "no_margin")]
    NoBuyingOnMargin,
    /// No negative weight
    #[display("long_only")]
    LongOnly,
    /// Portfolio beta of one
    #[display("unit_beta")]
    UnitBeta,
    /// Portfolio beta of zero
    #[display("zero_beta")]
    ZeroBeta,
}

impl Constraint {
    /// Every constraint, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::FullInvestment,
        Self::NoBuyingOnMargin,
        Self::LongOnly,
        Self::UnitBeta,
        Self::ZeroBeta,
    ];

    /// Snake-case name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FullInvestment => "full_investment",
            Self::NoBuyingOnMargin => "no_buying_on_margin",
            Self::LongOnly => "long_only",
            Self::UnitBeta => "unit_beta",
            Self::ZeroBeta => "zero_beta",
        }
    }
}

impl FromStr for Constraint {
    type Err = CadizError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "full_investment" => Ok(Self::FullInvestment),
            "no_buying_on_margin" | "no_margin" => Ok(Self::NoBuyingOnMargin),
            "long_only" => Ok(Self::LongOnly),
            "unit_beta" => Ok(Self::UnitBeta),
            "zero_beta" => Ok(Self::ZeroBeta),
            other => Err(CadizError::UnknownConstraint(other.to_string())),
        }
    }
}

impl ConstraintConstructor for Constraint {
    fn name(&self) -> &str {
        self.as_str()
    }

    fn construct(
        &self,
        date: Date,
        universe: &Universe,
        data: &dyn AssetDataSource,
    ) -> Result<LinearConstraint> {
        let n = universe.len();
        match self {
            Self::FullInvestment => LinearConstraint::equality(self.as_str(), Array1::ones(n), 1.0),
            Self::NoBuyingOnMargin => {
                LinearConstraint::elementwise(self.as_str(), n, f64::NEG_INFINITY, 1.0)
            }
            Self::LongOnly => LinearConstraint::elementwise(self.as_str(), n, 0.0, f64::INFINITY),
            Self::UnitBeta => {
                LinearConstraint::equality(self.as_str(), betas(date, universe, data)?, 1.0)
            }
            Self::ZeroBeta => {
                LinearConstraint::equality(self.as_str(), betas(date, universe, data)?, 0.0)
            }
        }
    }
}

/// Predicted betas on `date` in the canonical order of `universe`.
///
/// # Errors
///
/// Returns [`CadizError::Misaligned`] if any asset of the universe has no
/// finite beta for the date.
pub fn betas(date: Date, universe: &Universe, data: &dyn AssetDataSource) -> Result<Array1<f64>> {
    let frame = data.predicted_betas(date, universe)?;
    let assets = asset_values(&frame, "asset")?;
    let values = f64_values(&frame, "predicted_beta")?;

    let mut betas = Array1::from_elem(universe.len(), f64::NAN);
    let mut seen = vec![false; universe.len()];
    for (asset, value) in assets.iter().zip(values) {
        let Some(i) = universe.position(asset) else {
            continue;
        };
        if seen[i] {
            return Err(CadizError::InvalidData(format!(
                "duplicate predicted beta for {asset} on {date}"
            )));
        }
        seen[i] = true;
        betas[i] = value.unwrap_or(f64::NAN);
    }

    let missing: Vec<&str> = universe
        .iter()
        .zip(betas.iter())
        .filter(|(_, b)| !b.is_finite())
        .map(|(a, _)| a.as_str())
        .collect();
    if !missing.is_empty() {
        return Err(CadizError::misaligned(
            format!("predicted betas on {date}"),
            format!(
                "{} of {} assets without beta, e.g. {:?}",
                missing.len(),
                universe.len(),
                &missing[..missing.len().min(5)]
            ),
        ));
    }
    Ok(betas)
}
