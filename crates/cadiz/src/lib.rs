#![doc(issue_tracker_base_url = "https://github.com/factordynamics/cadiz/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! # cadiz
//!
//! Portfolio construction on top of a factor risk model.
//!
//! cadiz is an umbrella crate that re-exports all cadiz sub-crates for
//! convenience. A daily run goes through four stages:
//!
//! 1. **Risk**: assemble the asset covariance matrix `Σ = B·F·Bᵀ + diag(s²)`
//! 2. **Signals**: compute momentum, beta, and reversal, standardize them
//!    per date, and scale the scores into alphas
//! 3. **Blend**: weight each signal by the inverse volatility of its paper
//!    portfolio to get a composite alpha
//! 4. **Optimize**: maximize `αᵀw − γ·wᵀΣw` under linear constraints
//!
//! ## Quick Start
//!
//! ```ignore
//! use cadiz::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let source = InMemoryDataSource::new()
//!     .with_assets(assets)?
//!     .with_exposures(exposures)?
//!     .with_covariances(covariances)?;
//!
//! let alphas = SignalEngine::new(SignalConfig::default())?.run(&source, start, end)?;
//! let composite = RiskParityBlender::default().run(&source, &alphas)?;
//!
//! let alpha = Alpha::from_frame(&composite, end)?;
//! let portfolio = MeanVarianceOptimizer::default().optimize(
//!     &source,
//!     &alpha,
//!     &[Constraint::FullInvestment, Constraint::LongOnly],
//!     1.0,
//! )?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Organization
//!
//! - [`traits`] - Records, data-source traits, and the error type
//! - [`risk`] - Covariance matrix assembly
//! - [`signals`] - Signal computation and alpha scoring
//! - [`combine`] - Paper portfolios and risk-parity blending
//! - [`optimize`] - Constraints and the mean-variance optimizer
//!
//! ## Units
//!
//! Returns, specific risk, and alphas are in percent; covariances are in
//! percent squared.

/// Version information for the cadiz crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core data contracts.
///
/// - [`Universe`] - canonical asset ordering
/// - [`CovarianceMatrix`], [`Alpha`], [`Portfolio`] - stage outputs
/// - [`RiskModelSource`], [`AssetDataSource`] - the data layer the core reads
pub mod traits {
    pub use cadiz_traits::*;
}

pub use cadiz_traits::{
    Alpha, AssetDataSource, CadizError, ConstraintConstructor, CovarianceMatrix, Date,
    FactorDataAccess, InMemoryDataSource, LinearConstraint, Portfolio, Result, RiskModelSource,
    Signal, Universe,
};

/// Asset covariance matrices from a factor risk model.
pub mod risk {
    pub use cadiz_risk::*;
}

/// Signals and alphas.
///
/// | signal | definition |
/// |---|---|
/// | `momentum` | 230-day sum of log returns, skipping the latest 22 days |
/// | `beta` | negated predicted beta |
/// | `reversal` | negated 22-day sum of log returns |
pub mod signals {
    pub use cadiz_signals::*;
}

/// Composite alphas.
pub mod combine {
    pub use cadiz_combine::*;
}

/// Constraints and portfolio optimization.
pub mod optimize {
    pub use cadiz_optimize::*;
}

pub use cadiz_combine::{Combiner, PaperPortfolioBuilder, RiskParityBlender, RiskParityConfig};
pub use cadiz_optimize::{Constraint, MeanVarianceOptimizer, SolverSettings};
pub use cadiz_risk::CovarianceMatrixBuilder;
pub use cadiz_signals::{SignalConfig, SignalEngine};

/// Prelude module for convenient imports.
///
/// ```ignore
/// use cadiz::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Alpha, AssetDataSource, CadizError, Combiner, Constraint, ConstraintConstructor,
        CovarianceMatrix, CovarianceMatrixBuilder, Date, FactorDataAccess, InMemoryDataSource,
        LinearConstraint, MeanVarianceOptimizer, PaperPortfolioBuilder, Portfolio, Result,
        RiskModelSource, RiskParityBlender, RiskParityConfig, Signal, SignalConfig, SignalEngine,
        SolverSettings, Universe,
    };
}
