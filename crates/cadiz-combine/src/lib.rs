//! Composite alphas from several signals.
//!
//! Each signal's alphas are first turned into a per-date "paper" portfolio
//! with [`PaperPortfolioBuilder`]. The realized volatility of those
//! portfolios then decides how much each signal contributes to the
//! composite; see [`RiskParityBlender`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use cadiz_combine::{RiskParityBlender, RiskParityConfig};
//! use cadiz_traits::InMemoryDataSource;
//! # use polars::prelude::DataFrame;
//! # fn run(source: &InMemoryDataSource, alphas: &DataFrame) {
//! let blender = RiskParityBlender::new(RiskParityConfig::default());
//! let composite = blender.run(source, alphas).unwrap();
//! # }
//! ```

mod combiner;
mod paper;
mod risk_parity;

pub use combiner::Combiner;
pub use paper::{DEFAULT_PAPER_GAMMA, PaperPortfolioBuilder};
pub use risk_parity::{RiskParityBlender, RiskParityConfig};
