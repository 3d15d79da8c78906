//! Signal implementations for the Cadiz alpha pipeline.
//!
//! This crate provides the raw signals computed from the daily return/beta
//! panel and the engine that turns them into alphas:
//! - Momentum: 230-day log return, skipping the most recent 22 days
//! - Beta: negated predicted beta (low-beta anomaly)
//! - Reversal: negated 22-day log return
//!
//! Raw values are standardized cross-sectionally per date and signal, then
//! scaled by each asset's specific risk to give an alpha in percent.
//!
//! # Example
//!
//! ```ignore
//! use cadiz_signals::{SignalConfig, SignalEngine};
//!
//! let engine = SignalEngine::new(SignalConfig::default())?;
//! let alphas = engine.run(&source, start, end)?;
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

mod beta;
mod engine;
mod momentum;
pub mod registry;
mod reversal;
mod standardize;

pub use beta::Beta;
pub use engine::{SignalConfig, SignalEngine};
pub use momentum::{Momentum, MomentumConfig};
pub use registry::{SignalCategory, SignalInfo, build_signal, default_signals};
pub use reversal::{Reversal, ReversalConfig};
pub use standardize::cross_sectional_zscore;
