#![doc(issue_tracker_base_url = "https://github.com/factordynamics/cadiz/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core data contracts for the Cadiz portfolio construction framework.
//!
//! This crate provides the shared vocabulary of the pipeline: the canonical
//! asset [`Universe`], the record types produced by each stage
//! ([`CovarianceMatrix`], [`Alpha`], [`Portfolio`]), the data-source traits
//! the core reads through, and the [`Signal`] and [`ConstraintConstructor`]
//! abstractions.

/// The version of the cadiz-traits crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Module declarations
pub mod constraint;
pub mod error;
pub mod frame;
pub mod memory;
pub mod records;
pub mod signal;
pub mod source;
pub mod types;

// Re-exports
pub use constraint::{ConstraintConstructor, LinearConstraint};
pub use error::{CadizError, Result};
pub use memory::InMemoryDataSource;
pub use records::{Alpha, CovarianceMatrix, Portfolio, benchmark_weights};
pub use signal::Signal;
pub use source::{AssetDataSource, FactorDataAccess, RiskModelSource};
pub use types::{AssetId, Date, Universe};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }
}
