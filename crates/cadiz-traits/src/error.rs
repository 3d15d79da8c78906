//! Error types for the Cadiz framework.
//!
//! This module defines the error types used throughout the Cadiz ecosystem,
//! covering data validation, index alignment, matrix assembly, and the
//! distinct outcomes of the portfolio optimizer.

use std::time::Duration;
use thiserror::Error;

/// The main error type for Cadiz operations.
///
/// Solver outcomes (`PrimalInfeasible`, `DualInfeasible`, `MaxIterations`,
/// `TimeLimit`) are separate variants so callers can tell an infeasible
/// constraint set apart from a program that simply did not converge.
#[derive(Debug, Error)]
pub enum CadizError {
    /// The requested asset universe is empty.
    #[error("Asset universe is empty")]
    EmptyUniverse,

    /// Two inputs that must share one asset ordering do not.
    #[error("Misaligned {context}: {detail}")]
    Misaligned {
        /// Which inputs were being aligned
        context: String,
        /// What differed
        detail: String,
    },

    /// Matrix or vector dimensions do not fit together.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Error when a required column is missing from a table.
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Error due to invalid or malformed data.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A configuration or call parameter is out of range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error when data is insufficient for the requested operation.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// The quadratic program has no feasible point.
    #[error("Optimization problem is primal infeasible")]
    PrimalInfeasible,

    /// The quadratic program is unbounded (dual infeasible).
    #[error("Optimization problem is dual infeasible (unbounded)")]
    DualInfeasible,

    /// The solver hit its iteration cap before converging.
    #[error("Solver did not converge within {0} iterations")]
    MaxIterations(usize),

    /// The solver hit its wall-clock limit before converging.
    #[error("Solver exceeded time limit of {0:?}")]
    TimeLimit(Duration),

    /// Error when a signal name is not registered.
    #[error("Unknown signal: {0}")]
    UnknownSignal(String),

    /// Error when a constraint name is not recognised.
    #[error("Unknown constraint: {0}")]
    UnknownConstraint(String),

    /// Error from Polars operations.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Error from ndarray shape operations.
    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),
}

impl CadizError {
    /// Build a [`CadizError::Misaligned`] error.
    pub fn misaligned(context: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Misaligned {
            context: context.into(),
            detail: detail.into(),
        }
    }

    /// Whether this error is one of the solver outcome variants.
    pub const fn is_solver_failure(&self) -> bool {
        matches!(
            self,
            Self::PrimalInfeasible | Self::DualInfeasible | Self::MaxIterations(_) | Self::TimeLimit(_)
        )
    }
}

impl From<String> for CadizError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for CadizError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

/// A specialized Result type for Cadiz operations.
///
/// This is a convenience type that uses [`CadizError`] as the error type.
pub type Result<T> = std::result::Result<T, CadizError>;
