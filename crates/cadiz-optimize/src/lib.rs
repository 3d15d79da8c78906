//! Constrained mean-variance portfolio optimization.
//!
//! This crate provides the standard [`Constraint`] set, a dense ADMM
//! quadratic-program solver, and the [`MeanVarianceOptimizer`] tying them to
//! the covariance matrices built by `cadiz-risk`.
//!
//! Infeasible constraint sets and unbounded objectives are reported as
//! [`CadizError::PrimalInfeasible`](cadiz_traits::CadizError::PrimalInfeasible)
//! and [`CadizError::DualInfeasible`](cadiz_traits::CadizError::DualInfeasible);
//! the optimizer never returns a degenerate weight vector in their place.

mod constraints;
mod optimizer;
mod qp;

pub use constraints::{Constraint, betas};
pub use optimizer::MeanVarianceOptimizer;
pub use qp::{QpSolution, QpSolver, QuadraticProgram, SolverSettings};
