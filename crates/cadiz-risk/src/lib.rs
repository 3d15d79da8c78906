//! Asset covariance matrices from a factor risk model.
//!
//! The covariance of asset returns is assembled as
//!
//! ```text
//! Σ = B · F · Bᵀ + diag(s²)
//! ```
//!
//! where `B` holds factor exposures (assets × factors), `F` is the
//! symmetrized factor covariance matrix, and `s` is the specific risk of each
//! asset. All three inputs are in percent units, so `Σ` is in percent squared.
//!
//! # Examples
//!
//! ```rust
//! use cadiz_risk::{assemble, symmetrize};
//! use ndarray::{Array1, Array2, array};
//!
//! let factor_cov = symmetrize(&array![[4.0, 1.0], [f64::NAN, 9.0]]);
//! let exposures = Array2::eye(2);
//! let sigma = assemble(&exposures, &factor_cov, &Array1::zeros(2)).unwrap();
//! assert_eq!(sigma, array![[4.0, 1.0], [1.0, 9.0]]);
//! ```

mod builder;
mod loaders;
mod symmetrize;

pub use builder::{CovarianceMatrixBuilder, assemble, covariance_from_frames};
pub use loaders::{exposure_matrix, factor_axis, factor_covariance_matrix, specific_risk_vector};
pub use symmetrize::symmetrize;
