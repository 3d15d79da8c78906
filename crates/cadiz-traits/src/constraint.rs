//! Linear constraints on the portfolio weight vector.
//!
//! Every constraint the optimizer accepts is expressed in the two-sided form
//! `lower <= A w <= upper`, where the columns of `A` follow the canonical
//! asset order of the [`Universe`] the constraint was built against.
//! Equality rows have `lower == upper`; one-sided rows use an infinite bound.

use crate::{AssetDataSource, CadizError, Date, Result, Universe};
use ndarray::{Array1, Array2};

/// A block of linear constraint rows `lower <= coefficients · w <= upper`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    name: String,
    coefficients: Array2<f64>,
    lower: Array1<f64>,
    upper: Array1<f64>,
}

impl LinearConstraint {
    /// Creates a constraint block, checking that the bounds fit the rows.
    ///
    /// # Errors
    ///
    /// Returns [`CadizError::ShapeMismatch`] if the bound vectors do not have
    /// one entry per row, or [`CadizError::InvalidParameter`] if a lower
    /// bound exceeds its upper bound or either bound is NaN.
    pub fn new(
        name: impl Into<String>,
        coefficients: Array2<f64>,
        lower: Array1<f64>,
        upper: Array1<f64>,
    ) -> Result<Self> {
        let name = name.into();
        let rows = coefficients.nrows();
        if lower.len() != rows || upper.len() != rows {
            return Err(CadizError::ShapeMismatch(format!(
                "constraint `{name}` has {rows} rows but bounds of length {} and {}",
                lower.len(),
                upper.len()
            )));
        }
        if lower.iter().zip(upper.iter()).any(|(l, u)| l.is_nan() || u.is_nan() || l > u) {
            return Err(CadizError::InvalidParameter(format!(
                "constraint `{name}` has an empty or undefined bound interval"
            )));
        }
        Ok(Self {
            name,
            coefficients,
            lower,
            upper,
        })
    }

    /// A single equality row `coefficients · w = rhs`.
    pub fn equality(name: impl Into<String>, coefficients: Array1<f64>, rhs: f64) -> Result<Self> {
        let n = coefficients.len();
        let row = coefficients.into_shape_with_order((1, n))?;
        Self::new(name, row, Array1::from_elem(1, rhs), Array1::from_elem(1, rhs))
    }

    /// Elementwise bounds `lower <= w_i <= upper` on all `n` weights.
    pub fn elementwise(name: impl Into<String>, n: usize, lower: f64, upper: f64) -> Result<Self> {
        Self::new(
            name,
            Array2::eye(n),
            Array1::from_elem(n, lower),
            Array1::from_elem(n, upper),
        )
    }

    /// Constraint name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Coefficient rows.
    pub const fn coefficients(&self) -> &Array2<f64> {
        &self.coefficients
    }

    /// Lower bounds, one per row.
    pub const fn lower(&self) -> &Array1<f64> {
        &self.lower
    }

    /// Upper bounds, one per row.
    pub const fn upper(&self) -> &Array1<f64> {
        &self.upper
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.coefficients.nrows()
    }

    /// Whether every row is an equality.
    pub fn is_equality(&self) -> bool {
        self.lower.iter().zip(self.upper.iter()).all(|(l, u)| l == u)
    }

    /// Check the block has one column per asset of `universe`.
    ///
    /// # Errors
    ///
    /// Returns [`CadizError::Misaligned`] if the column count differs.
    pub fn ensure_columns(&self, universe: &Universe) -> Result<()> {
        if self.coefficients.ncols() == universe.len() {
            Ok(())
        } else {
            Err(CadizError::misaligned(
                format!("constraint `{}`", self.name),
                format!(
                    "{} coefficient columns for a universe of {} assets",
                    self.coefficients.ncols(),
                    universe.len()
                ),
            ))
        }
    }

    /// Largest violation of the block at `weights`.
    pub fn max_violation(&self, weights: &Array1<f64>) -> f64 {
        let values = self.coefficients.dot(weights);
        values
            .iter()
            .zip(self.lower.iter().zip(self.upper.iter()))
            .map(|(v, (l, u))| (l - v).max(v - u).max(0.0))
            .fold(0.0, f64::max)
    }
}

/// Builds one [`LinearConstraint`] for a date and universe.
///
/// Constructors are pure: the same date, universe, and data yield the same
/// rows. They do not check for conflicts with each other; an infeasible
/// combination surfaces when the program is solved.
pub trait ConstraintConstructor: Send + Sync {
    /// Name used in configuration and error messages.
    fn name(&self) -> &str;

    /// Instantiate the constraint against `universe` in canonical order.
    ///
    /// # Errors
    ///
    /// Returns [`CadizError::Misaligned`] if the data needed for the rows
    /// does not cover every asset of the universe.
    fn construct(
        &self,
        date: Date,
        universe: &Universe,
        data: &dyn AssetDataSource,
    ) -> Result<LinearConstraint>;
}

impl<T: ConstraintConstructor + ?Sized> ConstraintConstructor for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn construct(
        &self,
        date: Date,
        universe: &Universe,
        data: &dyn AssetDataSource,
    ) -> Result<LinearConstraint> {
        (**self).construct(date, universe, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_equality_row() {
        let c = LinearConstraint::equality("sum", array![1.0, 1.0, 1.0], 1.0).unwrap();
        assert_eq!(c.rows(), 1);
        assert!(c.is_equality());
        assert_eq!(c.max_violation(&array![0.2, 0.3, 0.5]), 0.0);
        assert!((c.max_violation(&array![0.5, 0.5, 0.5]) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_elementwise_bounds() {
        let c = LinearConstraint::elementwise("long", 2, 0.0, f64::INFINITY).unwrap();
        assert!(!c.is_equality());
        assert_eq!(c.max_violation(&array![0.1, 3.0]), 0.0);
        assert!((c.max_violation(&array![-0.25, 1.0]) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_bad_bounds() {
        let err = LinearConstraint::new(
            "bad",
            Array2::eye(2),
            array![0.0],
            array![1.0, 1.0],
        )
        .unwrap_err();
        assert!(matches!(err, CadizError::ShapeMismatch(_)));

        let err = LinearConstraint::elementwise("bad", 2, 1.0, 0.0).unwrap_err();
        assert!(matches!(err, CadizError::InvalidParameter(_)));
    }

    #[test]
    fn test_ensure_columns() {
        let universe = Universe::new(["A", "B", "C"]).unwrap();
        let c = LinearConstraint::elementwise("long", 2, 0.0, 1.0).unwrap();
        assert!(matches!(
            c.ensure_columns(&universe),
            Err(CadizError::Misaligned { .. })
        ));
    }
}
