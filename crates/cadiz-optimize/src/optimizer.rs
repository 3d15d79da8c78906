//! Mean-variance portfolio optimizer.

use cadiz_risk::CovarianceMatrixBuilder;
use cadiz_traits::{
    Alpha, CadizError, ConstraintConstructor, CovarianceMatrix, FactorDataAccess, LinearConstraint,
    Portfolio, Result,
};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, concatenate};
use tracing::debug;

use crate::qp::{QpSolver, QuadraticProgram, SolverSettings};

/// Solves `maximize αᵀw − γ·wᵀΣw` subject to a list of linear constraints.
///
/// The program is handed to the solver as
/// `minimize ½ wᵀ(2Σ)w − (α/γ)ᵀw`, which has the same minimiser. As `γ`
/// grows the linear term vanishes and the solution tends to the constrained
/// minimum-variance portfolio.
///
/// # Examples
///
/// ```rust
/// use cadiz_optimize::MeanVarianceOptimizer;
/// use cadiz_traits::{Alpha, CovarianceMatrix, Date, LinearConstraint, Universe};
/// use ndarray::{Array1, array};
///
/// let date = Date::from_ymd_opt(2024, 6, 3).unwrap();
/// let universe = Universe::new(["A", "B"]).unwrap();
/// let sigma = CovarianceMatrix::new(date, universe.clone(), array![[1.0, 0.0], [0.0, 4.0]]).unwrap();
/// let alpha = Alpha::new(date, universe, Array1::zeros(2)).unwrap();
/// let budget = LinearConstraint::equality("full_investment", Array1::ones(2), 1.0).unwrap();
///
/// let portfolio = MeanVarianceOptimizer::default()
///     .solve(&sigma, &alpha, &[budget], 1.0)
///     .unwrap();
/// assert!((portfolio.weight("A").unwrap() - 0.8).abs() < 1e-4);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MeanVarianceOptimizer {
    solver: QpSolver,
}

impl MeanVarianceOptimizer {
    /// Creates an optimizer with the given solver settings.
    pub const fn new(settings: SolverSettings) -> Self {
        Self {
            solver: QpSolver::new(settings),
        }
    }

    /// Solver settings.
    pub const fn settings(&self) -> &SolverSettings {
        self.solver.settings()
    }

    /// Solve for the given Σ, alpha, and instantiated constraints.
    ///
    /// # Errors
    ///
    /// - [`CadizError::InvalidParameter`] unless `gamma` is positive and finite
    /// - [`CadizError::Misaligned`] if Σ, alpha, and the constraint columns do
    ///   not share one asset ordering and date
    /// - the solver outcomes of [`QpSolver::solve`]
    pub fn solve(
        &self,
        covariance: &CovarianceMatrix,
        alpha: &Alpha,
        constraints: &[LinearConstraint],
        gamma: f64,
    ) -> Result<Portfolio> {
        if !(gamma.is_finite() && gamma > 0.0) {
            return Err(CadizError::InvalidParameter(format!(
                "gamma must be positive and finite, got {gamma}"
            )));
        }

        let universe = covariance.universe();
        universe.ensure_same(alpha.universe(), "alpha vs covariance")?;
        if alpha.date() != covariance.date() {
            return Err(CadizError::misaligned(
                "alpha vs covariance",
                format!("alpha for {} against Σ for {}", alpha.date(), covariance.date()),
            ));
        }
        for constraint in constraints {
            constraint.ensure_columns(universe)?;
        }

        let n = universe.len();
        let (a, l, u) = stack(constraints, n)?;
        let p = covariance.values() * 2.0;
        let q = alpha.values() / -gamma;

        let problem = QuadraticProgram::new(p, q, a, l, u)?;
        let solution = self.solver.solve(&problem)?;

        let violation = constraints
            .iter()
            .map(|c| c.max_violation(&solution.x))
            .fold(0.0, f64::max);
        debug!(
            date = %covariance.date(),
            assets = n,
            constraints = constraints.len(),
            iterations = solution.iterations,
            violation,
            "Portfolio optimized"
        );

        Portfolio::new(covariance.date(), universe.clone(), solution.x)
    }

    /// Build Σ from `source`, instantiate `constraints`, and solve.
    ///
    /// The universe and date are taken from `alpha`.
    pub fn optimize<D, C>(
        &self,
        source: &D,
        alpha: &Alpha,
        constraints: &[C],
        gamma: f64,
    ) -> Result<Portfolio>
    where
        D: FactorDataAccess,
        C: ConstraintConstructor,
    {
        self.optimize_with_covariance(source, alpha, constraints, gamma)
            .map(|(portfolio, _)| portfolio)
    }

    /// Like [`optimize`](Self::optimize), also returning the Σ it was solved
    /// against so callers can report risk without rebuilding it.
    pub fn optimize_with_covariance<D, C>(
        &self,
        source: &D,
        alpha: &Alpha,
        constraints: &[C],
        gamma: f64,
    ) -> Result<(Portfolio, CovarianceMatrix)>
    where
        D: FactorDataAccess,
        C: ConstraintConstructor,
    {
        let date = alpha.date();
        let universe = alpha.universe();
        let covariance = CovarianceMatrixBuilder::new(source).build(date, universe)?;
        let rows = constraints
            .iter()
            .map(|c| c.construct(date, universe, source))
            .collect::<Result<Vec<_>>>()?;
        let portfolio = self.solve(&covariance, alpha, &rows, gamma)?;
        Ok((portfolio, covariance))
    }
}

/// Stack constraint blocks into one `(A, l, u)`; zero rows if there are none.
fn stack(constraints: &[LinearConstraint], n: usize) -> Result<(Array2<f64>, Array1<f64>, Array1<f64>)> {
    if constraints.is_empty() {
        return Ok((Array2::zeros((0, n)), Array1::zeros(0), Array1::zeros(0)));
    }
    let a: Vec<ArrayView2<'_, f64>> = constraints.iter().map(|c| c.coefficients().view()).collect();
    let l: Vec<ArrayView1<'_, f64>> = constraints.iter().map(|c| c.lower().view()).collect();
    let u: Vec<ArrayView1<'_, f64>> = constraints.iter().map(|c| c.upper().view()).collect();
    Ok((
        concatenate(Axis(0), &a)?,
        concatenate(Axis(0), &l)?,
        concatenate(Axis(0), &u)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cadiz_traits::{Date, Universe};
    use ndarray::array;

    fn date() -> Date {
        Date::from_ymd_opt(2024, 6, 3).unwrap()
    }

    fn universe() -> Universe {
        Universe::new(["A", "B"]).unwrap()
    }

    fn sigma() -> CovarianceMatrix {
        CovarianceMatrix::new(date(), universe(), array![[1.0, 0.0], [0.0, 4.0]]).unwrap()
    }

    fn alpha(values: Array1<f64>) -> Alpha {
        Alpha::new(date(), universe(), values).unwrap()
    }

    #[test]
    fn test_rejects_bad_gamma() {
        let opt = MeanVarianceOptimizer::default();
        for gamma in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                opt.solve(&sigma(), &alpha(array![0.0, 0.0]), &[], gamma),
                Err(CadizError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn test_unconstrained_closed_form() {
        // w = Σ⁻¹α / (2γ)
        let portfolio = MeanVarianceOptimizer::default()
            .solve(&sigma(), &alpha(array![1.0, 2.0]), &[], 0.5)
            .unwrap();
        assert_relative_eq!(portfolio.weight("A").unwrap(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(portfolio.weight("B").unwrap(), 0.5, epsilon = 1e-5);
    }

    #[test]
    fn test_misaligned_alpha() {
        let other = Alpha::new(date(), Universe::new(["A", "C"]).unwrap(), array![0.0, 0.0]).unwrap();
        assert!(matches!(
            MeanVarianceOptimizer::default().solve(&sigma(), &other, &[], 1.0),
            Err(CadizError::Misaligned { .. })
        ));

        let later = Alpha::new(date().succ_opt().unwrap(), universe(), array![0.0, 0.0]).unwrap();
        assert!(matches!(
            MeanVarianceOptimizer::default().solve(&sigma(), &later, &[], 1.0),
            Err(CadizError::Misaligned { .. })
        ));
    }

    #[test]
    fn test_misaligned_constraint() {
        let row = LinearConstraint::equality("full_investment", Array1::ones(3), 1.0).unwrap();
        assert!(matches!(
            MeanVarianceOptimizer::default().solve(&sigma(), &alpha(array![0.0, 0.0]), &[row], 1.0),
            Err(CadizError::Misaligned { .. })
        ));
    }
}
