//! Dense ADMM solver for convex quadratic programs.
//!
//! Solves
//!
//! ```text
//! minimize    ½ xᵀ P x + qᵀ x
//! subject to  l ≤ A x ≤ u
//! ```
//!
//! with `P` positive semidefinite, by the operator splitting iteration of
//! Stellato et al. (OSQP): each step solves one regularized linear system
//! with a cached Cholesky factor, projects onto the bounds, and updates the
//! dual. The step size `rho` is adapted to balance the primal and dual
//! residuals. Infeasible and unbounded programs are detected from the
//! iterate differences and reported as distinct errors.

use std::time::{Duration, Instant};

use cadiz_traits::{CadizError, Result};
use nalgebra::{Cholesky, DMatrix, DVector, Dyn};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

const RHO_MIN: f64 = 1e-6;
const RHO_MAX: f64 = 1e6;
const RHO_EQUALITY_SCALE: f64 = 1e3;
const RHO_ADAPT_TOLERANCE: f64 = 5.0;
const COST_SCALE_MIN: f64 = 1e-4;
const COST_SCALE_MAX: f64 = 1e4;
const DIVISION_GUARD: f64 = 1e-10;
const SIGMA_BUMPS: usize = 4;
const SIGMA_BUMP_FACTOR: f64 = 10.0;

/// Solver settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Initial ADMM step size
    pub rho: f64,

    /// Proximal regularization of the primal variable
    pub sigma: f64,

    /// Over-relaxation parameter in (0, 2)
    pub relaxation: f64,

    /// Absolute convergence tolerance
    pub eps_abs: f64,

    /// Relative convergence tolerance
    pub eps_rel: f64,

    /// Tolerance of the primal infeasibility certificate
    pub eps_primal_infeasible: f64,

    /// Tolerance of the dual infeasibility certificate
    pub eps_dual_infeasible: f64,

    /// Iteration cap
    pub max_iter: usize,

    /// Iterations between termination checks
    pub check_interval: usize,

    /// Iterations between step size updates; 0 disables adaptation
    pub adaptive_rho_interval: usize,

    /// Wall-clock limit for one solve
    pub time_limit: Option<Duration>,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            rho: 0.1,
            sigma: 1e-6,
            relaxation: 1.6,
            eps_abs: 1e-7,
            eps_rel: 1e-7,
            eps_primal_infeasible: 1e-6,
            eps_dual_infeasible: 1e-6,
            max_iter: 100_000,
            check_interval: 10,
            adaptive_rho_interval: 50,
            time_limit: None,
        }
    }
}

impl SolverSettings {
    /// Check every setting is in range.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("rho", self.rho),
            ("sigma", self.sigma),
            ("eps_primal_infeasible", self.eps_primal_infeasible),
            ("eps_dual_infeasible", self.eps_dual_infeasible),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(CadizError::InvalidParameter(format!(
                    "solver {name} must be positive, got {value}"
                )));
            }
        }
        if !(self.eps_abs >= 0.0 && self.eps_rel >= 0.0 && self.eps_abs + self.eps_rel > 0.0) {
            return Err(CadizError::InvalidParameter(
                "solver tolerances must be non-negative and not both zero".into(),
            ));
        }
        if !(self.relaxation > 0.0 && self.relaxation < 2.0) {
            return Err(CadizError::InvalidParameter(format!(
                "solver relaxation must be in (0, 2), got {}",
                self.relaxation
            )));
        }
        if self.max_iter == 0 || self.check_interval == 0 {
            return Err(CadizError::InvalidParameter(
                "solver iteration counts must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// A quadratic program `min ½ xᵀPx + qᵀx  s.t.  l ≤ Ax ≤ u`.
#[derive(Debug, Clone)]
pub struct QuadraticProgram {
    p: Array2<f64>,
    q: Array1<f64>,
    a: Array2<f64>,
    l: Array1<f64>,
    u: Array1<f64>,
}

impl QuadraticProgram {
    /// Creates a program, checking dimensions.
    ///
    /// `a` may have zero rows for an unconstrained program.
    pub fn new(
        p: Array2<f64>,
        q: Array1<f64>,
        a: Array2<f64>,
        l: Array1<f64>,
        u: Array1<f64>,
    ) -> Result<Self> {
        let n = q.len();
        let m = a.nrows();
        if p.dim() != (n, n) || a.ncols() != n || l.len() != m || u.len() != m {
            return Err(CadizError::ShapeMismatch(format!(
                "P {:?}, q {n}, A {:?}, l {}, u {}",
                p.dim(),
                a.dim(),
                l.len(),
                u.len()
            )));
        }
        if p.iter().chain(q.iter()).chain(a.iter()).any(|v| !v.is_finite()) {
            return Err(CadizError::InvalidData(
                "quadratic program has non-finite coefficients".into(),
            ));
        }
        Ok(Self { p, q, a, l, u })
    }

    /// Number of variables.
    pub fn variables(&self) -> usize {
        self.q.len()
    }

    /// Number of constraint rows.
    pub fn constraints(&self) -> usize {
        self.a.nrows()
    }

    /// Objective value at `x`.
    pub fn objective(&self, x: &Array1<f64>) -> f64 {
        0.5 * x.dot(&self.p.dot(x)) + self.q.dot(x)
    }
}

/// A converged solution.
#[derive(Debug, Clone)]
pub struct QpSolution {
    /// Primal solution
    pub x: Array1<f64>,
    /// Constraint multipliers
    pub y: Array1<f64>,
    /// Objective value at `x`
    pub objective: f64,
    /// Iterations used
    pub iterations: usize,
    /// Final primal residual `‖Ax - z‖∞`
    pub primal_residual: f64,
    /// Final dual residual `‖Px + q + Aᵀy‖∞` of the cost-scaled program
    pub dual_residual: f64,
}

/// ADMM solver.
#[derive(Debug, Clone, Default)]
pub struct QpSolver {
    settings: SolverSettings,
}

impl QpSolver {
    /// Creates a solver with the given settings.
    pub const fn new(settings: SolverSettings) -> Self {
        Self { settings }
    }

    /// Solver settings.
    pub const fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    /// Solve `problem`.
    ///
    /// # Errors
    ///
    /// - [`CadizError::PrimalInfeasible`] if no point satisfies the constraints
    /// - [`CadizError::DualInfeasible`] if the objective is unbounded below
    /// - [`CadizError::MaxIterations`] or [`CadizError::TimeLimit`] if the
    ///   solver stops before converging
    /// - [`CadizError::InvalidData`] if `P` is not positive semidefinite
    pub fn solve(&self, problem: &QuadraticProgram) -> Result<QpSolution> {
        let settings = &self.settings;
        settings.validate()?;
        let started = Instant::now();

        let scale = cost_scale(&problem.p, &problem.q);
        let p = &problem.p * scale;
        let q = &problem.q * scale;
        let (a, l, u) = (&problem.a, &problem.l, &problem.u);
        let (n, m) = (problem.variables(), problem.constraints());
        let alpha = settings.relaxation;

        let mut rho = settings.rho;
        let mut rho_vec = rho_vector(rho, l, u);
        let mut kkt = Kkt::factor(&p, a, &rho_vec, settings.sigma)?;

        let mut x = Array1::<f64>::zeros(n);
        let mut z = Array1::<f64>::zeros(m);
        let mut y = Array1::<f64>::zeros(m);

        for iter in 1..=settings.max_iter {
            let x_prev = x.clone();
            let y_prev = y.clone();

            let rhs = &x_prev * kkt.sigma - &q + a.t().dot(&(&rho_vec * &z - &y_prev));
            let x_tilde = kkt.solve(&rhs);
            let z_tilde = a.dot(&x_tilde);

            x = &x_tilde * alpha + &x_prev * (1.0 - alpha);
            let z_relaxed = &z_tilde * alpha + &z * (1.0 - alpha);
            z = project(&(&z_relaxed + &(&y_prev / &rho_vec)), l, u);
            y = &y_prev + &(&rho_vec * &(&z_relaxed - &z));

            if let Some(limit) = settings.time_limit {
                if started.elapsed() > limit {
                    return Err(CadizError::TimeLimit(limit));
                }
            }

            if iter % settings.check_interval != 0 && iter != settings.max_iter {
                continue;
            }

            let residuals = Residuals::compute(&p, &q, a, &x, &z, &y);
            trace!(iter, rho, primal = residuals.primal, dual = residuals.dual, "ADMM residuals");
            if !residuals.is_finite() {
                return Err(CadizError::InvalidData(format!(
                    "solver diverged to non-finite residuals at iteration {iter}"
                )));
            }

            if residuals.converged(settings.eps_abs, settings.eps_rel) {
                debug!(
                    iterations = iter,
                    primal = residuals.primal,
                    dual = residuals.dual,
                    "Quadratic program solved"
                );
                return Ok(QpSolution {
                    objective: problem.objective(&x),
                    y: &y / scale,
                    x,
                    iterations: iter,
                    primal_residual: residuals.primal,
                    dual_residual: residuals.dual,
                });
            }

            if is_primal_infeasible(a, l, u, &(&y - &y_prev), settings.eps_primal_infeasible) {
                debug!(iterations = iter, "Primal infeasibility certificate found");
                return Err(CadizError::PrimalInfeasible);
            }
            if is_dual_infeasible(&p, &q, a, l, u, &(&x - &x_prev), settings.eps_dual_infeasible) {
                debug!(iterations = iter, "Dual infeasibility certificate found");
                return Err(CadizError::DualInfeasible);
            }

            if settings.adaptive_rho_interval > 0 && iter % settings.adaptive_rho_interval == 0 {
                let proposed = residuals.balanced_rho(rho).clamp(RHO_MIN, RHO_MAX);
                if proposed > rho * RHO_ADAPT_TOLERANCE || proposed < rho / RHO_ADAPT_TOLERANCE {
                    trace!(iter, from = rho, to = proposed, "Updating step size");
                    rho = proposed;
                    rho_vec = rho_vector(rho, l, u);
                    kkt = Kkt::factor(&p, a, &rho_vec, kkt.sigma)?;
                }
            }
        }

        Err(CadizError::MaxIterations(settings.max_iter))
    }
}

/// Cost scaling `1 / max(|P|, |q|)`, clipped, so the objective is of unit size.
fn cost_scale(p: &Array2<f64>, q: &Array1<f64>) -> f64 {
    let largest = p.iter().chain(q.iter()).fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if largest > 0.0 {
        (1.0 / largest).clamp(COST_SCALE_MIN, COST_SCALE_MAX)
    } else {
        1.0
    }
}

/// Per-row step sizes: stiffer on equalities, minimal on free rows.
fn rho_vector(rho: f64, l: &Array1<f64>, u: &Array1<f64>) -> Array1<f64> {
    l.iter()
        .zip(u.iter())
        .map(|(&lo, &hi)| {
            if lo == f64::NEG_INFINITY && hi == f64::INFINITY {
                RHO_MIN
            } else if lo == hi {
                (rho * RHO_EQUALITY_SCALE).min(RHO_MAX)
            } else {
                rho
            }
        })
        .collect()
}

/// Cholesky factor of the ADMM system `P + σI + Aᵀ diag(ρ) A`.
///
/// `sigma` is the proximal weight actually factored, which the iteration
/// must also use on the right-hand side.
struct Kkt {
    factor: Cholesky<f64, Dyn>,
    sigma: f64,
}

impl Kkt {
    /// Factor the system, raising `sigma` a few decades if the matrix is not
    /// numerically positive definite.
    fn factor(p: &Array2<f64>, a: &Array2<f64>, rho_vec: &Array1<f64>, sigma: f64) -> Result<Self> {
        let weighted = a * &rho_vec.view().insert_axis(Axis(1));
        let base = p + &a.t().dot(&weighted);
        let n = base.nrows();

        let mut sigma = sigma;
        for attempt in 0..=SIGMA_BUMPS {
            let matrix = DMatrix::from_fn(n, n, |i, j| {
                base[[i, j]] + if i == j { sigma } else { 0.0 }
            });
            if let Some(factor) = matrix.cholesky() {
                if attempt > 0 {
                    warn!(sigma, "Solver regularization raised to factor the linear system");
                }
                return Ok(Self { factor, sigma });
            }
            sigma *= SIGMA_BUMP_FACTOR;
        }
        Err(CadizError::InvalidData(
            "quadratic term is not positive semidefinite".into(),
        ))
    }

    fn solve(&self, rhs: &Array1<f64>) -> Array1<f64> {
        let b = DVector::from_iterator(rhs.len(), rhs.iter().copied());
        self.factor.solve(&b).iter().copied().collect()
    }
}

fn project(v: &Array1<f64>, l: &Array1<f64>, u: &Array1<f64>) -> Array1<f64> {
    v.iter()
        .zip(l.iter().zip(u.iter()))
        .map(|(&x, (&lo, &hi))| x.max(lo).min(hi))
        .collect()
}

fn inf_norm(v: &Array1<f64>) -> f64 {
    v.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()))
}

#[derive(Debug, Clone, Copy)]
struct Residuals {
    primal: f64,
    primal_scale: f64,
    dual: f64,
    dual_scale: f64,
}

impl Residuals {
    fn compute(
        p: &Array2<f64>,
        q: &Array1<f64>,
        a: &Array2<f64>,
        x: &Array1<f64>,
        z: &Array1<f64>,
        y: &Array1<f64>,
    ) -> Self {
        let ax = a.dot(x);
        let px = p.dot(x);
        let aty = a.t().dot(y);
        Self {
            primal: inf_norm(&(&ax - z)),
            primal_scale: inf_norm(&ax).max(inf_norm(z)),
            dual: inf_norm(&(&px + q + &aty)),
            dual_scale: inf_norm(&px).max(inf_norm(&aty)).max(inf_norm(q)),
        }
    }

    fn is_finite(&self) -> bool {
        self.primal.is_finite() && self.dual.is_finite()
    }

    fn converged(&self, eps_abs: f64, eps_rel: f64) -> bool {
        self.primal <= eps_abs + eps_rel * self.primal_scale
            && self.dual <= eps_abs + eps_rel * self.dual_scale
    }

    fn balanced_rho(&self, rho: f64) -> f64 {
        let primal = self.primal / (self.primal_scale + DIVISION_GUARD);
        let dual = self.dual / (self.dual_scale + DIVISION_GUARD);
        rho * (primal / (dual + DIVISION_GUARD)).sqrt()
    }
}

/// Whether `δy` certifies that `l ≤ Ax ≤ u` is empty.
///
/// `δy` is first projected onto the polar of the recession cone of `[l, u]`
/// so infinite bounds never enter the support function.
fn is_primal_infeasible(
    a: &Array2<f64>,
    l: &Array1<f64>,
    u: &Array1<f64>,
    delta_y: &Array1<f64>,
    eps: f64,
) -> bool {
    let mut dy = delta_y.clone();
    for ((d, &lo), &hi) in dy.iter_mut().zip(l.iter()).zip(u.iter()) {
        match (lo.is_infinite(), hi.is_infinite()) {
            (true, true) => *d = 0.0,
            (false, true) => *d = d.min(0.0),
            (true, false) => *d = d.max(0.0),
            (false, false) => {}
        }
    }

    let norm = inf_norm(&dy);
    if norm <= eps {
        return false;
    }

    let support: f64 = dy
        .iter()
        .zip(l.iter().zip(u.iter()))
        .map(|(&d, (&lo, &hi))| {
            if d > 0.0 {
                hi * d
            } else if d < 0.0 {
                lo * d
            } else {
                0.0
            }
        })
        .sum();

    support < -eps * norm && inf_norm(&a.t().dot(&dy)) < eps * norm
}

/// Whether `δx` certifies that the objective is unbounded below.
fn is_dual_infeasible(
    p: &Array2<f64>,
    q: &Array1<f64>,
    a: &Array2<f64>,
    l: &Array1<f64>,
    u: &Array1<f64>,
    delta_x: &Array1<f64>,
    eps: f64,
) -> bool {
    let norm = inf_norm(delta_x);
    if norm <= eps || q.dot(delta_x) >= -eps * norm {
        return false;
    }
    if inf_norm(&p.dot(delta_x)) >= eps * norm {
        return false;
    }
    let tolerance = eps * norm;
    a.dot(delta_x)
        .iter()
        .zip(l.iter().zip(u.iter()))
        .all(|(&v, (&lo, &hi))| {
            (hi == f64::INFINITY || v <= tolerance) && (lo == f64::NEG_INFINITY || v >= -tolerance)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn no_rows(n: usize) -> (Array2<f64>, Array1<f64>, Array1<f64>) {
        (Array2::zeros((0, n)), Array1::zeros(0), Array1::zeros(0))
    }

    #[test]
    fn test_unconstrained_minimum() {
        // minimize x² + 2y² - 2x - 8y  →  x = 1, y = 2
        let (a, l, u) = no_rows(2);
        let qp = QuadraticProgram::new(array![[2.0, 0.0], [0.0, 4.0]], array![-2.0, -8.0], a, l, u)
            .unwrap();
        let sol = QpSolver::default().solve(&qp).unwrap();
        assert_relative_eq!(sol.x[0], 1.0, epsilon = 1e-5);
        assert_relative_eq!(sol.x[1], 2.0, epsilon = 1e-5);
        assert_relative_eq!(sol.objective, -9.0, epsilon = 1e-5);
    }

    #[test]
    fn test_box_and_equality() {
        // minimize ½‖x‖² - x₀  s.t.  x₀ + x₁ = 1, 0 ≤ x ≤ 0.7
        let a = array![[1.0, 1.0], [1.0, 0.0], [0.0, 1.0]];
        let l = array![1.0, 0.0, 0.0];
        let u = array![1.0, 0.7, 0.7];
        let qp = QuadraticProgram::new(Array2::eye(2), array![-1.0, 0.0], a, l, u).unwrap();
        let sol = QpSolver::default().solve(&qp).unwrap();
        assert_relative_eq!(sol.x[0], 0.7, epsilon = 1e-5);
        assert_relative_eq!(sol.x[1], 0.3, epsilon = 1e-5);
    }

    #[test]
    fn test_primal_infeasible() {
        let a = array![[1.0, 1.0], [1.0, 1.0]];
        let qp = QuadraticProgram::new(
            Array2::eye(2),
            Array1::zeros(2),
            a,
            array![1.0, 0.0],
            array![1.0, 0.0],
        )
        .unwrap();
        assert!(matches!(
            QpSolver::default().solve(&qp),
            Err(CadizError::PrimalInfeasible)
        ));
    }

    #[test]
    fn test_dual_infeasible() {
        let (a, l, u) = no_rows(2);
        let qp = QuadraticProgram::new(Array2::zeros((2, 2)), array![-1.0, 0.5], a, l, u).unwrap();
        assert!(matches!(
            QpSolver::default().solve(&qp),
            Err(CadizError::DualInfeasible)
        ));
    }

    #[test]
    fn test_iteration_cap() {
        let a = array![[1.0, 1.0]];
        let qp = QuadraticProgram::new(
            array![[1.0, 0.9], [0.9, 1.0]],
            array![1.0, -3.0],
            a,
            array![1.0],
            array![1.0],
        )
        .unwrap();
        let solver = QpSolver::new(SolverSettings {
            max_iter: 3,
            check_interval: 1,
            ..Default::default()
        });
        assert!(matches!(solver.solve(&qp), Err(CadizError::MaxIterations(3))));
    }

    #[test]
    fn test_time_limit() {
        let (a, l, u) = no_rows(1);
        let qp = QuadraticProgram::new(array![[1.0]], array![1.0], a, l, u).unwrap();
        let solver = QpSolver::new(SolverSettings {
            time_limit: Some(Duration::ZERO),
            ..Default::default()
        });
        assert!(matches!(solver.solve(&qp), Err(CadizError::TimeLimit(_))));
    }

    #[test]
    fn test_settings_validation() {
        let settings = SolverSettings {
            relaxation: 2.5,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
        assert!(SolverSettings::default().validate().is_ok());
    }

    #[test]
    fn test_indefinite_quadratic_term_rejected() {
        let (a, l, u) = no_rows(2);
        let qp = QuadraticProgram::new(array![[1.0, 2.0], [2.0, 1.0]], array![0.0, 0.0], a, l, u)
            .unwrap();
        assert!(matches!(
            QpSolver::default().solve(&qp),
            Err(CadizError::InvalidData(_))
        ));
    }

    #[test]
    fn test_kkt_solves_regularized_system() {
        let p = array![[4.0, 2.0, 0.4], [2.0, 5.0, 1.0], [0.4, 1.0, 3.0]];
        let a = array![[1.0, 1.0, 1.0]];
        let rho = array![0.5];
        let kkt = Kkt::factor(&p, &a, &rho, 1e-6).unwrap();
        assert_relative_eq!(kkt.sigma, 1e-6);

        let b = array![1.0, -2.0, 0.5];
        let x = kkt.solve(&b);
        let mut system = &p + &(a.t().dot(&a) * 0.5);
        system.diag_mut().mapv_inplace(|v| v + 1e-6);
        let back = system.dot(&x);
        for i in 0..3 {
            assert_relative_eq!(back[i], b[i], epsilon = 1e-10);
        }
    }

    #[test]
    fn test_kkt_raises_sigma_for_singular_system() {
        // smallest eigenvalue about -5e-10, below the initial sigma of 1e-12
        let p = array![[1.0, 1.0], [1.0, 1.0 - 1e-9]];
        let (a, _, _) = no_rows(2);
        let kkt = Kkt::factor(&p, &a, &Array1::zeros(0), 1e-12).unwrap();
        assert!(kkt.sigma > 1e-12 && kkt.sigma <= 1e-8);
    }

    #[test]
    fn test_shape_checked() {
        let err = QuadraticProgram::new(
            Array2::eye(2),
            Array1::zeros(3),
            Array2::zeros((0, 3)),
            Array1::zeros(0),
            Array1::zeros(0),
        )
        .unwrap_err();
        assert!(matches!(err, CadizError::ShapeMismatch(_)));
    }
}
