//! End-to-end optimizer behaviour: constraint satisfaction, risk aversion
//! limit, and distinguishable failure outcomes.

use approx::assert_relative_eq;
use cadiz_optimize::{Constraint, MeanVarianceOptimizer};
use cadiz_traits::{
    Alpha, CadizError, CovarianceMatrix, Date, InMemoryDataSource, LinearConstraint, Universe,
};
use ndarray::{Array1, array};
use polars::prelude::*;
use rstest::rstest;

fn date() -> Date {
    Date::from_ymd_opt(2024, 6, 3).unwrap()
}

fn universe() -> Universe {
    Universe::new(["A", "B", "C", "D"]).unwrap()
}

/// One-factor model: market exposures around one, specific risk 10–25%.
fn source() -> InMemoryDataSource {
    let d = date();
    let assets = df! {
        "date" => &[d, d, d, d],
        "asset" => &["A", "B", "C", "D"],
        "return" => &[0.0, 0.0, 0.0, 0.0],
        "predicted_beta" => &[0.8, 1.0, 1.2, 0.6],
        "specific_risk" => &[10.0, 15.0, 20.0, 25.0],
    }
    .unwrap();
    let exposures = df! {
        "date" => &[d, d, d, d],
        "asset" => &["A", "B", "C", "D"],
        "factor" => &["market", "market", "market", "market"],
        "exposure" => &[0.8, 1.0, 1.2, 0.6],
    }
    .unwrap();
    let covariances = df! {
        "date" => &[d],
        "factor_1" => &["market"],
        "factor_2" => &["market"],
        "covariance" => &[225.0],
    }
    .unwrap();
    InMemoryDataSource::new()
        .with_assets(assets)
        .unwrap()
        .with_exposures(exposures)
        .unwrap()
        .with_covariances(covariances)
        .unwrap()
}

fn alpha(values: [f64; 4]) -> Alpha {
    Alpha::new(date(), universe(), Array1::from_vec(values.to_vec())).unwrap()
}

#[rstest]
#[case([2.0, -1.0, 0.5, -3.0], 1.0)]
#[case([-5.0, -5.0, 5.0, 0.0], 0.01)]
#[case([0.0, 0.0, 0.0, 0.0], 10.0)]
fn full_investment_long_only_is_a_simplex_point(#[case] values: [f64; 4], #[case] gamma: f64) {
    let portfolio = MeanVarianceOptimizer::default()
        .optimize(
            &source(),
            &alpha(values),
            &[Constraint::FullInvestment, Constraint::LongOnly],
            gamma,
        )
        .unwrap();

    assert_eq!(portfolio.universe(), &universe());
    assert_relative_eq!(portfolio.net_exposure(), 1.0, epsilon = 1e-5);
    assert!(portfolio.weights().iter().all(|w| *w >= -1e-5));
}

#[test]
fn long_only_concentrates_on_best_alpha_when_risk_is_cheap() {
    let portfolio = MeanVarianceOptimizer::default()
        .optimize(
            &source(),
            &alpha([-5.0, -5.0, 5.0, 0.0]),
            &[
                Constraint::FullInvestment,
                Constraint::LongOnly,
                Constraint::NoBuyingOnMargin,
            ],
            1e-4,
        )
        .unwrap();
    assert_relative_eq!(portfolio.weight("C").unwrap(), 1.0, epsilon = 1e-4);
}

#[test]
fn covariance_is_returned_with_the_portfolio() {
    let optimizer = MeanVarianceOptimizer::default();
    let constraints = [Constraint::FullInvestment, Constraint::LongOnly];
    let (portfolio, covariance) = optimizer
        .optimize_with_covariance(&source(), &alpha([2.0, -1.0, 0.5, -3.0]), &constraints, 1.0)
        .unwrap();

    assert_eq!(covariance.universe(), portfolio.universe());
    assert_eq!(covariance.date(), date());
    // market variance 225 · 0.8² plus specific variance 10²
    assert_relative_eq!(covariance.get("A", "A").unwrap(), 225.0 * 0.64 + 100.0, epsilon = 1e-9);
    assert!(portfolio.risk(&covariance).unwrap() > 0.0);

    let alone = optimizer
        .optimize(&source(), &alpha([2.0, -1.0, 0.5, -3.0]), &constraints, 1.0)
        .unwrap();
    for (a, b) in alone.weights().iter().zip(portfolio.weights()) {
        assert_relative_eq!(*a, *b, epsilon = 1e-12);
    }
}

#[test]
fn unit_beta_is_satisfied() {
    let portfolio = MeanVarianceOptimizer::default()
        .optimize(
            &source(),
            &alpha([1.0, 0.0, -1.0, 0.5]),
            &[Constraint::UnitBeta],
            2.0,
        )
        .unwrap();
    let betas = array![0.8, 1.0, 1.2, 0.6];
    assert_relative_eq!(portfolio.weights().dot(&betas), 1.0, epsilon = 1e-5);
}

#[test]
fn zero_beta_is_satisfied() {
    let portfolio = MeanVarianceOptimizer::default()
        .optimize(
            &source(),
            &alpha([1.0, 0.0, -1.0, 0.5]),
            &[Constraint::ZeroBeta],
            2.0,
        )
        .unwrap();
    let betas = array![0.8, 1.0, 1.2, 0.6];
    assert_relative_eq!(portfolio.weights().dot(&betas), 0.0, epsilon = 1e-5);
    assert!(portfolio.gross_leverage() > 0.0);
}

#[test]
fn large_gamma_converges_to_minimum_variance() {
    // Σ = diag(1, 4): minimum variance with Σw = 1 is (0.8, 0.2)
    let pair = Universe::new(["A", "B"]).unwrap();
    let sigma = CovarianceMatrix::new(date(), pair.clone(), array![[1.0, 0.0], [0.0, 4.0]]).unwrap();
    let budget = LinearConstraint::equality("full_investment", Array1::ones(2), 1.0).unwrap();
    let optimizer = MeanVarianceOptimizer::default();

    let mut previous: Option<Array1<f64>> = None;
    for values in [array![10.0, -10.0], array![-3.0, 7.0], array![0.0, 0.0]] {
        let alpha = Alpha::new(date(), pair.clone(), values).unwrap();
        let w = optimizer
            .solve(&sigma, &alpha, std::slice::from_ref(&budget), 1e8)
            .unwrap()
            .weights()
            .clone();
        assert_relative_eq!(w[0], 0.8, epsilon = 1e-5);
        assert_relative_eq!(w[1], 0.2, epsilon = 1e-5);
        if let Some(p) = &previous {
            assert_relative_eq!((&w - p).mapv(f64::abs).sum(), 0.0, epsilon = 1e-5);
        }
        previous = Some(w);
    }
}

#[test]
fn conflicting_beta_targets_are_primal_infeasible() {
    let err = MeanVarianceOptimizer::default()
        .optimize(
            &source(),
            &alpha([0.0, 0.0, 0.0, 0.0]),
            &[Constraint::UnitBeta, Constraint::ZeroBeta],
            1.0,
        )
        .unwrap_err();
    assert!(matches!(err, CadizError::PrimalInfeasible));
    assert!(err.is_solver_failure());
}

#[test]
fn riskless_unconstrained_alpha_is_dual_infeasible() {
    let pair = Universe::new(["A", "B"]).unwrap();
    let sigma = CovarianceMatrix::new(date(), pair.clone(), ndarray::Array2::zeros((2, 2))).unwrap();
    let alpha = Alpha::new(date(), pair, array![1.0, 0.5]).unwrap();
    let err = MeanVarianceOptimizer::default()
        .solve(&sigma, &alpha, &[], 1.0)
        .unwrap_err();
    assert!(matches!(err, CadizError::DualInfeasible));
}

#[test]
fn missing_beta_is_reported_before_solving() {
    let wide = Universe::new(["A", "B", "E"]).unwrap();
    let alpha = Alpha::new(date(), wide, Array1::zeros(3)).unwrap();
    let err = MeanVarianceOptimizer::default()
        .optimize(&source(), &alpha, &[Constraint::ZeroBeta], 1.0)
        .unwrap_err();
    assert!(matches!(err, CadizError::Misaligned { .. }));
}
