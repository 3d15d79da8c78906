//! Property tests for covariance assembly.
//!
//! Uses proptest to verify, for random factor models:
//! 1. Symmetry: Σ == Σᵀ
//! 2. Non-negative variances: diag(Σ) >= 0
//! 3. Identity: B = I and s = 0 gives back the symmetrized factor covariance

use cadiz_risk::{assemble, symmetrize};
use ndarray::{Array1, Array2};
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_matrix(rows: usize, cols: usize) -> impl Strategy<Value = Array2<f64>> {
    prop::collection::vec(-2.0..2.0_f64, rows * cols)
        .prop_map(move |v| Array2::from_shape_vec((rows, cols), v).unwrap())
}

/// Factor covariance `L Lᵀ` stored as its upper triangle with NaN below.
fn arb_upper_factor_covariance(k: usize) -> impl Strategy<Value = Array2<f64>> {
    arb_matrix(k, k).prop_map(move |l| {
        let full = l.dot(&l.t());
        Array2::from_shape_fn((k, k), |(i, j)| if i <= j { full[[i, j]] } else { f64::NAN })
    })
}

fn arb_model() -> impl Strategy<Value = (Array2<f64>, Array2<f64>, Array1<f64>)> {
    (1usize..8, 1usize..5).prop_flat_map(|(n, k)| {
        (
            arb_matrix(n, k),
            arb_upper_factor_covariance(k),
            prop::collection::vec(0.0..50.0_f64, n).prop_map(Array1::from_vec),
        )
    })
}

// ── 1 & 2. Symmetry and variances ────────────────────────────────────

proptest! {
    #[test]
    fn sigma_is_symmetric_with_nonnegative_diagonal((b, upper, s) in arb_model()) {
        let sigma = assemble(&b, &symmetrize(&upper), &s).unwrap();
        let n = sigma.nrows();
        for i in 0..n {
            prop_assert!(sigma[[i, i]] >= -1e-9, "negative variance {}", sigma[[i, i]]);
            for j in 0..n {
                prop_assert_eq!(sigma[[i, j]], sigma[[j, i]]);
            }
        }
    }
}

// ── 3. Identity exposures ────────────────────────────────────────────

proptest! {
    #[test]
    fn identity_exposures_return_factor_covariance(upper in (1usize..6).prop_flat_map(arb_upper_factor_covariance)) {
        let k = upper.nrows();
        let f = symmetrize(&upper);
        let sigma = assemble(&Array2::eye(k), &f, &Array1::zeros(k)).unwrap();
        prop_assert_eq!(sigma, f);
    }
}
