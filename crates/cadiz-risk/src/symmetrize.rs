//! Upper-triangle to full symmetric matrix.

use ndarray::Array2;

/// Fill a factor covariance matrix stored as one triangle into a full
/// symmetric matrix.
///
/// `out[i][j]` is `m[i][j]` when that cell is finite, otherwise `m[j][i]`,
/// otherwise `0.0`. Missing cells are NaN, whether the upstream table carried
/// an explicit NaN marker or never had the pair at all.
///
/// The function is total: any square input yields a matrix with
/// `out[i][j] == out[j][i]` as long as no pair is given inconsistent finite
/// values in both triangles, in which case each triangle keeps its own.
/// A non-square input is read over its leading square block.
pub fn symmetrize(m: &Array2<f64>) -> Array2<f64> {
    let n = m.nrows().min(m.ncols());
    Array2::from_shape_fn((n, n), |(i, j)| {
        let direct = m[[i, j]];
        if direct.is_finite() {
            return direct;
        }
        let mirrored = m[[j, i]];
        if mirrored.is_finite() { mirrored } else { 0.0 }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    const NAN: f64 = f64::NAN;

    #[test]
    fn test_fills_lower_triangle_from_nan_markers() {
        let upper = array![[1.0, 0.2, 0.3], [NAN, 2.0, 0.4], [NAN, NAN, 3.0]];
        let full = symmetrize(&upper);
        assert_eq!(
            full,
            array![[1.0, 0.2, 0.3], [0.2, 2.0, 0.4], [0.3, 0.4, 3.0]]
        );
    }

    #[test]
    fn test_absent_pair_becomes_zero() {
        // factor pair (0, 2) missing from both triangles
        let upper = array![[1.0, 0.2, NAN], [NAN, 2.0, 0.4], [NAN, NAN, 3.0]];
        let full = symmetrize(&upper);
        assert_eq!(full[[0, 2]], 0.0);
        assert_eq!(full[[2, 0]], 0.0);
        assert_eq!(full[[1, 0]], 0.2);
    }

    #[test]
    fn test_lower_triangle_input_is_mirrored() {
        let lower = array![[1.0, NAN], [0.5, 2.0]];
        assert_eq!(symmetrize(&lower), array![[1.0, 0.5], [0.5, 2.0]]);
    }

    #[test]
    fn test_missing_variance_becomes_zero() {
        let m = array![[NAN, 0.1], [NAN, f64::INFINITY]];
        assert_eq!(symmetrize(&m), array![[0.0, 0.1], [0.1, 0.0]]);
    }

    #[test]
    fn test_already_symmetric_is_unchanged() {
        let m = array![[4.0, -1.0], [-1.0, 9.0]];
        assert_eq!(symmetrize(&m), m);
    }
}
