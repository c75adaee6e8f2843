//! Pearson correlation between pivot columns.

use ndarray::{Array2, ArrayView1, ArrayView2};

use crate::error::{StatsError, StatsResult};
use crate::thresholds::{MIN_CORRELATION_PERIODS, VARIANCE_EPSILON};

/// Pearson correlation coefficient of two equally long series.
///
/// Returns `None` when either series has (numerically) zero variance or
/// fewer than two observations: the coefficient is undefined there, and
/// reporting 0.0 would read as "uncorrelated".
pub fn pearson(x: ArrayView1<'_, f64>, y: ArrayView1<'_, f64>) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let n = x.len() as f64;
    let mean_x = x.sum() / n;
    let mean_y = y.sum() / n;

    let mut sum_xy = 0.0;
    let mut sum_xx = 0.0;
    let mut sum_yy = 0.0;
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        sum_xy += dx * dy;
        sum_xx += dx * dx;
        sum_yy += dy * dy;
    }

    if sum_xx < VARIANCE_EPSILON || sum_yy < VARIANCE_EPSILON {
        return None;
    }
    // Rounding can push |r| a hair past 1.
    Some((sum_xy / (sum_xx * sum_yy).sqrt()).clamp(-1.0, 1.0))
}

/// Convenience wrapper over plain slices.
pub fn pearson_slices(x: &[f64], y: &[f64]) -> Option<f64> {
    pearson(ArrayView1::from(x), ArrayView1::from(y))
}

/// Pairwise correlation between the columns of `pivot` (rows = periods).
///
/// Entry `(i, j)` is `None` when column `i` or `j` is degenerate. Every
/// non-degenerate column has exactly `1.0` on the diagonal.
pub fn correlation_matrix(pivot: ArrayView2<'_, f64>) -> StatsResult<Array2<Option<f64>>> {
    let (n_obs, n_vars) = pivot.dim();
    if n_obs < MIN_CORRELATION_PERIODS {
        return Err(StatsError::InsufficientData {
            required: MIN_CORRELATION_PERIODS,
            available: n_obs,
        });
    }

    let mut out = Array2::from_elem((n_vars, n_vars), None);
    for i in 0..n_vars {
        for j in i..n_vars {
            let r = pearson(pivot.column(i), pivot.column(j));
            let r = if i == j { r.map(|_| 1.0) } else { r };
            out[[i, j]] = r;
            out[[j, i]] = r;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn perfect_positive_and_negative() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let up = [2.0, 4.0, 6.0, 8.0, 10.0];
        let down = [10.0, 8.0, 6.0, 4.0, 2.0];
        assert!((pearson_slices(&x, &up).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson_slices(&x, &down).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn constant_series_is_undefined() {
        assert!(pearson_slices(&[1.0, 2.0, 3.0], &[5.0, 5.0, 5.0]).is_none());
    }

    #[test]
    fn matrix_is_symmetric_with_unit_diagonal() {
        let pivot = array![[1.0, 3.0, 7.0], [2.0, 1.0, 7.0], [3.0, 4.0, 7.0], [4.0, 2.0, 7.0]];
        let m = correlation_matrix(pivot.view()).unwrap();
        assert_eq!(m.dim(), (3, 3));
        assert_eq!(m[[0, 0]], Some(1.0));
        assert_eq!(m[[1, 1]], Some(1.0));
        // Third column is constant.
        assert_eq!(m[[2, 2]], None);
        assert_eq!(m[[0, 2]], None);
        assert_eq!(m[[0, 1]], m[[1, 0]]);
    }

    #[test]
    fn single_period_is_insufficient() {
        let pivot = array![[1.0, 2.0]];
        assert_eq!(
            correlation_matrix(pivot.view()),
            Err(StatsError::InsufficientData {
                required: 2,
                available: 1
            })
        );
    }
}
