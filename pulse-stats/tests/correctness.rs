//! Correctness tests for pulse-stats.
//!
//! Validates that:
//! 1. OLS residuals sum to zero and recover an exact line
//! 2. Correlation matrices are symmetric with a unit diagonal
//! 3. Seasonal forecasts reproduce a repeating pattern
//! 4. Fingerprints are deterministic and order-sensitive

use ndarray::{array, Array2};
use pulse_stats::descriptive::population_std_dev;
use pulse_stats::{correlation_matrix, fit_trend, seasonal_forecast, Fingerprint, StatsError};

const EPS: f64 = 1e-9;

/// Three years of a monthly pattern on top of a rising line.
fn seasonal_history() -> Vec<f64> {
    let pattern = [5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 10.0, 40.0];
    (0..36).map(|i| 100.0 + 2.0 * i as f64 + pattern[i % 12]).collect()
}

// ---------------------------------------------------------------------------
// Regression
// ---------------------------------------------------------------------------

#[test]
fn residuals_of_least_squares_sum_to_zero() {
    let ys = seasonal_history();
    let fit = fit_trend(&ys).unwrap();
    let residual_sum: f64 = fit.residuals(&ys).iter().sum();
    assert!(residual_sum.abs() < 1e-6);
}

#[test]
fn exact_line_is_recovered() {
    let ys: Vec<f64> = (0..10).map(|i| 3.0 * i as f64 - 4.0).collect();
    let fit = fit_trend(&ys).unwrap();
    assert!((fit.slope - 3.0).abs() < EPS);
    assert!((fit.intercept + 4.0).abs() < EPS);
}

// ---------------------------------------------------------------------------
// Correlation
// ---------------------------------------------------------------------------

#[test]
fn matrix_is_symmetric_with_unit_diagonal() {
    let pivot: Array2<f64> = array![
        [1.0, 10.0, 3.0],
        [2.0, 8.0, 1.0],
        [3.0, 9.0, 4.0],
        [4.0, 5.0, 1.0],
        [5.0, 7.0, 5.0],
    ];
    let m = correlation_matrix(pivot.view()).unwrap();
    for i in 0..3 {
        assert_eq!(m[[i, i]], Some(1.0));
        for j in 0..3 {
            assert_eq!(m[[i, j]], m[[j, i]]);
            let r = m[[i, j]].unwrap();
            assert!((-1.0..=1.0).contains(&r));
        }
    }
}

#[test]
fn one_period_is_not_enough() {
    let pivot: Array2<f64> = array![[1.0, 2.0]];
    assert_eq!(
        correlation_matrix(pivot.view()),
        Err(StatsError::InsufficientData {
            required: 2,
            available: 1
        })
    );
}

// ---------------------------------------------------------------------------
// Forecast
// ---------------------------------------------------------------------------

#[test]
fn repeating_pattern_is_projected_forward() {
    let history = seasonal_history();
    let fc = seasonal_forecast(&history, 0, 12, 12, 1.5).unwrap();

    // December keeps its spike over November, November over October.
    assert!(fc.projection[11] > fc.projection[10]);
    assert!(fc.projection[10] > fc.projection[9]);
    // Trend keeps rising year over year.
    assert!(fc.projection[0] > history[24]);
    assert!((fc.trend.slope - 2.0).abs() < 0.5);
}

#[test]
fn band_width_matches_residual_spread() {
    let history = seasonal_history();
    let fc = seasonal_forecast(&history, 0, 12, 3, 1.5).unwrap();
    let fit = fit_trend(&history).unwrap();
    let expected = population_std_dev(&fit.residuals(&history)).unwrap();
    assert!((fc.residual_std - expected).abs() < EPS);
    for i in 0..3 {
        assert!((fc.upper[i] - fc.projection[i] - 1.5 * expected).abs() < 1e-6);
    }
}

#[test]
fn zero_season_length_is_rejected() {
    assert_eq!(
        seasonal_forecast(&[1.0; 6], 0, 0, 1, 1.5),
        Err(StatsError::InvalidSeasonLength)
    );
}

// ---------------------------------------------------------------------------
// Fingerprint
// ---------------------------------------------------------------------------

#[test]
fn fingerprint_is_deterministic_and_order_sensitive() {
    let digest = |ids: &[u64]| {
        let mut fp = Fingerprint::new();
        for id in ids {
            fp.write_u64(*id);
        }
        fp.finish()
    };
    assert_eq!(digest(&[1, 2, 3]), digest(&[1, 2, 3]));
    assert_ne!(digest(&[1, 2, 3]), digest(&[3, 2, 1]));
}
