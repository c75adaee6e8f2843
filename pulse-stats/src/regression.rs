//! Ordinary least squares trend fits.

use crate::error::{StatsError, StatsResult};
use crate::thresholds::VARIANCE_EPSILON;

/// A fitted line `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    /// Observed minus fitted value for each point of `ys` against `0..n`.
    pub fn residuals(&self, ys: &[f64]) -> Vec<f64> {
        ys.iter()
            .enumerate()
            .map(|(i, y)| y - self.predict(i as f64))
            .collect()
    }
}

/// Fit `ys` against the integer index `0, 1, .., n - 1`.
pub fn fit_trend(ys: &[f64]) -> StatsResult<LinearFit> {
    let xs: Vec<f64> = (0..ys.len()).map(|i| i as f64).collect();
    fit_linear(&xs, ys)
}

/// Degree-one least squares fit of `ys` against `xs`.
///
/// Needs at least two points. When all `xs` are equal the slope is
/// undefined and the fit collapses to a horizontal line through the mean.
pub fn fit_linear(xs: &[f64], ys: &[f64]) -> StatsResult<LinearFit> {
    if xs.len() != ys.len() {
        return Err(StatsError::LengthMismatch {
            left: xs.len(),
            right: ys.len(),
        });
    }
    if xs.len() < 2 {
        return Err(StatsError::InsufficientData {
            required: 2,
            available: xs.len(),
        });
    }

    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        sxx += dx * dx;
        sxy += dx * (y - mean_y);
    }

    let slope = if sxx < VARIANCE_EPSILON { 0.0 } else { sxy / sxx };
    Ok(LinearFit {
        slope,
        intercept: mean_y - slope * mean_x,
    })
}
