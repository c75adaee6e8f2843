//! Linear trend + seasonal residual forecast.
//!
//! The decomposition:
//!   1. fit an OLS line against the period index,
//!   2. average the detrended residuals per seasonal phase (calendar month
//!      or quarter) to get the seasonal effect,
//!   3. project `trend(x) + effect(phase(x))` forward, floored at zero,
//!   4. band = projection ± multiplier * population std of the trend
//!      residuals, lower edge floored at zero.

use crate::descriptive::population_std_dev;
use crate::error::{StatsError, StatsResult};
use crate::regression::{fit_trend, LinearFit};
use crate::thresholds::MIN_FORECAST_PERIODS;

/// Output of [`seasonal_forecast`].
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalForecast {
    pub trend: LinearFit,
    /// Mean trend residual per phase. Phases never observed stay at 0.
    pub seasonal_effects: Vec<f64>,
    pub residual_std: f64,
    pub projection: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

/// Forecast `horizon` periods past the end of `values`.
///
/// `values` must be a contiguous series (no gaps). `first_phase` is the
/// zero-based seasonal phase of `values[0]` (January = 0 for monthly data)
/// and `season_length` the number of phases per cycle.
pub fn seasonal_forecast(
    values: &[f64],
    first_phase: usize,
    season_length: usize,
    horizon: usize,
    band_multiplier: f64,
) -> StatsResult<SeasonalForecast> {
    if season_length == 0 {
        return Err(StatsError::InvalidSeasonLength);
    }
    if values.len() < MIN_FORECAST_PERIODS {
        return Err(StatsError::InsufficientData {
            required: MIN_FORECAST_PERIODS,
            available: values.len(),
        });
    }

    let trend = fit_trend(values)?;
    let residuals = trend.residuals(values);
    let phase_of = |index: usize| (first_phase + index) % season_length;

    let mut sums = vec![0.0; season_length];
    let mut counts = vec![0usize; season_length];
    for (i, r) in residuals.iter().enumerate() {
        let phase = phase_of(i);
        sums[phase] += r;
        counts[phase] += 1;
    }
    let seasonal_effects: Vec<f64> = sums
        .iter()
        .zip(&counts)
        .map(|(s, &c)| if c == 0 { 0.0 } else { s / c as f64 })
        .collect();

    let residual_std = population_std_dev(&residuals).unwrap_or(0.0);
    let margin = band_multiplier * residual_std;

    let n = values.len();
    let mut projection = Vec::with_capacity(horizon);
    let mut lower = Vec::with_capacity(horizon);
    let mut upper = Vec::with_capacity(horizon);
    for step in 0..horizon {
        let index = n + step;
        let raw = trend.predict(index as f64) + seasonal_effects[phase_of(index)];
        let point = raw.max(0.0);
        projection.push(point);
        lower.push((point - margin).max(0.0));
        upper.push(point + margin);
    }

    Ok(SeasonalForecast {
        trend,
        seasonal_effects,
        residual_std,
        projection,
        lower,
        upper,
    })
}
