//! Short-horizon sales projection over a time series.

use pulse_stats::thresholds::{CONFIDENCE_BAND_MULTIPLIER, MIN_FORECAST_PERIODS};
use pulse_stats::{seasonal_forecast, StatsError};
use serde::Serialize;

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::types::{Period, PeriodKey, TimeSeries};

/// One projected period with its confidence band.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub period: PeriodKey,
    pub projection: f64,
    pub lower: f64,
    pub upper: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Forecast {
    pub period: Period,
    pub points: Vec<ForecastPoint>,
    /// Change in sales per period from the OLS trend.
    pub trend_slope: f64,
    pub residual_std: f64,
    /// Length of the completed history the model was fitted on.
    pub history_len: usize,
}

impl Forecast {
    pub fn projection(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.projection).collect()
    }

    pub fn lower(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.lower).collect()
    }

    pub fn upper(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.upper).collect()
    }
}

/// Forecast `horizon` periods with the default ±1.5σ band.
pub fn forecast(series: &TimeSeries, horizon: usize) -> AnalyticsResult<Forecast> {
    forecast_with_band(series, horizon, CONFIDENCE_BAND_MULTIPLIER)
}

/// Trend + seasonal-effect projection.
///
/// The series is completed to a contiguous period index first, so a
/// missing month counts as zero sales rather than being skipped.
pub fn forecast_with_band(series: &TimeSeries, horizon: usize, band_multiplier: f64) -> AnalyticsResult<Forecast> {
    if series.is_empty() {
        return Err(AnalyticsError::EmptyResult);
    }

    let history = series.completed();
    let first = history.points[0].period;
    let last = history.points[history.len() - 1].period;

    let values = history.values();
    let fit = seasonal_forecast(
        &values,
        first.phase(),
        series.period.season_length(),
        horizon,
        band_multiplier,
    )
    .map_err(|e| match e {
        StatsError::InsufficientData { required, available } => AnalyticsError::InsufficientData {
            operation: "forecast",
            required,
            available,
        },
        _ => AnalyticsError::InsufficientData {
            operation: "forecast",
            required: MIN_FORECAST_PERIODS,
            available: values.len(),
        },
    })?;

    let mut cursor = last;
    let points = (0..horizon)
        .map(|i| {
            cursor = cursor.succ();
            ForecastPoint {
                period: cursor,
                projection: fit.projection[i],
                lower: fit.lower[i],
                upper: fit.upper[i],
            }
        })
        .collect();

    log::debug!(
        "forecast history={} horizon={} slope={:.2} residual_std={:.2}",
        values.len(),
        horizon,
        fit.trend.slope,
        fit.residual_std
    );

    Ok(Forecast {
        period: series.period,
        points,
        trend_slope: fit.trend.slope,
        residual_std: fit.residual_std,
        history_len: values.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Measure, SeriesPoint, YearMonth};

    fn monthly(start: YearMonth, values: &[f64]) -> TimeSeries {
        let mut key = PeriodKey::Month(start);
        let mut points = Vec::new();
        for v in values {
            points.push(SeriesPoint { period: key, value: *v });
            key = key.succ();
        }
        TimeSeries {
            period: Period::Month,
            measure: Measure::Sales,
            points,
        }
    }

    #[test]
    fn constant_series_projects_constant() {
        let series = monthly(YearMonth::new(2017, 1), &[500.0; 6]);
        let fc = forecast(&series, 3).unwrap();
        assert_eq!(fc.points.len(), 3);
        for p in &fc.points {
            assert!((p.projection - 500.0).abs() < 1e-9);
            assert!((p.upper - p.lower).abs() < 1e-9);
        }
    }

    #[test]
    fn projected_periods_continue_after_history() {
        let series = monthly(YearMonth::new(2017, 11), &[1.0, 2.0, 3.0, 4.0]);
        let fc = forecast(&series, 2).unwrap();
        let labels: Vec<String> = fc.points.iter().map(|p| p.period.to_string()).collect();
        assert_eq!(labels, ["2018-03", "2018-04"]);
    }

    #[test]
    fn three_months_is_insufficient() {
        let series = monthly(YearMonth::new(2017, 1), &[1.0, 2.0, 3.0]);
        assert_eq!(
            forecast(&series, 6),
            Err(AnalyticsError::InsufficientData {
                operation: "forecast",
                required: 4,
                available: 3
            })
        );
    }

    #[test]
    fn gaps_count_toward_history() {
        // Jan and Apr observed; completion yields four months.
        let series = TimeSeries {
            period: Period::Month,
            measure: Measure::Sales,
            points: vec![
                SeriesPoint {
                    period: PeriodKey::Month(YearMonth::new(2017, 1)),
                    value: 10.0,
                },
                SeriesPoint {
                    period: PeriodKey::Month(YearMonth::new(2017, 4)),
                    value: 10.0,
                },
            ],
        };
        let fc = forecast(&series, 1).unwrap();
        assert_eq!(fc.history_len, 4);
    }

    #[test]
    fn band_brackets_projection() {
        let series = monthly(YearMonth::new(2016, 1), &[10.0, 40.0, 15.0, 35.0, 20.0, 50.0, 25.0, 45.0]);
        let fc = forecast(&series, 4).unwrap();
        for p in &fc.points {
            assert!(p.lower <= p.projection && p.projection <= p.upper);
            assert!(p.lower >= 0.0);
        }
        assert!(fc.residual_std > 0.0);
    }

    #[test]
    fn empty_series_is_empty_result() {
        let series = monthly(YearMonth::new(2017, 1), &[]);
        assert_eq!(forecast(&series, 3), Err(AnalyticsError::EmptyResult));
    }
}
