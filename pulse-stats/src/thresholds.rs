//! Centralized thresholds for the statistical aggregates.
//!
//! Changing a value here affects both the pipeline's default behaviour and
//! the bridge's parameter validation.

/// Minimum number of periods before a trend + seasonal forecast is fitted.
pub const MIN_FORECAST_PERIODS: usize = 4;

/// Minimum number of periods before a correlation matrix is defined.
pub const MIN_CORRELATION_PERIODS: usize = 2;

/// Width of the forecast band in trend-residual standard deviations.
pub const CONFIDENCE_BAND_MULTIPLIER: f64 = 1.5;

/// Variance below this is treated as zero (degenerate column).
pub const VARIANCE_EPSILON: f64 = 1e-12;

/// Calendar months per seasonal cycle.
pub const MONTHS_PER_YEAR: usize = 12;

/// Calendar quarters per seasonal cycle.
pub const QUARTERS_PER_YEAR: usize = 4;

/// Default forecast horizon in periods.
pub const DEFAULT_FORECAST_HORIZON: usize = 6;

/// Longest forecast horizon the bridge accepts.
pub const MAX_FORECAST_HORIZON: usize = 36;

/// Default number of entries in "top N" charts.
pub const DEFAULT_TOP_N: usize = 5;

/// Largest "top N" the bridge accepts.
pub const MAX_TOP_N: usize = 50;

/// Default page size when browsing the filtered rows.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Largest page of filtered rows the bridge returns at once.
pub const MAX_PAGE_SIZE: usize = 500;
