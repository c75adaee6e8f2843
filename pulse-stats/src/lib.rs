//! Numeric kernels behind the dashboard aggregates.
//!
//! Everything here works on plain `f64` slices or `ndarray` views and knows
//! nothing about orders, regions or calendars beyond a seasonal phase index.

pub mod correlation;
pub mod descriptive;
pub mod error;
pub mod forecast;
pub mod math;
pub mod regression;
pub mod thresholds;

pub use correlation::{correlation_matrix, pearson};
pub use error::{StatsError, StatsResult};
pub use forecast::{seasonal_forecast, SeasonalForecast};
pub use math::{fnv1a_hash, Fingerprint};
pub use regression::{fit_trend, LinearFit};
