//! Filter-and-aggregate pipeline behind the sales dashboard.
//!
//! Records are loaded once into a [`RecordStore`]; every interaction runs
//! [`apply_filters`] to get a [`Subset`] and recomputes the aggregates from
//! it. [`DashboardSession`] holds the selection and the memo cache.

pub mod aggregate;
pub mod cache;
pub mod components;
pub mod config;
pub mod correlation;
pub mod error;
pub mod filter;
pub mod forecast;
pub mod geo;
pub mod insight;
pub mod order_loader;
pub mod pipelines;
pub mod record;
pub mod selector;
pub mod session;
pub mod states;
pub mod subset;
pub mod timeseries;
pub mod types;
pub mod util;

pub use pulse_stats::thresholds;

pub use aggregate::{aggregate_by, aggregate_measure_by, average_order_value, distinct_order_count, kpis, Kpis};
pub use config::DashboardConfig;
pub use correlation::{correlation_matrix, CorrelationMatrix};
pub use error::{AnalyticsError, AnalyticsResult, LoadError};
pub use forecast::{forecast, forecast_with_band, Forecast, ForecastPoint};
pub use geo::{state_map, StateMap, StateSales};
pub use insight::{top_insight, TopInsight};
pub use order_loader::{load_orders, load_orders_file, DateOrder};
pub use pipelines::dashboard::{DashboardPipeline, DashboardReport, DashboardView, Section};
pub use record::{OrderRecord, RecordStore};
pub use session::{Aggregate, AggregateRequest, DashboardSession, RowPage};
pub use subset::{apply_filters, Subset};
pub use timeseries::{complete_monthly, measure_series, time_series};
pub use types::{
    Dimension, FilterSelection, GroupKey, GroupValue, GroupedAggregate, Measure, Metric, Period, PeriodKey,
    SeriesPoint, TimeSeries,
};
