use serde::Serialize;

use crate::aggregate::{aggregate_by, kpis, Kpis};
use crate::config::DashboardConfig;
use crate::correlation::{correlation_matrix, CorrelationMatrix};
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::forecast::{forecast_with_band, Forecast};
use crate::geo::{state_map, StateMap};
use crate::insight::{
    correlation_extremes, describe_change, describe_correlation, describe_top, latest_change, period_change,
    top_insight, TopInsight,
};
use crate::subset::Subset;
use crate::timeseries::time_series;
use crate::types::{Dimension, GroupedAggregate, Metric, Period, TimeSeries};

/// A chart input that may be missing for lack of history.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Section<T> {
    Ready(T),
    InsufficientData { required: usize, available: usize },
    NoData,
}

impl<T> Section<T> {
    pub fn from_result(result: AnalyticsResult<T>) -> Self {
        match result {
            Ok(v) => Section::Ready(v),
            Err(AnalyticsError::InsufficientData { required, available, .. }) => {
                Section::InsufficientData { required, available }
            }
            Err(_) => Section::NoData,
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Section::Ready(v) => Some(v),
            _ => None,
        }
    }
}

/// Everything one re-render needs.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DashboardReport {
    pub selection: String,
    pub rows: usize,
    pub source_rows: usize,
    pub kpis: Kpis,
    pub sales_by_sub_category: GroupedAggregate,
    pub top_sub_categories: Vec<TopInsight>,
    pub sales_by_region: GroupedAggregate,
    pub sales_by_segment: GroupedAggregate,
    /// Sunburst: category -> sub-category.
    pub category_breakdown: GroupedAggregate,
    /// Heatmap: segment x region.
    pub segment_region: GroupedAggregate,
    pub monthly_sales: TimeSeries,
    pub forecast: Section<Forecast>,
    pub region_correlation: Section<CorrelationMatrix>,
    pub state_map: StateMap,
    pub insights: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DashboardView {
    Ready(Box<DashboardReport>),
    NoData { selection: String, source_rows: usize },
}

impl DashboardView {
    pub fn report(&self) -> Option<&DashboardReport> {
        match self {
            DashboardView::Ready(r) => Some(r),
            DashboardView::NoData { .. } => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, DashboardView::NoData { .. })
    }

    /// Relabel the view. Selections that match the same rows share one
    /// computed view, so the label is set after the cache lookup.
    pub fn with_selection(mut self, label: impl Into<String>) -> Self {
        let label = label.into();
        match &mut self {
            DashboardView::Ready(report) => report.selection = label,
            DashboardView::NoData { selection, .. } => *selection = label,
        }
        self
    }

    pub fn selection(&self) -> &str {
        match self {
            DashboardView::Ready(report) => &report.selection,
            DashboardView::NoData { selection, .. } => selection,
        }
    }
}

/// The full dashboard pass over one filtered subset.
///
/// Flow:
/// 1. KPI block
/// 2. grouped sums for the bar, sunburst and heatmap charts
/// 3. TopKSelector picks the leading sub-categories
/// 4. monthly series, then forecast and region correlation over it
/// 5. choropleth rows
/// 6. narrated insights: top sub-category, category, region and state,
///    period changes, correlation extremes
///
/// An empty subset short-circuits to `DashboardView::NoData`.
#[derive(Clone, Debug, PartialEq)]
pub struct DashboardPipeline {
    pub top_n: usize,
    pub horizon: usize,
    pub band_multiplier: f64,
}

impl Default for DashboardPipeline {
    fn default() -> Self {
        Self::from_config(&DashboardConfig::default())
    }
}

impl DashboardPipeline {
    pub fn from_config(config: &DashboardConfig) -> Self {
        Self {
            top_n: config.top_n,
            horizon: config.forecast_horizon,
            band_multiplier: config.band_multiplier,
        }
    }

    pub fn run(&self, subset: &Subset<'_>, selection: &str) -> DashboardView {
        match self.build(subset, selection) {
            Ok(report) => DashboardView::Ready(Box::new(report)),
            Err(e) => {
                log::info!("dashboard skipped: {e}");
                DashboardView::NoData {
                    selection: selection.to_string(),
                    source_rows: subset.source_len(),
                }
            }
        }
    }

    fn build(&self, subset: &Subset<'_>, selection: &str) -> AnalyticsResult<DashboardReport> {
        let kpis = kpis(subset)?;

        let sales_by_sub_category = aggregate_by(subset, &[Dimension::SubCategory], Metric::Sum)?;
        let sales_by_region = aggregate_by(subset, &[Dimension::Region], Metric::Sum)?;
        let sales_by_segment = aggregate_by(subset, &[Dimension::Segment], Metric::Sum)?;
        let category_breakdown = aggregate_by(subset, &[Dimension::Category, Dimension::SubCategory], Metric::Sum)?;
        let segment_region = aggregate_by(subset, &[Dimension::Segment, Dimension::Region], Metric::Sum)?;
        let top_sub_categories = top_insight(&sales_by_sub_category, self.top_n);
        let top_regions = top_insight(&sales_by_region, 1);
        let top_categories = top_insight(&aggregate_by(subset, &[Dimension::Category], Metric::Sum)?, 1);
        let top_states = top_insight(&aggregate_by(subset, &[Dimension::State], Metric::Sum)?, 1);

        let monthly_sales = time_series(subset, Period::Month)?;
        let forecast = Section::from_result(forecast_with_band(&monthly_sales, self.horizon, self.band_multiplier));
        let region_correlation = Section::from_result(correlation_matrix(subset, Dimension::Region, Period::Month));
        let state_map = state_map(subset)?;

        let extremes = region_correlation.ready().and_then(correlation_extremes);
        let insights = vec![
            describe_top("sub-category", &top_sub_categories),
            describe_top("category", &top_categories),
            describe_top("region", &top_regions),
            describe_top("state", &top_states),
            describe_change("Sales", period_change(&monthly_sales).as_ref()),
            describe_change("Month over month", latest_change(&monthly_sales).as_ref()),
            describe_correlation("regions", extremes.as_ref()),
        ];

        log::debug!(
            "dashboard rows={} groups={} months={}",
            subset.len(),
            sales_by_sub_category.len(),
            monthly_sales.len()
        );

        Ok(DashboardReport {
            selection: selection.to_string(),
            rows: subset.len(),
            source_rows: subset.source_len(),
            kpis,
            sales_by_sub_category,
            top_sub_categories,
            sales_by_region,
            sales_by_segment,
            category_breakdown,
            segment_region,
            monthly_sales,
            forecast,
            region_correlation,
            state_map,
            insights,
        })
    }
}
