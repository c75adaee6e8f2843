//! Caller-side session: the shared record store, the current selection
//! and the memo cache.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::aggregate::{aggregate_measure_by, kpis, Kpis};
use crate::cache::{CacheKey, CacheStats, MemoCache};
use crate::config::DashboardConfig;
use crate::correlation::{correlation_matrix, CorrelationMatrix};
use crate::error::AnalyticsResult;
use crate::forecast::{forecast_with_band, Forecast};
use crate::geo::{state_map, StateMap};
use crate::insight::{top_insight, TopInsight};
use crate::pipelines::dashboard::{DashboardPipeline, DashboardView};
use crate::record::{OrderRecord, RecordStore};
use crate::states;
use crate::subset::{apply_filters, Subset};
use crate::timeseries::measure_series;
use crate::types::{Dimension, FilterSelection, GroupedAggregate, Measure, Metric, Period, TimeSeries};

/// One aggregate request against the current subset.
#[derive(Clone, Debug, PartialEq)]
pub enum AggregateRequest {
    Kpis,
    AggregateBy {
        dimensions: Vec<Dimension>,
        metric: Metric,
        measure: Measure,
    },
    TimeSeries {
        period: Period,
        measure: Measure,
    },
    CorrelationMatrix {
        dimension: Dimension,
        period: Period,
    },
    Forecast {
        period: Period,
        horizon: usize,
    },
    TopInsight {
        dimensions: Vec<Dimension>,
        measure: Measure,
        n: usize,
    },
    StateMap,
    Dashboard,
}

fn join_labels(dimensions: &[Dimension]) -> String {
    dimensions.iter().map(|d| d.label()).collect::<Vec<_>>().join("+")
}

impl fmt::Display for AggregateRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregateRequest::Kpis => write!(f, "kpis"),
            AggregateRequest::AggregateBy {
                dimensions,
                metric,
                measure,
            } => write!(f, "aggregate_by {} {metric}({measure})", join_labels(dimensions)),
            AggregateRequest::TimeSeries { period, measure } => write!(f, "time_series {period} {measure}"),
            AggregateRequest::CorrelationMatrix { dimension, period } => {
                write!(f, "correlation_matrix {} {period}", dimension.label())
            }
            AggregateRequest::Forecast { period, horizon } => write!(f, "forecast {period} {horizon}"),
            AggregateRequest::TopInsight { dimensions, measure, n } => {
                write!(f, "top_insight {} {measure} {n}", join_labels(dimensions))
            }
            AggregateRequest::StateMap => write!(f, "state_map"),
            AggregateRequest::Dashboard => write!(f, "dashboard"),
        }
    }
}

/// A computed aggregate, as cached and as handed to the presentation layer.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Aggregate {
    Kpis(Kpis),
    Grouped(GroupedAggregate),
    Series(TimeSeries),
    Correlation(CorrelationMatrix),
    Forecast(Forecast),
    Top(Vec<TopInsight>),
    StateMap(StateMap),
    Dashboard(DashboardView),
}

/// A window onto the raw rows behind the current selection.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RowPage {
    pub offset: usize,
    /// Rows in the whole subset, not just this page.
    pub total: usize,
    pub records: Vec<OrderRecord>,
}

pub struct DashboardSession {
    store: Arc<RecordStore>,
    selection: FilterSelection,
    pipeline: DashboardPipeline,
    band_multiplier: f64,
    cache: MemoCache<Aggregate>,
}

impl DashboardSession {
    pub fn new(store: Arc<RecordStore>, config: &DashboardConfig) -> Self {
        Self {
            store,
            selection: FilterSelection::default(),
            pipeline: DashboardPipeline::from_config(config),
            band_multiplier: config.band_multiplier,
            cache: MemoCache::new(config.cache_capacity),
        }
    }

    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn pipeline(&self) -> &DashboardPipeline {
        &self.pipeline
    }

    /// Replace the selection and re-render.
    pub fn select(&mut self, selection: FilterSelection) -> DashboardView {
        log::debug!("select selection=\"{selection}\" fingerprint={:016x}", selection.fingerprint());
        self.selection = selection;
        self.view()
    }

    /// Toggle the clicked map state: clicking the active state clears it.
    /// Accepts a state name or its postal code.
    pub fn click_state(&mut self, state: &str) -> DashboardView {
        let state = states::state_name(state).unwrap_or(state);
        let mut next = self.selection.clone();
        next.clicked_state = match next.clicked_state.as_deref() {
            Some(current) if current == state => None,
            _ => Some(state.to_string()),
        };
        self.select(next)
    }

    pub fn clear(&mut self) -> DashboardView {
        self.select(FilterSelection::default())
    }

    /// Row count of the current subset.
    pub fn subset_len(&self) -> usize {
        self.with_subset(|s| s.len())
    }

    /// Rows `offset..offset + limit` of the current subset, in load order.
    /// An offset past the end gives an empty page.
    pub fn rows(&self, offset: usize, limit: usize) -> RowPage {
        self.with_subset(|subset| RowPage {
            offset,
            total: subset.len(),
            records: subset.iter().skip(offset).take(limit).cloned().collect(),
        })
    }

    /// Run `f` over the current subset.
    pub fn with_subset<R>(&self, f: impl FnOnce(&Subset<'_>) -> R) -> R {
        let subset = apply_filters(self.store.records(), &self.selection);
        f(&subset)
    }

    /// The dashboard for the current selection.
    pub fn view(&mut self) -> DashboardView {
        match self.compute(&AggregateRequest::Dashboard) {
            Ok(Aggregate::Dashboard(view)) => view,
            // The dashboard request only ever yields a view.
            _ => DashboardView::NoData {
                selection: self.selection.to_string(),
                source_rows: self.store.len(),
            },
        }
    }

    /// Compute `request` over the current subset, served from the memo
    /// cache when the same rows were seen before.
    pub fn compute(&mut self, request: &AggregateRequest) -> AnalyticsResult<Aggregate> {
        let store = Arc::clone(&self.store);
        let subset = apply_filters(store.records(), &self.selection);
        let key = CacheKey::new(subset.fingerprint(), request.to_string());
        let selection = self.selection.to_string();
        let pipeline = &self.pipeline;
        let band = self.band_multiplier;

        let aggregate = self
            .cache
            .get_or_try_insert_with(key, || evaluate(&subset, request, pipeline, band, &selection))?;
        Ok(match aggregate {
            Aggregate::Dashboard(view) => Aggregate::Dashboard(view.with_selection(selection)),
            other => other,
        })
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

fn evaluate(
    subset: &Subset<'_>,
    request: &AggregateRequest,
    pipeline: &DashboardPipeline,
    band_multiplier: f64,
    selection: &str,
) -> AnalyticsResult<Aggregate> {
    log::debug!("compute request=\"{request}\" rows={}", subset.len());
    Ok(match request {
        AggregateRequest::Kpis => Aggregate::Kpis(kpis(subset)?),
        AggregateRequest::AggregateBy {
            dimensions,
            metric,
            measure,
        } => Aggregate::Grouped(aggregate_measure_by(subset, dimensions, *metric, *measure)?),
        AggregateRequest::TimeSeries { period, measure } => Aggregate::Series(measure_series(subset, *period, *measure)?),
        AggregateRequest::CorrelationMatrix { dimension, period } => {
            Aggregate::Correlation(correlation_matrix(subset, *dimension, *period)?)
        }
        AggregateRequest::Forecast { period, horizon } => {
            let series = measure_series(subset, *period, Measure::Sales)?;
            Aggregate::Forecast(forecast_with_band(&series, *horizon, band_multiplier)?)
        }
        AggregateRequest::TopInsight { dimensions, measure, n } => {
            let aggregate = aggregate_measure_by(subset, dimensions, Metric::Sum, *measure)?;
            Aggregate::Top(top_insight(&aggregate, *n))
        }
        AggregateRequest::StateMap => Aggregate::StateMap(state_map(subset)?),
        AggregateRequest::Dashboard => Aggregate::Dashboard(pipeline.run(subset, selection)),
    })
}
