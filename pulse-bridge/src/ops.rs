//! The complete vocabulary of dashboard operations.
//!
//! A request is parsed into exactly one of these variants. If it doesn't
//! parse, it is rejected before anything runs.

use pulse_pipeline::thresholds::{DEFAULT_FORECAST_HORIZON, DEFAULT_PAGE_SIZE, DEFAULT_TOP_N};
use pulse_pipeline::{AggregateRequest, Dimension, FilterSelection, Measure, Metric, Period};
use serde::{Deserialize, Serialize};

fn default_horizon() -> usize {
    DEFAULT_FORECAST_HORIZON
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_correlation_dimension() -> Dimension {
    Dimension::Region
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "params")]
pub enum DashboardOperation {
    // ========================================
    // SELECTION (updates the session)
    // ========================================

    /// Replace the whole filter selection.
    Select(FilterSelection),

    /// Click a state on the map; clicking it again clears it.
    ClickState { state: String },

    /// Drop every constraint.
    ClearSelection,

    // ========================================
    // AGGREGATES (read-only)
    // ========================================

    Kpis,

    AggregateBy {
        dimensions: Vec<Dimension>,
        #[serde(default)]
        metric: Metric,
        #[serde(default)]
        measure: Measure,
    },

    TimeSeries {
        #[serde(default)]
        period: Period,
        #[serde(default)]
        measure: Measure,
    },

    CorrelationMatrix {
        #[serde(default = "default_correlation_dimension")]
        dimension: Dimension,
        #[serde(default)]
        period: Period,
    },

    Forecast {
        #[serde(default)]
        period: Period,
        #[serde(default = "default_horizon")]
        horizon: usize,
    },

    TopInsight {
        dimensions: Vec<Dimension>,
        #[serde(default)]
        measure: Measure,
        #[serde(default = "default_top_n")]
        n: usize,
    },

    StateMap,

    /// Full dashboard for the current selection.
    Dashboard,

    /// Distinct values of a dimension, for populating the filter widgets.
    Options { dimension: Dimension },

    /// Page through the raw rows behind the current selection.
    Rows {
        #[serde(default)]
        offset: usize,
        #[serde(default = "default_page_size")]
        limit: usize,
    },
}

impl DashboardOperation {
    /// Read-only operations never change the selection.
    pub fn is_read_only(&self) -> bool {
        !self.is_mutation()
    }

    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            DashboardOperation::Select(_) | DashboardOperation::ClickState { .. } | DashboardOperation::ClearSelection
        )
    }

    /// Stable operation name, as it appears in the `op` field.
    pub fn name(&self) -> &'static str {
        match self {
            DashboardOperation::Select(_) => "Select",
            DashboardOperation::ClickState { .. } => "ClickState",
            DashboardOperation::ClearSelection => "ClearSelection",
            DashboardOperation::Kpis => "Kpis",
            DashboardOperation::AggregateBy { .. } => "AggregateBy",
            DashboardOperation::TimeSeries { .. } => "TimeSeries",
            DashboardOperation::CorrelationMatrix { .. } => "CorrelationMatrix",
            DashboardOperation::Forecast { .. } => "Forecast",
            DashboardOperation::TopInsight { .. } => "TopInsight",
            DashboardOperation::StateMap => "StateMap",
            DashboardOperation::Dashboard => "Dashboard",
            DashboardOperation::Options { .. } => "Options",
            DashboardOperation::Rows { .. } => "Rows",
        }
    }

    /// The aggregate this operation asks the session for, if any.
    pub fn aggregate_request(&self) -> Option<AggregateRequest> {
        Some(match self {
            DashboardOperation::Kpis => AggregateRequest::Kpis,
            DashboardOperation::AggregateBy {
                dimensions,
                metric,
                measure,
            } => AggregateRequest::AggregateBy {
                dimensions: dimensions.clone(),
                metric: *metric,
                measure: *measure,
            },
            DashboardOperation::TimeSeries { period, measure } => AggregateRequest::TimeSeries {
                period: *period,
                measure: *measure,
            },
            DashboardOperation::CorrelationMatrix { dimension, period } => AggregateRequest::CorrelationMatrix {
                dimension: *dimension,
                period: *period,
            },
            DashboardOperation::Forecast { period, horizon } => AggregateRequest::Forecast {
                period: *period,
                horizon: *horizon,
            },
            DashboardOperation::TopInsight { dimensions, measure, n } => AggregateRequest::TopInsight {
                dimensions: dimensions.clone(),
                measure: *measure,
                n: *n,
            },
            DashboardOperation::StateMap => AggregateRequest::StateMap,
            DashboardOperation::Dashboard => AggregateRequest::Dashboard,
            DashboardOperation::Select(_)
            | DashboardOperation::ClickState { .. }
            | DashboardOperation::ClearSelection
            | DashboardOperation::Options { .. }
            | DashboardOperation::Rows { .. } => return None,
        })
    }

    /// Human-readable description for the audit log.
    pub fn describe(&self) -> String {
        let dims = |d: &[Dimension]| d.iter().map(|x| x.label()).collect::<Vec<_>>().join(" x ");
        match self {
            DashboardOperation::Select(selection) => format!("Select {selection}"),
            DashboardOperation::ClickState { state } => format!("Click state '{state}'"),
            DashboardOperation::ClearSelection => "Clear selection".into(),
            DashboardOperation::Kpis => "KPI block".into(),
            DashboardOperation::AggregateBy {
                dimensions,
                metric,
                measure,
            } => format!("{metric} of {measure} by {}", dims(dimensions.as_slice())),
            DashboardOperation::TimeSeries { period, measure } => format!("{measure} per {period}"),
            DashboardOperation::CorrelationMatrix { dimension, period } => {
                format!("Correlation of {} per {period}", dimension.label())
            }
            DashboardOperation::Forecast { period, horizon } => format!("Forecast {horizon} {period}s"),
            DashboardOperation::TopInsight { dimensions, measure, n } => {
                format!("Top {n} {} by {measure}", dims(dimensions.as_slice()))
            }
            DashboardOperation::StateMap => "Sales by state".into(),
            DashboardOperation::Dashboard => "Full dashboard".into(),
            DashboardOperation::Options { dimension } => format!("Options for {}", dimension.label()),
            DashboardOperation::Rows { offset, limit } => format!("Rows {offset}..{}", offset + limit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aggregate_with_defaults() {
        let json = r#"{"op": "AggregateBy", "params": {"dimensions": ["sub_category"]}}"#;
        let op: DashboardOperation = serde_json::from_str(json).unwrap();
        assert!(op.is_read_only());
        assert_eq!(
            op,
            DashboardOperation::AggregateBy {
                dimensions: vec![Dimension::SubCategory],
                metric: Metric::Sum,
                measure: Measure::Sales,
            }
        );
    }

    #[test]
    fn test_parse_select() {
        let json = r#"{
            "op": "Select",
            "params": {"regions": ["East", "West"], "years": [2017]}
        }"#;
        let op: DashboardOperation = serde_json::from_str(json).unwrap();
        assert!(op.is_mutation());
        match op {
            DashboardOperation::Select(sel) => {
                assert_eq!(sel.regions.len(), 2);
                assert!(sel.categories.is_empty());
                assert!(sel.years.contains(&2017));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_unit_variant() {
        let op: DashboardOperation = serde_json::from_str(r#"{"op": "Dashboard"}"#).unwrap();
        assert_eq!(op.aggregate_request(), Some(AggregateRequest::Dashboard));
    }

    #[test]
    fn test_forecast_defaults() {
        let op: DashboardOperation = serde_json::from_str(r#"{"op": "Forecast", "params": {}}"#).unwrap();
        assert_eq!(
            op,
            DashboardOperation::Forecast {
                period: Period::Month,
                horizon: 6
            }
        );
    }

    #[test]
    fn test_invalid_op_rejected() {
        let json = r#"{"op": "DropTable", "params": {}}"#;
        let result: Result<DashboardOperation, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_dimension_rejected() {
        let json = r#"{"op": "AggregateBy", "params": {"dimensions": ["planet"]}}"#;
        assert!(serde_json::from_str::<DashboardOperation>(json).is_err());
    }

    #[test]
    fn test_all_ops_described() {
        let ops = vec![
            DashboardOperation::Select(FilterSelection::default()),
            DashboardOperation::ClickState { state: "Texas".into() },
            DashboardOperation::ClearSelection,
            DashboardOperation::Kpis,
            DashboardOperation::AggregateBy {
                dimensions: vec![Dimension::Region],
                metric: Metric::Mean,
                measure: Measure::Profit,
            },
            DashboardOperation::TimeSeries {
                period: Period::Quarter,
                measure: Measure::Sales,
            },
            DashboardOperation::CorrelationMatrix {
                dimension: Dimension::Category,
                period: Period::Month,
            },
            DashboardOperation::Forecast {
                period: Period::Month,
                horizon: 3,
            },
            DashboardOperation::TopInsight {
                dimensions: vec![Dimension::SubCategory],
                measure: Measure::Sales,
                n: 5,
            },
            DashboardOperation::StateMap,
            DashboardOperation::Dashboard,
            DashboardOperation::Options {
                dimension: Dimension::Segment,
            },
            DashboardOperation::Rows { offset: 0, limit: 10 },
        ];

        for op in &ops {
            assert!(!op.describe().is_empty(), "Empty description for {:?}", op);
            let browses = matches!(op, DashboardOperation::Options { .. } | DashboardOperation::Rows { .. });
            assert_eq!(op.is_mutation(), op.aggregate_request().is_none() && !browses);
        }
    }

    #[test]
    fn test_rows_defaults() {
        let op: DashboardOperation = serde_json::from_str(r#"{"op": "Rows", "params": {}}"#).unwrap();
        assert!(op.is_read_only());
        assert_eq!(op, DashboardOperation::Rows { offset: 0, limit: 50 });
    }
}
