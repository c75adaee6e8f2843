//! Correlation between per-period series of one dimension's values.

use std::collections::{BTreeMap, BTreeSet};

use ndarray::Array2;
use pulse_stats::thresholds::MIN_CORRELATION_PERIODS;
use pulse_stats::StatsError;
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::subset::Subset;
use crate::types::{Dimension, Period, PeriodKey};

/// Pairwise Pearson correlations, columns labelled by dimension value.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub dimension: Dimension,
    pub period: Period,
    /// Dimension values, sorted.
    pub labels: Vec<String>,
    /// Periods that formed the observation axis.
    pub periods: Vec<PeriodKey>,
    /// `None` where a column has zero variance.
    #[serde(serialize_with = "serialize_matrix")]
    pub values: Array2<Option<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.labels.iter().position(|l| l == a)?;
        let j = self.labels.iter().position(|l| l == b)?;
        self.values[[i, j]]
    }
}

fn serialize_matrix<S: Serializer>(values: &Array2<Option<f64>>, serializer: S) -> Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_seq(Some(values.nrows()))?;
    for row in values.rows() {
        seq.serialize_element(&row.to_vec())?;
    }
    seq.end()
}

/// Correlate the per-period sales of each `dimension` value.
///
/// The pivot has one row per observed period and one column per dimension
/// value; combinations with no sales are 0.
pub fn correlation_matrix(subset: &Subset<'_>, dimension: Dimension, period: Period) -> AnalyticsResult<CorrelationMatrix> {
    subset.ensure_non_empty()?;

    let mut cells: BTreeMap<(PeriodKey, String), f64> = BTreeMap::new();
    let mut periods: BTreeSet<PeriodKey> = BTreeSet::new();
    let mut labels: BTreeSet<String> = BTreeSet::new();
    for record in subset.iter() {
        let p = period.key_of(record);
        let label = dimension.value_of(record).into_owned();
        periods.insert(p);
        labels.insert(label.clone());
        *cells.entry((p, label)).or_insert(0.0) += record.sales;
    }

    if periods.len() < MIN_CORRELATION_PERIODS {
        return Err(AnalyticsError::InsufficientData {
            operation: "correlation_matrix",
            required: MIN_CORRELATION_PERIODS,
            available: periods.len(),
        });
    }

    let periods: Vec<PeriodKey> = periods.into_iter().collect();
    let labels: Vec<String> = labels.into_iter().collect();
    let mut pivot = Array2::<f64>::zeros((periods.len(), labels.len()));
    for (i, p) in periods.iter().enumerate() {
        for (j, label) in labels.iter().enumerate() {
            if let Some(v) = cells.get(&(*p, label.clone())) {
                pivot[[i, j]] = *v;
            }
        }
    }

    let values = pulse_stats::correlation_matrix(pivot.view()).map_err(|e| match e {
        StatsError::InsufficientData { required, available } => AnalyticsError::InsufficientData {
            operation: "correlation_matrix",
            required,
            available,
        },
        _ => AnalyticsError::InsufficientData {
            operation: "correlation_matrix",
            required: MIN_CORRELATION_PERIODS,
            available: periods.len(),
        },
    })?;

    Ok(CorrelationMatrix {
        dimension,
        period,
        labels,
        periods,
        values,
    })
}
