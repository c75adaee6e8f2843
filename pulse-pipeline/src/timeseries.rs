use std::collections::BTreeMap;

use crate::error::AnalyticsResult;
use crate::subset::Subset;
use crate::types::{Measure, Period, PeriodKey, SeriesPoint, TimeSeries};

/// Sales per period, ascending by period.
pub fn time_series(subset: &Subset<'_>, period: Period) -> AnalyticsResult<TimeSeries> {
    measure_series(subset, period, Measure::Sales)
}

/// `measure` summed per period, ascending by period.
///
/// Only periods with at least one row appear; see
/// [`TimeSeries::completed`] for a gap-free index.
pub fn measure_series(subset: &Subset<'_>, period: Period, measure: Measure) -> AnalyticsResult<TimeSeries> {
    subset.ensure_non_empty()?;

    let mut sums: BTreeMap<PeriodKey, f64> = BTreeMap::new();
    for record in subset.iter() {
        *sums.entry(period.key_of(record)).or_insert(0.0) += measure.value_of(record);
    }

    Ok(TimeSeries {
        period,
        measure,
        points: sums
            .into_iter()
            .map(|(period, value)| SeriesPoint { period, value })
            .collect(),
    })
}

/// Contiguous copy of `series` with zero-valued points in every gap.
pub fn complete_monthly(series: &TimeSeries) -> TimeSeries {
    series.completed()
}
