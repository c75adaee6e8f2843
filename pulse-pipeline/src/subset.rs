//! Filtered views over the record store.

use pulse_stats::Fingerprint;

use crate::components::clicked_state_filter::ClickedStateFilter;
use crate::components::membership_filter::{MembershipFilter, SelectableDimension};
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::filter::{Filter, FilterResult};
use crate::record::OrderRecord;
use crate::types::FilterSelection;

/// The rows surviving a filter pass, borrowed from the record store.
///
/// Keeps enough context to tell "no filters applied" apart from "filters
/// matched nothing".
#[derive(Clone, Debug)]
pub struct Subset<'a> {
    rows: Vec<&'a OrderRecord>,
    constrained: bool,
    source_len: usize,
}

impl<'a> Subset<'a> {
    /// Every record, unfiltered.
    pub fn all(records: &'a [OrderRecord]) -> Self {
        Self {
            rows: records.iter().collect(),
            constrained: false,
            source_len: records.len(),
        }
    }

    pub fn rows(&self) -> &[&'a OrderRecord] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a OrderRecord> + '_ {
        self.rows.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether at least one filter stage ran.
    pub fn is_constrained(&self) -> bool {
        self.constrained
    }

    /// Number of rows the filters were applied to.
    pub fn source_len(&self) -> usize {
        self.source_len
    }

    /// `EmptyResult` when there is nothing to aggregate.
    pub fn ensure_non_empty(&self) -> AnalyticsResult<()> {
        if self.rows.is_empty() {
            Err(AnalyticsError::EmptyResult)
        } else {
            Ok(())
        }
    }

    /// Apply `selection` again on top of this subset.
    pub fn refine(&self, selection: &FilterSelection) -> Subset<'a> {
        let mut refined = apply_filters(self.iter(), selection);
        refined.constrained |= self.constrained;
        refined
    }

    /// Content fingerprint over the row positions, for memo cache keys.
    pub fn fingerprint(&self) -> u64 {
        let mut fp = Fingerprint::new();
        fp.write_u64(self.rows.len() as u64);
        for row in &self.rows {
            fp.write_u64(row.index as u64);
        }
        fp.finish()
    }
}

fn filter_stages<'a>() -> Vec<Box<dyn Filter<FilterSelection, &'a OrderRecord>>> {
    let mut stages: Vec<Box<dyn Filter<FilterSelection, &'a OrderRecord>>> = SelectableDimension::ALL
        .into_iter()
        .map(|d| Box::new(MembershipFilter::new(d)) as Box<dyn Filter<FilterSelection, &'a OrderRecord>>)
        .collect();
    stages.push(Box::new(ClickedStateFilter));
    stages
}

/// Select the records satisfying every non-empty constraint of `selection`.
///
/// Values absent from the data simply match nothing. Feeding the result
/// back through the same selection returns the same rows.
pub fn apply_filters<'a, I>(records: I, selection: &FilterSelection) -> Subset<'a>
where
    I: IntoIterator<Item = &'a OrderRecord>,
{
    let mut rows: Vec<&'a OrderRecord> = records.into_iter().collect();
    let source_len = rows.len();
    let mut constrained = false;

    for stage in filter_stages() {
        if !stage.enable(selection) {
            continue;
        }
        constrained = true;
        let FilterResult { kept, removed } = stage.filter(selection, rows);
        log::debug!(
            "stage={} kept={} removed={}",
            stage.name(),
            kept.len(),
            removed.len()
        );
        rows = kept;
    }

    if constrained && rows.is_empty() {
        log::info!("selection=\"{}\" matched no rows", selection);
    }

    Subset {
        rows,
        constrained,
        source_len,
    }
}
