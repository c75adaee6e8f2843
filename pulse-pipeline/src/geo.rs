//! Choropleth input: sales per state keyed by postal abbreviation.

use serde::Serialize;

use crate::aggregate::aggregate_by;
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::states;
use crate::subset::Subset;
use crate::types::{Dimension, Metric};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StateSales {
    pub state: String,
    pub code: &'static str,
    pub sales: f64,
}

/// Map rows plus the states that could not be placed on the map.
///
/// The colour scale spans `scale_min..=scale_max` of the mapped rows, so it
/// follows the current filter selection.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StateMap {
    pub rows: Vec<StateSales>,
    pub unmapped: Vec<String>,
    pub scale_min: f64,
    pub scale_max: f64,
}

impl StateMap {
    pub fn get(&self, code: &str) -> Option<f64> {
        self.rows.iter().find(|r| r.code == code).map(|r| r.sales)
    }
}

pub fn state_map(subset: &Subset<'_>) -> AnalyticsResult<StateMap> {
    let by_state = aggregate_by(subset, &[Dimension::State], Metric::Sum)?;

    let mut rows = Vec::with_capacity(by_state.len());
    let mut unmapped = Vec::new();
    for group in by_state.groups {
        let name = group.key.to_string();
        match states::state_code(&name) {
            Some(code) => rows.push(StateSales {
                state: name,
                code,
                sales: group.value,
            }),
            None => {
                let err = AnalyticsError::UnmappedCategory {
                    dimension: Dimension::State,
                    value: name.clone(),
                };
                log::warn!("state_map skipped: {err}");
                unmapped.push(name);
            }
        }
    }

    let scale_min = rows.iter().map(|r| r.sales).fold(f64::INFINITY, f64::min);
    let scale_max = rows.iter().map(|r| r.sales).fold(f64::NEG_INFINITY, f64::max);
    let (scale_min, scale_max) = if rows.is_empty() { (0.0, 0.0) } else { (scale_min, scale_max) };

    Ok(StateMap {
        rows,
        unmapped,
        scale_min,
        scale_max,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{OrderRecord, RecordStore};
    use chrono::NaiveDate;

    fn rec(state: &str, sales: f64) -> OrderRecord {
        OrderRecord::new(
            "O-1",
            NaiveDate::from_ymd_opt(2017, 1, 1).unwrap(),
            "C1", "Consumer", "East", state, "Town", "Furniture", "Chairs", sales,
        )
    }

    #[test]
    fn unmapped_states_are_reported_not_fatal() {
        let store = RecordStore::new(vec![rec("Ohio", 10.0), rec("Atlantis", 5.0), rec("Texas", 30.0), rec("Ohio", 2.0)]);
        let map = state_map(&Subset::all(store.records())).unwrap();
        assert_eq!(map.rows.len(), 2);
        assert_eq!(map.get("OH"), Some(12.0));
        assert_eq!(map.get("TX"), Some(30.0));
        assert_eq!(map.unmapped, ["Atlantis"]);
        assert_eq!((map.scale_min, map.scale_max), (12.0, 30.0));
    }

    #[test]
    fn only_unmapped_gives_flat_scale() {
        let store = RecordStore::new(vec![rec("Atlantis", 5.0)]);
        let map = state_map(&Subset::all(store.records())).unwrap();
        assert!(map.rows.is_empty());
        assert_eq!((map.scale_min, map.scale_max), (0.0, 0.0));
    }
}
