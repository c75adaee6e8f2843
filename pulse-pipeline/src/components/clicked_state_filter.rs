use crate::filter::{Filter, FilterResult};
use crate::record::OrderRecord;
use crate::types::FilterSelection;

/// Keeps rows from the state clicked on the choropleth map.
pub struct ClickedStateFilter;

impl<'a> Filter<FilterSelection, &'a OrderRecord> for ClickedStateFilter {
    fn enable(&self, selection: &FilterSelection) -> bool {
        selection.clicked_state.is_some()
    }

    fn filter(
        &self,
        selection: &FilterSelection,
        candidates: Vec<&'a OrderRecord>,
    ) -> FilterResult<&'a OrderRecord> {
        let Some(state) = selection.clicked_state.as_deref() else {
            return FilterResult {
                kept: candidates,
                removed: Vec::new(),
            };
        };
        let (kept, removed): (Vec<_>, Vec<_>) =
            candidates.into_iter().partition(|r| r.state == state);

        FilterResult { kept, removed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn keeps_only_clicked_state() {
        let d = NaiveDate::from_ymd_opt(2017, 1, 1).unwrap();
        let data = vec![
            OrderRecord::new("O-1", d, "C1", "Consumer", "Central", "Texas", "Austin", "Furniture", "Chairs", 10.0),
            OrderRecord::new("O-2", d, "C2", "Consumer", "West", "Utah", "Provo", "Furniture", "Chairs", 10.0),
        ];
        let sel = FilterSelection::new().with_clicked_state("Texas");
        let result = ClickedStateFilter.filter(&sel, data.iter().collect());
        assert_eq!(result.kept.len(), 1);
        assert_eq!(result.kept[0].state, "Texas");
        assert_eq!(result.removed.len(), 1);
    }

    #[test]
    fn no_click_keeps_everything() {
        let d = NaiveDate::from_ymd_opt(2017, 1, 1).unwrap();
        let data = vec![OrderRecord::new(
            "O-1", d, "C1", "Consumer", "Central", "Texas", "Austin", "Furniture", "Chairs", 10.0,
        )];
        let sel = FilterSelection::new();
        assert!(!Filter::<FilterSelection, &OrderRecord>::enable(&ClickedStateFilter, &sel));
        let result = ClickedStateFilter.filter(&sel, data.iter().collect());
        assert_eq!(result.kept.len(), 1);
    }
}
