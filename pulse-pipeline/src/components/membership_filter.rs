use crate::filter::{Filter, FilterResult};
use crate::record::OrderRecord;
use crate::types::FilterSelection;

/// The multi-select dimensions of a `FilterSelection`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectableDimension {
    Region,
    Category,
    Segment,
    Year,
}

impl SelectableDimension {
    pub const ALL: [SelectableDimension; 4] = [
        SelectableDimension::Region,
        SelectableDimension::Category,
        SelectableDimension::Segment,
        SelectableDimension::Year,
    ];

    fn label(&self) -> &'static str {
        match self {
            SelectableDimension::Region => "RegionFilter",
            SelectableDimension::Category => "CategoryFilter",
            SelectableDimension::Segment => "SegmentFilter",
            SelectableDimension::Year => "YearFilter",
        }
    }
}

/// Keeps rows whose value on one dimension is in the selected set.
///
/// Disabled when the set is empty, so an empty selection never excludes
/// anything.
pub struct MembershipFilter {
    pub dimension: SelectableDimension,
}

impl MembershipFilter {
    pub fn new(dimension: SelectableDimension) -> Self {
        Self { dimension }
    }

    fn admits(&self, selection: &FilterSelection, record: &OrderRecord) -> bool {
        match self.dimension {
            SelectableDimension::Region => selection.regions.contains(&record.region),
            SelectableDimension::Category => selection.categories.contains(&record.category),
            SelectableDimension::Segment => selection.segments.contains(&record.segment),
            SelectableDimension::Year => selection.years.contains(&record.year),
        }
    }
}

impl<'a> Filter<FilterSelection, &'a OrderRecord> for MembershipFilter {
    fn enable(&self, selection: &FilterSelection) -> bool {
        match self.dimension {
            SelectableDimension::Region => !selection.regions.is_empty(),
            SelectableDimension::Category => !selection.categories.is_empty(),
            SelectableDimension::Segment => !selection.segments.is_empty(),
            SelectableDimension::Year => !selection.years.is_empty(),
        }
    }

    fn filter(
        &self,
        selection: &FilterSelection,
        candidates: Vec<&'a OrderRecord>,
    ) -> FilterResult<&'a OrderRecord> {
        let (kept, removed): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(|r| self.admits(selection, r));

        FilterResult { kept, removed }
    }

    fn name(&self) -> &str {
        self.dimension.label()
    }
}
