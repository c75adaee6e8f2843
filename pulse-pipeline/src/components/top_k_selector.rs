use pulse_stats::thresholds::DEFAULT_TOP_N;

use crate::selector::Selector;
use crate::types::GroupValue;

/// Selects the K largest groups of an aggregate.
pub struct TopKSelector {
    pub k: usize,
}

impl TopKSelector {
    pub fn new(k: usize) -> Self {
        Self { k }
    }
}

impl Default for TopKSelector {
    fn default() -> Self {
        Self { k: DEFAULT_TOP_N }
    }
}

impl<Q> Selector<Q, GroupValue> for TopKSelector {
    fn score(&self, candidate: &GroupValue) -> f64 {
        candidate.value
    }

    fn size(&self) -> Option<usize> {
        Some(self.k)
    }
}
