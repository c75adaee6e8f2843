use std::cmp::Ordering;

use crate::util;

/// Selectors sort and truncate a candidate list.
pub trait Selector<Q, C>: Send + Sync {
    /// Default selection: sort, then truncate to `size()`.
    fn select(&self, _query: &Q, candidates: Vec<C>) -> Vec<C> {
        let mut sorted = self.sort(candidates);
        if let Some(limit) = self.size() {
            sorted.truncate(limit);
        }
        sorted
    }

    /// Extract the score from a candidate to use for sorting.
    fn score(&self, candidate: &C) -> f64;

    /// Sort candidates by score, descending.
    ///
    /// The sort is stable, so equal scores keep their incoming order. NaN
    /// scores go to the end.
    fn sort(&self, candidates: Vec<C>) -> Vec<C> {
        let mut sorted = candidates;
        sorted.sort_by(|a, b| {
            let sa = self.score(a);
            let sb = self.score(b);
            match (sa.is_nan(), sb.is_nan()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => sb.partial_cmp(&sa).unwrap_or(Ordering::Equal),
            }
        });
        sorted
    }

    /// Maximum number of candidates to keep. `None` keeps all.
    fn size(&self) -> Option<usize> {
        None
    }

    /// Returns a stable name for logging.
    fn name(&self) -> &str {
        util::short_type_name(std::any::type_name::<Self>())
    }
}
