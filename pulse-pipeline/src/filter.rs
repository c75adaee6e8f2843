use crate::util;

/// Result of a filter operation, partitioning candidates into kept and removed.
pub struct FilterResult<C> {
    pub kept: Vec<C>,
    pub removed: Vec<C>,
}

/// Filters run sequentially and partition candidates into kept and removed
/// sets. Chaining stages gives the conjunction of their predicates.
pub trait Filter<Q, C>: Send + Sync {
    /// Decide if this filter should run for the given query.
    fn enable(&self, _query: &Q) -> bool {
        true
    }

    /// Filter candidates by evaluating each against some criteria.
    /// Kept candidates continue to the next stage; removed candidates are
    /// excluded from further processing.
    fn filter(&self, query: &Q, candidates: Vec<C>) -> FilterResult<C>;

    /// Returns a stable name for logging.
    fn name(&self) -> &str {
        util::short_type_name(std::any::type_name::<Self>())
    }
}
