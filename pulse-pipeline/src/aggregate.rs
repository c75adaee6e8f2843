//! Grouped sums, means, distinct counts and the KPI block.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::error::AnalyticsResult;
use crate::subset::Subset;
use crate::types::{Dimension, GroupKey, GroupValue, GroupedAggregate, Measure, Metric};

/// Headline numbers for the KPI row.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Kpis {
    pub total_sales: f64,
    /// Mean sales per line item.
    pub average_sale: f64,
    pub total_orders: usize,
    /// Total sales per distinct order.
    pub average_order_value: f64,
    pub total_profit: f64,
    pub total_quantity: f64,
    pub line_items: usize,
}

#[derive(Default)]
struct Accumulator<'a> {
    sum: f64,
    count: usize,
    orders: HashSet<&'a str>,
}

/// Aggregate sales over one or more dimensions.
pub fn aggregate_by(subset: &Subset<'_>, dimensions: &[Dimension], metric: Metric) -> AnalyticsResult<GroupedAggregate> {
    aggregate_measure_by(subset, dimensions, metric, Measure::Sales)
}

/// Aggregate `measure` over `dimensions`.
///
/// Only groups present in the subset appear, in the order their first row
/// was encountered. With no dimensions the whole subset is one group.
pub fn aggregate_measure_by(
    subset: &Subset<'_>,
    dimensions: &[Dimension],
    metric: Metric,
    measure: Measure,
) -> AnalyticsResult<GroupedAggregate> {
    subset.ensure_non_empty()?;

    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut keys: Vec<GroupKey> = Vec::new();
    let mut accs: Vec<Accumulator<'_>> = Vec::new();

    for record in subset.iter() {
        let key = GroupKey(
            dimensions
                .iter()
                .map(|d| d.value_of(record).into_owned())
                .collect(),
        );
        let slot = match index.get(&key) {
            Some(&slot) => slot,
            None => {
                let slot = accs.len();
                index.insert(key.clone(), slot);
                keys.push(key);
                accs.push(Accumulator::default());
                slot
            }
        };
        let acc = &mut accs[slot];
        acc.sum += measure.value_of(record);
        acc.count += 1;
        if metric == Metric::DistinctCount {
            acc.orders.insert(record.order_id.as_str());
        }
    }

    let groups = keys
        .into_iter()
        .zip(accs)
        .map(|(key, acc)| {
            let value = match metric {
                Metric::Sum => acc.sum,
                Metric::Mean => acc.sum / acc.count as f64,
                Metric::DistinctCount => acc.orders.len() as f64,
            };
            GroupValue { key, value }
        })
        .collect();

    Ok(GroupedAggregate {
        dimensions: dimensions.to_vec(),
        metric,
        measure,
        groups,
    })
}

/// Number of unique order ids in the subset.
pub fn distinct_order_count(subset: &Subset<'_>) -> usize {
    subset
        .iter()
        .map(|r| r.order_id.as_str())
        .collect::<HashSet<_>>()
        .len()
}

/// Total sales divided by distinct orders; 0 for an empty subset.
pub fn average_order_value(subset: &Subset<'_>) -> f64 {
    let orders = distinct_order_count(subset);
    if orders == 0 {
        return 0.0;
    }
    total(subset, Measure::Sales) / orders as f64
}

/// Sum of `measure` over the subset.
pub fn total(subset: &Subset<'_>, measure: Measure) -> f64 {
    subset.iter().map(|r| measure.value_of(r)).sum()
}

/// The KPI row: totals, averages and order counts.
pub fn kpis(subset: &Subset<'_>) -> AnalyticsResult<Kpis> {
    subset.ensure_non_empty()?;

    let total_sales = total(subset, Measure::Sales);
    let total_orders = distinct_order_count(subset);
    Ok(Kpis {
        total_sales,
        average_sale: total_sales / subset.len() as f64,
        total_orders,
        average_order_value: average_order_value(subset),
        total_profit: total(subset, Measure::Profit),
        total_quantity: total(subset, Measure::Quantity),
        line_items: subset.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalyticsError;
    use crate::record::{OrderRecord, RecordStore};
    use crate::subset::apply_filters;
    use crate::types::FilterSelection;
    use chrono::NaiveDate;

    fn store() -> RecordStore {
        let d = NaiveDate::from_ymd_opt(2017, 5, 1).unwrap();
        RecordStore::new(vec![
            OrderRecord::new("O-1", d, "C1", "Consumer", "East", "Ohio", "Akron", "A", "A1", 100.0).with_profit(10.0),
            OrderRecord::new("O-1", d, "C1", "Consumer", "East", "Ohio", "Akron", "A", "A2", 200.0).with_profit(-5.0),
            OrderRecord::new("O-2", d, "C2", "Corporate", "West", "Utah", "Provo", "B", "B1", 300.0).with_profit(30.0).with_quantity(4.0),
        ])
    }

    #[test]
    fn grouped_sum_scenario() {
        let store = store();
        let subset = Subset::all(store.records());
        let agg = aggregate_by(&subset, &[Dimension::Category], Metric::Sum).unwrap();
        assert_eq!(agg.len(), 2);
        assert_eq!(agg.get(&["A"]), Some(300.0));
        assert_eq!(agg.get(&["B"]), Some(300.0));
        // First-encountered order.
        assert_eq!(agg.groups[0].key, GroupKey::single("A"));
        assert_eq!(distinct_order_count(&subset), 2);
        assert!((average_order_value(&subset) - 600.0 / 2.0).abs() < 1e-9);
    }

    #[test]
    fn grouped_sums_partition_total() {
        let store = store();
        let subset = Subset::all(store.records());
        for dim in [Dimension::Region, Dimension::SubCategory, Dimension::Segment, Dimension::Year] {
            let agg = aggregate_by(&subset, &[dim], Metric::Sum).unwrap();
            assert!((agg.total() - total(&subset, Measure::Sales)).abs() < 1e-9);
        }
    }

    #[test]
    fn two_dimension_keys() {
        let store = store();
        let subset = Subset::all(store.records());
        let agg = aggregate_by(&subset, &[Dimension::Category, Dimension::SubCategory], Metric::Sum).unwrap();
        assert_eq!(agg.len(), 3);
        assert_eq!(agg.get(&["A", "A2"]), Some(200.0));
        assert_eq!(agg.get(&["A"]), None);
        assert_eq!(agg.groups[0].key.to_string(), "A / A1");
    }

    #[test]
    fn mean_and_distinct_count() {
        let store = store();
        let subset = Subset::all(store.records());
        let mean = aggregate_by(&subset, &[Dimension::Category], Metric::Mean).unwrap();
        assert_eq!(mean.get(&["A"]), Some(150.0));
        let orders = aggregate_by(&subset, &[Dimension::Category], Metric::DistinctCount).unwrap();
        assert_eq!(orders.get(&["A"]), Some(1.0));
        assert_eq!(orders.get(&["B"]), Some(1.0));
    }

    #[test]
    fn profit_measure() {
        let store = store();
        let subset = Subset::all(store.records());
        let agg = aggregate_measure_by(&subset, &[Dimension::Region], Metric::Sum, Measure::Profit).unwrap();
        assert_eq!(agg.get(&["East"]), Some(5.0));
        assert_eq!(agg.measure, Measure::Profit);
    }

    #[test]
    fn no_dimensions_is_grand_total() {
        let store = store();
        let subset = Subset::all(store.records());
        let agg = aggregate_by(&subset, &[], Metric::Sum).unwrap();
        assert_eq!(agg.len(), 1);
        assert_eq!(agg.groups[0].value, 600.0);
    }

    #[test]
    fn kpi_block() {
        let store = store();
        let subset = Subset::all(store.records());
        let k = kpis(&subset).unwrap();
        assert_eq!(k.total_sales, 600.0);
        assert_eq!(k.average_sale, 200.0);
        assert_eq!(k.total_orders, 2);
        assert_eq!(k.average_order_value, 300.0);
        assert_eq!(k.total_profit, 35.0);
        assert_eq!(k.total_quantity, 4.0);
        assert_eq!(k.line_items, 3);
        assert!((k.average_order_value * k.total_orders as f64 - k.total_sales).abs() < 1e-9);
    }

    #[test]
    fn empty_subset_is_empty_result() {
        let store = store();
        let subset = apply_filters(store.records(), &FilterSelection::new().with_regions(["Nonexistent"]));
        assert_eq!(aggregate_by(&subset, &[Dimension::Category], Metric::Sum), Err(AnalyticsError::EmptyResult));
        assert_eq!(kpis(&subset), Err(AnalyticsError::EmptyResult));
        assert_eq!(distinct_order_count(&subset), 0);
        assert_eq!(average_order_value(&subset), 0.0);
    }
}
