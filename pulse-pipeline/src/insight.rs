//! Superlatives and templated sentences derived from aggregates.
//!
//! Every function here is pure. When the supporting aggregate is empty or
//! the statistic is undefined, the rendered value is `N/A`.

use pulse_stats::descriptive::percent_change;
use serde::Serialize;

use crate::components::top_k_selector::TopKSelector;
use crate::correlation::CorrelationMatrix;
use crate::selector::Selector;
use crate::types::{GroupKey, GroupedAggregate, PeriodKey, TimeSeries};

pub const NOT_AVAILABLE: &str = "N/A";

/// One of the top-N entries of an aggregate.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TopInsight {
    pub key: GroupKey,
    pub value: f64,
    /// Share of the aggregate total in percent. `None` when the total is 0.
    pub share_pct: Option<f64>,
}

/// The `n` largest groups, ties resolved in the aggregate's key order.
pub fn top_insight(aggregate: &GroupedAggregate, n: usize) -> Vec<TopInsight> {
    let total = aggregate.total();
    let selector = TopKSelector::new(n);
    selector
        .select(&(), aggregate.groups.clone())
        .into_iter()
        .map(|g| TopInsight {
            share_pct: if total == 0.0 { None } else { Some(g.value / total * 100.0) },
            key: g.key,
            value: g.value,
        })
        .collect()
}

/// Signed change between two points of a series.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PeriodChange {
    pub from: PeriodKey,
    pub to: PeriodKey,
    pub from_value: f64,
    pub to_value: f64,
    /// `None` when `from_value` is 0.
    pub pct: Option<f64>,
}

fn change_between(series: &TimeSeries, from: usize, to: usize) -> PeriodChange {
    let a = &series.points[from];
    let b = &series.points[to];
    PeriodChange {
        from: a.period,
        to: b.period,
        from_value: a.value,
        to_value: b.value,
        pct: percent_change(a.value, b.value),
    }
}

/// First-to-last change. Needs at least two points.
pub fn period_change(series: &TimeSeries) -> Option<PeriodChange> {
    if series.len() < 2 {
        return None;
    }
    Some(change_between(series, 0, series.len() - 1))
}

/// Change from the second-to-last to the last period of the completed
/// series, so an empty latest month reads as a drop to zero.
pub fn latest_change(series: &TimeSeries) -> Option<PeriodChange> {
    let full = series.completed();
    if full.len() < 2 {
        return None;
    }
    Some(change_between(&full, full.len() - 2, full.len() - 1))
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CorrelatedPair {
    pub a: String,
    pub b: String,
    pub r: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CorrelationExtremes {
    pub highest: CorrelatedPair,
    pub lowest: CorrelatedPair,
}

/// Highest and lowest correlated pair of distinct columns.
///
/// Undefined cells are skipped. `None` when no distinct pair is defined.
pub fn correlation_extremes(matrix: &CorrelationMatrix) -> Option<CorrelationExtremes> {
    let mut highest: Option<CorrelatedPair> = None;
    let mut lowest: Option<CorrelatedPair> = None;
    let n = matrix.labels.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let Some(r) = matrix.values[[i, j]] else {
                continue;
            };
            let pair = || CorrelatedPair {
                a: matrix.labels[i].clone(),
                b: matrix.labels[j].clone(),
                r,
            };
            if highest.as_ref().map_or(true, |h| r > h.r) {
                highest = Some(pair());
            }
            if lowest.as_ref().map_or(true, |l| r < l.r) {
                lowest = Some(pair());
            }
        }
    }
    Some(CorrelationExtremes {
        highest: highest?,
        lowest: lowest?,
    })
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Whole dollars with comma thousands separators, e.g. `$12,345`.
pub fn format_currency(amount: f64) -> String {
    let whole = amount.abs().round() as u64;
    let sign = if amount < 0.0 && whole > 0 { "-" } else { "" };

    let s = whole.to_string();
    let mut grouped = String::with_capacity(s.len() + s.len() / 3);
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}${}", sign, grouped.chars().rev().collect::<String>())
}

/// Signed percentage with one decimal, or `N/A`.
pub fn format_pct(pct: Option<f64>) -> String {
    match pct {
        Some(p) if p.is_finite() => format!("{p:+.1}%"),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// "Top sub-category: Phones with $330,007 (14.4% of sales)".
pub fn describe_top(label: &str, top: &[TopInsight]) -> String {
    match top.first() {
        Some(t) => {
            let share = match t.share_pct {
                Some(s) => format!(" ({s:.1}% of sales)"),
                None => String::new(),
            };
            format!("Top {label}: {} with {}{share}", t.key, format_currency(t.value))
        }
        None => format!("Top {label}: {NOT_AVAILABLE}"),
    }
}

/// "Sales 2015-01 to 2018-12: +42.0%".
pub fn describe_change(label: &str, change: Option<&PeriodChange>) -> String {
    match change {
        Some(c) => format!("{label} {} to {}: {}", c.from, c.to, format_pct(c.pct)),
        None => format!("{label}: {NOT_AVAILABLE}"),
    }
}

/// "Most correlated regions: East & West (r=0.82); least: ...".
pub fn describe_correlation(label: &str, extremes: Option<&CorrelationExtremes>) -> String {
    match extremes {
        Some(e) => format!(
            "Most correlated {label}: {} & {} (r={:.2}); least: {} & {} (r={:.2})",
            e.highest.a, e.highest.b, e.highest.r, e.lowest.a, e.lowest.b, e.lowest.r
        ),
        None => format!("Most correlated {label}: {NOT_AVAILABLE}"),
    }
}
