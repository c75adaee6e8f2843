use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use crate::record::OrderRecord;

// ---------------------------------------------------------------------------
// Dimensions and measures
// ---------------------------------------------------------------------------

/// A categorical column records can be grouped by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Region,
    Category,
    SubCategory,
    Segment,
    State,
    City,
    ShipMode,
    Year,
}

impl Dimension {
    /// The record's value on this dimension.
    pub fn value_of<'a>(&self, record: &'a OrderRecord) -> Cow<'a, str> {
        match self {
            Dimension::Region => Cow::Borrowed(record.region.as_str()),
            Dimension::Category => Cow::Borrowed(record.category.as_str()),
            Dimension::SubCategory => Cow::Borrowed(record.sub_category.as_str()),
            Dimension::Segment => Cow::Borrowed(record.segment.as_str()),
            Dimension::State => Cow::Borrowed(record.state.as_str()),
            Dimension::City => Cow::Borrowed(record.city.as_str()),
            Dimension::ShipMode => Cow::Borrowed(record.ship_mode.as_str()),
            Dimension::Year => Cow::Owned(record.year.to_string()),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Region => "region",
            Dimension::Category => "category",
            Dimension::SubCategory => "sub-category",
            Dimension::Segment => "segment",
            Dimension::State => "state",
            Dimension::City => "city",
            Dimension::ShipMode => "ship mode",
            Dimension::Year => "year",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The numeric column being summed or averaged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    #[default]
    Sales,
    Profit,
    Quantity,
}

impl Measure {
    pub fn value_of(&self, record: &OrderRecord) -> f64 {
        match self {
            Measure::Sales => record.sales,
            Measure::Profit => record.profit,
            Measure::Quantity => record.quantity,
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Measure::Sales => write!(f, "sales"),
            Measure::Profit => write!(f, "profit"),
            Measure::Quantity => write!(f, "quantity"),
        }
    }
}

/// How each group's rows are reduced to one number.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[default]
    Sum,
    Mean,
    DistinctCount,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Sum => write!(f, "sum"),
            Metric::Mean => write!(f, "mean"),
            Metric::DistinctCount => write!(f, "distinct_count"),
        }
    }
}

// ---------------------------------------------------------------------------
// Calendar periods
// ---------------------------------------------------------------------------

/// Time bucket for series.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    #[default]
    Month,
    Quarter,
}

impl Period {
    pub fn key_of(&self, record: &OrderRecord) -> PeriodKey {
        match self {
            Period::Month => PeriodKey::Month(record.year_month),
            Period::Quarter => PeriodKey::Quarter(record.year_quarter),
        }
    }

    /// Phases per seasonal cycle.
    pub fn season_length(&self) -> usize {
        match self {
            Period::Month => pulse_stats::thresholds::MONTHS_PER_YEAR,
            Period::Quarter => pulse_stats::thresholds::QUARTERS_PER_YEAR,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Month => write!(f, "month"),
            Period::Quarter => write!(f, "quarter"),
        }
    }
}

/// Calendar month, `month` in `1..=12`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn succ(&self) -> Self {
        if self.month >= 12 {
            Self::new(self.year + 1, 1)
        } else {
            Self::new(self.year, self.month + 1)
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Calendar quarter, `quarter` in `1..=4`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearQuarter {
    pub year: i32,
    pub quarter: u32,
}

impl YearQuarter {
    pub fn new(year: i32, quarter: u32) -> Self {
        Self { year, quarter }
    }

    pub fn from_month(ym: YearMonth) -> Self {
        Self::new(ym.year, (ym.month - 1) / 3 + 1)
    }

    pub fn succ(&self) -> Self {
        if self.quarter >= 4 {
            Self::new(self.year + 1, 1)
        } else {
            Self::new(self.year, self.quarter + 1)
        }
    }
}

impl fmt::Display for YearQuarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Q{}", self.year, self.quarter)
    }
}

impl Serialize for YearQuarter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Key of one point in a time series.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PeriodKey {
    Month(YearMonth),
    Quarter(YearQuarter),
}

impl PeriodKey {
    pub fn succ(&self) -> Self {
        match self {
            PeriodKey::Month(ym) => PeriodKey::Month(ym.succ()),
            PeriodKey::Quarter(yq) => PeriodKey::Quarter(yq.succ()),
        }
    }

    /// Zero-based position within the calendar year (January = 0, Q1 = 0).
    pub fn phase(&self) -> usize {
        match self {
            PeriodKey::Month(ym) => (ym.month - 1) as usize,
            PeriodKey::Quarter(yq) => (yq.quarter - 1) as usize,
        }
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodKey::Month(ym) => ym.fmt(f),
            PeriodKey::Quarter(yq) => yq.fmt(f),
        }
    }
}

impl Serialize for PeriodKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// Filter selection
// ---------------------------------------------------------------------------

/// The active constraints from the dashboard widgets.
///
/// An empty set on a dimension means "no constraint", never "exclude all".
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSelection {
    pub regions: BTreeSet<String>,
    pub categories: BTreeSet<String>,
    pub segments: BTreeSet<String>,
    pub years: BTreeSet<i32>,
    /// State clicked on the choropleth map.
    pub clicked_state: Option<String>,
}

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_regions<I, S>(mut self, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.regions = regions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_segments<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.segments = segments.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_years<I: IntoIterator<Item = i32>>(mut self, years: I) -> Self {
        self.years = years.into_iter().collect();
        self
    }

    pub fn with_clicked_state(mut self, state: impl Into<String>) -> Self {
        self.clicked_state = Some(state.into());
        self
    }

    /// True when no dimension is constrained.
    pub fn is_unconstrained(&self) -> bool {
        self.regions.is_empty()
            && self.categories.is_empty()
            && self.segments.is_empty()
            && self.years.is_empty()
            && self.clicked_state.is_none()
    }

    /// Stable fingerprint of the selection, for cache keys and logs.
    pub fn fingerprint(&self) -> u64 {
        let mut fp = pulse_stats::Fingerprint::new();
        for (tag, values) in [
            ("regions", &self.regions),
            ("categories", &self.categories),
            ("segments", &self.segments),
        ] {
            fp.write_str(tag);
            for v in values {
                fp.write_str(v);
            }
        }
        fp.write_str("years");
        for y in &self.years {
            fp.write_u64(*y as i64 as u64);
        }
        fp.write_str("clicked_state");
        if let Some(state) = &self.clicked_state {
            fp.write_str(state);
        }
        fp.finish()
    }
}

impl fmt::Display for FilterSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unconstrained() {
            return write!(f, "all records");
        }
        let mut parts = Vec::new();
        let join = |set: &BTreeSet<String>| set.iter().cloned().collect::<Vec<_>>().join("|");
        if !self.regions.is_empty() {
            parts.push(format!("region={}", join(&self.regions)));
        }
        if !self.categories.is_empty() {
            parts.push(format!("category={}", join(&self.categories)));
        }
        if !self.segments.is_empty() {
            parts.push(format!("segment={}", join(&self.segments)));
        }
        if !self.years.is_empty() {
            let years: Vec<String> = self.years.iter().map(|y| y.to_string()).collect();
            parts.push(format!("year={}", years.join("|")));
        }
        if let Some(state) = &self.clicked_state {
            parts.push(format!("state={state}"));
        }
        write!(f, "{}", parts.join(" "))
    }
}

// ---------------------------------------------------------------------------
// Aggregate results
// ---------------------------------------------------------------------------

/// Group key: one value per grouped dimension.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct GroupKey(pub Vec<String>);

impl GroupKey {
    pub fn single(value: impl Into<String>) -> Self {
        GroupKey(vec![value.into()])
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" / "))
    }
}

/// One group of a grouped aggregate.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GroupValue {
    pub key: GroupKey,
    pub value: f64,
}

/// Result of `aggregate_by`: observed groups in first-encountered order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GroupedAggregate {
    pub dimensions: Vec<Dimension>,
    pub metric: Metric,
    pub measure: Measure,
    pub groups: Vec<GroupValue>,
}

impl GroupedAggregate {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Sum of all group values.
    pub fn total(&self) -> f64 {
        self.groups.iter().map(|g| g.value).sum()
    }

    /// Value of the group whose key equals `parts`.
    pub fn get(&self, parts: &[&str]) -> Option<f64> {
        self.groups
            .iter()
            .find(|g| g.key.0.len() == parts.len() && g.key.0.iter().zip(parts).all(|(a, b)| a == b))
            .map(|g| g.value)
    }
}

/// One point of a time series.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub period: PeriodKey,
    pub value: f64,
}

/// Per-period sums sorted ascending by period.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimeSeries {
    pub period: Period,
    pub measure: Measure,
    pub points: Vec<SeriesPoint>,
}

impl TimeSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Fill gaps between the first and last period with zero-valued points.
    pub fn completed(&self) -> TimeSeries {
        let mut points = Vec::with_capacity(self.points.len());
        let mut iter = self.points.iter().peekable();
        let mut cursor = match iter.peek() {
            Some(p) => p.period,
            None => {
                return self.clone();
            }
        };
        for point in iter {
            while cursor < point.period {
                points.push(SeriesPoint {
                    period: cursor,
                    value: 0.0,
                });
                cursor = cursor.succ();
            }
            points.push(point.clone());
            cursor = point.period.succ();
        }
        TimeSeries {
            period: self.period,
            measure: self.measure,
            points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_month_rolls_over() {
        assert_eq!(YearMonth::new(2017, 12).succ(), YearMonth::new(2018, 1));
        assert_eq!(YearMonth::new(2017, 3).succ(), YearMonth::new(2017, 4));
        assert_eq!(YearMonth::new(2017, 3).to_string(), "2017-03");
    }

    #[test]
    fn quarter_from_month() {
        assert_eq!(YearQuarter::from_month(YearMonth::new(2016, 1)).quarter, 1);
        assert_eq!(YearQuarter::from_month(YearMonth::new(2016, 6)).quarter, 2);
        assert_eq!(YearQuarter::from_month(YearMonth::new(2016, 12)).quarter, 4);
        assert_eq!(YearQuarter::new(2016, 4).succ(), YearQuarter::new(2017, 1));
        assert_eq!(YearQuarter::new(2016, 2).to_string(), "2016Q2");
    }

    #[test]
    fn completed_fills_gaps_with_zero() {
        let series = TimeSeries {
            period: Period::Month,
            measure: Measure::Sales,
            points: vec![
                SeriesPoint {
                    period: PeriodKey::Month(YearMonth::new(2017, 11)),
                    value: 5.0,
                },
                SeriesPoint {
                    period: PeriodKey::Month(YearMonth::new(2018, 2)),
                    value: 7.0,
                },
            ],
        };
        let full = series.completed();
        let labels: Vec<String> = full.points.iter().map(|p| p.period.to_string()).collect();
        assert_eq!(labels, ["2017-11", "2017-12", "2018-01", "2018-02"]);
        assert_eq!(full.values(), [5.0, 0.0, 0.0, 7.0]);
    }

    #[test]
    fn selection_fingerprint_depends_on_content() {
        let a = FilterSelection::new().with_regions(["East"]);
        let b = FilterSelection::new().with_regions(["West"]);
        let c = FilterSelection::new().with_regions(["East"]);
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint(), c.fingerprint());
        assert_ne!(a.fingerprint(), FilterSelection::new().fingerprint());
    }

    #[test]
    fn selection_display() {
        assert_eq!(FilterSelection::new().to_string(), "all records");
        let sel = FilterSelection::new()
            .with_regions(["West", "East"])
            .with_years([2017])
            .with_clicked_state("Texas");
        assert_eq!(sel.to_string(), "region=East|West year=2017 state=Texas");
    }

    #[test]
    fn selection_deserializes_with_missing_fields() {
        let sel: FilterSelection = serde_json::from_str(r#"{"regions": ["East"]}"#).unwrap();
        assert_eq!(sel.regions.len(), 1);
        assert!(sel.categories.is_empty());
        assert!(sel.clicked_state.is_none());
    }
}
