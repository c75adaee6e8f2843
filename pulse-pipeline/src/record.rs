//! The immutable in-memory order dataset.

use std::collections::HashSet;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::error::LoadError;
use crate::order_loader::{load_orders_file, DateOrder};
use crate::states;
use crate::types::{Dimension, YearMonth, YearQuarter};

/// One order line-item, with calendar fields derived at load time.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OrderRecord {
    /// Zero-based position in the loaded dataset. Unique per store.
    pub index: usize,
    pub row_id: Option<u64>,
    pub order_id: String,
    pub order_date: NaiveDate,
    pub ship_date: Option<NaiveDate>,
    pub ship_mode: String,
    pub customer_id: String,
    pub customer_name: String,
    pub segment: String,
    pub country: String,
    pub city: String,
    pub state: String,
    pub postal_code: Option<String>,
    pub region: String,
    pub product_id: String,
    pub category: String,
    pub sub_category: String,
    pub product_name: String,
    pub sales: f64,
    pub quantity: f64,
    pub discount: f64,
    pub profit: f64,

    // Derived once from order_date / state.
    pub year: i32,
    pub month: u32,
    pub year_month: YearMonth,
    pub year_quarter: YearQuarter,
    pub state_code: Option<&'static str>,
}

impl OrderRecord {
    /// Build a record with the required fields; optional columns default to
    /// empty/zero. Derived fields are filled in from `order_date` and `state`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        order_id: impl Into<String>,
        order_date: NaiveDate,
        customer_id: impl Into<String>,
        segment: impl Into<String>,
        region: impl Into<String>,
        state: impl Into<String>,
        city: impl Into<String>,
        category: impl Into<String>,
        sub_category: impl Into<String>,
        sales: f64,
    ) -> Self {
        let mut record = OrderRecord {
            index: 0,
            row_id: None,
            order_id: order_id.into(),
            order_date,
            ship_date: None,
            ship_mode: String::new(),
            customer_id: customer_id.into(),
            customer_name: String::new(),
            segment: segment.into(),
            country: "United States".into(),
            city: city.into(),
            state: state.into(),
            postal_code: None,
            region: region.into(),
            product_id: String::new(),
            category: category.into(),
            sub_category: sub_category.into(),
            product_name: String::new(),
            sales,
            quantity: 0.0,
            discount: 0.0,
            profit: 0.0,
            year: 0,
            month: 0,
            year_month: YearMonth::new(0, 1),
            year_quarter: YearQuarter::new(0, 1),
            state_code: None,
        };
        record.derive_fields();
        record
    }

    /// Recompute calendar and lookup fields.
    pub fn derive_fields(&mut self) {
        self.year = self.order_date.year();
        self.month = self.order_date.month();
        self.year_month = YearMonth::new(self.year, self.month);
        self.year_quarter = YearQuarter::from_month(self.year_month);
        self.state_code = states::state_code(&self.state);
    }

    pub fn with_profit(mut self, profit: f64) -> Self {
        self.profit = profit;
        self
    }

    pub fn with_quantity(mut self, quantity: f64) -> Self {
        self.quantity = quantity;
        self
    }
}

/// Read-only record set shared by every recomputation pass.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: Vec<OrderRecord>,
}

impl RecordStore {
    /// Take ownership of `records`, renumbering `index` to match position.
    pub fn new(mut records: Vec<OrderRecord>) -> Self {
        for (i, record) in records.iter_mut().enumerate() {
            record.index = i;
        }
        Self { records }
    }

    /// Load a store from a CSV file.
    pub fn load(path: impl AsRef<Path>, date_order: DateOrder) -> Result<Self, LoadError> {
        let records = load_orders_file(path.as_ref(), date_order)?;
        log::info!(
            "path={} loaded {} order lines",
            path.as_ref().display(),
            records.len()
        );
        Ok(Self::new(records))
    }

    pub fn records(&self) -> &[OrderRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct values of a dimension in first-encountered order, i.e. the
    /// options a multi-select widget would offer.
    pub fn options(&self, dimension: Dimension) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for record in &self.records {
            let value = dimension.value_of(record);
            if !seen.contains(value.as_ref()) {
                seen.insert(value.to_string());
                out.push(value.into_owned());
            }
        }
        out
    }
}
