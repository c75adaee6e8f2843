//! CSV order data loader.
//!
//! Parses order line-item CSV files into `OrderRecord` structs.
//! Expected CSV columns (Superstore layout):
//!   Row ID, Order ID, Order Date, Ship Date, Ship Mode, Customer ID,
//!   Customer Name, Segment, Country, City, State, Postal Code, Region,
//!   Product ID, Category, Sub-Category, Product Name, Sales
//! and optionally Quantity, Discount, Profit.

use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::LoadError;
use crate::record::OrderRecord;
use crate::types::{YearMonth, YearQuarter};

/// Columns the aggregation pipeline cannot work without.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "Order ID",
    "Order Date",
    "Customer ID",
    "Segment",
    "City",
    "State",
    "Region",
    "Category",
    "Sub-Category",
    "Sales",
];

/// How to read ambiguous `a/b/YYYY` dates. ISO dates are always accepted.
/// US-style month-first unless configured otherwise.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOrder {
    DayFirst,
    #[default]
    MonthFirst,
}

/// A raw CSV row before date parsing and derivation.
#[derive(Debug, Clone, Deserialize)]
struct OrderRow {
    #[serde(rename = "Row ID", default)]
    row_id: Option<u64>,
    #[serde(rename = "Order ID")]
    order_id: String,
    #[serde(rename = "Order Date")]
    order_date: String,
    #[serde(rename = "Ship Date", default)]
    ship_date: Option<String>,
    #[serde(rename = "Ship Mode", default)]
    ship_mode: String,
    #[serde(rename = "Customer ID")]
    customer_id: String,
    #[serde(rename = "Customer Name", default)]
    customer_name: String,
    #[serde(rename = "Segment")]
    segment: String,
    #[serde(rename = "Country", default)]
    country: String,
    #[serde(rename = "City")]
    city: String,
    #[serde(rename = "State")]
    state: String,
    #[serde(rename = "Postal Code", default)]
    postal_code: Option<String>,
    #[serde(rename = "Region")]
    region: String,
    #[serde(rename = "Product ID", default)]
    product_id: String,
    #[serde(rename = "Category")]
    category: String,
    #[serde(rename = "Sub-Category")]
    sub_category: String,
    #[serde(rename = "Product Name", default)]
    product_name: String,
    #[serde(rename = "Sales")]
    sales: f64,
    #[serde(rename = "Quantity", default)]
    quantity: Option<f64>,
    #[serde(rename = "Discount", default)]
    discount: Option<f64>,
    #[serde(rename = "Profit", default)]
    profit: Option<f64>,
}

impl OrderRow {
    fn into_record(self, index: usize, line: u64, date_order: DateOrder) -> Result<OrderRecord, LoadError> {
        let order_date = parse_date(&self.order_date, date_order).ok_or_else(|| LoadError::InvalidDate {
            line,
            column: "Order Date",
            value: self.order_date.clone(),
        })?;
        let ship_date = match self.ship_date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_date(raw, date_order).ok_or_else(|| LoadError::InvalidDate {
                line,
                column: "Ship Date",
                value: raw.to_string(),
            })?),
        };

        let mut record = OrderRecord {
            index,
            row_id: self.row_id,
            order_id: self.order_id,
            order_date,
            ship_date,
            ship_mode: self.ship_mode,
            customer_id: self.customer_id,
            customer_name: self.customer_name,
            segment: self.segment,
            country: self.country,
            city: self.city,
            state: self.state,
            postal_code: self.postal_code.filter(|p| !p.is_empty()),
            region: self.region,
            product_id: self.product_id,
            category: self.category,
            sub_category: self.sub_category,
            product_name: self.product_name,
            sales: self.sales,
            quantity: self.quantity.unwrap_or(0.0),
            discount: self.discount.unwrap_or(0.0),
            profit: self.profit.unwrap_or(0.0),
            year: 0,
            month: 0,
            year_month: YearMonth::new(0, 1),
            year_quarter: YearQuarter::new(0, 1),
            state_code: None,
        };
        record.derive_fields();
        Ok(record)
    }
}

/// Parse an order/ship date.
///
/// Accepts `YYYY-MM-DD` (optionally followed by a time), and `a/b/YYYY` or
/// `a-b-YYYY` read according to `date_order`.
pub fn parse_date(raw: &str, date_order: DateOrder) -> Option<NaiveDate> {
    let date_part = raw.split_whitespace().next()?;
    if let Ok(d) = NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        return Some(d);
    }
    let normalized = date_part.replace('-', "/");
    let format = match date_order {
        DateOrder::DayFirst => "%d/%m/%Y",
        DateOrder::MonthFirst => "%m/%d/%Y",
    };
    NaiveDate::parse_from_str(&normalized, format).ok()
}

/// Load order records from a CSV reader.
pub fn load_orders<R: Read>(reader: R, date_order: DateOrder) -> Result<Vec<OrderRecord>, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    for &column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(LoadError::MissingColumn(column));
        }
    }

    // Quoted fields may span lines, so line numbers come from the reader.
    let mut raw = csv::StringRecord::new();
    let mut records = Vec::new();
    loop {
        let next_line = csv_reader.position().line();
        let more = csv_reader.read_record(&mut raw).map_err(|source| LoadError::Csv {
            line: source.position().map_or(next_line, |p| p.line()),
            source,
        })?;
        if !more {
            break;
        }
        let line = raw.position().map_or(next_line, |p| p.line());
        let row: OrderRow = raw
            .deserialize(Some(&headers))
            .map_err(|source| LoadError::Csv { line, source })?;
        records.push(row.into_record(records.len(), line, date_order)?);
    }

    log::debug!("loaded {} order lines", records.len());
    Ok(records)
}

/// Load order records from a CSV file path.
pub fn load_orders_file(path: &Path, date_order: DateOrder) -> Result<Vec<OrderRecord>, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_orders(file, date_order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE_CSV: &str = "\
Row ID,Order ID,Order Date,Ship Date,Ship Mode,Customer ID,Customer Name,Segment,Country,City,State,Postal Code,Region,Product ID,Category,Sub-Category,Product Name,Sales
1,CA-2017-152156,08/11/2017,11/11/2017,Second Class,CG-12520,Claire Gute,Consumer,United States,Henderson,Kentucky,42420,South,FUR-BO-10001798,Furniture,Bookcases,Bush Somerset Collection Bookcase,261.96
2,CA-2017-152156,08/11/2017,11/11/2017,Second Class,CG-12520,Claire Gute,Consumer,United States,Henderson,Kentucky,42420,South,FUR-CH-10000454,Furniture,Chairs,Hon Deluxe Fabric Upholstered Stacking Chairs,731.94
3,CA-2017-138688,12/06/2017,16/06/2017,Second Class,DV-13045,Darrin Van Huff,Corporate,United States,Los Angeles,California,90036,West,OFF-LA-10000240,Office Supplies,Labels,Self-Adhesive Address Labels,14.62
4,US-2016-108966,11/10/2016,18/10/2016,Standard Class,SO-20335,Sean O'Donnell,Consumer,United States,Fort Lauderdale,Florida,33311,South,FUR-TA-10000577,Furniture,Tables,Bretford CR4500 Series Slim Rectangular Table,957.5775
";

    #[test]
    fn load_sample_csv() {
        let records = load_orders(SAMPLE_CSV.as_bytes(), DateOrder::DayFirst).unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].order_id, "CA-2017-152156");
        assert_eq!(records[0].order_date, NaiveDate::from_ymd_opt(2017, 11, 8).unwrap());
        assert_eq!(records[0].ship_date, NaiveDate::from_ymd_opt(2017, 11, 11));
        assert_eq!(records[0].year_month, YearMonth::new(2017, 11));
        assert_eq!(records[0].state_code, Some("KY"));
        assert_eq!(records[0].postal_code.as_deref(), Some("42420"));
        assert!((records[1].sales - 731.94).abs() < 1e-9);
        assert_eq!(records[2].region, "West");
        assert_eq!(records[3].sub_category, "Tables");
        // Optional measures default to zero.
        assert_eq!(records[0].profit, 0.0);
        assert_eq!(records[0].quantity, 0.0);
        let indices: Vec<usize> = records.iter().map(|r| r.index).collect();
        assert_eq!(indices, [0, 1, 2, 3]);
    }

    #[test]
    fn optional_measure_columns_are_read() {
        let csv_data = "\
Order ID,Order Date,Customer ID,Segment,City,State,Region,Category,Sub-Category,Sales,Quantity,Discount,Profit
A-1,2017-01-05,C1,Consumer,Austin,Texas,Central,Technology,Phones,500.0,2,0.2,-35.5
";
        let records = load_orders(csv_data.as_bytes(), DateOrder::DayFirst).unwrap();
        assert_eq!(records[0].quantity, 2.0);
        assert!((records[0].discount - 0.2).abs() < 1e-12);
        assert!((records[0].profit + 35.5).abs() < 1e-12);
        assert_eq!(records[0].ship_date, None);
        assert_eq!(records[0].row_id, None);
    }

    #[test]
    fn date_order_controls_ambiguous_dates() {
        let day_first = parse_date("03/04/2017", DateOrder::DayFirst).unwrap();
        let month_first = parse_date("03/04/2017", DateOrder::MonthFirst).unwrap();
        assert_eq!(day_first, NaiveDate::from_ymd_opt(2017, 4, 3).unwrap());
        assert_eq!(month_first, NaiveDate::from_ymd_opt(2017, 3, 4).unwrap());
    }

    #[test]
    fn date_parsing_handles_variants() {
        let expected = NaiveDate::from_ymd_opt(2017, 11, 8).unwrap();
        assert_eq!(parse_date("2017-11-08", DateOrder::DayFirst), Some(expected));
        assert_eq!(parse_date("2017-11-08 00:00:00", DateOrder::DayFirst), Some(expected));
        assert_eq!(parse_date("08-11-2017", DateOrder::DayFirst), Some(expected));
        assert_eq!(parse_date("8/11/2017", DateOrder::DayFirst), Some(expected));
        assert_eq!(parse_date("not a date", DateOrder::DayFirst), None);
        assert_eq!(parse_date("", DateOrder::DayFirst), None);
    }

    #[test]
    fn missing_required_column_rejected() {
        let csv_data = "Order ID,Order Date,Sales\nA-1,2017-01-05,10\n";
        let err = load_orders(csv_data.as_bytes(), DateOrder::DayFirst).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn("Customer ID")));
    }

    #[test]
    fn non_numeric_sales_reports_line() {
        let csv_data = "\
Order ID,Order Date,Customer ID,Segment,City,State,Region,Category,Sub-Category,Sales
A-1,2017-01-05,C1,Consumer,Austin,Texas,Central,Technology,Phones,500.0
A-2,2017-01-06,C2,Consumer,Austin,Texas,Central,Technology,Phones,lots
";
        let err = load_orders(csv_data.as_bytes(), DateOrder::DayFirst).unwrap_err();
        match err {
            LoadError::Csv { line, .. } => assert_eq!(line, 3),
            other => panic!("expected Csv error, got {other:?}"),
        }
    }

    #[test]
    fn bad_date_reports_line_and_column() {
        let csv_data = "\
Order ID,Order Date,Customer ID,Segment,City,State,Region,Category,Sub-Category,Sales
A-1,31/31/2017,C1,Consumer,Austin,Texas,Central,Technology,Phones,500.0
";
        let err = load_orders(csv_data.as_bytes(), DateOrder::DayFirst).unwrap_err();
        match err {
            LoadError::InvalidDate { line, column, value } => {
                assert_eq!(line, 2);
                assert_eq!(column, "Order Date");
                assert_eq!(value, "31/31/2017");
            }
            other => panic!("expected InvalidDate, got {other:?}"),
        }
    }

    #[test]
    fn multiline_quoted_field_keeps_line_numbers() {
        let csv_data = "\
Order ID,Order Date,Customer ID,Segment,City,State,Region,Category,Sub-Category,Product Name,Sales
A-1,2017-01-05,C1,Consumer,Austin,Texas,Central,Technology,Phones,\"Desk Phone,
two-line label\",500.0
A-2,13/13/2017,C2,Consumer,Austin,Texas,Central,Technology,Phones,Headset,80.0
";
        let err = load_orders(csv_data.as_bytes(), DateOrder::DayFirst).unwrap_err();
        match err {
            LoadError::InvalidDate { line, .. } => assert_eq!(line, 4),
            other => panic!("expected InvalidDate, got {other:?}"),
        }
    }

    #[test]
    fn ambiguous_dates_default_to_month_first() {
        assert_eq!(DateOrder::default(), DateOrder::MonthFirst);
        let csv_data = "\
Order ID,Order Date,Customer ID,Segment,City,State,Region,Category,Sub-Category,Sales
A-1,11/08/2017,C1,Consumer,Austin,Texas,Central,Technology,Phones,500.0
";
        let records = load_orders(csv_data.as_bytes(), DateOrder::default()).unwrap();
        assert_eq!(records[0].order_date, NaiveDate::from_ymd_opt(2017, 11, 8).unwrap());
    }

    #[test]
    fn load_from_file_and_missing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE_CSV.as_bytes()).unwrap();
        let records = load_orders_file(file.path(), DateOrder::DayFirst).unwrap();
        assert_eq!(records.len(), 4);

        let err = load_orders_file(Path::new("/definitely/not/here.csv"), DateOrder::DayFirst).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
