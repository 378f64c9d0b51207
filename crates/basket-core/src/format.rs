//! Display formatting for result cells and column headers.
//!
//! Formatting is driven by a [`ColumnVocabulary`]: price columns get two
//! fractional digits, timestamp columns are rendered as `DD/MM/YYYY HH:MM`,
//! everything else is shown as-is. Every function here is total.

use basket_types::CellValue;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Shown for null or missing cells.
pub const NOT_AVAILABLE: &str = "N/A";

const TIMESTAMP_DISPLAY: &str = "%d/%m/%Y %H:%M";

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const DEFAULT_PRICE_COLUMNS: &[&str] = &[
    "ItemPrice",
    "DiscountedPrice",
    "UnitOfMeasurePrice",
    "Price",
    "MinPrice",
    "MaxPrice",
    "AvgPrice",
];

const DEFAULT_TIMESTAMP_COLUMNS: &[&str] = &[
    "LastUpdate",
    "PriceUpdateDate",
    "PromotionStartDate",
    "PromotionEndDate",
];

const DEFAULT_LABELS: &[(&str, &str)] = &[
    ("ChainId", "Chain"),
    ("StoreId", "Store #"),
    ("StoreName", "Store"),
    ("City", "City"),
    ("ItemName", "Item"),
    ("ItemPrice", "Price"),
    ("ManufacturerName", "Manufacturer"),
    ("ItemCode", "Barcode"),
    ("Quantity", "Quantity"),
    ("UnitQty", "Unit"),
    ("LastUpdate", "Last Update"),
    ("PromotionDescription", "Promotion"),
    ("DiscountRate", "Discount %"),
    ("DiscountedPrice", "Discounted Price"),
];

/// Which columns are prices, which are timestamps, and what to call them.
///
/// Column names are matched case-insensitively.
#[derive(Debug, Clone)]
pub struct ColumnVocabulary {
    price_columns: HashSet<String>,
    timestamp_columns: HashSet<String>,
    labels: HashMap<String, String>,
}

impl Default for ColumnVocabulary {
    fn default() -> Self {
        let mut vocabulary = Self::empty();
        for column in DEFAULT_PRICE_COLUMNS {
            vocabulary.add_price_column(column);
        }
        for column in DEFAULT_TIMESTAMP_COLUMNS {
            vocabulary.add_timestamp_column(column);
        }
        for (column, label) in DEFAULT_LABELS {
            vocabulary.add_label(column, label);
        }
        vocabulary
    }
}

impl ColumnVocabulary {
    /// A vocabulary that recognizes nothing: every cell is shown literally.
    pub fn empty() -> Self {
        Self {
            price_columns: HashSet::new(),
            timestamp_columns: HashSet::new(),
            labels: HashMap::new(),
        }
    }

    pub fn add_price_column(&mut self, column: &str) {
        self.price_columns.insert(column.to_lowercase());
    }

    pub fn add_timestamp_column(&mut self, column: &str) {
        self.timestamp_columns.insert(column.to_lowercase());
    }

    pub fn add_label(&mut self, column: &str, label: &str) {
        self.labels.insert(column.to_lowercase(), label.to_string());
    }

    pub fn is_price_column(&self, column: &str) -> bool {
        self.price_columns.contains(&column.to_lowercase())
    }

    pub fn is_timestamp_column(&self, column: &str) -> bool {
        self.timestamp_columns.contains(&column.to_lowercase())
    }

    /// Friendly header for a column, or the raw name when none is registered.
    pub fn label<'a>(&'a self, column: &'a str) -> &'a str {
        self.labels
            .get(&column.to_lowercase())
            .map(String::as_str)
            .unwrap_or(column)
    }

    /// Display string for one cell of `column`.
    pub fn format_cell(&self, value: &CellValue, column: &str) -> String {
        if value.is_null() {
            return NOT_AVAILABLE.to_string();
        }
        if self.is_price_column(column) {
            if let Some(price) = format_price(value) {
                return price;
            }
        } else if self.is_timestamp_column(column) {
            if let Some(timestamp) = format_timestamp(value) {
                return timestamp;
            }
        }
        literal(value)
    }
}

/// Format a cell with the given vocabulary. See [`ColumnVocabulary::format_cell`].
pub fn format_cell(value: &CellValue, column: &str, vocabulary: &ColumnVocabulary) -> String {
    vocabulary.format_cell(value, column)
}

/// Fixed-point with two fractional digits, if the value is numeric.
fn format_price(value: &Value) -> Option<String> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then(|| format!("{:.2}", number))
}

/// `DD/MM/YYYY HH:MM`, if the value parses as a date or date-time.
///
/// Values with an offset are rendered in their own offset, not converted.
fn format_timestamp(value: &Value) -> Option<String> {
    let raw = value.as_str()?.trim();
    parse_timestamp(raw).map(|ts| ts.format(TIMESTAMP_DISPLAY).to_string())
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.naive_local());
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(ts);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// The value's own string form: strings unquoted, everything else as JSON.
fn literal(value: &Value) -> String {
    match value {
        Value::Null => NOT_AVAILABLE.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn vocab() -> ColumnVocabulary {
        ColumnVocabulary::default()
    }

    #[test]
    fn test_null_is_sentinel() {
        assert_eq!(vocab().format_cell(&Value::Null, "ItemPrice"), NOT_AVAILABLE);
        assert_eq!(vocab().format_cell(&Value::Null, "LastUpdate"), NOT_AVAILABLE);
        assert_eq!(vocab().format_cell(&Value::Null, "Anything"), NOT_AVAILABLE);
    }

    #[test]
    fn test_price_two_decimals() {
        let v = vocab();
        assert_eq!(v.format_cell(&json!(6.9), "ItemPrice"), "6.90");
        assert_eq!(v.format_cell(&json!(7.25), "ItemPrice"), "7.25");
        assert_eq!(v.format_cell(&json!(12), "DiscountedPrice"), "12.00");
        assert_eq!(v.format_cell(&json!(3.14159), "ItemPrice"), "3.14");
        assert_eq!(v.format_cell(&json!("4.5"), "ItemPrice"), "4.50");
    }

    #[test]
    fn test_price_never_scientific() {
        assert_eq!(
            vocab().format_cell(&json!(1e21), "ItemPrice"),
            "1000000000000000000000.00"
        );
        assert_eq!(vocab().format_cell(&json!(1e-7), "ItemPrice"), "0.00");
    }

    #[test]
    fn test_price_non_numeric_falls_back() {
        let v = vocab();
        assert_eq!(v.format_cell(&json!("free"), "ItemPrice"), "free");
        assert_eq!(v.format_cell(&json!(true), "ItemPrice"), "true");
        assert_eq!(v.format_cell(&json!("NaN"), "ItemPrice"), "NaN");
    }

    #[test]
    fn test_price_column_match_is_case_insensitive() {
        assert_eq!(vocab().format_cell(&json!(2), "itemprice"), "2.00");
        assert_eq!(vocab().format_cell(&json!(2), "min_price"), "2");
    }

    #[test]
    fn test_timestamp_formats() {
        let v = vocab();
        assert_eq!(
            v.format_cell(&json!("2024-01-15 09:05:00"), "LastUpdate"),
            "15/01/2024 09:05"
        );
        assert_eq!(
            v.format_cell(&json!("2024-01-15T21:30:59"), "LastUpdate"),
            "15/01/2024 21:30"
        );
        assert_eq!(
            v.format_cell(&json!("2024-01-15T21:30:59.123456"), "PriceUpdateDate"),
            "15/01/2024 21:30"
        );
        assert_eq!(
            v.format_cell(&json!("2024-03-01T08:00:00+02:00"), "LastUpdate"),
            "01/03/2024 08:00"
        );
        assert_eq!(v.format_cell(&json!("2024-12-31"), "LastUpdate"), "31/12/2024 00:00");
    }

    #[test]
    fn test_timestamp_malformed_falls_back() {
        let v = vocab();
        assert_eq!(v.format_cell(&json!("yesterday"), "LastUpdate"), "yesterday");
        assert_eq!(v.format_cell(&json!("2024-13-45"), "LastUpdate"), "2024-13-45");
        assert_eq!(v.format_cell(&json!(1705310700), "LastUpdate"), "1705310700");
    }

    #[test]
    fn test_plain_columns_are_literal() {
        let v = vocab();
        assert_eq!(v.format_cell(&json!("Store A"), "StoreName"), "Store A");
        assert_eq!(v.format_cell(&json!(6.9), "Quantity"), "6.9");
        assert_eq!(v.format_cell(&json!(42), "StoreId"), "42");
        assert_eq!(v.format_cell(&json!([1, 2]), "Tags"), "[1,2]");
    }

    #[test]
    fn test_labels_default_to_raw_name() {
        let v = vocab();
        assert_eq!(v.label("StoreName"), "Store");
        assert_eq!(v.label("ItemPrice"), "Price");
        assert_eq!(v.label("count()"), "count()");
    }

    #[test]
    fn test_empty_vocabulary_is_literal() {
        let v = ColumnVocabulary::empty();
        assert_eq!(v.format_cell(&json!(6.9), "ItemPrice"), "6.9");
        assert_eq!(v.label("ItemPrice"), "ItemPrice");
    }

    #[test]
    fn test_custom_columns() {
        let mut v = ColumnVocabulary::empty();
        v.add_price_column("cheapest");
        v.add_timestamp_column("seen_at");
        v.add_label("cheapest", "Cheapest");
        assert_eq!(format_cell(&json!(1.5), "cheapest", &v), "1.50");
        assert_eq!(format_cell(&json!("2024-02-02 10:00:00"), "seen_at", &v), "02/02/2024 10:00");
        assert_eq!(v.label("Cheapest"), "Cheapest");
    }

    fn arb_cell() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            any::<f64>().prop_map(Value::from),
            ".*".prop_map(Value::from),
            "[0-9]{4}-[0-9]{2}-[0-9]{2}[ T][0-9]{2}:[0-9]{2}:[0-9]{2}".prop_map(Value::from),
        ]
    }

    proptest! {
        #[test]
        fn prop_format_is_total_and_deterministic(
            cell in arb_cell(),
            column in prop_oneof![
                Just("ItemPrice".to_string()),
                Just("LastUpdate".to_string()),
                "[A-Za-z_]{0,12}",
            ],
        ) {
            let v = ColumnVocabulary::default();
            let first = v.format_cell(&cell, &column);
            let second = v.format_cell(&cell, &column);
            prop_assert_eq!(&first, &second);
            if cell.is_null() {
                prop_assert_eq!(first.as_str(), NOT_AVAILABLE);
            }
        }

        #[test]
        fn prop_numeric_price_has_two_decimals(price in -1.0e9f64..1.0e9f64) {
            let formatted = ColumnVocabulary::default().format_cell(&Value::from(price), "ItemPrice");
            let (_, fraction) = formatted.split_once('.').unwrap();
            prop_assert_eq!(fraction.len(), 2);
        }
    }
}
