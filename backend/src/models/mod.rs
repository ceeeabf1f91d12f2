//! Domain models for the sales normalization pipeline.
//!
//! - [`TransactionRecord`] - One raw row of a source table, fields still text
//! - [`PricedRecord`] - A transaction whose quantity and price have been typed
//! - [`SalesRecord`] - One normalized output row (`Sales, Date, Region`)
//! - [`SalesTable`] - The immutable result of a run, handed to consumers by reference

use serde::{Deserialize, Serialize};

/// Columns every source table must provide, in any order.
pub const REQUIRED_COLUMNS: [&str; 5] = ["product", "quantity", "price", "date", "region"];

/// Header of the normalized table. Order is part of the output contract.
pub const OUTPUT_COLUMNS: [&str; 3] = ["Sales", "Date", "Region"];

// =============================================================================
// Source Rows
// =============================================================================

/// Where a row came from: index of its source in the run and its line number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowOrigin {
    pub source: usize,
    pub line: u64,
}

/// A raw transaction row as read from a source table.
///
/// Fields are kept as text until the cleaning stage so a failure can
/// report the exact value that was rejected.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransactionRecord {
    /// Empty cells deserialize to `None` and never match a product filter.
    #[serde(default)]
    pub product: Option<String>,
    pub quantity: String,
    pub price: String,
    pub date: String,
    pub region: String,
    #[serde(skip)]
    pub origin: RowOrigin,
}

impl TransactionRecord {
    pub fn new(
        product: Option<&str>,
        quantity: impl Into<String>,
        price: impl Into<String>,
        date: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            product: product.map(str::to_string),
            quantity: quantity.into(),
            price: price.into(),
            date: date.into(),
            region: region.into(),
            origin: RowOrigin::default(),
        }
    }
}

/// A transaction with typed quantity and price.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedRecord {
    pub product: Option<String>,
    pub quantity: i64,
    pub price: f64,
    pub date: String,
    pub region: String,
    pub origin: RowOrigin,
}

// =============================================================================
// Normalized Output
// =============================================================================

/// One row of the normalized table.
///
/// Field order matches [`OUTPUT_COLUMNS`]; the serde names are the
/// output header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    #[serde(rename = "Sales")]
    pub sales: f64,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Region")]
    pub region: String,
}

/// The normalized sales table produced by a run.
///
/// Built once and never mutated afterwards; consumers borrow it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesTable {
    records: Vec<SalesRecord>,
}

impl SalesTable {
    pub fn new(records: Vec<SalesRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SalesRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of the `Sales` column.
    pub fn total_sales(&self) -> f64 {
        self.records.iter().map(|r| r.sales).sum()
    }
}

impl<'a> IntoIterator for &'a SalesTable {
    type Item = &'a SalesRecord;
    type IntoIter = std::slice::Iter<'a, SalesRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_columns_follow_record_fields() {
        let record = SalesRecord {
            sales: 6.0,
            date: "2021-01-10".into(),
            region: "north".into(),
        };
        let json = serde_json::to_value(&record).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        for col in OUTPUT_COLUMNS {
            assert!(keys.contains(&col), "missing {col}");
        }
    }

    #[test]
    fn test_table_totals() {
        let table = SalesTable::new(vec![
            SalesRecord { sales: 6.0, date: "2021-01-10".into(), region: "north".into() },
            SalesRecord { sales: 1.5, date: "2021-01-11".into(), region: "south".into() },
        ]);
        assert_eq!(table.len(), 2);
        assert!(!table.is_empty());
        assert_eq!(table.total_sales(), 7.5);
        assert_eq!((&table).into_iter().count(), 2);
    }

    #[test]
    fn test_transaction_record_new() {
        let r = TransactionRecord::new(None, "3", "$1.00", "2021-01-01", "east");
        assert!(r.product.is_none());
        assert_eq!(r.origin, RowOrigin::default());
    }
}
