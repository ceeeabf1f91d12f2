//! Per-record cleaning operations.
//!
//! Pure functions on a single record: product matching, currency
//! stripping, numeric parsing and the sales derivation. The pipeline
//! maps these over the combined table.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ParseError;
use crate::models::{PricedRecord, SalesRecord, TransactionRecord};

/// Plain decimal literal: optional sign, digits with optional fraction, optional exponent.
static DECIMAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?$").expect("valid decimal regex")
});

/// Signed integer literal.
static INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?\d+$").expect("valid integer regex"));

/// Case-insensitive exact comparison of a product cell against the target.
///
/// No trimming and no partial matches. A missing product never matches.
pub fn matches_product(product: Option<&str>, target: &str) -> bool {
    match product {
        Some(p) => p.to_lowercase() == target.to_lowercase(),
        None => false,
    }
}

/// Remove a single leading currency symbol, if present.
pub fn strip_currency<'a>(raw: &'a str, symbol: &str) -> &'a str {
    if symbol.is_empty() {
        return raw;
    }
    raw.strip_prefix(symbol).unwrap_or(raw)
}

/// Parse a plain decimal number. Rejects `inf`, `NaN` and anything non-numeric.
pub fn parse_decimal(text: &str) -> Option<f64> {
    if !DECIMAL.is_match(text) {
        return None;
    }
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Clean a currency-prefixed price into a number.
///
/// Whitespace around the cell and between the symbol and the amount is ignored.
pub fn clean_price(raw: &str, symbol: &str) -> Result<f64, ParseError> {
    let stripped = strip_currency(raw.trim(), symbol).trim();
    parse_decimal(stripped).ok_or_else(|| {
        ParseError::new(
            "price",
            raw,
            format!("expected a decimal amount after '{}'", symbol),
        )
    })
}

/// Parse the quantity column. Negative and zero values pass through.
pub fn parse_quantity(raw: &str) -> Result<i64, ParseError> {
    let text = raw.trim();
    if !INTEGER.is_match(text) {
        return Err(ParseError::new("quantity", raw, "expected an integer"));
    }
    text.parse::<i64>()
        .map_err(|e| ParseError::new("quantity", raw, e.to_string()))
}

/// `quantity * price`, unrounded.
pub fn derive_sales(quantity: i64, price: f64) -> f64 {
    quantity as f64 * price
}

/// Type quantity and price of one raw row.
///
/// The returned error carries the column and value; the caller attaches
/// the source location.
pub fn price_record(record: &TransactionRecord, symbol: &str) -> Result<PricedRecord, ParseError> {
    let quantity = parse_quantity(&record.quantity)?;
    let price = clean_price(&record.price, symbol)?;

    Ok(PricedRecord {
        product: record.product.clone(),
        quantity,
        price,
        date: record.date.clone(),
        region: record.region.clone(),
        origin: record.origin,
    })
}

/// Derive sales and project onto the output columns.
pub fn to_sales_record(record: PricedRecord) -> SalesRecord {
    SalesRecord {
        sales: derive_sales(record.quantity, record.price),
        date: record.date,
        region: record.region,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_product_case_insensitive() {
        assert!(matches_product(Some("Pink Morsel"), "pink morsel"));
        assert!(matches_product(Some("PINK MORSEL"), "Pink Morsel"));
        assert!(!matches_product(Some("Gold Bar"), "pink morsel"));
    }

    #[test]
    fn test_matches_product_is_exact() {
        assert!(!matches_product(Some(" pink morsel"), "pink morsel"));
        assert!(!matches_product(Some("pink morsels"), "pink morsel"));
        assert!(!matches_product(Some("pink"), "pink morsel"));
        assert!(!matches_product(None, "pink morsel"));
    }

    #[test]
    fn test_strip_currency() {
        assert_eq!(strip_currency("$3.50", "$"), "3.50");
        assert_eq!(strip_currency("3.50", "$"), "3.50");
        assert_eq!(strip_currency("$$3.50", "$"), "$3.50");
        assert_eq!(strip_currency("€3.50", "€"), "3.50");
        assert_eq!(strip_currency("$3.50", ""), "$3.50");
    }

    #[test]
    fn test_clean_price() {
        assert_eq!(clean_price("$3.00", "$").unwrap(), 3.0);
        assert_eq!(clean_price("$0.5", "$").unwrap(), 0.5);
        assert_eq!(clean_price("4", "$").unwrap(), 4.0);
        assert_eq!(clean_price("$.25", "$").unwrap(), 0.25);
    }

    #[test]
    fn test_clean_price_space_after_symbol() {
        assert_eq!(clean_price("$ 3.00", "$").unwrap(), 3.0);
        assert_eq!(clean_price(" $\t2.50 ", "$").unwrap(), 2.5);
        assert!(clean_price("$ ", "$").is_err());
        assert!(clean_price("$ 3 00", "$").is_err());
    }

    #[test]
    fn test_clean_price_rejects_garbage() {
        for raw in ["free", "$", "", "$ ", "$abc", "$1,000.00", "$inf", "$NaN", "$3.00$"] {
            let err = clean_price(raw, "$").unwrap_err();
            assert_eq!(err.column, "price");
            assert_eq!(err.value, raw);
        }
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("546").unwrap(), 546);
        assert_eq!(parse_quantity("0").unwrap(), 0);
        assert_eq!(parse_quantity("-3").unwrap(), -3);
        assert!(parse_quantity("2.5").is_err());
        assert!(parse_quantity("").is_err());
        assert!(parse_quantity("99999999999999999999").is_err());
    }

    #[test]
    fn test_derive_sales_exact() {
        let price = clean_price("$3.00", "$").unwrap();
        assert_eq!(derive_sales(2, price), 6.0);
        let price = clean_price("$0.1", "$").unwrap();
        assert_eq!(derive_sales(3, price), 3.0 * 0.1);
    }

    #[test]
    fn test_price_record_keeps_passthrough_fields() {
        let mut raw = TransactionRecord::new(Some("pink morsel"), "2", "$3.00", "2021-01-10", "north");
        raw.origin.line = 9;
        let priced = price_record(&raw, "$").unwrap();
        assert_eq!(priced.quantity, 2);
        assert_eq!(priced.price, 3.0);
        assert_eq!(priced.origin.line, 9);

        let sales = to_sales_record(priced);
        assert_eq!(sales.sales, 6.0);
        assert_eq!(sales.date, "2021-01-10");
        assert_eq!(sales.region, "north");
    }

    #[test]
    fn test_price_record_reports_quantity_first() {
        let raw = TransactionRecord::new(Some("pink morsel"), "lots", "free", "2021-01-10", "north");
        let err = price_record(&raw, "$").unwrap_err();
        assert_eq!(err.column, "quantity");
    }
}
