//! Transformation module.
//!
//! - Clean: pure per-record operations (matching, currency stripping, sales derivation)
//! - Pipeline: the staged run from source tables to the normalized table

pub mod clean;
pub mod pipeline;

pub use clean::{clean_price, derive_sales, matches_product, parse_decimal, parse_quantity, strip_currency};
pub use pipeline::*;
