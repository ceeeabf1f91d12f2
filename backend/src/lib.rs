//! # Soul Sales - Pink Morsel sales normalization
//!
//! Soul Sales merges the daily per-region transaction exports into one
//! table of Pink Morsel sales that the chart front-end reads.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Source CSVs │────▶│   Parser    │────▶│  Transform  │────▶│ Output CSV  │
//! │  (N files)  │     │  (auto-enc) │     │ (clean+flt) │     │ Sales,Date, │
//! │             │     │             │     │             │     │   Region    │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use soul_sales::{run, PipelineConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let outcome = run(&PipelineConfig::default())?;
//!     println!("Wrote {} rows", outcome.table.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per stage
//! - [`config`] - Layered run configuration
//! - [`models`] - Transaction and sales records
//! - [`parser`] - Source loading with encoding/delimiter detection
//! - [`transform`] - Cleaning functions and the pipeline
//! - [`output`] - Atomic table persistence
//! - [`summary`] - Daily series for the chart front-end
//! - [`logs`] - Status reporting

// Core modules
pub mod config;
pub mod error;
pub mod logs;
pub mod models;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Output
pub mod output;

// Consumer-side aggregation
pub mod summary;

// =============================================================================
// Re-exports - Errors
// =============================================================================

pub use error::{
    ConfigError,
    IngestError,
    ParseError,
    PersistError,
    PipelineError,
    SummaryError,
};

// =============================================================================
// Re-exports - Models & Config
// =============================================================================

pub use config::PipelineConfig;

pub use models::{
    PricedRecord,
    RowOrigin,
    SalesRecord,
    SalesTable,
    TransactionRecord,
    OUTPUT_COLUMNS,
    REQUIRED_COLUMNS,
};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_content,
    detect_delimiter,
    detect_encoding,
    load_bytes,
    load_source,
    read_text,
    LoadedSource,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    clean,
    concatenate,
    filter_product,
    load_sources,
    normalize,
    project,
    run,
    write_report,
    CombinedTable,
    PipelineRun,
    RunReport,
    SourceReport,
};

pub use transform::clean::{
    clean_price,
    derive_sales,
    matches_product,
    strip_currency,
};

// =============================================================================
// Re-exports - Output & Summary
// =============================================================================

pub use output::{persist_table, to_csv_string, write_table};

pub use summary::{
    compare_around,
    daily_totals,
    load_sales_table,
    DailyTotal,
    MarkerComparison,
    RegionFilter,
};
