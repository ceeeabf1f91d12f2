//! High-level pipeline API.
//!
//! Runs the stages in order:
//!
//! ```text
//! load ─▶ concatenate ─▶ clean ─▶ filter ─▶ derive/project ─▶ persist
//! ```
//!
//! Every row is typed before filtering, so a malformed price anywhere in
//! the inputs aborts the run. Nothing is written until the whole table
//! has been built.
//!
//! # Example
//!
//! ```rust,ignore
//! use soul_sales::{run, PipelineConfig};
//!
//! let outcome = run(&PipelineConfig::default())?;
//! println!("{} matching rows", outcome.report.matched_rows);
//! ```

use serde::Serialize;
use std::path::{Path, PathBuf};

use super::clean::{matches_product, price_record, to_sales_record};
use crate::config::PipelineConfig;
use crate::error::{IngestResult, ParseError, PipelineResult};
use crate::logs::{log_info, log_info_indent, log_success};
use crate::models::{PricedRecord, SalesTable, TransactionRecord};
use crate::output::persist_table;
use crate::parser::{load_source, LoadedSource};

/// Metadata about one loaded source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceReport {
    pub path: PathBuf,
    pub encoding: String,
    pub delimiter: char,
    pub rows: usize,
}

/// Informational counts for a run. Not part of the data contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub sources: Vec<SourceReport>,
    /// Rows across all sources
    pub total_rows: usize,
    /// Rows matching the target product
    pub matched_rows: usize,
    /// Where the table was written, if it was
    pub output: Option<PathBuf>,
}

/// Result of a pipeline run: the table and what happened.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub table: SalesTable,
    pub report: RunReport,
}

/// All sources unioned into one table.
#[derive(Debug, Clone, Default)]
pub struct CombinedTable {
    pub sources: Vec<SourceReport>,
    pub rows: Vec<TransactionRecord>,
}

/// Load every source, in order. The first failure aborts.
pub fn load_sources(paths: &[PathBuf], delimiter: Option<char>) -> IngestResult<Vec<LoadedSource>> {
    let mut loaded = Vec::with_capacity(paths.len());
    for path in paths {
        log_info(format!("📖 Reading {}", path.display()));
        let source = load_source(path, delimiter)?;
        log_info_indent(
            format!(
                "encoding: {}, delimiter: '{}', rows: {}",
                source.encoding,
                format_delimiter(source.delimiter),
                source.rows.len()
            ),
            1,
        );
        loaded.push(source);
    }
    Ok(loaded)
}

/// Union sources preserving source order, then row order. No deduplication.
pub fn concatenate(sources: Vec<LoadedSource>) -> CombinedTable {
    let total = sources.iter().map(|s| s.rows.len()).sum();
    let mut combined = CombinedTable {
        sources: Vec::with_capacity(sources.len()),
        rows: Vec::with_capacity(total),
    };

    for (index, source) in sources.into_iter().enumerate() {
        combined.sources.push(SourceReport {
            path: source.path,
            encoding: source.encoding,
            delimiter: source.delimiter,
            rows: source.rows.len(),
        });
        combined.rows.extend(source.rows.into_iter().map(|mut row| {
            row.origin.source = index;
            row
        }));
    }

    combined
}

/// Type quantity and price of every row.
///
/// The first failure aborts with the offending source, line and value.
pub fn clean(combined: &CombinedTable, currency_symbol: &str) -> Result<Vec<PricedRecord>, ParseError> {
    combined
        .rows
        .iter()
        .map(|row| {
            price_record(row, currency_symbol).map_err(|e| {
                let path = combined
                    .sources
                    .get(row.origin.source)
                    .map(|s| s.path.clone())
                    .unwrap_or_default();
                e.at(path, row.origin.line)
            })
        })
        .collect()
}

/// Keep rows whose product equals `product`, ignoring case.
pub fn filter_product(rows: Vec<PricedRecord>, product: &str) -> Vec<PricedRecord> {
    rows.into_iter()
        .filter(|row| matches_product(row.product.as_deref(), product))
        .collect()
}

/// Derive sales and project onto `Sales, Date, Region`.
pub fn project(rows: Vec<PricedRecord>) -> SalesTable {
    SalesTable::new(rows.into_iter().map(to_sales_record).collect())
}

/// Build the normalized table without writing it.
pub fn normalize(config: &PipelineConfig) -> PipelineResult<PipelineRun> {
    config.validate()?;

    let loaded = load_sources(&config.sources, config.delimiter)?;
    let combined = concatenate(loaded);
    let total_rows = combined.rows.len();
    log_success(format!(
        "Read {} rows from {} source(s)",
        total_rows,
        combined.sources.len()
    ));

    log_info(format!("💲 Cleaning prices (prefix '{}')...", config.currency_symbol));
    let priced = clean(&combined, &config.currency_symbol)?;

    log_info(format!("🔎 Filtering for '{}'...", config.product));
    let matched = filter_product(priced, &config.product);
    let matched_rows = matched.len();
    log_success(format!("{} matching rows", matched_rows));

    let table = project(matched);

    Ok(PipelineRun {
        table,
        report: RunReport {
            sources: combined.sources,
            total_rows,
            matched_rows,
            output: None,
        },
    })
}

/// Run the full pipeline and publish the table at `config.output`.
pub fn run(config: &PipelineConfig) -> PipelineResult<PipelineRun> {
    let mut outcome = normalize(config)?;

    log_info(format!("💾 Writing {}...", config.output.display()));
    persist_table(&outcome.table, &config.output)?;
    log_success(format!(
        "Wrote {} rows to {}",
        outcome.table.len(),
        config.output.display()
    ));

    outcome.report.output = Some(config.output.clone());
    Ok(outcome)
}

/// Write the run report as pretty JSON.
pub fn write_report(report: &RunReport, path: &Path) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)
}

/// Format delimiter for display
fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}
