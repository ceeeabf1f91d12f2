//! Error types for the sales normalization pipeline.
//!
//! - [`IngestError`] - a source table is missing, unreadable or has the wrong schema
//! - [`ParseError`] - a field of one row cannot be typed
//! - [`PersistError`] - the output table cannot be written
//! - [`ConfigError`] - the configuration file or values are invalid
//! - [`SummaryError`] - the daily summary cannot be built
//! - [`PipelineError`] - top-level error returned by [`crate::run`]
//!
//! Conversions into [`PipelineError`] are automatic via `From`,
//! so `?` works across stage boundaries.

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// Ingestion Errors
// =============================================================================

/// Errors while loading a source table.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Source location does not exist.
    #[error("Source not found: {}", .path.display())]
    Missing { path: PathBuf },

    /// Source exists but could not be read.
    #[error("Cannot read source {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Source bytes could not be decoded to text.
    #[error("Cannot decode source {} as {encoding}", .path.display())]
    Encoding { path: PathBuf, encoding: String },

    /// Source has no header line.
    #[error("Source {} is empty", .path.display())]
    Empty { path: PathBuf },

    /// Header is missing one or more required columns.
    #[error("Source {} is missing required column(s): {}", .path.display(), .columns.join(", "))]
    MissingColumns { path: PathBuf, columns: Vec<String> },

    /// The delimited text itself is malformed.
    #[error("Malformed source {} at line {line}: {message}", .path.display())]
    Malformed {
        path: PathBuf,
        line: u64,
        message: String,
    },
}

impl IngestError {
    /// Path of the source that failed.
    pub fn path(&self) -> &std::path::Path {
        match self {
            IngestError::Missing { path }
            | IngestError::Unreadable { path, .. }
            | IngestError::Encoding { path, .. }
            | IngestError::Empty { path }
            | IngestError::MissingColumns { path, .. }
            | IngestError::Malformed { path, .. } => path,
        }
    }
}

// =============================================================================
// Field Parse Errors
// =============================================================================

/// A single field of a single row could not be typed.
///
/// Carries enough context to locate the offending cell: the source file,
/// the 1-based line number (header is line 1), the column and its raw value.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}, line {line}, column '{column}' (value '{value}'): {message}", .path.display())]
pub struct ParseError {
    pub path: PathBuf,
    pub line: u64,
    pub column: String,
    pub value: String,
    pub message: String,
}

impl ParseError {
    pub fn new(column: impl Into<String>, value: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: PathBuf::new(),
            line: 0,
            column: column.into(),
            value: value.into(),
            message: message.into(),
        }
    }

    /// Attach the row location once it is known.
    pub fn at(mut self, path: impl Into<PathBuf>, line: u64) -> Self {
        self.path = path.into();
        self.line = line;
        self
    }
}

// =============================================================================
// Persist Errors
// =============================================================================

/// Errors while writing the normalized table.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Could not create the output directory or the staging file.
    #[error("Cannot stage output next to {}: {source}", .path.display())]
    Stage {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Serializing a row failed.
    #[error("Cannot write output {}: {source}", .path.display())]
    Write { path: PathBuf, source: csv::Error },

    /// Flushing the staged file failed.
    #[error("Cannot flush output {}: {source}", .path.display())]
    Flush {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Moving the staged file into place failed.
    #[error("Cannot publish output {}: {source}", .path.display())]
    Publish {
        path: PathBuf,
        source: std::io::Error,
    },
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while building the pipeline configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// =============================================================================
// Summary Errors
// =============================================================================

/// Errors while aggregating a sales table into daily totals.
#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// A `Date` value is not a recognised calendar date.
    #[error("Row {row}: unrecognised date '{value}'")]
    InvalidDate { row: usize, value: String },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline error.
///
/// Every variant is fatal: the run stops and no output is published.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Persist error: {0}")]
    Persist(#[from] PersistError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for ingestion.
pub type IngestResult<T> = Result<T, IngestError>;

/// Result type for persisting output.
pub type PersistResult<T> = Result<T, PersistError>;

/// Result type for configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for daily summaries.
pub type SummaryResult<T> = Result<T, SummaryError>;

/// Result type for pipeline runs.
pub type PipelineResult<T> = Result<T, PipelineError>;
