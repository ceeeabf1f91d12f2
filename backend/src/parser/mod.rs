//! Source table loading with encoding and delimiter auto-detection.
//!
//! Turns one delimited-text file into a [`LoadedSource`] of raw
//! [`TransactionRecord`]s. Typing of quantity and price happens later.

use std::path::{Path, PathBuf};

use crate::error::{IngestError, IngestResult};
use crate::models::{RowOrigin, TransactionRecord, REQUIRED_COLUMNS};

/// Delimiters tried by [`detect_delimiter`], in tie-break order.
const CANDIDATE_DELIMITERS: [char; 4] = [',', ';', '\t', '|'];

/// A source table held in memory with its detection metadata.
#[derive(Debug, Clone)]
pub struct LoadedSource {
    pub path: PathBuf,
    /// Detected encoding
    pub encoding: String,
    /// Detected or configured delimiter
    pub delimiter: char,
    /// Column headers as found in the file
    pub headers: Vec<String>,
    /// Data rows in file order
    pub rows: Vec<TransactionRecord>,
}

/// Detect the encoding of raw bytes.
///
/// Valid UTF-8 is always taken as UTF-8; chardet is only asked otherwise.
pub fn detect_encoding(bytes: &[u8]) -> String {
    if std::str::from_utf8(bytes).is_ok() {
        return "utf-8".to_string();
    }

    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" | "utf-8-sig" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes using the given encoding.
///
/// Returns `None` when the bytes are declared UTF-8 but are not valid UTF-8.
/// Unknown encodings fall back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> Option<String> {
    let text = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8(bytes.to_vec()).ok()?,
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.into_owned()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    };

    Some(match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    })
}

/// Detect the delimiter by counting occurrences in the header line.
///
/// Falls back to `,` when no candidate appears.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &CANDIDATE_DELIMITERS {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// 1-based physical line of the record that `csv` reports at `byte`.
///
/// `csv` positions a record where reading resumed, which is before any blank
/// lines it skipped, so line terminators at `byte` are stepped over first.
pub fn physical_line(content: &str, byte: u64) -> u64 {
    let bytes = content.as_bytes();
    let mut start = usize::try_from(byte).unwrap_or(usize::MAX).min(bytes.len());
    while start < bytes.len() && matches!(bytes[start], b'\r' | b'\n') {
        start += 1;
    }
    bytes[..start].iter().filter(|&&b| b == b'\n').count() as u64 + 1
}

fn record_line(content: &str, position: Option<&csv::Position>) -> u64 {
    position.map(|p| physical_line(content, p.byte())).unwrap_or(0)
}

/// Read a file and decode it to text, returning the encoding used.
pub fn read_text(path: &Path) -> IngestResult<(String, String)> {
    if !path.exists() {
        return Err(IngestError::Missing {
            path: path.to_path_buf(),
        });
    }

    let bytes = std::fs::read(path).map_err(|source| IngestError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;

    decode_bytes(path, &bytes)
}

fn decode_bytes(path: &Path, bytes: &[u8]) -> IngestResult<(String, String)> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding).ok_or_else(|| IngestError::Encoding {
        path: path.to_path_buf(),
        encoding: encoding.clone(),
    })?;
    Ok((encoding, content))
}

/// Load one source table from disk.
///
/// `delimiter` overrides auto-detection when set.
pub fn load_source(path: &Path, delimiter: Option<char>) -> IngestResult<LoadedSource> {
    let (encoding, content) = read_text(path)?;
    load_text(path, encoding, content, delimiter)
}

/// Load a source table from bytes already in memory.
///
/// `path` is only used to label rows and errors.
pub fn load_bytes(path: &Path, bytes: &[u8], delimiter: Option<char>) -> IngestResult<LoadedSource> {
    let (encoding, content) = decode_bytes(path, bytes)?;
    load_text(path, encoding, content, delimiter)
}

fn load_text(
    path: &Path,
    encoding: String,
    content: String,
    delimiter: Option<char>,
) -> IngestResult<LoadedSource> {
    if content.trim().is_empty() {
        return Err(IngestError::Empty {
            path: path.to_path_buf(),
        });
    }

    let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(&content));
    let (headers, rows) = parse_table(path, &content, delimiter)?;

    Ok(LoadedSource {
        path: path.to_path_buf(),
        encoding,
        delimiter,
        headers,
        rows,
    })
}

/// Parse decoded text into headers and raw transaction rows.
///
/// Blank lines are skipped but still counted in row line numbers. Extra
/// columns are ignored; missing required columns are an error.
pub fn parse_table(
    path: &Path,
    content: &str,
    delimiter: char,
) -> IngestResult<(Vec<String>, Vec<TransactionRecord>)> {
    let malformed = |line: u64, err: &csv::Error| IngestError::Malformed {
        path: path.to_path_buf(),
        line,
        message: err.to_string(),
    };

    let delimiter = u8::try_from(delimiter).map_err(|_| IngestError::Malformed {
        path: path.to_path_buf(),
        line: 1,
        message: format!("delimiter '{}' is not a single byte", delimiter),
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::Headers)
        .from_reader(content.as_bytes());

    let headers = reader.headers().map_err(|e| malformed(1, &e))?.clone();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(IngestError::MissingColumns {
            path: path.to_path_buf(),
            columns: missing,
        });
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| malformed(record_line(content, e.position()), &e))?;
        let line = record_line(content, record.position());

        let mut row: TransactionRecord = record
            .deserialize(Some(&headers))
            .map_err(|e| malformed(line, &e))?;
        row.origin = RowOrigin { source: 0, line };
        rows.push(row);
    }

    Ok((headers.iter().map(str::to_string).collect(), rows))
}
