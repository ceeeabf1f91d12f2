//! Normalized table serialization.
//!
//! The table is written to a staging file in the output directory and
//! renamed over the target only once every row has been flushed, so a
//! reader sees either the previous file or the complete new one. The
//! published file keeps the mode of the file it replaces; a new file gets
//! `0644` on Unix rather than the staging file's private `0600`.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{PersistError, PersistResult};
use crate::models::{SalesTable, OUTPUT_COLUMNS};

/// Serialize `table` as comma-separated text with a `Sales,Date,Region` header.
///
/// The header is written even when the table is empty.
pub fn write_table<W: Write>(table: &SalesTable, writer: W) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    wtr.write_record(OUTPUT_COLUMNS)?;
    for record in table {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Render `table` to a string, as it would be persisted.
pub fn to_csv_string(table: &SalesTable) -> Result<String, csv::Error> {
    let mut buf = Vec::new();
    write_table(table, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Atomically replace `path` with the serialized table.
///
/// On any error the staging file is removed and an existing file at
/// `path` is left as it was.
pub fn persist_table(table: &SalesTable, path: &Path) -> PersistResult<()> {
    let dir = staging_dir(path);
    std::fs::create_dir_all(&dir).map_err(|source| PersistError::Stage {
        path: path.to_path_buf(),
        source,
    })?;

    let mut staged = NamedTempFile::new_in(&dir).map_err(|source| PersistError::Stage {
        path: path.to_path_buf(),
        source,
    })?;

    write_table(table, staged.as_file_mut()).map_err(|source| PersistError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(permissions) = published_permissions(path) {
        staged
            .as_file()
            .set_permissions(permissions)
            .map_err(|source| PersistError::Stage {
                path: path.to_path_buf(),
                source,
            })?;
    }

    staged
        .as_file()
        .sync_all()
        .map_err(|source| PersistError::Flush {
            path: path.to_path_buf(),
            source,
        })?;

    staged.persist(path).map_err(|e| PersistError::Publish {
        path: path.to_path_buf(),
        source: e.error,
    })?;

    Ok(())
}

/// Permissions the published file should carry.
fn published_permissions(path: &Path) -> Option<std::fs::Permissions> {
    if let Ok(meta) = std::fs::metadata(path) {
        return Some(meta.permissions());
    }
    default_permissions()
}

#[cfg(unix)]
fn default_permissions() -> Option<std::fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(std::fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<std::fs::Permissions> {
    None
}

fn staging_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
