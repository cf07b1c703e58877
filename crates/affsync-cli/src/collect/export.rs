//! Optional CSV copy of the flattened dataset.
//!
//! The file holds every flattened column, including ones the destination
//! table does not know. A new file gets a header line; an existing file is
//! appended to without one.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use affsync_core::FlattenedDataset;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ExportStatus {
    /// No output path was given.
    Skipped,
    Created(PathBuf),
    Appended(PathBuf),
    /// Writing failed; the upload still runs.
    Failed(String),
}

/// Writes `dataset` to `path` when one is given. Errors are logged and
/// returned as [`ExportStatus::Failed`].
pub(crate) fn export_dataset(path: Option<&Path>, dataset: &FlattenedDataset) -> ExportStatus {
    let Some(path) = path else {
        tracing::info!("no output file given; skipping CSV export");
        return ExportStatus::Skipped;
    };

    match write_csv(path, dataset) {
        Ok(true) => {
            tracing::info!(path = %path.display(), rows = dataset.len(), "appended to existing file");
            ExportStatus::Appended(path.to_path_buf())
        }
        Ok(false) => {
            tracing::info!(path = %path.display(), rows = dataset.len(), "created new file");
            ExportStatus::Created(path.to_path_buf())
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "failed to write CSV export");
            ExportStatus::Failed(format!("{e:#}"))
        }
    }
}

/// Appends `dataset` to `path`, writing the header only when the file did not
/// exist yet. Returns `true` when an existing file was appended to.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or written.
pub(crate) fn write_csv(path: &Path, dataset: &FlattenedDataset) -> anyhow::Result<bool> {
    let existed = path.is_file();
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    if !existed {
        writer.write_record(&dataset.columns)?;
    }
    for row in &dataset.rows {
        writer.write_record(dataset.columns.iter().map(|column| cell(row.get(column))))?;
    }
    writer.flush()?;
    Ok(existed)
}

/// Text for one CSV cell: empty for null, raw text for strings, JSON text
/// for everything else.
fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
