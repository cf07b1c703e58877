//! Batched upload of sanitized rows with a row-by-row fallback.
//!
//! Each batch is first sent as one insert. If that insert fails, every row of
//! the batch is retried on its own so that one bad row only costs itself.
//! Upload errors are logged and counted; they never abort the run.

use std::time::Duration;

use affsync_core::Record;
use affsync_table::TableSink;

/// Rows per bulk insert.
pub(crate) const BATCH_SIZE: usize = 10;

/// A row that could not be inserted on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordFailure {
    /// Position of the row in the full upload.
    pub index: usize,
    pub reason: String,
}

/// Result of uploading one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BatchOutcome {
    /// The bulk insert succeeded; the count is the number of rows the table
    /// echoed back.
    Success(usize),
    /// The bulk insert failed and the rows were inserted one at a time.
    PartialFailure {
        succeeded: usize,
        failed: Vec<RecordFailure>,
    },
}

impl BatchOutcome {
    pub(crate) fn uploaded(&self) -> usize {
        match self {
            Self::Success(count) => *count,
            Self::PartialFailure { succeeded, .. } => *succeeded,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct UploadSummary {
    /// Rows submitted for upload.
    pub attempted: usize,
    /// Rows the table accepted.
    pub uploaded: usize,
    pub batches: Vec<BatchOutcome>,
}

impl UploadSummary {
    /// Rows that were rejected even when inserted on their own.
    pub(crate) fn failures(&self) -> impl Iterator<Item = &RecordFailure> {
        self.batches.iter().flat_map(|batch| match batch {
            BatchOutcome::Success(_) => [].iter(),
            BatchOutcome::PartialFailure { failed, .. } => failed.iter(),
        })
    }
}

/// Uploads `records` in batches of `batch_size`, pausing
/// `inter_batch_delay_ms` between batches.
pub(crate) async fn upload_records<S: TableSink>(
    sink: &S,
    records: &[Record],
    batch_size: usize,
    inter_batch_delay_ms: u64,
) -> UploadSummary {
    let mut summary = UploadSummary {
        attempted: records.len(),
        ..UploadSummary::default()
    };
    let batch_size = batch_size.max(1);
    let batch_count = records.len().div_ceil(batch_size);

    for (batch_idx, batch) in records.chunks(batch_size).enumerate() {
        let batch_no = batch_idx + 1;
        let offset = batch_idx * batch_size;

        let outcome = upload_batch(sink, batch_no, offset, batch).await;
        summary.uploaded += outcome.uploaded();
        tracing::info!(
            batch = batch_no,
            uploaded = summary.uploaded,
            total = summary.attempted,
            "upload progress"
        );
        summary.batches.push(outcome);

        if batch_no < batch_count && inter_batch_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(inter_batch_delay_ms)).await;
        }
    }

    summary
}

async fn upload_batch<S: TableSink>(
    sink: &S,
    batch_no: usize,
    offset: usize,
    batch: &[Record],
) -> BatchOutcome {
    match sink.insert_batch(batch).await {
        Ok(Some(count)) => BatchOutcome::Success(count),
        Ok(None) => {
            tracing::warn!(batch = batch_no, "insert returned no rows in response");
            BatchOutcome::Success(0)
        }
        Err(e) => {
            tracing::warn!(
                batch = batch_no,
                rows = batch.len(),
                error = %e,
                "bulk insert failed; retrying rows individually"
            );
            let mut succeeded = 0usize;
            let mut failed = Vec::new();
            for (i, record) in batch.iter().enumerate() {
                match insert_single(sink, offset + i, record).await {
                    Ok(()) => succeeded += 1,
                    Err(failure) => failed.push(failure),
                }
            }
            BatchOutcome::PartialFailure { succeeded, failed }
        }
    }
}

/// Inserts one row on its own.
pub(crate) async fn insert_single<S: TableSink>(
    sink: &S,
    index: usize,
    record: &Record,
) -> Result<(), RecordFailure> {
    sink.insert_one(record).await.map(|_| ()).map_err(|e| {
        tracing::error!(record = index, error = %e, "failed to insert record");
        RecordFailure {
            index,
            reason: e.to_string(),
        }
    })
}

#[cfg(test)]
#[path = "upload_test.rs"]
mod tests;
