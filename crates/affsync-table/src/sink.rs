use std::future::Future;

use affsync_core::Record;

use crate::error::TableError;

/// Write side of the destination table, as seen by the uploader.
pub trait TableSink {
    /// Inserts `rows` in one call. Returns the number of rows the table echoed
    /// back, or `None` when the response carried no rows.
    fn insert_batch(
        &self,
        rows: &[Record],
    ) -> impl Future<Output = Result<Option<usize>, TableError>>;

    /// Inserts a single row as a one-element batch.
    fn insert_one(&self, row: &Record) -> impl Future<Output = Result<Option<usize>, TableError>> {
        self.insert_batch(std::slice::from_ref(row))
    }
}
