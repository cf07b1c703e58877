use std::cell::RefCell;
use std::time::Duration;

use affsync_table::TableError;
use serde_json::{json, Value};

use super::*;

/// In-memory sink recording the size of every insert call.
#[derive(Default)]
struct FakeSink {
    calls: RefCell<Vec<usize>>,
    /// Bulk inserts containing this product id fail.
    fail_bulk_with: Option<i64>,
    /// Single-row inserts of these product ids fail.
    fail_single: Vec<i64>,
    /// Respond to successful bulk inserts without echoing rows.
    silent: bool,
}

impl TableSink for FakeSink {
    async fn insert_batch(&self, rows: &[Record]) -> Result<Option<usize>, TableError> {
        self.calls.borrow_mut().push(rows.len());
        let ids: Vec<i64> = rows
            .iter()
            .filter_map(|r| r.get("product_id").and_then(Value::as_i64))
            .collect();

        if rows.len() > 1 && self.fail_bulk_with.is_some_and(|id| ids.contains(&id)) {
            return Err(TableError::Api {
                status: 409,
                message: "duplicate key value".to_string(),
            });
        }
        if rows.len() == 1 && ids.first().is_some_and(|id| self.fail_single.contains(id)) {
            return Err(TableError::Api {
                status: 400,
                message: "invalid input syntax".to_string(),
            });
        }
        if self.silent {
            return Ok(None);
        }
        Ok(Some(rows.len()))
    }
}

fn records(n: i64) -> Vec<Record> {
    (1..=n)
        .map(|id| json!({"product_id": id}).as_object().cloned().unwrap())
        .collect()
}

#[tokio::test]
async fn uploads_23_records_in_three_batches() {
    let sink = FakeSink::default();
    let summary = upload_records(&sink, &records(23), BATCH_SIZE, 0).await;

    assert_eq!(*sink.calls.borrow(), vec![10, 10, 3]);
    assert_eq!(summary.attempted, 23);
    assert_eq!(summary.uploaded, 23);
    assert_eq!(
        summary.batches,
        vec![
            BatchOutcome::Success(10),
            BatchOutcome::Success(10),
            BatchOutcome::Success(3)
        ]
    );
}

#[tokio::test]
async fn failed_bulk_insert_retries_only_that_batch() {
    let sink = FakeSink {
        fail_bulk_with: Some(15),
        ..FakeSink::default()
    };
    let summary = upload_records(&sink, &records(23), BATCH_SIZE, 0).await;

    let calls = sink.calls.borrow().clone();
    assert_eq!(calls.len(), 3 + 10, "expected 3 bulk + 10 single inserts");
    assert_eq!(&calls[..2], &[10, 10]);
    assert!(calls[2..12].iter().all(|&n| n == 1));
    assert_eq!(calls[12], 3);

    assert_eq!(summary.uploaded, 23);
    assert_eq!(
        summary.batches[1],
        BatchOutcome::PartialFailure {
            succeeded: 10,
            failed: vec![]
        }
    );
}

#[tokio::test]
async fn single_record_failures_are_reported_and_skipped() {
    let sink = FakeSink {
        fail_bulk_with: Some(3),
        fail_single: vec![3, 7],
        ..FakeSink::default()
    };
    let summary = upload_records(&sink, &records(12), BATCH_SIZE, 0).await;

    assert_eq!(summary.attempted, 12);
    assert_eq!(summary.uploaded, 10);
    match &summary.batches[0] {
        BatchOutcome::PartialFailure { succeeded, failed } => {
            assert_eq!(*succeeded, 8);
            let indexes: Vec<usize> = failed.iter().map(|f| f.index).collect();
            assert_eq!(indexes, vec![2, 6]);
            assert!(failed[0].reason.contains("invalid input syntax"));
        }
        other => panic!("expected PartialFailure, got: {other:?}"),
    }
    assert_eq!(summary.batches[1], BatchOutcome::Success(2));
}

#[tokio::test(start_paused = true)]
async fn pauses_between_batches_but_not_after_the_last() {
    let sink = FakeSink::default();
    let started = tokio::time::Instant::now();
    let summary = upload_records(&sink, &records(23), BATCH_SIZE, 500).await;

    assert_eq!(summary.batches.len(), 3);
    assert_eq!(started.elapsed(), Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn single_batch_never_pauses() {
    let sink = FakeSink::default();
    let started = tokio::time::Instant::now();
    upload_records(&sink, &records(7), BATCH_SIZE, 500).await;

    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test]
async fn response_without_rows_counts_nothing() {
    let sink = FakeSink {
        silent: true,
        ..FakeSink::default()
    };
    let summary = upload_records(&sink, &records(4), BATCH_SIZE, 0).await;
    assert_eq!(summary.uploaded, 0);
    assert_eq!(summary.batches, vec![BatchOutcome::Success(0)]);
}

#[tokio::test]
async fn nothing_to_upload_makes_no_calls() {
    let sink = FakeSink::default();
    let summary = upload_records(&sink, &[], BATCH_SIZE, 0).await;
    assert!(sink.calls.borrow().is_empty());
    assert_eq!(summary, UploadSummary::default());
}

#[tokio::test]
async fn insert_single_maps_error_to_failure() {
    let sink = FakeSink {
        fail_single: vec![1],
        ..FakeSink::default()
    };
    let record = records(1).remove(0);
    let failure = insert_single(&sink, 41, &record).await.unwrap_err();
    assert_eq!(failure.index, 41);
    assert!(failure.reason.contains("400"));
}
