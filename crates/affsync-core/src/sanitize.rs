//! Projection of flattened rows onto the destination schema.

use crate::record::{FieldValue, Record};
use crate::schema::DestinationSchema;

/// Keeps only schema columns and converts each value into something the
/// table accepts (see [`FieldValue::into_upload_value`]).
#[must_use]
pub fn sanitize_record(record: &Record, schema: &DestinationSchema) -> Record {
    record
        .iter()
        .filter(|(column, _)| schema.contains(column))
        .map(|(column, value)| {
            let value = FieldValue::classify(value.clone()).into_upload_value();
            (column.clone(), value)
        })
        .collect()
}

#[must_use]
pub fn sanitize_records(records: &[Record], schema: &DestinationSchema) -> Vec<Record> {
    records
        .iter()
        .map(|record| sanitize_record(record, schema))
        .collect()
}
