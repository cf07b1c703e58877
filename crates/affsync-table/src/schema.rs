//! Destination schema discovery.

use affsync_core::DestinationSchema;

use crate::client::TableClient;

/// Where the discovered schema came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    /// Column names of an existing row.
    Probed,
    /// The table has no rows; the fallback was used.
    EmptyTable,
    /// The probe failed; the fallback was used.
    ProbeFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredSchema {
    pub schema: DestinationSchema,
    pub source: SchemaSource,
}

/// Reads one row to learn the table's columns, falling back to `fallback`
/// when the table is empty or the read fails. Never fails.
pub async fn discover_schema(client: &TableClient, fallback: &DestinationSchema) -> DiscoveredSchema {
    tracing::info!(table = client.table(), "probing destination table columns");

    match client.select_one().await {
        Ok(Some(row)) => {
            let schema = DestinationSchema::from_row(&row);
            tracing::info!(
                table = client.table(),
                columns = ?schema.iter().collect::<Vec<_>>(),
                "using columns of existing row"
            );
            DiscoveredSchema {
                schema,
                source: SchemaSource::Probed,
            }
        }
        Ok(None) => {
            tracing::info!(
                table = client.table(),
                "table has no rows; using fallback columns"
            );
            DiscoveredSchema {
                schema: fallback.clone(),
                source: SchemaSource::EmptyTable,
            }
        }
        Err(e) => {
            tracing::warn!(
                table = client.table(),
                error = %e,
                "failed to probe table columns; using fallback columns"
            );
            DiscoveredSchema {
                schema: fallback.clone(),
                source: SchemaSource::ProbeFailed(e.to_string()),
            }
        }
    }
}
