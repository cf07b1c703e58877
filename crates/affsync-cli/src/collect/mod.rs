//! The collect run: discover the table schema, fetch every result page for
//! a keyword, flatten, optionally export to CSV, then upload.
//!
//! Only a destination table that cannot be set up aborts the run. Every other
//! failure (schema probe, bad API page, CSV write, rejected inserts) is
//! logged and the run carries on with what it has.

mod export;
mod upload;

use std::path::Path;

use affsync_aliexpress::AliexpressClient;
use affsync_core::{
    flatten_products, format_run_timestamp, sanitize_records, AppConfig, DestinationSchema,
    FlattenedDataset,
};
use affsync_table::{discover_schema, TableClient, TableSink};
use anyhow::Context;

pub(crate) use export::ExportStatus;
pub(crate) use upload::{BatchOutcome, UploadSummary, BATCH_SIZE};

/// Run settings taken from [`AppConfig`].
#[derive(Debug, Clone)]
pub(crate) struct CollectSettings {
    pub fallback_schema: DestinationSchema,
    pub page_delay_ms: u64,
    pub batch_delay_ms: u64,
}

impl From<&AppConfig> for CollectSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            fallback_schema: config.fallback_schema.clone(),
            page_delay_ms: config.page_delay_ms,
            batch_delay_ms: config.batch_delay_ms,
        }
    }
}

/// What a run produced.
#[derive(Debug)]
pub(crate) struct CollectReport {
    /// Flattened rows before projection onto the table schema.
    pub dataset: FlattenedDataset,
    pub schema: DestinationSchema,
    pub export: ExportStatus,
    pub upload: UploadSummary,
}

/// Builds the clients from `config` and runs [`collect_keyword`].
///
/// # Errors
///
/// Returns an error if the destination table client or the search client
/// cannot be constructed. Nothing is fetched or uploaded in that case.
pub(crate) async fn run_collect(
    config: &AppConfig,
    keyword: &str,
    output: Option<&Path>,
) -> anyhow::Result<Option<CollectReport>> {
    let table = TableClient::connect(
        &config.supabase_url,
        &config.supabase_key,
        &config.supabase_table,
        config.request_timeout_secs,
        &config.user_agent,
    )
    .context("failed to connect to destination table")?;
    tracing::info!(table = table.table(), "destination table client ready");

    let search = AliexpressClient::new(
        &config.server_url,
        &config.app_key,
        &config.app_secret,
        config.request_timeout_secs,
        &config.user_agent,
    )
    .context("failed to build AliExpress client")?;

    let settings = CollectSettings::from(config);
    Ok(collect_keyword(&search, &table, &settings, keyword, output).await)
}

/// Runs one collection for `keyword`. Returns `None` when the search yielded
/// no products, in which case nothing is written or uploaded.
pub(crate) async fn collect_keyword(
    search: &AliexpressClient,
    table: &TableClient,
    settings: &CollectSettings,
    keyword: &str,
    output: Option<&Path>,
) -> Option<CollectReport> {
    let schema = discover_schema(table, &settings.fallback_schema).await.schema;

    let fetched_at = format_run_timestamp(&chrono::Local::now());
    tracing::info!(keyword, fetched_at = %fetched_at, "starting product search");

    let fetched = search
        .fetch_all_products(keyword, settings.page_delay_ms)
        .await;
    tracing::info!(
        keyword,
        products = fetched.total_count(),
        pages = fetched.pages_fetched,
        stop_reason = ?fetched.stop_reason,
        "product search finished"
    );
    if fetched.products.is_empty() {
        tracing::info!(keyword, "no products found to store");
        return None;
    }

    let dataset = flatten_products(fetched.products, &schema, &fetched_at, keyword);
    let export = export::export_dataset(output, &dataset);
    let upload = upload_dataset(table, &dataset, &schema, settings.batch_delay_ms).await;

    let stored: Vec<&str> = dataset
        .columns
        .iter()
        .map(String::as_str)
        .filter(|c| schema.contains(c))
        .collect();
    tracing::info!(columns = ?stored, "columns stored in destination table");

    Some(CollectReport {
        dataset,
        schema,
        export,
        upload,
    })
}

async fn upload_dataset<S: TableSink>(
    sink: &S,
    dataset: &FlattenedDataset,
    schema: &DestinationSchema,
    batch_delay_ms: u64,
) -> UploadSummary {
    tracing::info!(rows = dataset.len(), "starting upload");
    let records = sanitize_records(&dataset.rows, schema);
    let summary = upload::upload_records(sink, &records, BATCH_SIZE, batch_delay_ms).await;

    let failed_batches = summary
        .batches
        .iter()
        .filter(|b| matches!(b, BatchOutcome::PartialFailure { .. }))
        .count();
    if failed_batches > 0 {
        tracing::warn!(failed_batches, "some batches fell back to single-row inserts");
    }
    tracing::info!(
        uploaded = summary.uploaded,
        total = summary.attempted,
        "upload finished"
    );
    summary
}

#[cfg(test)]
#[path = "collect_test.rs"]
mod tests;
