//! HTTP client for a hosted Postgres table exposed through PostgREST.
//!
//! Rows live under `<base>/rest/v1/<table>`. Every request carries the
//! project key both as `apikey` and as a bearer token.

use std::time::Duration;

use affsync_core::Record;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde_json::Value;

use crate::error::TableError;
use crate::sink::TableSink;

/// Client for one destination table.
pub struct TableClient {
    client: Client,
    api_key: String,
    table: String,
    rows_url: Url,
}

impl TableClient {
    /// Builds a client for `table` under the project at `base_url`.
    ///
    /// No request is made; this validates the URL, key, and table name.
    ///
    /// # Errors
    ///
    /// - [`TableError::MissingKey`] / [`TableError::MissingTable`] for blank values.
    /// - [`TableError::InvalidUrl`] if `base_url` is not an absolute http(s) URL.
    /// - [`TableError::Http`] if the `reqwest::Client` cannot be constructed.
    pub fn connect(
        base_url: &str,
        api_key: &str,
        table: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, TableError> {
        if api_key.trim().is_empty() {
            return Err(TableError::MissingKey);
        }
        if table.trim().is_empty() {
            return Err(TableError::MissingTable);
        }

        let invalid = |reason: String| TableError::InvalidUrl {
            url: base_url.to_owned(),
            reason,
        };
        let base = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))
            .map_err(|e| invalid(e.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme \"{}\"", base.scheme())));
        }
        let rows_url = base
            .join(&format!("rest/v1/{table}"))
            .map_err(|e| invalid(e.to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            table: table.to_owned(),
            rows_url,
        })
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Reads at most one row (`select=*&limit=1`).
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Api`] on a non-2xx status, [`TableError::Http`]
    /// on network failure, or [`TableError::Deserialize`] if the body is not
    /// an array of objects.
    pub async fn select_one(&self) -> Result<Option<Record>, TableError> {
        let mut url = self.rows_url.clone();
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("limit", "1");

        let response = self.authorized(self.client.get(url)).send().await?;
        let context = format!("select one from {}", self.table);
        let rows = Self::read_rows(response, &context).await?;
        Ok(rows.into_iter().next())
    }

    /// Inserts `rows` in a single request and returns the number of rows the
    /// table echoed back (`Prefer: return=representation`).
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Api`] when the table rejects the insert (the
    /// whole request is rolled back by PostgREST), [`TableError::Http`] on
    /// network failure, or [`TableError::Deserialize`] for an unreadable body.
    pub async fn insert_rows(&self, rows: &[Record]) -> Result<Option<usize>, TableError> {
        let request = self
            .client
            .post(self.rows_url.clone())
            .header("Prefer", "return=representation")
            .json(rows);
        let response = self.authorized(request).send().await?;
        let context = format!("insert into {}", self.table);
        let echoed = Self::read_rows(response, &context).await?;
        Ok(if echoed.is_empty() {
            None
        } else {
            Some(echoed.len())
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Checks the status and parses the body as an array of rows. An empty
    /// body counts as no rows.
    async fn read_rows(response: Response, context: &str) -> Result<Vec<Record>, TableError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(TableError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str::<Vec<Record>>(&body).map_err(|e| TableError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }
}

impl TableSink for TableClient {
    async fn insert_batch(&self, rows: &[Record]) -> Result<Option<usize>, TableError> {
        self.insert_rows(rows).await
    }
}

/// Extracts `message` from a PostgREST error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_owned))
        .unwrap_or_else(|| body.trim().to_owned())
}
