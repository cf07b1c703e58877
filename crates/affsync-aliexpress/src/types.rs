//! Response types for `aliexpress.affiliate.product.query`.
//!
//! ## Observed envelope
//!
//! ```text
//! {
//!   "aliexpress_affiliate_product_query_response": {
//!     "resp_result": {
//!       "resp_code": 200,
//!       "resp_msg": "Call succeeds",
//!       "result": {
//!         "current_page_no": 1,
//!         "current_record_count": 50,
//!         "total_record_count": "1234",
//!         "products": { "product": [ { ... }, ... ] }
//!       }
//!     }
//!   },
//!   "request_id": "..."
//! }
//! ```
//!
//! `total_record_count` arrives either as a number or as numeric text. When a
//! search has no hits the gateway answers `resp_code: 405` with no `result`
//! object, which is read as an empty page.
//!
//! Products are kept as untyped [`Record`]s: the field set varies between
//! categories and the destination schema decides what survives.

use affsync_core::Record;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub(crate) struct ProductQueryEnvelope {
    #[serde(rename = "aliexpress_affiliate_product_query_response", default)]
    pub response: Option<ProductQueryResponse>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductQueryResponse {
    #[serde(default)]
    pub resp_result: Option<RespResult>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RespResult {
    #[serde(default)]
    pub result: Option<QueryResult>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QueryResult {
    #[serde(default)]
    pub products: Option<ProductList>,

    #[serde(default, deserialize_with = "de_record_count")]
    pub total_record_count: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductList {
    #[serde(default)]
    pub product: Vec<Record>,
}

/// One page of search results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPage {
    pub products: Vec<Record>,
    /// Total hits reported by the API across all pages.
    pub total_record_count: u64,
}

impl From<ProductQueryEnvelope> for ProductPage {
    fn from(envelope: ProductQueryEnvelope) -> Self {
        let result = envelope
            .response
            .and_then(|r| r.resp_result)
            .and_then(|r| r.result);
        match result {
            Some(result) => Self {
                products: result.products.map(|p| p.product).unwrap_or_default(),
                total_record_count: result.total_record_count,
            },
            None => Self::default(),
        }
    }
}

/// Why the multi-page fetch stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// A page came back with no products.
    EmptyPage,
    /// The collected count reached the reported total.
    TotalReached,
    /// A page failed (HTTP, API error, or unexpected shape).
    Anomaly(String),
}

/// Everything collected for one keyword.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedProducts {
    pub products: Vec<Record>,
    pub pages_fetched: u32,
    pub stop_reason: StopReason,
}

impl FetchedProducts {
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.products.len()
    }
}

/// Accepts `123`, `"123"`, or `null` (as 0).
fn de_record_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Value::deserialize(deserializer)? {
        Value::Null => Ok(0),
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| D::Error::custom(format!("invalid record count {n}"))),
        Value::String(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|e| D::Error::custom(format!("invalid record count \"{s}\": {e}"))),
        other => Err(D::Error::custom(format!(
            "record count must be a number or numeric text, got {other}"
        ))),
    }
}
