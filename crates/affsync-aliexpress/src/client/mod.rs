//! HTTP client for the AliExpress affiliate product search.

mod fetch_all;

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::{Client, Url};
use serde_json::Value;

use crate::error::AliexpressError;
use crate::sign::{sign_request, SIGN_METHOD};
use crate::types::{ProductPage, ProductQueryEnvelope};

pub const PRODUCT_QUERY_METHOD: &str = "aliexpress.affiliate.product.query";

/// Results requested per page (the API maximum).
pub const PAGE_SIZE: u32 = 50;

const PARTNER_ID: &str = "affsync-rust";
const TARGET_CURRENCY: &str = "USD";
const TARGET_LANGUAGE: &str = "EN";

/// Parameters of one `aliexpress.affiliate.product.query` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub keywords: String,
    pub page_no: u32,
}

impl ProductQuery {
    #[must_use]
    pub fn new(keywords: &str, page_no: u32) -> Self {
        Self {
            keywords: keywords.to_owned(),
            page_no,
        }
    }

    /// Business parameters, sent form-encoded in the request body.
    #[must_use]
    pub fn api_params(&self) -> BTreeMap<String, String> {
        [
            ("keywords", self.keywords.clone()),
            ("target_currency", TARGET_CURRENCY.to_owned()),
            ("target_language", TARGET_LANGUAGE.to_owned()),
            ("page_size", PAGE_SIZE.to_string()),
            ("page_no", self.page_no.to_string()),
            ("tracking_id", String::new()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v))
        .collect()
    }
}

/// Signed client for the AliExpress open-platform gateway.
///
/// Use [`AliexpressClient::new`] with the production gateway URL, or point
/// `server_url` at a mock server in tests.
pub struct AliexpressClient {
    client: Client,
    app_key: String,
    app_secret: String,
    server_url: Url,
}

impl AliexpressClient {
    /// Creates a client with the given gateway URL and credentials.
    ///
    /// # Errors
    ///
    /// Returns [`AliexpressError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`AliexpressError::InvalidServerUrl`] if
    /// `server_url` does not parse.
    pub fn new(
        server_url: &str,
        app_key: &str,
        app_secret: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, AliexpressError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        let server_url =
            Url::parse(server_url).map_err(|e| AliexpressError::InvalidServerUrl {
                url: server_url.to_owned(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            app_key: app_key.to_owned(),
            app_secret: app_secret.to_owned(),
            server_url,
        })
    }

    /// Fetches one page of search results.
    ///
    /// # Errors
    ///
    /// - [`AliexpressError::Http`] on network failure.
    /// - [`AliexpressError::UnexpectedStatus`] on a non-2xx status.
    /// - [`AliexpressError::Api`] if the gateway returns an error envelope.
    /// - [`AliexpressError::Deserialize`] if the body is not JSON or the
    ///   result has an unexpected shape.
    pub async fn query_products(&self, query: &ProductQuery) -> Result<ProductPage, AliexpressError> {
        let api_params = query.api_params();
        let timestamp_ms = chrono::Utc::now().timestamp_millis();
        let url = self.signed_url(PRODUCT_QUERY_METHOD, &api_params, timestamp_ms)?;

        let response = self.client.post(url).form(&api_params).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AliexpressError::UnexpectedStatus {
                status: status.as_u16(),
                url: self.server_url.to_string(),
            });
        }

        let body = response.text().await?;
        let context = format!(
            "{PRODUCT_QUERY_METHOD}(keywords={}, page_no={})",
            query.keywords, query.page_no
        );
        let value: Value =
            serde_json::from_str(&body).map_err(|e| AliexpressError::Deserialize {
                context: context.clone(),
                source: e,
            })?;
        Self::check_api_error(&value)?;

        let envelope: ProductQueryEnvelope = serde_json::from_value(value)
            .map_err(|e| AliexpressError::Deserialize { context, source: e })?;
        Ok(ProductPage::from(envelope))
    }

    /// Builds the gateway URL carrying the system parameters and signature.
    ///
    /// The signature covers system and business parameters together; only the
    /// system parameters travel in the query string.
    fn signed_url(
        &self,
        method: &str,
        api_params: &BTreeMap<String, String>,
        timestamp_ms: i64,
    ) -> Result<Url, AliexpressError> {
        let system_params: BTreeMap<String, String> = [
            ("app_key", self.app_key.clone()),
            ("sign_method", SIGN_METHOD.to_owned()),
            ("timestamp", timestamp_ms.to_string()),
            ("partner_id", PARTNER_ID.to_owned()),
            ("method", method.to_owned()),
            ("simplify", "false".to_owned()),
            ("format", "json".to_owned()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v))
        .collect();

        let mut signed = system_params.clone();
        signed.extend(api_params.iter().map(|(k, v)| (k.clone(), v.clone())));
        let sign = sign_request(&self.app_secret, method, &signed)?;

        let mut url = self.server_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in &system_params {
                pairs.append_pair(k, v);
            }
            pairs.append_pair("sign", &sign);
        }
        Ok(url)
    }

    /// Surfaces gateway-level errors, which come either wrapped in an
    /// `error_response` object or as top-level `code`/`message` fields.
    fn check_api_error(body: &Value) -> Result<(), AliexpressError> {
        let error = body.get("error_response").unwrap_or(body);
        let code = match error.get("code") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return Ok(()),
        };
        if code == "0" {
            return Ok(());
        }
        let message = error
            .get("message")
            .or_else(|| error.get("msg"))
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        Err(AliexpressError::Api { code, message })
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
