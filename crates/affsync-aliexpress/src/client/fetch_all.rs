//! Multi-page product fetch loop for `AliexpressClient`.

use std::time::Duration;

use crate::types::{FetchedProducts, StopReason};

use super::{AliexpressClient, ProductQuery};

impl AliexpressClient {
    /// Fetches every page of results for `keywords`, starting at page 1.
    ///
    /// Keeps requesting while the last page was non-empty and fewer products
    /// have been collected than the API reports in total, sleeping
    /// `inter_request_delay_ms` between pages.
    ///
    /// Never fails: an error on any page is logged and ends pagination,
    /// keeping whatever earlier pages returned. The reason is reported in
    /// [`FetchedProducts::stop_reason`].
    pub async fn fetch_all_products(
        &self,
        keywords: &str,
        inter_request_delay_ms: u64,
    ) -> FetchedProducts {
        let mut products = Vec::new();
        let mut page_no = 1u32;
        let mut pages_fetched = 0u32;

        let stop_reason = loop {
            tracing::info!(keywords, page_no, "fetching page");
            let page = match self
                .query_products(&ProductQuery::new(keywords, page_no))
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!(
                        keywords,
                        page_no,
                        error = %e,
                        "failed to read product page; ending pagination"
                    );
                    break StopReason::Anomaly(e.to_string());
                }
            };

            if page.products.is_empty() {
                tracing::info!(keywords, page_no, "no more products available");
                break StopReason::EmptyPage;
            }

            let added = page.products.len();
            products.extend(page.products);
            pages_fetched += 1;
            tracing::info!(keywords, page_no, added, "added products from page");

            let collected = u64::try_from(products.len()).unwrap_or(u64::MAX);
            if page.total_record_count > collected {
                page_no += 1;
                if inter_request_delay_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(inter_request_delay_ms)).await;
                }
            } else {
                tracing::info!(
                    keywords,
                    collected,
                    total = page.total_record_count,
                    "all products collected"
                );
                break StopReason::TotalReached;
            }
        };

        FetchedProducts {
            products,
            pages_fetched,
            stop_reason,
        }
    }
}
