//! The set of column names accepted by the destination table.

use std::collections::BTreeSet;

use crate::record::Record;

/// Columns assumed for an AliExpress product table when the live table cannot
/// be probed (empty table or failed query).
pub const DEFAULT_FALLBACK_COLUMNS: &[&str] = &[
    "app_sale_price",
    "original_price",
    "product_detail_url",
    "second_level_category_name",
    "target_sale_price",
    "second_level_category_id",
    "discount",
    "product_main_image_url",
    "first_level_category_id",
    "target_sale_price_currency",
    "target_app_sale_price_currency",
    "tax_rate",
    "original_price_currency",
    "shop_url",
    "target_original_price_currency",
    "product_id",
    "target_original_price",
    "product_video_url",
    "first_level_category_name",
    "promotion_link",
    "sku_id",
    "evaluate_rate",
    "sale_price",
    "product_title",
    "hot_product_commission_rate",
    "shop_id",
    "app_sale_price_currency",
    "sale_price_currency",
    "lastest_volume",
    "target_app_sale_price",
    "commission_rate",
    "fecha_consulta",
    "small_images",
];

/// Known column names of the destination table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestinationSchema {
    columns: BTreeSet<String>,
}

impl DestinationSchema {
    pub fn from_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Schema made of the field names of an existing table row.
    #[must_use]
    pub fn from_row(row: &Record) -> Self {
        Self::from_columns(row.keys().cloned())
    }

    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.columns.contains(column)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn default_fallback_has_33_unique_columns() {
        let schema = DestinationSchema::from_columns(DEFAULT_FALLBACK_COLUMNS.iter().copied());
        assert_eq!(schema.len(), 33);
        assert!(schema.contains("small_images"));
        assert!(schema.contains("fecha_consulta"));
        assert!(!schema.contains("keyword"));
    }

    #[test]
    fn from_row_uses_row_keys() {
        let row = json!({"product_id": 1, "keyword": "shoes", "extra": null});
        let schema = DestinationSchema::from_row(row.as_object().unwrap());
        assert_eq!(schema.len(), 3);
        assert!(schema.contains("keyword"));
        assert!(schema.contains("extra"));
    }

    #[test]
    fn iter_is_sorted() {
        let schema = DestinationSchema::from_columns(["b", "a", "c"]);
        let cols: Vec<&str> = schema.iter().collect();
        assert_eq!(cols, vec!["a", "b", "c"]);
    }
}
