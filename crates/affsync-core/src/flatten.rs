//! Flattening of raw API products into uniform, table-shaped rows.
//!
//! Every row of a [`FlattenedDataset`] carries the same columns in the same
//! order; cells a product did not provide are `null`. Nested fields are
//! expanded here:
//!
//! - `promo_code_info` (mapping) becomes one `promo_<key>` column per key seen
//!   anywhere in the batch, in first-seen order.
//! - `product_small_image_urls` becomes a single `small_images` column.

use std::collections::HashSet;

use chrono::{DateTime, TimeZone};
use serde_json::Value;

use crate::record::Record;
use crate::schema::DestinationSchema;

pub const FETCHED_AT_COLUMN: &str = "fecha_consulta";
pub const KEYWORD_COLUMN: &str = "keyword";
pub const PROMO_COLUMN: &str = "promo_code_info";
pub const PROMO_PREFIX: &str = "promo_";
pub const SMALL_IMAGES_SOURCE_COLUMN: &str = "product_small_image_urls";
pub const SMALL_IMAGES_COLUMN: &str = "small_images";

/// Rows sharing one ordered column set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlattenedDataset {
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
}

impl FlattenedDataset {
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sets `name` on every row, appending the column if it is new.
    fn set_column<F>(&mut self, name: &str, value_for: F)
    where
        F: Fn(&Record) -> Value,
    {
        if !self.columns.iter().any(|c| c == name) {
            self.columns.push(name.to_string());
        }
        for row in &mut self.rows {
            let value = value_for(row);
            row.insert(name.to_string(), value);
        }
    }

    fn drop_column(&mut self, name: &str) {
        self.columns.retain(|c| c != name);
        for row in &mut self.rows {
            row.shift_remove(name);
        }
    }

    fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }
}

/// Formats the run timestamp stored in `fecha_consulta`.
#[must_use]
pub fn format_run_timestamp<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Flattens a batch of raw products.
///
/// `keyword` is only written when the destination schema has a `keyword`
/// column.
#[must_use]
pub fn flatten_products(
    products: Vec<Record>,
    schema: &DestinationSchema,
    fetched_at: &str,
    keyword: &str,
) -> FlattenedDataset {
    let mut dataset = uniform_dataset(products);
    if dataset.is_empty() {
        return dataset;
    }

    dataset.set_column(FETCHED_AT_COLUMN, |_| Value::String(fetched_at.to_string()));

    if schema.contains(KEYWORD_COLUMN) {
        dataset.set_column(KEYWORD_COLUMN, |_| Value::String(keyword.to_string()));
    }

    if dataset.has_column(PROMO_COLUMN) {
        expand_promo_codes(&mut dataset);
    }

    if dataset.has_column(SMALL_IMAGES_SOURCE_COLUMN) {
        dataset.set_column(SMALL_IMAGES_COLUMN, |row| {
            small_images_value(row.get(SMALL_IMAGES_SOURCE_COLUMN))
        });
        dataset.drop_column(SMALL_IMAGES_SOURCE_COLUMN);
    }

    dataset
}

/// Builds rows over the union of all product keys, first-seen order.
fn uniform_dataset(products: Vec<Record>) -> FlattenedDataset {
    let mut columns: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for product in &products {
        for key in product.keys() {
            if seen.insert(key.clone()) {
                columns.push(key.clone());
            }
        }
    }

    let rows = products
        .into_iter()
        .map(|mut product| {
            columns
                .iter()
                .map(|col| {
                    let value = product.shift_remove(col).unwrap_or(Value::Null);
                    (col.clone(), value)
                })
                .collect::<Record>()
        })
        .collect();

    FlattenedDataset { columns, rows }
}

/// Adds a `promo_<key>` column for every key found in any row's
/// `promo_code_info` mapping, then drops `promo_code_info`.
///
/// Rows whose mapping lacks a key (or that have no mapping) get `null` for it.
fn expand_promo_codes(dataset: &mut FlattenedDataset) {
    let mut keys: Vec<String> = Vec::new();
    for row in &dataset.rows {
        if let Some(Value::Object(promo)) = row.get(PROMO_COLUMN) {
            for key in promo.keys() {
                if !keys.contains(key) {
                    keys.push(key.clone());
                }
            }
        }
    }

    for key in &keys {
        let column = format!("{PROMO_PREFIX}{key}");
        dataset.set_column(&column, |row| {
            row.get(PROMO_COLUMN)
                .and_then(Value::as_object)
                .and_then(|promo| promo.get(key))
                .cloned()
                .unwrap_or(Value::Null)
        });
    }

    dataset.drop_column(PROMO_COLUMN);
}

/// `"string"` entry if present, else the first entry of a non-empty mapping,
/// else the text `"[]"`.
fn small_images_value(raw: Option<&Value>) -> Value {
    match raw {
        Some(Value::Object(map)) => map
            .get("string")
            .or_else(|| map.values().next())
            .cloned()
            .unwrap_or_else(|| Value::String("[]".to_string())),
        _ => Value::String("[]".to_string()),
    }
}

#[cfg(test)]
#[path = "flatten_test.rs"]
mod tests;
