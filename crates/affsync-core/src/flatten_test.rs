use chrono::{NaiveDate, Utc};
use serde_json::{json, Value};

use super::*;

const FETCHED_AT: &str = "2026-10-15 08:30:00";

fn record(value: Value) -> Record {
    value.as_object().cloned().expect("fixture must be an object")
}

fn base_schema() -> DestinationSchema {
    DestinationSchema::from_columns(["product_id", "fecha_consulta", "small_images"])
}

#[test]
fn format_run_timestamp_uses_seconds_precision() {
    let at = NaiveDate::from_ymd_opt(2026, 3, 7)
        .and_then(|d| d.and_hms_opt(9, 5, 1))
        .unwrap()
        .and_local_timezone(Utc)
        .unwrap();
    assert_eq!(format_run_timestamp(&at), "2026-03-07 09:05:01");
}

#[test]
fn empty_input_yields_empty_dataset() {
    let dataset = flatten_products(vec![], &base_schema(), FETCHED_AT, "shoes");
    assert!(dataset.is_empty());
    assert!(dataset.columns.is_empty());
}

#[test]
fn adds_fetched_at_to_every_row() {
    let products = vec![
        record(json!({"product_id": 1})),
        record(json!({"product_id": 2})),
    ];
    let dataset = flatten_products(products, &base_schema(), FETCHED_AT, "shoes");
    assert_eq!(dataset.columns, vec!["product_id", "fecha_consulta"]);
    for row in &dataset.rows {
        assert_eq!(row["fecha_consulta"], json!(FETCHED_AT));
    }
}

#[test]
fn keyword_only_added_when_schema_has_it() {
    let products = vec![record(json!({"product_id": 1}))];
    let without = flatten_products(products.clone(), &base_schema(), FETCHED_AT, "shoes");
    assert!(!without.rows[0].contains_key("keyword"));

    let schema = DestinationSchema::from_columns(["product_id", "keyword"]);
    let with = flatten_products(products, &schema, FETCHED_AT, "shoes");
    assert_eq!(with.rows[0]["keyword"], json!("shoes"));
    assert!(with.columns.contains(&"keyword".to_string()));
}

#[test]
fn missing_fields_become_null_columns() {
    let products = vec![
        record(json!({"product_id": 1, "discount": "10%"})),
        record(json!({"product_id": 2, "shop_id": 77})),
    ];
    let dataset = flatten_products(products, &base_schema(), FETCHED_AT, "shoes");
    assert_eq!(
        dataset.columns,
        vec!["product_id", "discount", "shop_id", "fecha_consulta"]
    );
    assert_eq!(dataset.rows[0]["shop_id"], Value::Null);
    assert_eq!(dataset.rows[1]["discount"], Value::Null);
    let keys: Vec<&String> = dataset.rows[1].keys().collect();
    assert_eq!(keys, dataset.columns.iter().collect::<Vec<_>>());
}

#[test]
fn promo_code_info_becomes_sibling_field() {
    let products = vec![record(json!({"product_id": 1, "promo_code_info": {"code": "X"}}))];
    let dataset = flatten_products(products, &base_schema(), FETCHED_AT, "shoes");
    let row = &dataset.rows[0];
    assert_eq!(row["promo_code"], json!("X"));
    assert!(!row.contains_key("promo_code_info"));
    assert!(!dataset.columns.contains(&"promo_code_info".to_string()));
}

#[test]
fn promo_keys_seen_later_are_null_for_other_rows() {
    let products = vec![
        record(json!({"product_id": 1, "promo_code_info": {"code": "A"}})),
        record(json!({"product_id": 2})),
        record(json!({"product_id": 3, "promo_code_info": {"code": "C", "value": "5"}})),
    ];
    let dataset = flatten_products(products, &base_schema(), FETCHED_AT, "shoes");

    assert_eq!(
        dataset.columns,
        vec!["product_id", "fecha_consulta", "promo_code", "promo_value"]
    );
    assert_eq!(dataset.rows[0]["promo_code"], json!("A"));
    assert_eq!(dataset.rows[0]["promo_value"], Value::Null);
    assert_eq!(dataset.rows[1]["promo_code"], Value::Null);
    assert_eq!(dataset.rows[1]["promo_value"], Value::Null);
    assert_eq!(dataset.rows[2]["promo_code"], json!("C"));
    assert_eq!(dataset.rows[2]["promo_value"], json!("5"));
}

#[test]
fn non_mapping_promo_code_info_is_dropped_without_columns() {
    let products = vec![record(json!({"product_id": 1, "promo_code_info": "none"}))];
    let dataset = flatten_products(products, &base_schema(), FETCHED_AT, "shoes");
    assert_eq!(dataset.columns, vec!["product_id", "fecha_consulta"]);
}

#[test]
fn small_images_prefers_string_key() {
    let products = vec![record(
        json!({"product_id": 1, "product_small_image_urls": {"string": ["a", "b"]}}),
    )];
    let dataset = flatten_products(products, &base_schema(), FETCHED_AT, "shoes");
    let row = &dataset.rows[0];
    assert_eq!(row["small_images"], json!(["a", "b"]));
    assert!(!row.contains_key("product_small_image_urls"));
}

#[test]
fn small_images_falls_back_to_first_value() {
    let products = vec![record(
        json!({"product_id": 1, "product_small_image_urls": {"urls": ["x"], "other": ["y"]}}),
    )];
    let dataset = flatten_products(products, &base_schema(), FETCHED_AT, "shoes");
    assert_eq!(dataset.rows[0]["small_images"], json!(["x"]));
}

#[test]
fn small_images_empty_mapping_is_empty_list_text() {
    let products = vec![
        record(json!({"product_id": 1, "product_small_image_urls": {}})),
        record(json!({"product_id": 2})),
        record(json!({"product_id": 3, "product_small_image_urls": ["z"]})),
    ];
    let dataset = flatten_products(products, &base_schema(), FETCHED_AT, "shoes");
    for row in &dataset.rows {
        assert_eq!(row["small_images"], json!("[]"));
    }
}

#[test]
fn flattening_is_idempotent_without_nested_fields() {
    let products = vec![
        record(json!({"product_id": 1, "sale_price": "3.10"})),
        record(json!({"product_id": 2, "sale_price": "4.20"})),
    ];
    let once = flatten_products(products, &base_schema(), FETCHED_AT, "shoes");
    let twice = flatten_products(once.rows.clone(), &base_schema(), FETCHED_AT, "shoes");
    assert_eq!(once, twice);
}
