use retail_etl::cleaning::{rules_for, DatasetKind};
use retail_etl::ingestion::json::{ingest_json_from_path, ingest_json_from_str};
use retail_etl::types::{DataType, Field, Schema, Value};

fn store_schema() -> Schema {
    rules_for(DatasetKind::StoreDetails).raw_schema()
}

#[test]
fn ingest_json_array_from_path_happy_path() {
    let ds = ingest_json_from_path("tests/fixtures/store_details.json", &store_schema()).unwrap();

    assert_eq!(ds.row_count(), 6);
    // Numbers are kept as text when the schema asks for raw text.
    assert_eq!(ds.cell(0, "index"), Some(&Value::text("0")));
    assert_eq!(ds.cell(0, "latitude"), Some(&Value::Null));
    assert_eq!(ds.cell(1, "locality"), Some(&Value::text("High Wycombe")));
}

#[test]
fn ingest_json_column_oriented_from_path() {
    let schema = rules_for(DatasetKind::Events).raw_schema();
    let ds = ingest_json_from_path("tests/fixtures/date_details.json", &schema).unwrap();

    assert_eq!(ds.row_count(), 4);
    assert_eq!(ds.cell(0, "time_period"), Some(&Value::text("Evening")));
    assert_eq!(ds.cell(3, "date_uuid"), Some(&Value::text("5ZX2FOF3VH")));
}

#[test]
fn ingest_json_ndjson_with_nested_fields() {
    let schema = Schema::new(vec![
        Field::new("order.index", DataType::Int64),
        Field::new("store.code", DataType::Utf8),
    ]);
    let input = r#"
{"order":{"index":1},"store":{"code":"WEB-1388012W"}}
{"order":{"index":2},"store":{"code":"HI-9B97EE4E"}}
"#;
    let ds = ingest_json_from_str(input, &schema).unwrap();
    assert_eq!(ds.row_count(), 2);
    assert_eq!(ds.rows[1], vec![Value::Int64(2), Value::text("HI-9B97EE4E")]);
}

#[test]
fn ingest_json_errors_on_missing_field() {
    let input = r#"[{"card_number":"1","expiry_date":"01/30","card_provider":"Maestro"}]"#;
    let err = ingest_json_from_str(input, &rules_for(DatasetKind::CardDetails).raw_schema())
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("schema mismatch"));
    assert!(msg.contains("missing required field 'date_payment_confirmed'"));
}

#[test]
fn ingest_json_errors_on_type_mismatch() {
    let schema = Schema::new(vec![Field::new("product_quantity", DataType::Int64)]);
    let err = ingest_json_from_str(r#"[{"product_quantity":"nope"}]"#, &schema).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("failed to parse value"));
    assert!(msg.contains("column 'product_quantity'"));
}

#[test]
fn ingest_json_rejects_scalars_and_empty_input() {
    let schema = Schema::utf8(["a"]);
    assert!(ingest_json_from_str("42", &schema).is_err());
    assert!(ingest_json_from_str("   ", &schema).is_err());
}
