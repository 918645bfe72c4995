use retail_etl::cleaning::{rules_for, DatasetKind};
use retail_etl::ingestion::csv::{ingest_csv_from_path, ingest_csv_from_reader};
use retail_etl::types::{DataType, Field, Schema, Value};

fn card_schema() -> Schema {
    rules_for(DatasetKind::CardDetails).raw_schema()
}

#[test]
fn ingest_csv_from_path_happy_path() {
    let ds = ingest_csv_from_path("tests/fixtures/card_details.csv", &card_schema()).unwrap();

    assert_eq!(ds.row_count(), 8);
    assert_eq!(ds.rows[0], vec![
        Value::text("30060773296197"),
        Value::text("09/26"),
        Value::text("Diners Club / Carte Blanche"),
        Value::text("2015-11-25"),
    ]);
    // The raw NULL literal is not missing until cleaning says so.
    assert_eq!(ds.rows[2][0], Value::text("NULL"));
}

#[test]
fn ingest_csv_allows_reordered_and_extra_columns() {
    let schema = Schema::utf8(["store_code", "index"]);
    let input = "index,address,store_code\n0,1 Road,WEB-1\n";
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(input.as_bytes());

    let ds = ingest_csv_from_reader(&mut rdr, &schema).unwrap();
    assert_eq!(ds.row_count(), 1);
    assert_eq!(ds.rows[0], vec![Value::text("WEB-1"), Value::text("0")]);
}

#[test]
fn ingest_csv_errors_on_missing_required_column() {
    let input = "card_number,expiry_date,card_provider\n1,01/30,Maestro\n";
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(input.as_bytes());

    let err = ingest_csv_from_reader(&mut rdr, &card_schema()).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("schema mismatch"));
    assert!(msg.contains("missing required column 'date_payment_confirmed'"));
}

#[test]
fn ingest_csv_errors_on_type_parse() {
    let schema = Schema::new(vec![
        Field::new("product_code", DataType::Utf8),
        Field::new("product_quantity", DataType::Int64),
    ]);
    let input = "product_code,product_quantity\nA1-1,three\n";
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(input.as_bytes());

    let err = ingest_csv_from_reader(&mut rdr, &schema).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("row 2"));
    assert!(msg.contains("column 'product_quantity'"));
    assert!(msg.contains("raw='three'"));
}

#[test]
fn ingest_csv_missing_file_is_io_error() {
    let err = ingest_csv_from_path("tests/fixtures/does_not_exist.csv", &card_schema()).unwrap_err();
    assert!(err.to_string().contains("csv error"));
}
