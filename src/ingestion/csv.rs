//! CSV ingestion implementation.

use std::path::Path;

use crate::error::{EtlError, EtlResult};
use crate::processing::coerce::{parse_bool, parse_date};
use crate::types::{DataSet, DataType, Schema, Value};

/// Ingest a CSV file into an in-memory [`DataSet`].
///
/// Rules:
///
/// - CSV must have headers.
/// - Headers must contain all schema fields (order can differ, extra columns are ignored).
/// - Empty cells are missing; everything else is parsed according to the schema field type.
pub fn ingest_csv_from_path(path: impl AsRef<Path>, schema: &Schema) -> EtlResult<DataSet> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;
    ingest_csv_from_reader(&mut rdr, schema)
}

/// Ingest CSV text held in memory (e.g. an object fetched over HTTP).
pub fn ingest_csv_from_str(input: &str, schema: &Schema) -> EtlResult<DataSet> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(input.as_bytes());
    ingest_csv_from_reader(&mut rdr, schema)
}

/// Ingest CSV data from an existing CSV reader.
pub fn ingest_csv_from_reader<R: std::io::Read>(
    rdr: &mut csv::Reader<R>,
    schema: &Schema,
) -> EtlResult<DataSet> {
    let headers = rdr.headers()?.clone();

    // Map schema fields -> CSV column indexes (allows re-ordered CSV columns).
    let mut col_idxs = Vec::with_capacity(schema.fields.len());
    for field in &schema.fields {
        match headers.iter().position(|h| h == field.name) {
            Some(idx) => col_idxs.push(idx),
            None => {
                return Err(EtlError::SchemaMismatch {
                    message: format!(
                        "missing required column '{field}'. headers={:?}",
                        headers.iter().collect::<Vec<_>>(),
                        field = field.name
                    ),
                });
            }
        }
    }

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for (row_idx0, result) in rdr.records().enumerate() {
        // Report 1-based row number for users; +1 again because header is row 1.
        let user_row = row_idx0 + 2;
        let record = result?;

        let mut row: Vec<Value> = Vec::with_capacity(schema.fields.len());
        for (field, &csv_idx) in schema.fields.iter().zip(col_idxs.iter()) {
            let raw = record.get(csv_idx).unwrap_or("");
            row.push(parse_typed_value(user_row, &field.name, &field.data_type, raw)?);
        }
        rows.push(row);
    }

    Ok(DataSet::new(schema.clone(), rows))
}

pub(crate) fn parse_typed_value(
    row: usize,
    column: &str,
    data_type: &DataType,
    raw: &str,
) -> EtlResult<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }

    let parse_error = |message: String| EtlError::ParseError {
        row,
        column: column.to_owned(),
        raw: raw.to_owned(),
        message,
    };

    match data_type {
        DataType::Utf8 => Ok(Value::Utf8(trimmed.to_owned())),
        DataType::Int64 => trimmed
            .parse::<i64>()
            .map(Value::Int64)
            .map_err(|e| parse_error(e.to_string())),
        DataType::Float64 => trimmed
            .parse::<f64>()
            .map(Value::Float64)
            .map_err(|e| parse_error(e.to_string())),
        DataType::Bool => parse_bool(trimmed)
            .map(Value::Bool)
            .ok_or_else(|| parse_error("expected bool (true/false/1/0/yes/no)".to_string())),
        DataType::Date => parse_date(trimmed)
            .map(Value::Date)
            .ok_or_else(|| parse_error("expected a date".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::ingest_csv_from_str;
    use crate::types::{DataType, Field, Schema, Value};

    #[test]
    fn quoted_multiline_cells_and_null_literal_survive_as_text() {
        let schema = Schema::utf8(["index", "address"]);
        let input = "index,address,extra\n0,\"1 High St\nLondon\",x\n1,NULL,y\n2,,z\n";
        let ds = ingest_csv_from_str(input, &schema).unwrap();
        assert_eq!(ds.row_count(), 3);
        assert_eq!(ds.rows[0][1], Value::text("1 High St\nLondon"));
        assert_eq!(ds.rows[1][1], Value::text("NULL"));
        assert_eq!(ds.rows[2][1], Value::Null);
        assert_eq!(ds.schema.fields.len(), 2);
    }

    #[test]
    fn typed_date_column_parses_or_errors() {
        let schema = Schema::new(vec![Field::new("d", DataType::Date)]);
        let ok = ingest_csv_from_str("d\n2020-01-02\n", &schema).unwrap();
        assert!(matches!(ok.rows[0][0], Value::Date(_)));

        let err = ingest_csv_from_str("d\nsoon\n", &schema).unwrap_err();
        assert!(err.to_string().contains("column 'd'"));
    }
}
