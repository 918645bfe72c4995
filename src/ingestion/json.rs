//! JSON ingestion implementation.
//!
//! Supported inputs:
//! - A JSON array of objects: `[{"a":1}, {"a":2}]`
//! - Newline-delimited JSON (NDJSON): `{"a":1}\n{"a":2}\n`
//! - A single object, read as one record
//! - A column-oriented object `{"a": {"0": 1, "1": 2}}` (one inner object per column, keyed by
//!   row label), as written by dataframe exports
//!
//! Nested fields are supported using dot paths in schema field names (e.g. `user.name`).

use std::fs;
use std::path::Path;

use serde_json::Map;

use crate::error::{EtlError, EtlResult};
use crate::processing::coerce::parse_date;
use crate::types::{DataSet, DataType, Schema, Value};

/// Ingest JSON into an in-memory `DataSet`.
pub fn ingest_json_from_path(path: impl AsRef<Path>, schema: &Schema) -> EtlResult<DataSet> {
    let text = fs::read_to_string(path)?;
    ingest_json_from_str(&text, schema)
}

/// Ingest JSON from an in-memory string into a [`DataSet`].
pub fn ingest_json_from_str(input: &str, schema: &Schema) -> EtlResult<DataSet> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(EtlError::SchemaMismatch {
            message: "json input is empty".to_string(),
        });
    }

    // First try parsing as a single JSON value (array or object).
    if let Ok(v) = serde_json::from_str::<serde_json::Value>(trimmed) {
        match v {
            serde_json::Value::Array(items) => ingest_json_values(&items, schema),
            serde_json::Value::Object(map) if is_column_oriented(&map, schema) => {
                ingest_json_columns(&map, schema)
            }
            serde_json::Value::Object(_) => ingest_json_values(std::slice::from_ref(&v), schema),
            _ => Err(EtlError::SchemaMismatch {
                message: "json must be an object, an array of objects, or NDJSON".to_string(),
            }),
        }
    } else {
        // Fall back to NDJSON.
        let mut values = Vec::new();
        for (i, line) in trimmed.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let v = serde_json::from_str::<serde_json::Value>(line).map_err(|e| {
                EtlError::SchemaMismatch {
                    message: format!("invalid ndjson at line {}: {}", i + 1, e),
                }
            })?;
            values.push(v);
        }
        ingest_json_values(&values, schema)
    }
}

/// Convert a list of JSON records into a [`DataSet`] shaped by `schema`.
pub fn ingest_json_values(values: &[serde_json::Value], schema: &Schema) -> EtlResult<DataSet> {
    let mut rows: Vec<Vec<Value>> = Vec::with_capacity(values.len());

    for (idx0, v) in values.iter().enumerate() {
        let row_num = idx0 + 1;
        let obj = v.as_object().ok_or_else(|| EtlError::SchemaMismatch {
            message: format!("row {row_num} is not a json object"),
        })?;

        let mut row: Vec<Value> = Vec::with_capacity(schema.fields.len());
        for field in &schema.fields {
            let jv = get_by_dot_path(obj, &field.name).ok_or_else(|| EtlError::SchemaMismatch {
                message: format!("row {row_num} missing required field '{}'", field.name),
            })?;
            row.push(convert_json_value(row_num, &field.name, &field.data_type, jv)?);
        }
        rows.push(row);
    }

    Ok(DataSet::new(schema.clone(), rows))
}

// Every schema field is a top-level key holding an object of row-label -> value.
fn is_column_oriented(map: &Map<String, serde_json::Value>, schema: &Schema) -> bool {
    !schema.fields.is_empty()
        && schema
            .fields
            .iter()
            .all(|f| map.get(&f.name).is_some_and(serde_json::Value::is_object))
}

fn ingest_json_columns(
    map: &Map<String, serde_json::Value>,
    schema: &Schema,
) -> EtlResult<DataSet> {
    let first = &schema.fields[0].name;
    let mut labels: Vec<&String> = map
        .get(first)
        .and_then(serde_json::Value::as_object)
        .map(|col| col.keys().collect())
        .unwrap_or_default();
    // Labels are usually stringified row numbers; keep them in numeric order when they are.
    if labels.iter().all(|l| l.parse::<u64>().is_ok()) {
        labels.sort_by_key(|l| l.parse::<u64>().unwrap_or(u64::MAX));
    }

    let mut rows: Vec<Vec<Value>> = Vec::with_capacity(labels.len());
    for (idx0, label) in labels.iter().enumerate() {
        let row_num = idx0 + 1;
        let mut row: Vec<Value> = Vec::with_capacity(schema.fields.len());
        for field in &schema.fields {
            let jv = map
                .get(&field.name)
                .and_then(|col| col.get(label.as_str()))
                .ok_or_else(|| EtlError::SchemaMismatch {
                    message: format!("column '{}' has no value for row '{label}'", field.name),
                })?;
            row.push(convert_json_value(row_num, &field.name, &field.data_type, jv)?);
        }
        rows.push(row);
    }

    Ok(DataSet::new(schema.clone(), rows))
}

fn get_by_dot_path<'a>(
    root: &'a Map<String, serde_json::Value>,
    path: &str,
) -> Option<&'a serde_json::Value> {
    // An exact key wins over a dotted path.
    if let Some(v) = root.get(path) {
        return Some(v);
    }

    let mut segments = path.split('.');
    let mut current: &serde_json::Value = root.get(segments.next()?)?;
    for segment in segments {
        match current {
            serde_json::Value::Object(map) => current = map.get(segment)?,
            _ => return None,
        }
    }
    Some(current)
}

fn convert_json_value(
    row: usize,
    column: &str,
    data_type: &DataType,
    v: &serde_json::Value,
) -> EtlResult<Value> {
    if v.is_null() {
        return Ok(Value::Null);
    }

    let parse_error = |message: &str| EtlError::ParseError {
        row,
        column: column.to_string(),
        raw: v.to_string(),
        message: message.to_string(),
    };

    match data_type {
        // Raw text ingestion: scalars are kept as their textual form.
        DataType::Utf8 => match v {
            serde_json::Value::String(s) => Ok(Value::Utf8(s.clone())),
            serde_json::Value::Number(n) => Ok(Value::Utf8(n.to_string())),
            serde_json::Value::Bool(b) => Ok(Value::Utf8(b.to_string())),
            _ => Err(parse_error("expected a scalar")),
        },
        DataType::Bool => v
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| parse_error("expected bool")),
        DataType::Int64 => {
            if let Some(n) = v.as_i64() {
                Ok(Value::Int64(n))
            } else if let Some(n) = v.as_u64() {
                i64::try_from(n)
                    .map(Value::Int64)
                    .map_err(|_| parse_error("u64 out of range for i64"))
            } else {
                Err(parse_error("expected integer number"))
            }
        }
        DataType::Float64 => v
            .as_f64()
            .map(Value::Float64)
            .ok_or_else(|| parse_error("expected number")),
        DataType::Date => v
            .as_str()
            .and_then(parse_date)
            .map(Value::Date)
            .ok_or_else(|| parse_error("expected a date string")),
    }
}
