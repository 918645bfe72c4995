//! Best-effort type coercion.
//!
//! Coercion never fails: a cell that cannot be converted to the target [`DataType`] becomes
//! [`Value::Null`].

use chrono::{NaiveDate, NaiveDateTime};

use crate::types::{DataSet, DataType, Value};

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y %B %d",
    "%B %Y %d",
    "%d %B %Y",
    "%B %d %Y",
    "%B %d, %Y",
    "%m/%d/%Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"];

/// Coerce every cell of column `idx` to `to` and record the new column type.
pub fn coerce_column(dataset: &mut DataSet, idx: usize, to: &DataType) {
    dataset.map_column(idx, |cell| coerce_value(cell, to));
    dataset.set_column_type(idx, to.clone());
}

/// Coerce one cell.
pub fn coerce_value(value: Value, to: &DataType) -> Value {
    if value.is_null() {
        return Value::Null;
    }
    let coerced = match to {
        DataType::Utf8 => value.to_text().map(Value::Utf8),
        DataType::Date => to_date(&value).map(Value::Date),
        DataType::Int64 => to_int(&value).map(Value::Int64),
        DataType::Float64 => to_float(&value).map(Value::Float64),
        DataType::Bool => to_bool(&value).map(Value::Bool),
    };
    coerced.unwrap_or(Value::Null)
}

/// Parse free-form date text. Month names may be full or abbreviated.
///
/// Date-time text keeps only the date part.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Parse a finite float from trimmed text.
pub fn parse_float(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse an integer from trimmed text; integral float text (`"12.0"`) is accepted.
pub fn parse_int(raw: &str) -> Option<i64> {
    let s = raw.trim();
    s.parse::<i64>().ok().or_else(|| parse_float(s).and_then(integral))
}

pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" => Some(true),
        "false" | "f" | "0" | "no" | "n" => Some(false),
        _ => None,
    }
}

fn integral(v: f64) -> Option<i64> {
    if v.fract() == 0.0 && v >= i64::MIN as f64 && v <= i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}

fn to_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::Date(d) => Some(*d),
        Value::Utf8(s) => parse_date(s),
        _ => None,
    }
}

fn to_int(value: &Value) -> Option<i64> {
    match value {
        Value::Int64(v) => Some(*v),
        Value::Float64(v) => integral(*v),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::Utf8(s) => parse_int(s),
        Value::Date(_) | Value::Null => None,
    }
}

fn to_float(value: &Value) -> Option<f64> {
    match value {
        Value::Int64(v) => Some(*v as f64),
        Value::Float64(v) => Some(*v).filter(|v| v.is_finite()),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Utf8(s) => parse_float(s),
        Value::Date(_) | Value::Null => None,
    }
}

fn to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Int64(0) => Some(false),
        Value::Int64(1) => Some(true),
        Value::Utf8(s) => parse_bool(s),
        _ => None,
    }
}
