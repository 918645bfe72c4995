//! Cell-wise rewrites for [`crate::types::DataSet`] columns.
//!
//! These never change the row count. Missing cells pass through untouched unless a function
//! says otherwise ([`fill_missing_where`], [`normalize_missing_literal`]).

use crate::types::{DataSet, Value};

/// Raw text that some sources use to spell "no value".
pub const NULL_LITERAL: &str = "NULL";

/// Rewrite the text of every non-missing cell in column `idx`.
///
/// Non-text cells are first rendered to text, so the column ends up as [`Value::Utf8`].
pub fn map_text<F>(dataset: &mut DataSet, idx: usize, mut f: F)
where
    F: FnMut(&str) -> String,
{
    dataset.map_column(idx, |cell| match cell.to_text() {
        Some(text) => Value::Utf8(f(&text)),
        None => Value::Null,
    });
}

/// Replace the exact text `"NULL"` with the missing marker in every column.
pub fn normalize_missing_literal(dataset: &mut DataSet) {
    for row in &mut dataset.rows {
        for cell in row.iter_mut() {
            if cell.as_str() == Some(NULL_LITERAL) {
                *cell = Value::Null;
            }
        }
    }
}

/// Strip leading/trailing whitespace, then turn each embedded line break (`\n`, `\r\n` or a
/// lone `\r`) into a single space.
pub fn trim_and_strip_newlines(dataset: &mut DataSet, idx: usize) {
    map_text(dataset, idx, |s| s.trim().replace("\r\n", " ").replace(['\r', '\n'], " "));
}

/// Replace every occurrence of `from` with `to` (left to right, non-overlapping).
pub fn replace_in_column(dataset: &mut DataSet, idx: usize, from: &str, to: &str) {
    map_text(dataset, idx, |s| s.replace(from, to));
}

/// Remove every character in `chars` from the column's text.
pub fn strip_chars(dataset: &mut DataSet, idx: usize, chars: &[char]) {
    map_text(dataset, idx, |s| s.chars().filter(|c| !chars.contains(c)).collect());
}

/// Keep only ASCII digits in the column's text.
pub fn keep_digits(dataset: &mut DataSet, idx: usize) {
    map_text(dataset, idx, |s| s.chars().filter(char::is_ascii_digit).collect());
}

/// For rows whose `key` column equals `equals`, replace every missing cell with `fill`.
pub fn fill_missing_where(dataset: &mut DataSet, key: usize, equals: &str, fill: &str) {
    for row in &mut dataset.rows {
        if row[key].as_str() != Some(equals) {
            continue;
        }
        for cell in row.iter_mut().filter(|c| c.is_null()) {
            *cell = Value::text(fill);
        }
    }
}
