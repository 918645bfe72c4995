//! Row filtering primitives for [`crate::types::DataSet`].
//!
//! Every filter keeps surviving rows in their original order and never adds rows.

use regex::Regex;

use crate::types::{DataSet, Value};

/// Keep rows whose text value in column `idx` is one of `allowed`. Missing cells are dropped.
pub fn filter_isin(dataset: &mut DataSet, idx: usize, allowed: &[&str]) {
    dataset.retain_rows(|row| {
        row[idx]
            .to_text()
            .is_some_and(|v| allowed.contains(&v.as_str()))
    });
}

/// Remove rows containing the missing marker in any column.
pub fn drop_rows_any_missing(dataset: &mut DataSet) {
    dataset.retain_rows(|row| !row.iter().any(Value::is_null));
}

/// Remove rows that are missing in every column.
pub fn drop_rows_all_missing(dataset: &mut DataSet) {
    dataset.retain_rows(|row| !row.iter().all(Value::is_null));
}

/// Keep rows whose text in column `idx` matches `re`. Missing cells never match.
///
/// Anchoring is the pattern's business: use `^...$` for a full match.
pub fn keep_matching(dataset: &mut DataSet, idx: usize, re: &Regex) {
    dataset.retain_rows(|row| row[idx].to_text().is_some_and(|v| re.is_match(&v)));
}

/// Drop rows whose text in column `idx` matches `re`. Missing cells never match, so they stay.
pub fn reject_matching(dataset: &mut DataSet, idx: usize, re: &Regex) {
    dataset.retain_rows(|row| !row[idx].to_text().is_some_and(|v| re.is_match(&v)));
}

/// Drop rows whose text in column `idx` is longer than `max` characters.
pub fn reject_longer_than(dataset: &mut DataSet, idx: usize, max: usize) {
    dataset.retain_rows(|row| {
        row[idx]
            .to_text()
            .is_none_or(|v| v.chars().count() <= max)
    });
}

/// Drop rows where column `idx` parses fully as a number (or already holds one).
pub fn reject_numeric(dataset: &mut DataSet, idx: usize) {
    dataset.retain_rows(|row| !is_numeric_cell(&row[idx]));
}

/// Drop rows where column `idx` is present but does not parse fully as a number.
pub fn reject_non_numeric(dataset: &mut DataSet, idx: usize) {
    dataset.retain_rows(|row| row[idx].is_null() || is_numeric_cell(&row[idx]));
}

fn is_numeric_cell(v: &Value) -> bool {
    match v {
        Value::Int64(_) | Value::Float64(_) => true,
        Value::Utf8(s) => s.trim().parse::<f64>().is_ok_and(f64::is_finite),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DataSet, Schema, Value};

    fn text_dataset(rows: &[[Option<&str>; 2]]) -> DataSet {
        let rows = rows
            .iter()
            .map(|r| {
                r.iter()
                    .map(|c| c.map(Value::text).unwrap_or(Value::Null))
                    .collect()
            })
            .collect();
        DataSet::new(Schema::utf8(["a", "b"]), rows)
    }

    #[test]
    fn filter_isin_keeps_allowed_and_drops_missing() {
        let mut ds = text_dataset(&[
            [Some("GB"), Some("1")],
            [Some("FR"), Some("2")],
            [None, Some("3")],
            [Some("US"), Some("4")],
        ]);
        filter_isin(&mut ds, 0, &["GB", "DE", "US"]);
        let kept: Vec<_> = ds.rows.iter().map(|r| r[1].clone()).collect();
        assert_eq!(kept, vec![Value::text("1"), Value::text("4")]);
    }

    #[test]
    fn any_versus_all_missing() {
        let rows = [
            [Some("x"), None],
            [None, None],
            [Some("y"), Some("z")],
        ];
        let mut any = text_dataset(&rows);
        drop_rows_any_missing(&mut any);
        assert_eq!(any.row_count(), 1);

        let mut all = text_dataset(&rows);
        drop_rows_all_missing(&mut all);
        assert_eq!(all.row_count(), 2);
    }

    #[test]
    fn keep_matching_drops_missing_and_non_matching() {
        let re = Regex::new(r"^[0-9]{2}/[0-9]{2}$").unwrap();
        let mut ds = text_dataset(&[
            [Some("12/34"), Some("1")],
            [Some("12/34xyz"), Some("2")],
            [None, Some("3")],
        ]);
        keep_matching(&mut ds, 0, &re);
        assert_eq!(ds.row_count(), 1);
        assert_eq!(ds.rows[0][1], Value::text("1"));
    }

    #[test]
    fn reject_matching_keeps_missing_cells() {
        let re = Regex::new(r"^\d+$").unwrap();
        let mut ds = text_dataset(&[[Some("123"), None], [None, None], [Some("Ann"), None]]);
        reject_matching(&mut ds, 0, &re);
        assert_eq!(ds.row_count(), 2);
    }

    #[test]
    fn numeric_checks_are_inverse_on_present_cells() {
        let rows = [
            [Some("4971858637664481"), None],
            [Some("NB71VBAHJE"), None],
            [None, None],
        ];
        let mut numeric_dropped = text_dataset(&rows);
        reject_numeric(&mut numeric_dropped, 0);
        assert_eq!(numeric_dropped.row_count(), 2);

        let mut text_dropped = text_dataset(&rows);
        reject_non_numeric(&mut text_dropped, 0);
        assert_eq!(text_dropped.row_count(), 2);
        assert_eq!(text_dropped.rows[0][0], Value::text("4971858637664481"));
    }

    #[test]
    fn reject_longer_than_counts_characters() {
        let mut ds = text_dataset(&[
            [Some("1234567890123456789"), None],
            [Some("12345678901234567890"), None],
            [None, None],
        ]);
        reject_longer_than(&mut ds, 0, 19);
        assert_eq!(ds.row_count(), 2);
    }
}
