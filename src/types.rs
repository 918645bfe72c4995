//! Core data model types.
//!
//! Sources produce an in-memory [`DataSet`] shaped by a [`Schema`] (a list of typed [`Field`]s);
//! the cleaning engine rewrites it in place and sinks persist it.

use std::fmt;

use chrono::NaiveDate;

/// Logical data type for a schema field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point number.
    Float64,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    Utf8,
    /// Calendar date without time zone.
    Date,
}

/// A single named, typed field in a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field/column name.
    pub name: String,
    /// Field data type.
    pub data_type: DataType,
}

impl Field {
    /// Create a new field.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// A list of fields describing the expected shape of incoming data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    /// Ordered list of fields.
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create a new schema from fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Build a schema where every column is raw text ([`DataType::Utf8`]).
    pub fn utf8<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            names
                .into_iter()
                .map(|n| Field::new(n, DataType::Utf8))
                .collect(),
        )
    }

    /// Iterate field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Returns the index of a field by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

/// A single typed value in a [`DataSet`].
///
/// [`Value::Null`] is the missing marker. The raw text `"NULL"` found in some sources is a
/// plain [`Value::Utf8`] until the cleaning engine normalizes it.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing/empty value.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Utf8(String),
    /// Calendar date.
    Date(NaiveDate),
}

impl Value {
    /// Shorthand for a text cell.
    pub fn text(s: impl Into<String>) -> Self {
        Self::Utf8(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the cell as text if it is a [`Value::Utf8`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Utf8(s) => Some(s),
            _ => None,
        }
    }

    /// Text form of a non-missing cell; `None` for [`Value::Null`].
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Utf8(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Utf8(s) => f.write_str(s),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

/// In-memory tabular dataset.
///
/// Rows are stored as `Vec<Vec<Value>>` in the same order as the [`Schema`] fields.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSet {
    /// Schema describing row shape.
    pub schema: Schema,
    /// Row-major value storage.
    pub rows: Vec<Vec<Value>>,
    /// Column designated as the row identifier, if any. Not used for deduplication.
    pub index: Option<String>,
}

impl DataSet {
    /// Create a dataset from schema and rows.
    pub fn new(schema: Schema, rows: Vec<Vec<Value>>) -> Self {
        Self {
            schema,
            rows,
            index: None,
        }
    }

    /// Number of rows in the dataset.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns the column index for `name`, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.schema.index_of(name)
    }

    /// Iterate the cells of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Returns the cell at (`row`, `column`), if both exist.
    pub fn cell(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// Keep only rows for which `predicate` returns `true`, preserving order.
    pub fn retain_rows<F>(&mut self, mut predicate: F)
    where
        F: FnMut(&[Value]) -> bool,
    {
        self.rows.retain(|row| predicate(row.as_slice()));
    }

    /// Rewrite every cell of column `idx` through `f`.
    pub fn map_column<F>(&mut self, idx: usize, mut f: F)
    where
        F: FnMut(Value) -> Value,
    {
        for row in &mut self.rows {
            let cell = std::mem::replace(&mut row[idx], Value::Null);
            row[idx] = f(cell);
        }
    }

    /// Set the declared type of column `idx`.
    pub fn set_column_type(&mut self, idx: usize, data_type: DataType) {
        self.schema.fields[idx].data_type = data_type;
    }

    /// Remove a column by name. Returns `false` if it was not present.
    pub fn drop_column(&mut self, name: &str) -> bool {
        let Some(idx) = self.column_index(name) else {
            return false;
        };
        self.schema.fields.remove(idx);
        for row in &mut self.rows {
            row.remove(idx);
        }
        if self.index.as_deref() == Some(name) {
            self.index = None;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::{DataSet, DataType, Field, Schema, Value};
    use chrono::NaiveDate;

    fn sample_dataset() -> DataSet {
        let schema = Schema::new(vec![
            Field::new("index", DataType::Int64),
            Field::new("name", DataType::Utf8),
            Field::new("level_0", DataType::Int64),
        ]);
        DataSet::new(
            schema,
            vec![
                vec![Value::Int64(0), Value::text("a"), Value::Int64(9)],
                vec![Value::Int64(1), Value::Null, Value::Int64(8)],
            ],
        )
    }

    #[test]
    fn schema_index_of_works() {
        let ds = sample_dataset();
        assert_eq!(ds.schema.index_of("index"), Some(0));
        assert_eq!(ds.schema.index_of("level_0"), Some(2));
        assert_eq!(ds.schema.index_of("missing"), None);
    }

    #[test]
    fn drop_column_removes_field_and_cells() {
        let mut ds = sample_dataset();
        assert!(ds.drop_column("level_0"));
        assert!(!ds.drop_column("level_0"));
        assert_eq!(ds.schema.field_names().collect::<Vec<_>>(), vec!["index", "name"]);
        assert!(ds.rows.iter().all(|r| r.len() == 2));
    }

    #[test]
    fn drop_column_clears_index_designation() {
        let mut ds = sample_dataset();
        ds.index = Some("index".to_string());
        ds.drop_column("index");
        assert_eq!(ds.index, None);
    }

    #[test]
    fn retain_rows_preserves_order() {
        let mut ds = sample_dataset();
        ds.rows.push(vec![Value::Int64(2), Value::text("c"), Value::Int64(7)]);
        ds.retain_rows(|row| !row[1].is_null());
        assert_eq!(ds.column("index").unwrap().cloned().collect::<Vec<_>>(), vec![
            Value::Int64(0),
            Value::Int64(2)
        ]);
    }

    #[test]
    fn display_renders_missing_as_empty_and_dates_iso() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::Float64(0.5).to_string(), "0.5");
        let d = NaiveDate::from_ymd_opt(2001, 2, 3).unwrap();
        assert_eq!(Value::Date(d).to_string(), "2001-02-03");
        assert_eq!(Value::Null.to_text(), None);
        assert_eq!(Value::Int64(42).to_text(), Some("42".to_string()));
    }
}
