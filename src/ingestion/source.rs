//! Table sources: where raw datasets come from.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{EtlError, EtlResult};
use crate::types::{DataSet, Schema};

use super::unified::{ingest_from_path, IngestionOptions};

/// Something that can produce a raw dataset by logical name.
///
/// Implementations return every column in `schema`, read as the schema says (the cleaning
/// rules read everything as raw text). Extra source columns are ignored.
pub trait TableSource: Send + Sync {
    fn fetch(&self, logical_name: &str, schema: &Schema) -> EtlResult<DataSet>;
}

/// Reads a local CSV/JSON file. The logical name is informational only.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    options: IngestionOptions,
}

impl FileSource {
    /// Format is inferred from the extension.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::with_options(path, IngestionOptions::default())
    }

    pub fn with_options(path: impl AsRef<Path>, options: IngestionOptions) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            options,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TableSource for FileSource {
    fn fetch(&self, _logical_name: &str, schema: &Schema) -> EtlResult<DataSet> {
        ingest_from_path(&self.path, schema, &self.options)
    }
}

/// Serves prepared datasets by logical name.
///
/// Each fetch is projected onto the requested schema, so tables can hold extra columns.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: HashMap<String, DataSet>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the dataset served under `logical_name`.
    pub fn with_table(mut self, logical_name: impl Into<String>, dataset: DataSet) -> Self {
        self.tables.insert(logical_name.into(), dataset);
        self
    }
}

impl TableSource for MemorySource {
    fn fetch(&self, logical_name: &str, schema: &Schema) -> EtlResult<DataSet> {
        let table = self
            .tables
            .get(logical_name)
            .ok_or_else(|| EtlError::SchemaMismatch {
                message: format!("no table named '{logical_name}'"),
            })?;
        project(table, schema)
    }
}

// Reorder/select columns of `table` to match `schema` by name.
fn project(table: &DataSet, schema: &Schema) -> EtlResult<DataSet> {
    let mut idxs = Vec::with_capacity(schema.fields.len());
    for field in &schema.fields {
        let idx = table
            .column_index(&field.name)
            .ok_or_else(|| EtlError::SchemaMismatch {
                message: format!("missing required column '{}'", field.name),
            })?;
        idxs.push(idx);
    }

    let rows = table
        .rows
        .iter()
        .map(|row| idxs.iter().map(|&i| row[i].clone()).collect())
        .collect();
    Ok(DataSet::new(schema.clone(), rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    fn table() -> DataSet {
        DataSet::new(Schema::utf8(["b", "a", "extra"]), vec![vec![
            Value::text("b0"),
            Value::text("a0"),
            Value::text("x"),
        ]])
    }

    #[test]
    fn memory_source_projects_onto_requested_schema() {
        let src = MemorySource::new().with_table("orders_table", table());
        let ds = src.fetch("orders_table", &Schema::utf8(["a", "b"])).unwrap();
        assert_eq!(ds.schema, Schema::utf8(["a", "b"]));
        assert_eq!(ds.rows, vec![vec![Value::text("a0"), Value::text("b0")]]);
    }

    #[test]
    fn memory_source_errors_on_unknown_table_or_column() {
        let src = MemorySource::new().with_table("t", table());
        assert!(src.fetch("nope", &Schema::utf8(["a"])).is_err());
        let err = src.fetch("t", &Schema::utf8(["zzz"])).unwrap_err();
        assert!(err.to_string().contains("missing required column 'zzz'"));
    }
}
