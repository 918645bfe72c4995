//! Table sinks: where cleaned datasets are persisted.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{EtlError, EtlResult};
use crate::types::DataSet;

/// Persists a dataset under a table name, replacing whatever the table held before.
pub trait TableSink: Send + Sync {
    fn store(&self, dataset: &DataSet, table: &str) -> EtlResult<()>;
}

/// Writes each table to `<dir>/<table>.csv`.
///
/// The file is written next to the target and renamed over it, so a failed write leaves the
/// previous table intact. Missing cells are written as empty fields.
#[derive(Debug, Clone)]
pub struct CsvDirSink {
    dir: PathBuf,
}

impl CsvDirSink {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Path a table is written to.
    pub fn table_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{table}.csv"))
    }
}

pub(crate) fn check_table_name(table: &str) -> EtlResult<()> {
    if table.is_empty() || table.contains(['/', '\\']) || table.starts_with('.') {
        return Err(EtlError::SchemaMismatch {
            message: format!("invalid table name '{table}'"),
        });
    }
    Ok(())
}

impl TableSink for CsvDirSink {
    fn store(&self, dataset: &DataSet, table: &str) -> EtlResult<()> {
        check_table_name(table)?;
        fs::create_dir_all(&self.dir)?;

        let path = self.table_path(table);
        let tmp = path.with_extension("csv.tmp");
        let written = write_csv(dataset, &tmp).and_then(|()| Ok(fs::rename(&tmp, &path)?));
        if written.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        written
    }
}

fn write_csv(dataset: &DataSet, path: &Path) -> EtlResult<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(dataset.schema.field_names())?;
    for row in &dataset.rows {
        wtr.write_record(row.iter().map(|v| v.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Keeps the latest dataset stored under each table name.
#[derive(Debug, Default)]
pub struct MemorySink {
    tables: Mutex<HashMap<String, DataSet>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the table, if anything was stored under it.
    pub fn get(&self, table: &str) -> Option<DataSet> {
        self.tables
            .lock()
            .ok()
            .and_then(|tables| tables.get(table).cloned())
    }

    /// Names of every stored table, sorted.
    pub fn tables(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .tables
            .lock()
            .map(|tables| tables.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }
}

impl TableSink for MemorySink {
    fn store(&self, dataset: &DataSet, table: &str) -> EtlResult<()> {
        check_table_name(table)?;
        let mut tables = self.tables.lock().map_err(|_| {
            EtlError::Io(std::io::Error::other("memory sink lock poisoned"))
        })?;
        tables.insert(table.to_string(), dataset.clone());
        Ok(())
    }
}
