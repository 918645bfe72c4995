//! Postgres access for relational sources and sinks.
//!
//! Credentials come from a YAML file with the keys `RDS_HOST`, `RDS_PORT`, `RDS_DATABASE`,
//! `RDS_USER` and `RDS_PASSWORD`. The SQL builders here are plain functions; the connected
//! [`PgClient`] (feature `postgres`) drives them through `sqlx` on a private tokio runtime so
//! the rest of the crate stays synchronous.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{EtlError, EtlResult};
use crate::types::{DataSet, DataType, Value};

fn default_port() -> u16 {
    5432
}

/// Connection details for one database.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct DbCredentials {
    #[serde(rename = "RDS_HOST")]
    pub host: String,
    #[serde(rename = "RDS_PORT", default = "default_port")]
    pub port: u16,
    #[serde(rename = "RDS_DATABASE")]
    pub database: String,
    #[serde(rename = "RDS_USER")]
    pub user: String,
    #[serde(rename = "RDS_PASSWORD")]
    pub password: String,
}

impl fmt::Debug for DbCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbCredentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl DbCredentials {
    /// Read a credentials file.
    pub fn from_path(path: impl AsRef<Path>) -> EtlResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(yaml: &str) -> EtlResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    #[cfg(feature = "postgres")]
    pub fn connect_options(&self) -> sqlx::postgres::PgConnectOptions {
        sqlx::postgres::PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.user)
            .password(&self.password)
    }
}

/// Postgres limit on bind parameters in one statement.
pub const MAX_BIND_PARAMS: usize = 65_535;

/// Column names of a table in the current schema, in declaration order.
pub const TABLE_COLUMNS_SQL: &str = "SELECT column_name::text FROM information_schema.columns \
     WHERE table_schema = current_schema() AND table_name = $1 ORDER BY ordinal_position";

/// Every user table, grouped by schema.
pub const LIST_TABLES_SQL: &str = "SELECT table_schema::text, table_name::text \
     FROM information_schema.tables \
     WHERE table_schema NOT IN ('pg_catalog', 'information_schema') \
     ORDER BY table_schema, table_name";

/// Column type used when creating a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Text,
    BigInt,
    Double,
    Boolean,
    Date,
}

impl SqlType {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::BigInt => "BIGINT",
            Self::Double => "DOUBLE PRECISION",
            Self::Boolean => "BOOLEAN",
            Self::Date => "DATE",
        }
    }

    fn declared(data_type: &DataType) -> Self {
        match data_type {
            DataType::Utf8 => Self::Text,
            DataType::Int64 => Self::BigInt,
            DataType::Float64 => Self::Double,
            DataType::Bool => Self::Boolean,
            DataType::Date => Self::Date,
        }
    }

    fn holds(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (_, Value::Null)
                | (Self::Text, Value::Utf8(_))
                | (Self::BigInt, Value::Int64(_))
                | (Self::Double, Value::Float64(_))
                | (Self::Boolean, Value::Bool(_))
                | (Self::Date, Value::Date(_))
        )
    }
}

/// Column types for storing `dataset`.
///
/// A column keeps its declared type when every cell has it; mixed columns (a numeric column
/// holding `N/A` fill text, say) are stored as text.
pub fn column_sql_types(dataset: &DataSet) -> Vec<SqlType> {
    dataset
        .schema
        .fields
        .iter()
        .enumerate()
        .map(|(idx, field)| {
            let declared = SqlType::declared(&field.data_type);
            if dataset.rows.iter().all(|row| declared.holds(&row[idx])) {
                declared
            } else {
                SqlType::Text
            }
        })
        .collect()
}

/// Double-quote an identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn column_list(columns: &[&str]) -> String {
    columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn drop_table_sql(table: &str) -> String {
    format!("DROP TABLE IF EXISTS {}", quote_ident(table))
}

pub fn create_table_sql(table: &str, columns: &[&str], types: &[SqlType]) -> String {
    let defs = columns
        .iter()
        .zip(types)
        .map(|(c, t)| format!("{} {}", quote_ident(c), t.as_sql()))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE {} ({defs})", quote_ident(table))
}

/// Multi-row insert with `$n` placeholders, row-major.
pub fn insert_sql(table: &str, columns: &[&str], rows: usize) -> String {
    let width = columns.len();
    let values = (0..rows)
        .map(|r| {
            let params = (1..=width)
                .map(|c| format!("${}", r * width + c))
                .collect::<Vec<_>>()
                .join(", ");
            format!("({params})")
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES {values}",
        quote_ident(table),
        column_list(columns)
    )
}

/// Rows that fit in one insert statement.
pub fn rows_per_insert(columns: usize) -> usize {
    (MAX_BIND_PARAMS / columns.max(1)).max(1)
}

/// Select the named columns as text, so values are read the same way file sources read them.
pub fn select_sql(table: &str, columns: &[&str]) -> String {
    let projection = columns
        .iter()
        .map(|c| format!("{}::text", quote_ident(c)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("SELECT {projection} FROM {}", quote_ident(table))
}

/// First requested column the table does not have.
pub fn check_table_columns(table: &str, requested: &[&str], present: &[String]) -> EtlResult<()> {
    if present.is_empty() {
        return Err(EtlError::SchemaMismatch {
            message: format!("table '{table}' not found"),
        });
    }
    match requested.iter().find(|c| !present.iter().any(|p| p == *c)) {
        Some(column) => Err(EtlError::SchemaMismatch {
            message: format!("missing required column '{column}' in table '{table}'"),
        }),
        None => Ok(()),
    }
}

#[cfg(feature = "postgres")]
pub use client::PgClient;

#[cfg(feature = "postgres")]
mod client {
    use std::collections::BTreeMap;
    use std::fmt;
    use std::time::Duration;

    use sqlx::postgres::{PgArguments, PgPool, PgPoolOptions};
    use sqlx::query::Query;
    use sqlx::{Postgres, Row};
    use tokio::runtime::Runtime;

    use super::*;
    use crate::ingestion::csv::parse_typed_value;
    use crate::types::Schema;

    /// A pooled Postgres connection with its own runtime.
    pub struct PgClient {
        pool: PgPool,
        runtime: Runtime,
    }

    impl fmt::Debug for PgClient {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("PgClient")
                .field("pool_size", &self.pool.size())
                .finish()
        }
    }

    impl PgClient {
        pub fn connect(credentials: &DbCredentials) -> EtlResult<Self> {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .enable_all()
                .build()?;
            let pool = runtime.block_on(
                PgPoolOptions::new()
                    .acquire_timeout(Duration::from_secs(5))
                    .connect_with(credentials.connect_options()),
            )?;
            Ok(Self { pool, runtime })
        }

        /// Tables per schema, excluding the system catalogs.
        pub fn list_tables(&self) -> EtlResult<BTreeMap<String, Vec<String>>> {
            let rows: Vec<(String, String)> = self
                .runtime
                .block_on(sqlx::query_as(LIST_TABLES_SQL).fetch_all(&self.pool))?;
            let mut tables: BTreeMap<String, Vec<String>> = BTreeMap::new();
            for (schema, table) in rows {
                tables.entry(schema).or_default().push(table);
            }
            Ok(tables)
        }

        /// Read `table` shaped by `schema`.
        pub fn read_table(&self, table: &str, schema: &Schema) -> EtlResult<DataSet> {
            self.runtime.block_on(self.read_table_async(table, schema))
        }

        /// Drop, recreate and fill `table` in one transaction.
        pub fn replace_table(&self, table: &str, dataset: &DataSet) -> EtlResult<()> {
            self.runtime.block_on(self.replace_table_async(table, dataset))
        }

        async fn read_table_async(&self, table: &str, schema: &Schema) -> EtlResult<DataSet> {
            let present: Vec<String> = sqlx::query_scalar(TABLE_COLUMNS_SQL)
                .bind(table)
                .fetch_all(&self.pool)
                .await?;
            let columns: Vec<&str> = schema.field_names().collect();
            check_table_columns(table, &columns, &present)?;

            let sql = select_sql(table, &columns);
            let records = sqlx::query(&sql).fetch_all(&self.pool).await?;
            let mut rows = Vec::with_capacity(records.len());
            for (row_idx, record) in records.iter().enumerate() {
                let mut row = Vec::with_capacity(columns.len());
                for (col_idx, field) in schema.fields.iter().enumerate() {
                    let raw: Option<String> = record.try_get(col_idx)?;
                    row.push(match raw {
                        Some(raw) => {
                            parse_typed_value(row_idx + 1, &field.name, &field.data_type, &raw)?
                        }
                        None => Value::Null,
                    });
                }
                rows.push(row);
            }
            Ok(DataSet::new(schema.clone(), rows))
        }

        async fn replace_table_async(&self, table: &str, dataset: &DataSet) -> EtlResult<()> {
            let columns: Vec<&str> = dataset.schema.field_names().collect();
            let types = column_sql_types(dataset);

            let mut tx = self.pool.begin().await?;
            sqlx::query(&drop_table_sql(table)).execute(&mut *tx).await?;
            sqlx::query(&create_table_sql(table, &columns, &types))
                .execute(&mut *tx)
                .await?;
            if !columns.is_empty() {
                for chunk in dataset.rows.chunks(rows_per_insert(columns.len())) {
                    let sql = insert_sql(table, &columns, chunk.len());
                    let mut query = sqlx::query(&sql);
                    for row in chunk {
                        for (cell, ty) in row.iter().zip(&types) {
                            query = bind_cell(query, cell, *ty);
                        }
                    }
                    query.execute(&mut *tx).await?;
                }
            }
            tx.commit().await?;
            Ok(())
        }
    }

    impl Drop for PgClient {
        fn drop(&mut self) {
            self.runtime.block_on(self.pool.close());
        }
    }

    fn bind_cell<'q>(
        query: Query<'q, Postgres, PgArguments>,
        cell: &Value,
        ty: SqlType,
    ) -> Query<'q, Postgres, PgArguments> {
        match (ty, cell) {
            (SqlType::Text, _) => query.bind(cell.to_text()),
            (SqlType::BigInt, Value::Int64(v)) => query.bind(Some(*v)),
            (SqlType::BigInt, _) => query.bind(None::<i64>),
            (SqlType::Double, Value::Float64(v)) => query.bind(Some(*v)),
            (SqlType::Double, _) => query.bind(None::<f64>),
            (SqlType::Boolean, Value::Bool(v)) => query.bind(Some(*v)),
            (SqlType::Boolean, _) => query.bind(None::<bool>),
            (SqlType::Date, Value::Date(v)) => query.bind(Some(*v)),
            (SqlType::Date, _) => query.bind(None::<chrono::NaiveDate>),
        }
    }
}
