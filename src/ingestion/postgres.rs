//! Relational table source.

use std::sync::Arc;

use crate::database::{DbCredentials, PgClient};
use crate::error::EtlResult;
use crate::ingestion::TableSource;
use crate::types::{DataSet, Schema};

/// Reads a Postgres table. The table defaults to the job's logical source name.
#[derive(Debug, Clone)]
pub struct PgTableSource {
    client: Arc<PgClient>,
    table: Option<String>,
}

impl PgTableSource {
    pub fn new(client: Arc<PgClient>) -> Self {
        Self {
            client,
            table: None,
        }
    }

    pub fn connect(credentials: &DbCredentials) -> EtlResult<Self> {
        Ok(Self::new(Arc::new(PgClient::connect(credentials)?)))
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }
}

impl TableSource for PgTableSource {
    fn fetch(&self, logical_name: &str, schema: &Schema) -> EtlResult<DataSet> {
        let table = self.table.as_deref().unwrap_or(logical_name);
        self.client.read_table(table, schema)
    }
}
