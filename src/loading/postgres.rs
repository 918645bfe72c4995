//! Relational table sink.

use std::sync::Arc;

use crate::database::{DbCredentials, PgClient};
use crate::error::EtlResult;
use crate::loading::sink::check_table_name;
use crate::loading::TableSink;
use crate::types::DataSet;

/// Stores each dataset as a Postgres table, dropping any previous table of that name.
///
/// Drop, create and insert share one transaction, so readers see either the old table or the
/// complete new one.
#[derive(Debug, Clone)]
pub struct PgSink {
    client: Arc<PgClient>,
}

impl PgSink {
    pub fn new(client: Arc<PgClient>) -> Self {
        Self { client }
    }

    pub fn connect(credentials: &DbCredentials) -> EtlResult<Self> {
        Ok(Self::new(Arc::new(PgClient::connect(credentials)?)))
    }
}

impl TableSink for PgSink {
    fn store(&self, dataset: &DataSet, table: &str) -> EtlResult<()> {
        check_table_name(table)?;
        self.client.replace_table(table, dataset)
    }
}
