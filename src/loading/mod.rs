//! Loading side of the pipeline.
//!
//! Cleaned datasets are handed to a [`TableSink`] under their target table name. Every store
//! is a full replace of that table.

#[cfg(feature = "postgres")]
pub mod postgres;
pub mod sink;

#[cfg(feature = "postgres")]
pub use postgres::PgSink;
pub use sink::{CsvDirSink, MemorySink, TableSink};
