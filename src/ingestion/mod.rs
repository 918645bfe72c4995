//! Ingestion entrypoints and table sources.
//!
//! Most callers should use [`ingest_from_path`] (from [`unified`]) which:
//!
//! - auto-detects format by file extension (or you can override via [`IngestionOptions`])
//! - performs ingestion into an in-memory [`crate::types::DataSet`]
//! - optionally reports success/failure/alerts to an [`crate::observability::EtlObserver`]
//!
//! The orchestrator pulls datasets through the [`TableSource`] trait instead; see [`source`]
//! and the feature-gated `http` and `postgres` modules.
//!
//! Format-specific functions are also available under:
//! - [`csv`]
//! - [`json`]

pub mod csv;
#[cfg(feature = "http")]
pub mod http;
pub mod json;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod source;
pub mod unified;

#[cfg(feature = "http")]
pub use http::{object_url, HttpSource, StoreApiSource};
#[cfg(feature = "postgres")]
pub use postgres::PgTableSource;
pub use source::{FileSource, MemorySource, TableSource};
pub use unified::{ingest_from_path, ingest_from_str, IngestionFormat, IngestionOptions};
