//! `retail-etl` extracts retail datasets from heterogeneous sources, cleans them with one
//! validation engine, and loads them as star-schema tables.
//!
//! The core is [`cleaning::clean`]: given an in-memory [`types::DataSet`] and a
//! [`cleaning::DatasetKind`], it applies that kind's ordered cleaning pipeline and returns a
//! dataset in which every surviving row satisfies the kind's invariants. Malformed cells never
//! fail a run; they become [`types::Value::Null`] or their rows are dropped.
//!
//! ## Dataset kinds
//!
//! | Kind | Source name | Target table |
//! |---|---|---|
//! | `users` | `legacy_users` | `dim_users` |
//! | `card_details` | `card_details` | `dim_card_details` |
//! | `store_details` | `store_details` | `dim_store_details` |
//! | `product_details` | `products` | `dim_products` |
//! | `orders` | `orders_table` | `orders_table` |
//! | `events` | `date_details` | `dim_date_times` |
//!
//! ## Quick example: clean a dataset
//!
//! ```rust
//! use retail_etl::cleaning::{clean, DatasetKind};
//! use retail_etl::types::{DataSet, Schema, Value};
//!
//! # fn main() -> Result<(), retail_etl::EtlError> {
//! let raw = DataSet::new(
//!     Schema::utf8(["product_name", "product_price", "weight", "category", "EAN",
//!                   "date_added", "uuid", "removed", "product_code"]),
//!     vec![vec![
//!         Value::text("Tea"), Value::text("£1,234.50"), Value::text("500g"),
//!         Value::text("food"), Value::text("123"), Value::text("2019-05-06"),
//!         Value::text("u-1"), Value::text("Still_available"), Value::text("A1-1"),
//!     ]],
//! );
//! let cleaned = clean(raw, DatasetKind::ProductDetails)?;
//! assert_eq!(cleaned.cell(0, "product_price"), Some(&Value::Float64(1234.5)));
//! assert_eq!(cleaned.cell(0, "weight"), Some(&Value::Float64(0.5)));
//! # Ok(())
//! # }
//! ```
//!
//! ## Quick example: read a file
//!
//! ```no_run
//! use retail_etl::cleaning::{rules_for, DatasetKind};
//! use retail_etl::ingestion::{ingest_from_path, IngestionOptions};
//!
//! # fn main() -> Result<(), retail_etl::EtlError> {
//! let schema = rules_for(DatasetKind::CardDetails).raw_schema();
//! // Auto-detects by extension (.csv/.json/.ndjson).
//! let ds = ingest_from_path("card_details.csv", &schema, &IngestionOptions::default())?;
//! println!("rows={}", ds.row_count());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`cleaning`]: dataset kinds, rule tables and the cleaning engine
//! - [`processing`]: column-level primitives the engine is built from
//! - [`ingestion`]: CSV/JSON readers and table sources (file, memory, HTTP, store API, Postgres)
//! - [`loading`]: table sinks (CSV directory, memory, Postgres)
//! - [`database`]: Postgres credentials, SQL builders and (feature `postgres`) the client
//! - [`etl`]: the extract → clean → load orchestrator
//! - [`config`]: YAML job configuration
//! - [`observability`]: observer hooks, severities and stock observers
//! - [`types`]: schema + in-memory dataset types
//! - [`error`]: the error type shared by every layer

pub mod cleaning;
pub mod config;
pub mod database;
pub mod error;
pub mod etl;
pub mod ingestion;
pub mod loading;
pub mod observability;
pub mod processing;
pub mod types;

pub use error::{EtlError, EtlResult};
