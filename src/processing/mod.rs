//! Column-level dataset primitives.
//!
//! The processing layer operates in place on a caller-owned [`crate::types::DataSet`], one
//! column (addressed by index) at a time. The cleaning engine composes these into per-kind
//! pipelines; they are public so callers can build ad-hoc cleanups too.
//!
//! - [`filter`]: row predicates (allow-lists, missing-value drops, pattern checks)
//! - [`map`]: cell rewrites (trimming, substring replacement, `"NULL"` normalization, fills)
//! - [`coerce`]: best-effort type coercion where failure yields the missing marker
//! - [`weight`]: unit-suffixed weight text to kilograms
//!
//! ## Example
//!
//! ```rust
//! use retail_etl::processing::{coerce_column, filter_isin, normalize_missing_literal};
//! use retail_etl::types::{DataSet, DataType, Schema, Value};
//!
//! let mut ds = DataSet::new(
//!     Schema::utf8(["country_code", "staff"]),
//!     vec![
//!         vec![Value::text("GB"), Value::text("12")],
//!         vec![Value::text("FR"), Value::text("7")],
//!         vec![Value::text("US"), Value::text("NULL")],
//!     ],
//! );
//!
//! filter_isin(&mut ds, 0, &["GB", "DE", "US"]);
//! normalize_missing_literal(&mut ds);
//! coerce_column(&mut ds, 1, &DataType::Int64);
//!
//! assert_eq!(ds.rows, vec![
//!     vec![Value::text("GB"), Value::Int64(12)],
//!     vec![Value::text("US"), Value::Null],
//! ]);
//! ```

pub mod coerce;
pub mod filter;
pub mod map;
pub mod weight;

pub use coerce::{coerce_column, coerce_value, parse_date};
pub use filter::{
    drop_rows_all_missing, drop_rows_any_missing, filter_isin, keep_matching, reject_longer_than,
    reject_matching, reject_non_numeric, reject_numeric,
};
pub use map::{
    fill_missing_where, keep_digits, normalize_missing_literal, replace_in_column, strip_chars,
    trim_and_strip_newlines, NULL_LITERAL,
};
pub use weight::{convert_weights, weight_in_kilograms, WeightUnit};
