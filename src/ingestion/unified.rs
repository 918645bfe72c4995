//! Unified ingestion entrypoint.
//!
//! Most callers should use [`ingest_from_path`], which ingests a file into an in-memory
//! [`crate::types::DataSet`] using a provided [`crate::types::Schema`].
//!
//! - If [`IngestionOptions::format`] is `None`, the ingestion format is inferred from the file
//!   extension.
//! - If an [`crate::observability::EtlObserver`] is provided, success/failure/alerts are
//!   reported to it.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::{EtlError, EtlResult};
use crate::observability::{report_failure, EtlContext, EtlObserver, RowStats, Severity, Stage};
use crate::types::{DataSet, Schema};

use super::{csv, json};

/// Supported ingestion formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestionFormat {
    /// Comma-separated values.
    Csv,
    /// JSON records, NDJSON, or a column-oriented object.
    Json,
}

impl IngestionFormat {
    /// Parse an ingestion format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" | "ndjson" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Options controlling unified ingestion behavior.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct IngestionOptions {
    /// If `None`, auto-detect format from file extension.
    pub format: Option<IngestionFormat>,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn EtlObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: Severity,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("format", &self.format)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            format: None,
            observer: None,
            alert_at_or_above: Severity::Critical,
        }
    }
}

/// Unified ingestion entry point for path-based sources.
///
/// When an observer is configured, this function reports:
///
/// - `on_success` on success, with row count stats
/// - `on_failure` on failure, with a computed severity
/// - `on_alert` on failure when the computed severity is >= `options.alert_at_or_above`
///
/// # Examples
///
/// ```no_run
/// use retail_etl::cleaning::{rules_for, DatasetKind};
/// use retail_etl::ingestion::{ingest_from_path, IngestionOptions};
///
/// # fn main() -> Result<(), retail_etl::EtlError> {
/// // Every expected column, read as raw text.
/// let schema = rules_for(DatasetKind::ProductDetails).raw_schema();
///
/// // Uses `.csv` to select CSV ingestion.
/// let ds = ingest_from_path("products.csv", &schema, &IngestionOptions::default())?;
/// println!("rows={}", ds.row_count());
/// # Ok(())
/// # }
/// ```
pub fn ingest_from_path(
    path: impl AsRef<Path>,
    schema: &Schema,
    options: &IngestionOptions,
) -> EtlResult<DataSet> {
    let path = path.as_ref();
    let ctx = EtlContext::new(Stage::Extract, None, path.display().to_string());

    let result = match options.format {
        Some(f) => Ok(f),
        None => infer_format_from_path(path),
    }
    .and_then(|fmt| match fmt {
        IngestionFormat::Csv => csv::ingest_csv_from_path(path, schema),
        IngestionFormat::Json => json::ingest_json_from_path(path, schema),
    });

    if let Some(obs) = options.observer.as_deref() {
        match &result {
            Ok(ds) => obs.on_success(&ctx, RowStats {
                rows_in: ds.row_count(),
                rows_out: ds.row_count(),
            }),
            Err(e) => report_failure(obs, &ctx, e, options.alert_at_or_above),
        }
    }

    result
}

/// Ingest in-memory text of a known format.
pub fn ingest_from_str(input: &str, format: IngestionFormat, schema: &Schema) -> EtlResult<DataSet> {
    match format {
        IngestionFormat::Csv => csv::ingest_csv_from_str(input, schema),
        IngestionFormat::Json => json::ingest_json_from_str(input, schema),
    }
}

/// Infer the format of a path or URL from its extension.
pub fn infer_format_from_path(path: &Path) -> EtlResult<IngestionFormat> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| EtlError::SchemaMismatch {
            message: format!(
                "cannot infer format: path has no extension ({})",
                path.display()
            ),
        })?;

    IngestionFormat::from_extension(ext).ok_or_else(|| EtlError::SchemaMismatch {
        message: format!(
            "cannot infer format from extension '{ext}' for path ({})",
            path.display()
        ),
    })
}
