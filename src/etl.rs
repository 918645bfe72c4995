//! Job orchestration: extract, clean, load.
//!
//! An [`EtlJob`] binds a [`DatasetKind`] to a [`TableSource`] and a target table. The
//! [`Orchestrator`] runs jobs against one [`TableSink`] and reports every stage to the observer
//! configured in its [`CleaningOptions`].
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use retail_etl::cleaning::{CleaningOptions, DatasetKind};
//! use retail_etl::etl::{EtlJob, Orchestrator};
//! use retail_etl::ingestion::MemorySource;
//! use retail_etl::loading::MemorySink;
//! use retail_etl::types::{DataSet, Schema, Value};
//!
//! # fn main() -> Result<(), retail_etl::EtlError> {
//! let raw = DataSet::new(
//!     Schema::utf8(["timestamp", "month", "year", "day", "time_period", "date_uuid"]),
//!     vec![vec![
//!         Value::text("22:00:06"),
//!         Value::text("9"),
//!         Value::text("2012"),
//!         Value::text("19"),
//!         Value::text("Evening"),
//!         Value::text("3b7ca996"),
//!     ]],
//! );
//! let source = MemorySource::new().with_table("date_details", raw);
//! let sink = Arc::new(MemorySink::new());
//!
//! let orchestrator = Orchestrator::new(sink.clone(), CleaningOptions::default());
//! let report = orchestrator.run_job(&EtlJob::new(DatasetKind::Events, source))?;
//! assert_eq!(report.table, "dim_date_times");
//! assert_eq!(sink.get("dim_date_times").unwrap().row_count(), 1);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use rayon::prelude::*;

use crate::cleaning::{clean_with, rules_for, CleaningOptions, DatasetKind};
use crate::error::EtlResult;
use crate::ingestion::TableSource;
use crate::loading::TableSink;
use crate::observability::{report_failure, EtlContext, RowStats, Stage};

/// One unit of work: fetch `logical_name` from `source`, clean it as `kind`, store it as `table`.
pub struct EtlJob {
    pub kind: DatasetKind,
    pub logical_name: String,
    pub table: String,
    pub source: Box<dyn TableSource>,
}

impl EtlJob {
    /// A job using the kind's standard source name and target table.
    pub fn new(kind: DatasetKind, source: impl TableSource + 'static) -> Self {
        Self {
            kind,
            logical_name: kind.source_name().to_string(),
            table: kind.target_table().to_string(),
            source: Box::new(source),
        }
    }

    pub fn with_logical_name(mut self, logical_name: impl Into<String>) -> Self {
        self.logical_name = logical_name.into();
        self
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }
}

impl std::fmt::Debug for EtlJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EtlJob")
            .field("kind", &self.kind)
            .field("logical_name", &self.logical_name)
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

/// Outcome of a successful job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub kind: DatasetKind,
    pub table: String,
    pub rows_extracted: usize,
    pub rows_loaded: usize,
}

impl JobReport {
    pub fn rows_dropped(&self) -> usize {
        self.rows_extracted.saturating_sub(self.rows_loaded)
    }
}

/// Runs jobs into a single sink.
pub struct Orchestrator {
    sink: Arc<dyn TableSink>,
    options: CleaningOptions,
}

impl Orchestrator {
    pub fn new(sink: Arc<dyn TableSink>, options: CleaningOptions) -> Self {
        Self { sink, options }
    }

    pub fn options(&self) -> &CleaningOptions {
        &self.options
    }

    /// Extract, clean and load one job.
    ///
    /// A failure at any stage is reported to the observer and returned; nothing is stored
    /// for a job that fails before the load stage.
    pub fn run_job(&self, job: &EtlJob) -> EtlResult<JobReport> {
        let schema = rules_for(job.kind).raw_schema();

        let extract_ctx = EtlContext::new(Stage::Extract, Some(job.kind), job.logical_name.as_str());
        let raw = self.observe(&extract_ctx, job.source.fetch(&job.logical_name, &schema))?;
        let rows_extracted = raw.row_count();
        if let Some(obs) = self.options.observer.as_deref() {
            obs.on_success(&extract_ctx, RowStats {
                rows_in: rows_extracted,
                rows_out: rows_extracted,
            });
        }

        // Cleaning reports its own steps and failures.
        let cleaned = clean_with(raw, job.kind, &self.options)?;

        let load_ctx = EtlContext::new(Stage::Load, Some(job.kind), job.table.as_str());
        self.observe(&load_ctx, self.sink.store(&cleaned, &job.table))?;
        if let Some(obs) = self.options.observer.as_deref() {
            obs.on_success(&load_ctx, RowStats {
                rows_in: cleaned.row_count(),
                rows_out: cleaned.row_count(),
            });
        }

        Ok(JobReport {
            kind: job.kind,
            table: job.table.clone(),
            rows_extracted,
            rows_loaded: cleaned.row_count(),
        })
    }

    /// Run jobs in order, stopping at the first failure.
    pub fn run_all(&self, jobs: &[EtlJob]) -> EtlResult<Vec<JobReport>> {
        jobs.iter().map(|job| self.run_job(job)).collect()
    }

    /// Run jobs concurrently on the rayon pool.
    ///
    /// Reports come back in job order. If any job fails, one of the errors is returned; the
    /// other jobs still run to completion.
    pub fn run_all_parallel(&self, jobs: &[EtlJob]) -> EtlResult<Vec<JobReport>> {
        let results: Vec<EtlResult<JobReport>> =
            jobs.par_iter().map(|job| self.run_job(job)).collect();
        results.into_iter().collect()
    }

    fn observe<T>(&self, ctx: &EtlContext, result: EtlResult<T>) -> EtlResult<T> {
        if let (Err(e), Some(obs)) = (&result, self.options.observer.as_deref()) {
            report_failure(obs, ctx, e, self.options.alert_at_or_above);
        }
        result
    }
}
