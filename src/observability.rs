//! Observer hooks for extraction, cleaning and loading outcomes.
//!
//! Nothing in the crate logs on its own. Callers attach an [`EtlObserver`] (to
//! [`crate::cleaning::CleaningOptions`], [`crate::ingestion::IngestionOptions`] or an
//! [`crate::etl::Orchestrator`]) and decide where events go.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Deserialize;

use crate::cleaning::DatasetKind;
use crate::error::EtlError;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (operation failed).
    Error,
    /// Critical error (typically I/O or other infrastructure failures).
    Critical,
}

impl Severity {
    /// Severity of a failed operation.
    pub fn of(error: &EtlError) -> Self {
        match error {
            EtlError::Io(_) => Self::Critical,
            #[cfg(feature = "http")]
            EtlError::Http(_) => Self::Critical,
            #[cfg(feature = "postgres")]
            EtlError::Database(err) => match err {
                sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolTimedOut => {
                    Self::Critical
                }
                _ => Self::Error,
            },
            EtlError::Csv(err) => match err.kind() {
                ::csv::ErrorKind::Io(_) => Self::Critical,
                _ => Self::Error,
            },
            EtlError::Json(err) if err.is_io() => Self::Critical,
            _ => Self::Error,
        }
    }
}

/// Which part of the pipeline an event comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extract,
    Clean,
    Load,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Extract => "extract",
            Self::Clean => "clean",
            Self::Load => "load",
        })
    }
}

/// Context about one pipeline operation.
#[derive(Debug, Clone)]
pub struct EtlContext {
    pub stage: Stage,
    /// Dataset kind, when known.
    pub kind: Option<DatasetKind>,
    /// Path, URL, logical source name or table name the operation is about.
    pub target: String,
}

impl EtlContext {
    pub fn new(stage: Stage, kind: Option<DatasetKind>, target: impl Into<String>) -> Self {
        Self {
            stage,
            kind,
            target: target.into(),
        }
    }
}

impl fmt::Display for EtlContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            Some(kind) => write!(f, "stage={} kind={} target={}", self.stage, kind, self.target),
            None => write!(f, "stage={} target={}", self.stage, self.target),
        }
    }
}

/// Row counts in and out of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowStats {
    pub rows_in: usize,
    pub rows_out: usize,
}

impl RowStats {
    pub fn dropped(&self) -> usize {
        self.rows_in.saturating_sub(self.rows_out)
    }
}

/// Observer interface for pipeline outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait EtlObserver: Send + Sync {
    /// Called when an operation succeeds.
    fn on_success(&self, _ctx: &EtlContext, _stats: RowStats) {}

    /// Called after each cleaning step.
    fn on_step(&self, _ctx: &EtlContext, _step: &str, _stats: RowStats) {}

    /// Called when an operation fails.
    fn on_failure(&self, _ctx: &EtlContext, _severity: Severity, _error: &EtlError) {}

    /// Called when a failure meets an alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &EtlContext, severity: Severity, error: &EtlError) {
        self.on_failure(ctx, severity, error)
    }
}

/// Report a failure, raising an alert when `severity >= alert_at_or_above`.
pub(crate) fn report_failure(
    observer: &dyn EtlObserver,
    ctx: &EtlContext,
    error: &EtlError,
    alert_at_or_above: Severity,
) {
    let severity = Severity::of(error);
    observer.on_failure(ctx, severity, error);
    if severity >= alert_at_or_above {
        observer.on_alert(ctx, severity, error);
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn EtlObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn EtlObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl EtlObserver for CompositeObserver {
    fn on_success(&self, ctx: &EtlContext, stats: RowStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_step(&self, ctx: &EtlContext, step: &str, stats: RowStats) {
        for o in &self.observers {
            o.on_step(ctx, step, stats);
        }
    }

    fn on_failure(&self, ctx: &EtlContext, severity: Severity, error: &EtlError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &EtlContext, severity: Severity, error: &EtlError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Logs events to stderr. Per-step lines are only written when `verbose` is set.
#[derive(Debug, Default)]
pub struct StdErrObserver {
    pub verbose: bool,
}

impl EtlObserver for StdErrObserver {
    fn on_success(&self, ctx: &EtlContext, stats: RowStats) {
        eprintln!("[etl][ok] {ctx} rows_in={} rows_out={}", stats.rows_in, stats.rows_out);
    }

    fn on_step(&self, ctx: &EtlContext, step: &str, stats: RowStats) {
        if self.verbose {
            eprintln!("[etl][step] {ctx} step={step} dropped={}", stats.dropped());
        }
    }

    fn on_failure(&self, ctx: &EtlContext, severity: Severity, error: &EtlError) {
        eprintln!("[etl][{severity:?}] {ctx} err={error}");
    }

    fn on_alert(&self, ctx: &EtlContext, severity: Severity, error: &EtlError) {
        eprintln!("[ALERT][etl][{severity:?}] {ctx} err={error}");
    }
}

/// Appends events to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{} {line}", unix_ts());
        }
    }
}

impl EtlObserver for FileObserver {
    fn on_success(&self, ctx: &EtlContext, stats: RowStats) {
        self.append_line(&format!(
            "ok {ctx} rows_in={} rows_out={}",
            stats.rows_in, stats.rows_out
        ));
    }

    fn on_step(&self, ctx: &EtlContext, step: &str, stats: RowStats) {
        self.append_line(&format!(
            "step {ctx} step={step} rows_in={} rows_out={}",
            stats.rows_in, stats.rows_out
        ));
    }

    fn on_failure(&self, ctx: &EtlContext, severity: Severity, error: &EtlError) {
        self.append_line(&format!("fail severity={severity:?} {ctx} err={error}"));
    }

    fn on_alert(&self, ctx: &EtlContext, severity: Severity, error: &EtlError) {
        self.append_line(&format!("ALERT severity={severity:?} {ctx} err={error}"));
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_failures_are_critical_and_contract_errors_are_not() {
        let io = EtlError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(Severity::of(&io), Severity::Critical);

        let missing = EtlError::MissingColumn {
            kind: DatasetKind::Users,
            column: "email_address".to_string(),
        };
        assert_eq!(Severity::of(&missing), Severity::Error);
        assert!(Severity::Critical > Severity::Error);
    }

    #[test]
    fn file_observer_appends_lines() {
        let path = std::env::temp_dir().join(format!(
            "retail-etl-observer-{}.log",
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        let obs = FileObserver::new(&path);
        let ctx = EtlContext::new(Stage::Load, Some(DatasetKind::Events), "dim_date_times");
        obs.on_success(&ctx, RowStats {
            rows_in: 3,
            rows_out: 2,
        });
        obs.on_step(&ctx, "keep_in(time_period)", RowStats {
            rows_in: 3,
            rows_out: 2,
        });

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("ok stage=load kind=events target=dim_date_times rows_in=3 rows_out=2"));
        assert!(lines[1].contains("step=keep_in(time_period)"));
        let _ = std::fs::remove_file(&path);
    }
}
