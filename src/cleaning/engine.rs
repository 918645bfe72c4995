//! The cleaning engine entrypoints.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::rules::{rules_for, KindRules};
use super::step::{CardNumberCheck, Step};
use super::DatasetKind;
use crate::error::{EtlError, EtlResult};
use crate::observability::{report_failure, EtlContext, EtlObserver, RowStats, Severity, Stage};
use crate::types::DataSet;

/// Options controlling a cleaning run.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct CleaningOptions {
    /// Which rows the card-number check removes.
    pub card_number_check: CardNumberCheck,
    /// Optional observer for per-step row counts and failures.
    pub observer: Option<Arc<dyn EtlObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: Severity,
}

impl fmt::Debug for CleaningOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CleaningOptions")
            .field("card_number_check", &self.card_number_check)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for CleaningOptions {
    fn default() -> Self {
        Self {
            card_number_check: CardNumberCheck::default(),
            observer: None,
            alert_at_or_above: Severity::Critical,
        }
    }
}

/// Clean `dataset` with the pipeline for `kind`, using default options.
///
/// Malformed cells never fail the call: they become missing or their rows are dropped. The
/// call fails only when a step names a column the dataset does not have, and in that case no
/// step has run.
///
/// # Examples
///
/// ```rust
/// use retail_etl::cleaning::{clean, DatasetKind};
/// use retail_etl::types::{DataSet, Schema, Value};
///
/// # fn main() -> Result<(), retail_etl::EtlError> {
/// let raw = DataSet::new(
///     Schema::utf8(["date_uuid", "time_period"]),
///     vec![
///         vec![Value::text("a"), Value::text("Evening")],
///         vec![Value::text("b"), Value::text("NULL")],
///         vec![Value::text("c"), Value::text("Morning")],
///     ],
/// );
/// let cleaned = clean(raw, DatasetKind::Events)?;
/// assert_eq!(cleaned.row_count(), 2);
/// # Ok(())
/// # }
/// ```
pub fn clean(dataset: DataSet, kind: DatasetKind) -> EtlResult<DataSet> {
    clean_with(dataset, kind, &CleaningOptions::default())
}

/// Clean `dataset` with the pipeline for `kind`.
///
/// When an observer is configured, this function reports:
///
/// - `on_step` after each step, with rows before/after
/// - `on_success` at the end, with rows in/out for the whole pipeline
/// - `on_failure` (and `on_alert` above the threshold) for contract errors
pub fn clean_with(
    mut dataset: DataSet,
    kind: DatasetKind,
    options: &CleaningOptions,
) -> EtlResult<DataSet> {
    let rules = rules_for(kind);
    let ctx = EtlContext::new(Stage::Clean, Some(kind), kind.source_name());

    if let Err(e) = check_columns(&dataset, &rules) {
        if let Some(obs) = options.observer.as_deref() {
            report_failure(obs, &ctx, &e, options.alert_at_or_above);
        }
        return Err(e);
    }

    let rows_in = dataset.row_count();
    for step in &rules.steps {
        let before = dataset.row_count();
        step.apply(&mut dataset, kind, options.card_number_check)?;
        if let Some(obs) = options.observer.as_deref() {
            obs.on_step(&ctx, &step.to_string(), RowStats {
                rows_in: before,
                rows_out: dataset.row_count(),
            });
        }
    }

    if let Some(obs) = options.observer.as_deref() {
        obs.on_success(&ctx, RowStats {
            rows_in,
            rows_out: dataset.row_count(),
        });
    }
    Ok(dataset)
}

/// Walk the steps against the live column set and fail on the first absent column.
///
/// Columns removed by an earlier step count as absent for later ones.
pub fn check_columns(dataset: &DataSet, rules: &KindRules) -> EtlResult<()> {
    let mut live: HashSet<&str> = dataset.schema.field_names().collect();
    for step in &rules.steps {
        if let Some(column) = step.required_column() {
            if !live.contains(column) {
                return Err(EtlError::MissingColumn {
                    kind: rules.kind,
                    column: column.to_string(),
                });
            }
        }
        match step {
            Step::DropColumn { column } => {
                live.remove(column);
            }
            Step::DropColumns { columns } => {
                for column in columns.iter() {
                    live.remove(column);
                }
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::types::{Schema, Value};

    #[derive(Default)]
    struct RecordingObserver {
        steps: Mutex<Vec<(String, RowStats)>>,
        failures: Mutex<Vec<Severity>>,
    }

    impl EtlObserver for RecordingObserver {
        fn on_step(&self, _ctx: &EtlContext, step: &str, stats: RowStats) {
            self.steps.lock().unwrap().push((step.to_string(), stats));
        }

        fn on_failure(&self, _ctx: &EtlContext, severity: Severity, _error: &EtlError) {
            self.failures.lock().unwrap().push(severity);
        }
    }

    fn events(periods: &[&str]) -> DataSet {
        DataSet::new(
            Schema::utf8(["date_uuid", "time_period"]),
            periods
                .iter()
                .enumerate()
                .map(|(i, p)| vec![Value::text(i.to_string()), Value::text(*p)])
                .collect(),
        )
    }

    #[test]
    fn missing_column_fails_before_any_step() {
        let ds = DataSet::new(Schema::utf8(["date_uuid"]), vec![vec![Value::text("x")]]);
        let obs = Arc::new(RecordingObserver::default());
        let opts = CleaningOptions {
            observer: Some(obs.clone()),
            ..Default::default()
        };

        let err = clean_with(ds, DatasetKind::Events, &opts).unwrap_err();
        assert!(matches!(
            &err,
            EtlError::MissingColumn { kind: DatasetKind::Events, column } if column == "time_period"
        ));
        assert_eq!(err.to_string(), "events pipeline references missing column 'time_period'");
        assert!(obs.steps.lock().unwrap().is_empty());
        assert_eq!(*obs.failures.lock().unwrap(), vec![Severity::Error]);
    }

    #[test]
    fn observer_sees_each_step_with_row_counts() {
        let obs = Arc::new(RecordingObserver::default());
        let opts = CleaningOptions {
            observer: Some(obs.clone()),
            ..Default::default()
        };
        let out = clean_with(events(&["Evening", "Brunch", "Midday"]), DatasetKind::Events, &opts)
            .unwrap();
        assert_eq!(out.row_count(), 2);

        let steps = obs.steps.lock().unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].0, "keep_in(time_period)");
        assert_eq!(steps[0].1, RowStats {
            rows_in: 3,
            rows_out: 2
        });
    }

    #[test]
    fn dropped_columns_are_not_live_for_later_steps() {
        let ds = DataSet::new(Schema::utf8(["lat"]), vec![]);
        let mut rules = rules_for(DatasetKind::StoreDetails);
        rules.steps = vec![
            Step::DropColumn { column: "lat" },
            Step::TrimNewlines { column: "lat" },
        ];
        let err = check_columns(&ds, &rules).unwrap_err();
        assert!(matches!(err, EtlError::MissingColumn { column, .. } if column == "lat"));
    }
}
