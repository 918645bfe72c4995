//! YAML job configuration.
//!
//! ```yaml
//! output_dir: warehouse
//! log_file: etl.log
//! alert_at_or_above: critical
//! card_number_check: reject_numeric
//! headers:
//!   x-api-key: "secret"
//! jobs:
//!   - kind: users
//!     source: { type: file, path: data/legacy_users.csv }
//!   - kind: events
//!     source: { type: url, url: "s3://bucket/date_details.json" }
//!   - kind: store_details
//!     source:
//!       type: store_api
//!       number_stores_url: https://api.example.com/number_stores
//!       store_url: https://api.example.com/store_details/
//!   - kind: orders
//!     source: { type: database, credentials: db_creds.yaml, table: orders_table }
//! ```
//!
//! Setting `target_database: db_creds_local.yaml` loads tables into Postgres instead of
//! `output_dir`. Relative paths are resolved against the directory of the config file.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use crate::cleaning::{CardNumberCheck, CleaningOptions, DatasetKind};
use crate::error::{EtlError, EtlResult};
use crate::etl::EtlJob;
use crate::ingestion::{FileSource, IngestionFormat, IngestionOptions};
use crate::loading::{CsvDirSink, TableSink};
use crate::observability::{CompositeObserver, EtlObserver, FileObserver, Severity, StdErrObserver};

fn default_output_dir() -> PathBuf {
    PathBuf::from("warehouse")
}

fn default_alert_threshold() -> Severity {
    Severity::Critical
}

/// Top-level configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct EtlConfig {
    /// Root directory of the CSV table sink.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Credentials file of the Postgres database to load into, replacing the CSV sink.
    #[serde(default)]
    pub target_database: Option<PathBuf>,
    /// When set, events are also appended to this file.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    #[serde(default = "default_alert_threshold")]
    pub alert_at_or_above: Severity,
    #[serde(default)]
    pub card_number_check: CardNumberCheck,
    /// Headers sent with every HTTP request (e.g. an API key).
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    pub jobs: Vec<JobConfig>,
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

/// One job entry.
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    pub kind: DatasetKind,
    /// Logical source name; defaults to the kind's source name.
    #[serde(default)]
    pub name: Option<String>,
    /// Target table; defaults to the kind's target table.
    #[serde(default)]
    pub table: Option<String>,
    pub source: SourceConfig,
}

/// Where a job reads its raw data from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    File {
        path: PathBuf,
        #[serde(default)]
        format: Option<IngestionFormat>,
    },
    Url {
        url: String,
        #[serde(default)]
        format: Option<IngestionFormat>,
    },
    StoreApi {
        number_stores_url: String,
        store_url: String,
    },
    Database {
        credentials: PathBuf,
        /// Table to read; defaults to the job's logical source name.
        #[serde(default)]
        table: Option<String>,
    },
}

#[cfg(feature = "postgres")]
type DbClients = HashMap<PathBuf, Arc<crate::database::PgClient>>;
#[cfg(not(feature = "postgres"))]
type DbClients = HashMap<PathBuf, ()>;

impl EtlConfig {
    /// Load and validate a config file.
    pub fn from_path(path: impl AsRef<Path>) -> EtlResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let mut config = Self::from_str(&text)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Parse and validate config text. Relative paths stay relative to the working directory.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(yaml: &str) -> EtlResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> EtlResult<()> {
        let mut tables = HashSet::new();
        for job in &self.jobs {
            let table = job.table.as_deref().unwrap_or(job.kind.target_table());
            if !tables.insert(table) {
                return Err(EtlError::Config {
                    message: format!("more than one job loads table '{table}'"),
                });
            }
        }
        Ok(())
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Keep only jobs whose kind is in `kinds`. An empty list keeps everything.
    pub fn retain_kinds(&mut self, kinds: &[DatasetKind]) {
        if !kinds.is_empty() {
            self.jobs.retain(|job| kinds.contains(&job.kind));
        }
    }

    /// Sink writing CSV tables into `output_dir`.
    pub fn csv_sink(&self) -> CsvDirSink {
        CsvDirSink::new(self.resolve(&self.output_dir))
    }

    /// The configured sink: Postgres when `target_database` is set, CSV otherwise.
    pub fn sink(&self) -> EtlResult<Arc<dyn TableSink>> {
        match &self.target_database {
            Some(credentials) => self.database_sink(&self.resolve(credentials)),
            None => Ok(Arc::new(self.csv_sink())),
        }
    }

    #[cfg(feature = "postgres")]
    fn database_sink(&self, credentials: &Path) -> EtlResult<Arc<dyn TableSink>> {
        let credentials = crate::database::DbCredentials::from_path(credentials)?;
        Ok(Arc::new(crate::loading::PgSink::connect(&credentials)?))
    }

    #[cfg(not(feature = "postgres"))]
    fn database_sink(&self, credentials: &Path) -> EtlResult<Arc<dyn TableSink>> {
        Err(postgres_disabled(credentials))
    }

    /// Observer chain: stderr, plus the log file when configured.
    pub fn observer(&self, verbose: bool) -> Arc<dyn EtlObserver> {
        let mut observers: Vec<Arc<dyn EtlObserver>> = vec![Arc::new(StdErrObserver { verbose })];
        if let Some(log_file) = &self.log_file {
            observers.push(Arc::new(FileObserver::new(self.resolve(log_file))));
        }
        Arc::new(CompositeObserver::new(observers))
    }

    pub fn cleaning_options(&self, observer: Option<Arc<dyn EtlObserver>>) -> CleaningOptions {
        CleaningOptions {
            card_number_check: self.card_number_check,
            observer,
            alert_at_or_above: self.alert_at_or_above,
        }
    }

    /// Build runnable jobs in file order.
    ///
    /// Database sources naming the same credentials file share one connection pool.
    pub fn build_jobs(&self) -> EtlResult<Vec<EtlJob>> {
        let mut clients = DbClients::new();
        self.jobs
            .iter()
            .map(|job| self.build_job(job, &mut clients))
            .collect()
    }

    fn build_job(&self, job: &JobConfig, clients: &mut DbClients) -> EtlResult<EtlJob> {
        let mut built = match &job.source {
            SourceConfig::File { path, format } => {
                let options = IngestionOptions {
                    format: *format,
                    ..Default::default()
                };
                EtlJob::new(job.kind, FileSource::with_options(self.resolve(path), options))
            }
            SourceConfig::Url { url, format } => self.url_job(job.kind, url, *format)?,
            SourceConfig::StoreApi {
                number_stores_url,
                store_url,
            } => self.store_api_job(job.kind, number_stores_url, store_url)?,
            SourceConfig::Database { credentials, table } => {
                self.database_job(job.kind, &self.resolve(credentials), table.as_deref(), clients)?
            }
        };
        if let Some(name) = &job.name {
            built = built.with_logical_name(name.as_str());
        }
        if let Some(table) = &job.table {
            built = built.with_table(table.as_str());
        }
        Ok(built)
    }

    #[cfg(feature = "http")]
    fn url_job(
        &self,
        kind: DatasetKind,
        url: &str,
        format: Option<IngestionFormat>,
    ) -> EtlResult<EtlJob> {
        let mut source = crate::ingestion::HttpSource::new(url).with_headers(self.headers.clone());
        if let Some(format) = format {
            source = source.with_format(format);
        }
        Ok(EtlJob::new(kind, source))
    }

    #[cfg(not(feature = "http"))]
    fn url_job(
        &self,
        _kind: DatasetKind,
        url: &str,
        _format: Option<IngestionFormat>,
    ) -> EtlResult<EtlJob> {
        Err(http_disabled(url))
    }

    #[cfg(feature = "http")]
    fn store_api_job(
        &self,
        kind: DatasetKind,
        number_stores_url: &str,
        store_url: &str,
    ) -> EtlResult<EtlJob> {
        let source = crate::ingestion::StoreApiSource::new(number_stores_url, store_url)
            .with_headers(self.headers.clone());
        Ok(EtlJob::new(kind, source))
    }

    #[cfg(not(feature = "http"))]
    fn store_api_job(
        &self,
        _kind: DatasetKind,
        number_stores_url: &str,
        _store_url: &str,
    ) -> EtlResult<EtlJob> {
        Err(http_disabled(number_stores_url))
    }
}

#[cfg(feature = "postgres")]
impl EtlConfig {
    fn database_job(
        &self,
        kind: DatasetKind,
        credentials: &Path,
        table: Option<&str>,
        clients: &mut DbClients,
    ) -> EtlResult<EtlJob> {
        use crate::database::{DbCredentials, PgClient};
        use crate::ingestion::PgTableSource;

        let client = match clients.get(credentials) {
            Some(client) => Arc::clone(client),
            None => {
                let client = Arc::new(PgClient::connect(&DbCredentials::from_path(credentials)?)?);
                clients.insert(credentials.to_path_buf(), Arc::clone(&client));
                client
            }
        };
        let mut source = PgTableSource::new(client);
        if let Some(table) = table {
            source = source.with_table(table);
        }
        Ok(EtlJob::new(kind, source))
    }
}

#[cfg(not(feature = "postgres"))]
impl EtlConfig {
    fn database_job(
        &self,
        _kind: DatasetKind,
        credentials: &Path,
        _table: Option<&str>,
        _clients: &mut DbClients,
    ) -> EtlResult<EtlJob> {
        Err(postgres_disabled(credentials))
    }
}

#[cfg(not(feature = "postgres"))]
fn postgres_disabled(credentials: &Path) -> EtlError {
    EtlError::Config {
        message: format!(
            "database '{}' needs the `postgres` feature",
            credentials.display()
        ),
    }
}

#[cfg(not(feature = "http"))]
fn http_disabled(url: &str) -> EtlError {
    EtlError::Config {
        message: format!("source '{url}' needs the `http` feature"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
output_dir: out
alert_at_or_above: error
card_number_check: reject_non_numeric
headers:
  x-api-key: k
jobs:
  - kind: users
    source: { type: file, path: data/legacy_users.csv }
  - kind: events
    name: dates
    table: dim_dates
    source: { type: url, url: "s3://bucket/date_details.json", format: json }
  - kind: store_details
    source:
      type: store_api
      number_stores_url: https://api/number_stores
      store_url: https://api/store_details/
"#;

    #[test]
    fn parses_sources_and_defaults() {
        let config = EtlConfig::from_str(YAML).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.alert_at_or_above, Severity::Error);
        assert_eq!(config.card_number_check, CardNumberCheck::RejectNonNumeric);
        assert_eq!(config.headers.get("x-api-key").map(String::as_str), Some("k"));
        assert_eq!(config.jobs.len(), 3);
        assert_eq!(config.jobs[0].source, SourceConfig::File {
            path: PathBuf::from("data/legacy_users.csv"),
            format: None,
        });
        assert_eq!(config.jobs[1].source, SourceConfig::Url {
            url: "s3://bucket/date_details.json".to_string(),
            format: Some(IngestionFormat::Json),
        });
    }

    #[test]
    fn database_sources_and_target_parse() {
        let yaml = "target_database: db_creds_local.yaml\njobs:\n  - kind: users\n    source: { type: database, credentials: db_creds.yaml }\n  - kind: orders\n    source: { type: database, credentials: db_creds.yaml, table: orders_table }\n";
        let config = EtlConfig::from_str(yaml).unwrap();
        assert_eq!(config.target_database, Some(PathBuf::from("db_creds_local.yaml")));
        assert_eq!(config.jobs[0].source, SourceConfig::Database {
            credentials: PathBuf::from("db_creds.yaml"),
            table: None,
        });
        assert_eq!(config.jobs[1].source, SourceConfig::Database {
            credentials: PathBuf::from("db_creds.yaml"),
            table: Some("orders_table".to_string()),
        });
    }

    #[test]
    fn database_credentials_are_read_when_jobs_are_built() {
        let yaml = "jobs:\n  - kind: users\n    source: { type: database, credentials: /nonexistent/db_creds.yaml }\n";
        let err = EtlConfig::from_str(yaml).unwrap().build_jobs().unwrap_err();
        #[cfg(feature = "postgres")]
        assert!(matches!(err, EtlError::Io(_)));
        #[cfg(not(feature = "postgres"))]
        assert!(matches!(err, EtlError::Config { .. }));
    }

    #[test]
    fn csv_sink_is_the_default() {
        let config = EtlConfig::from_str("jobs: []").unwrap();
        assert!(config.target_database.is_none());
        assert!(config.sink().is_ok());
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = EtlConfig::from_str("jobs: []").unwrap();
        assert_eq!(config.output_dir, PathBuf::from("warehouse"));
        assert_eq!(config.alert_at_or_above, Severity::Critical);
        assert_eq!(config.card_number_check, CardNumberCheck::RejectNumeric);
        assert!(config.log_file.is_none());
    }

    #[test]
    fn unknown_kind_or_source_type_is_rejected() {
        assert!(EtlConfig::from_str("jobs:\n  - kind: refunds\n    source: { type: file, path: x.csv }\n").is_err());
        assert!(EtlConfig::from_str("jobs:\n  - kind: users\n    source: { type: ftp, path: x }\n").is_err());
    }

    #[test]
    fn duplicate_target_tables_are_rejected() {
        let yaml = "jobs:\n  - kind: users\n    source: { type: file, path: a.csv }\n  - kind: orders\n    table: dim_users\n    source: { type: file, path: b.csv }\n";
        let err = EtlConfig::from_str(yaml).unwrap_err();
        assert!(matches!(err, EtlError::Config { .. }));
        assert!(err.to_string().contains("dim_users"));
    }

    #[test]
    fn jobs_take_names_and_tables_from_config_or_kind() {
        let config = EtlConfig::from_str(YAML).unwrap();
        let jobs = config.build_jobs();
        #[cfg(feature = "http")]
        {
            let jobs = jobs.unwrap();
            assert_eq!(jobs[0].logical_name, "legacy_users");
            assert_eq!(jobs[0].table, "dim_users");
            assert_eq!(jobs[1].logical_name, "dates");
            assert_eq!(jobs[1].table, "dim_dates");
            assert_eq!(jobs[2].table, "dim_store_details");
        }
        #[cfg(not(feature = "http"))]
        assert!(matches!(jobs, Err(EtlError::Config { .. })));
    }

    #[test]
    fn retain_kinds_filters_jobs() {
        let mut config = EtlConfig::from_str(YAML).unwrap();
        config.retain_kinds(&[DatasetKind::Events]);
        assert_eq!(config.jobs.len(), 1);
        config.retain_kinds(&[]);
        assert_eq!(config.jobs.len(), 1);
    }

    #[test]
    fn relative_paths_follow_the_config_file() {
        let mut config = EtlConfig::from_str(YAML).unwrap();
        config.base_dir = Some(PathBuf::from("/etc/etl"));
        assert_eq!(
            config.csv_sink().table_path("dim_users"),
            PathBuf::from("/etc/etl/out/dim_users.csv")
        );
    }
}
