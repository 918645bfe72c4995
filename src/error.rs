use thiserror::Error;

use crate::cleaning::DatasetKind;

/// Convenience result type used across extraction, cleaning and loading.
pub type EtlResult<T> = Result<T, EtlError>;

/// Error type returned by every layer of the pipeline.
///
/// Data-quality problems inside the cleaning engine never surface here; they become missing
/// cells or dropped rows. What does surface is either a collaborator failure (I/O, HTTP,
/// malformed files) or a contract violation between a caller and the engine.
#[derive(Debug, Error)]
pub enum EtlError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read/write error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON decoding error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration file could not be parsed.
    #[error("config error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[cfg(feature = "http")]
    /// HTTP transport error (feature-gated behind `http`).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[cfg(feature = "postgres")]
    /// Database error (feature-gated behind `postgres`).
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A configuration file parsed but describes an unusable setup.
    #[error("invalid config: {message}")]
    Config { message: String },

    /// An HTTP endpoint answered with a non-success status.
    #[error("http status {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    /// The input does not conform to the provided schema (missing required fields/columns, etc.).
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// A value could not be parsed into the required [`crate::types::DataType`].
    #[error("failed to parse value at row {row} column '{column}': {message} (raw='{raw}')")]
    ParseError {
        row: usize,
        column: String,
        raw: String,
        message: String,
    },

    /// A cleaning step references a column the input dataset does not have.
    #[error("{kind} pipeline references missing column '{column}'")]
    MissingColumn { kind: DatasetKind, column: String },

    /// A dataset kind name did not match any known pipeline.
    #[error("unknown dataset kind '{name}'")]
    UnknownKind { name: String },
}

impl EtlError {
    /// Contract errors are caller/collaborator mismatches rather than data or I/O failures.
    pub fn is_contract_error(&self) -> bool {
        matches!(self, Self::MissingColumn { .. } | Self::UnknownKind { .. })
    }
}
