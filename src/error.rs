/// Error taxonomy for the lexgraph pipeline.
///
/// Parsing-level anomalies are absorbed close to where they happen
/// (see [`PipelineError::Data`]); connectivity and transactional failures
/// are surfaced to the caller, which owns the store connection.
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by a [`GraphStore`](crate::db::GraphStore) backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to encode batch: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("{0}")]
    Backend(String),
}

/// Errors that can occur while building or loading the graph.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("input file not found: {}", .0.display())]
    InputMissing(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed input {}: {reason}", .path.display())]
    MalformedInput { path: PathBuf, reason: String },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("constraint `{statement}` not created: {source}")]
    Constraint {
        statement: String,
        #[source]
        source: StoreError,
    },

    #[error("{operation} batch starting at index {offset} failed: {source}")]
    Transaction {
        operation: &'static str,
        offset: usize,
        #[source]
        source: StoreError,
    },

    #[error("unparseable frequency {0:?}")]
    Data(String),

    #[error("record {index} does not match the {operation} payload: {reason}")]
    Schema {
        operation: &'static str,
        index: usize,
        reason: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PipelineError {
    /// Map an I/O failure on `path`, turning "not found" into [`PipelineError::InputMissing`].
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::InputMissing(path)
        } else {
            Self::Io { path, source }
        }
    }
}
