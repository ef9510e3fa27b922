//! Error type shared by every pipeline stage.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Broad class of a failure, used to pick the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Integrity,
    Output,
}

impl ErrorKind {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Input => 2,
            Self::Integrity => 3,
            Self::Output => 4,
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to read {path}: {source}")]
    ReadCsv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("order {order_id}: cannot parse {column} value {value:?}: {source}")]
    Timestamp {
        order_id: String,
        column: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("delivered order {order_id} has no {column}")]
    MissingTimestamp {
        order_id: String,
        column: &'static str,
    },

    #[error("failed to write {path}: {source}")]
    WriteCsv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to write {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize summary: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to render {path}: {message}")]
    Render { path: PathBuf, message: String },
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ReadCsv { .. } | Self::Timestamp { .. } => ErrorKind::Input,
            Self::MissingTimestamp { .. } => ErrorKind::Integrity,
            Self::WriteCsv { .. }
            | Self::WriteFile { .. }
            | Self::Json(_)
            | Self::Render { .. } => ErrorKind::Output,
        }
    }
}
