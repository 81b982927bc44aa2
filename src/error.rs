use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error in {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{path:?} line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },
    #[error("{path:?}: invalid metadata: {message}")]
    InvalidMetadata { path: PathBuf, message: String },
    #[error("required input missing: {0:?}")]
    MissingInput(PathBuf),
    #[error("{fiber_type} population is empty, activation fraction undefined")]
    ZeroPopulation { fiber_type: &'static str },
    #[error("{context} length mismatch: expected {expected}, got {got}")]
    LengthMismatch {
        context: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("time axis of unit {unit} has {got} samples, first axis has {expected}")]
    TimeAxisMismatch {
        unit: String,
        expected: usize,
        got: usize,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("worker panicked while processing {0}")]
    WorkerPanic(String),
}

impl CompileError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CompileError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        CompileError::Parse {
            path: path.into(),
            line,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CompileError>;
