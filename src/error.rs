use std::path::PathBuf;
use thiserror::Error;

/// Failure to build the working table. Always fatal at startup.
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("failed to open {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed CSV in {path:?}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("column '{column}' not found in {path:?}")]
    MissingColumn { path: PathBuf, column: String },
    #[error("invalid {column} value '{value}' in {path:?} at line {line}")]
    InvalidValue {
        path: PathBuf,
        line: u64,
        column: &'static str,
        value: String,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("no map point selected")]
pub struct MissingSelectionError;
