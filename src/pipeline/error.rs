use crate::db::DatabaseError;
use crate::s3::StorageError;
use thiserror::Error;

/// Errors raised while reading or rewriting the consolidated snapshot
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Snapshot {0} not found")]
    NotFound(String),

    #[error("Malformed snapshot line {line}: {reason}")]
    Malformed { line: u64, reason: String },

    #[error("Failed to encode snapshot: {0}")]
    Encode(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Reasons a set of source files is rejected. Any of them aborts the whole run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("There are missing csv files: {images} image files but only {csv_files} csv files")]
    TooManyImages { csv_files: usize, images: usize },

    #[error("File {file} is not readable as CSV: {reason}")]
    Unreadable { file: String, reason: String },

    #[error("File {file} must hold a header and one data row of 3 columns, found {values} values")]
    WrongShape { file: String, values: usize },

    #[error("File {file} has header {found:?}, expected [\"first_name\", \"last_name\", \"birthts\"]")]
    WrongHeader { file: String, found: Vec<String> },

    #[error("Empty field '{column}' in file {file}")]
    EmptyField { file: String, column: String },
}

/// Failures of an ingestion run
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Object storage failure: {0}")]
    Storage(#[from] StorageError),

    #[error("Database failure: {0}")]
    Database(#[from] DatabaseError),

    #[error("Snapshot failure: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Flat row list holds {0} values, which is not a whole number of users")]
    MalformedRows(usize),
}
