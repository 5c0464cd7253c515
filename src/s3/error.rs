use thiserror::Error;

/// Failures of the object store holding source files and the snapshot
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Object store unreachable: {0}")]
    ConnectionError(String),

    #[error("Bucket {0} does not exist")]
    BucketNotFound(String),

    #[error("No object {0}")]
    ObjectNotFound(String),

    #[error("Permission denied on {0}: {1}")]
    AccessDenied(String, String),

    #[error("Could not read {0}: {1}")]
    ReadError(String, String),

    #[error("Could not write {0}: {1}")]
    WriteError(String, String),

    #[error("Transport failure talking to the object store: {0}")]
    NetworkError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
