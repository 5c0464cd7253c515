use thiserror::Error;

/// Failures of the relational mirror
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database unreachable: {0}")]
    ConnectionError(String),

    #[error("Statement on users table failed: {0}")]
    QueryError(String),

    #[error("Unexpected users row: {0}")]
    DeserializationError(String),
}
