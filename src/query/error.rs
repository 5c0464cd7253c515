use crate::db::DatabaseError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Invalid value '{value}' for filter '{name}'")]
    InvalidFilter { name: String, value: String },

    #[error(transparent)]
    Database(#[from] DatabaseError),
}
