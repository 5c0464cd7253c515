pub mod database;
pub mod error;
#[cfg(test)]
pub mod fake;
pub mod models;
pub mod pg_schema;
pub mod postgres;

pub use database::Database;
pub use error::DatabaseError;
#[cfg(test)]
pub use fake::FakeDatabase;
pub use models::{flatten_rows, UserRow, USER_ROW_WIDTH};
pub use postgres::PostgresDatabase;
