use crate::db::error::DatabaseError;
use crate::db::models::UserRow;
use async_trait::async_trait;
use std::sync::Arc;

/// Database trait defining the interface to the relational mirror of the users snapshot
#[async_trait]
pub trait Database: Send + Sync + 'static {
    /// Create the users table if it does not exist yet
    async fn ensure_schema(&self) -> Result<(), DatabaseError>;

    /// Every `user_id` currently stored, duplicates included
    async fn get_user_ids(&self) -> Result<Vec<String>, DatabaseError>;

    /// All rows of the users table in insertion order
    async fn get_users(&self) -> Result<Vec<UserRow>, DatabaseError>;

    /// Insert all rows in a single batch
    async fn insert_users(&self, rows: &[UserRow]) -> Result<(), DatabaseError>;

    /// Delete every row whose `user_id` is in `ids`, returning the number of rows removed
    ///
    /// * `ids` - Must not be empty
    async fn delete_users_by_ids(&self, ids: &[String]) -> Result<u64, DatabaseError>;

    /// Delete every row whose `user_id` is in `ids` and insert `rows`, atomically.
    /// On error the table is left as it was. Returns the number of rows deleted.
    async fn replace_users(&self, ids: &[String], rows: &[UserRow]) -> Result<u64, DatabaseError>;

    /// Remove every row from the users table
    async fn clear_users(&self) -> Result<(), DatabaseError>;
}

/// Implementation of Database trait for Arc<T> where T implements Database
///
/// This allows sharing database instances across threads and components efficiently.
/// The Arc wrapper provides thread-safe reference counting, enabling the HTTP
/// handlers and the scheduler to share the same connection pool.
#[async_trait]
impl<T: Database + ?Sized> Database for Arc<T> {
    async fn ensure_schema(&self) -> Result<(), DatabaseError> {
        (**self).ensure_schema().await
    }

    async fn get_user_ids(&self) -> Result<Vec<String>, DatabaseError> {
        (**self).get_user_ids().await
    }

    async fn get_users(&self) -> Result<Vec<UserRow>, DatabaseError> {
        (**self).get_users().await
    }

    async fn insert_users(&self, rows: &[UserRow]) -> Result<(), DatabaseError> {
        (**self).insert_users(rows).await
    }

    async fn delete_users_by_ids(&self, ids: &[String]) -> Result<u64, DatabaseError> {
        (**self).delete_users_by_ids(ids).await
    }

    async fn replace_users(&self, ids: &[String], rows: &[UserRow]) -> Result<u64, DatabaseError> {
        (**self).replace_users(ids, rows).await
    }

    async fn clear_users(&self) -> Result<(), DatabaseError> {
        (**self).clear_users().await
    }
}
