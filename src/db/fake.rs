use crate::db::database::Database;
use crate::db::error::DatabaseError;
use crate::db::models::UserRow;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

/// A fake in-memory implementation of the Database trait for testing
#[derive(Clone)]
pub struct FakeDatabase {
    rows: Arc<RwLock<Vec<(i64, UserRow)>>>,
    next_id: Arc<RwLock<i64>>,
    unavailable: Arc<AtomicBool>,
}

impl FakeDatabase {
    /// Create a new empty FakeDatabase
    pub fn new() -> Self {
        FakeDatabase {
            rows: Arc::new(RwLock::new(Vec::new())),
            next_id: Arc::new(RwLock::new(1)),
            unavailable: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Add a row directly, bypassing the trait
    pub fn fake_add_user(&self, row: UserRow) {
        let mut next_id = self.next_id.write().unwrap();
        self.rows.write().unwrap().push((*next_id, row));
        *next_id += 1;
    }

    /// Make every subsequent call fail as if the server were down
    pub fn fake_set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    // Postgres rejects the whole statement when one value overflows its column
    fn check_insertable(rows: &[UserRow]) -> Result<(), DatabaseError> {
        for row in rows {
            if let Some((column, length)) = row.oversized_column() {
                return Err(DatabaseError::QueryError(format!(
                    "value too long for column {} ({} characters) of user {}",
                    column, length, row.user_id
                )));
            }
        }
        Ok(())
    }

    fn check_available(&self) -> Result<(), DatabaseError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DatabaseError::ConnectionError(
                "simulated database outage".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for FakeDatabase {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Database for FakeDatabase {
    async fn ensure_schema(&self) -> Result<(), DatabaseError> {
        self.check_available()
    }

    async fn get_user_ids(&self) -> Result<Vec<String>, DatabaseError> {
        self.check_available()?;
        let rows = self.rows.read().unwrap();
        Ok(rows.iter().map(|(_, row)| row.user_id.clone()).collect())
    }

    async fn get_users(&self) -> Result<Vec<UserRow>, DatabaseError> {
        self.check_available()?;
        let rows = self.rows.read().unwrap();
        Ok(rows.iter().map(|(_, row)| row.clone()).collect())
    }

    async fn insert_users(&self, new_rows: &[UserRow]) -> Result<(), DatabaseError> {
        self.check_available()?;
        Self::check_insertable(new_rows)?;
        for row in new_rows {
            self.fake_add_user(row.clone());
        }
        Ok(())
    }

    async fn delete_users_by_ids(&self, ids: &[String]) -> Result<u64, DatabaseError> {
        self.check_available()?;
        let mut rows = self.rows.write().unwrap();
        let before = rows.len();
        rows.retain(|(_, row)| !ids.contains(&row.user_id));
        Ok((before - rows.len()) as u64)
    }

    async fn replace_users(
        &self,
        ids: &[String],
        new_rows: &[UserRow],
    ) -> Result<u64, DatabaseError> {
        self.check_available()?;
        let mut next_id = self.next_id.write().unwrap();
        let mut rows = self.rows.write().unwrap();

        // Work on a copy so a failed insert leaves the table untouched
        let mut staged: Vec<(i64, UserRow)> = rows
            .iter()
            .filter(|(_, row)| !ids.contains(&row.user_id))
            .cloned()
            .collect();
        let deleted = (rows.len() - staged.len()) as u64;

        Self::check_insertable(new_rows)?;
        for row in new_rows {
            staged.push((*next_id, row.clone()));
            *next_id += 1;
        }
        *rows = staged;
        Ok(deleted)
    }

    async fn clear_users(&self) -> Result<(), DatabaseError> {
        self.check_available()?;
        self.rows.write().unwrap().clear();
        Ok(())
    }
}
