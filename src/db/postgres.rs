use crate::db::database::Database;
use crate::db::error::DatabaseError;
use crate::db::models::UserRow;
use crate::db::pg_schema::{user_from_row, users_table_definition, USERS_TABLE, USER_COLUMNS};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder, Row as _, Transaction};
use std::time::Duration;
use tracing::{debug, error, info};

/// Postgres caps a statement at 65535 bind parameters
const INSERT_CHUNK_ROWS: usize = 1000;
const DELETE_CHUNK_IDS: usize = 10_000;

/// A PostgreSQL implementation of the Database trait
pub struct PostgresDatabase {
    pool: PgPool,
    schema: Option<String>,
}

impl PostgresDatabase {
    /// Create a new PostgresDatabase with the given connection URL
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self, DatabaseError> {
        Self::new_with_schema(database_url, max_connections, None).await
    }

    /// Create a new PostgresDatabase whose users table lives in a specific schema
    pub async fn new_with_schema(
        database_url: &str,
        max_connections: u32,
        schema: Option<String>,
    ) -> Result<Self, DatabaseError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(60))
            .connect_lazy(database_url)
            .map_err(|e| {
                error!("Failed to create connection pool: {}", e);
                DatabaseError::ConnectionError(e.to_string())
            })?;

        if let Err(e) = sqlx::query("SELECT 1").execute(&pool).await {
            error!("Database connectivity test failed: {}", e);
            return Err(DatabaseError::ConnectionError(format!(
                "Database is not accessible: {}",
                e
            )));
        };

        info!("PostgreSQL database connection established successfully");
        Ok(PostgresDatabase { pool, schema })
    }

    /// Get the table name with schema prefix if applicable
    fn table_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema, USERS_TABLE),
            None => USERS_TABLE.to_string(),
        }
    }

    async fn execute(&self, query: &str, what: &str) -> Result<u64, DatabaseError> {
        debug!("Executing: {}", query);
        sqlx::query(query)
            .execute(&self.pool)
            .await
            .map(|result| result.rows_affected())
            .map_err(|e| {
                error!("Failed to {}: {}", what, e);
                DatabaseError::QueryError(format!("Failed to {}: {}", what, e))
            })
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, DatabaseError> {
        self.pool
            .begin()
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))
    }

    async fn insert_in(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        rows: &[UserRow],
    ) -> Result<(), DatabaseError> {
        for chunk in rows.chunks(INSERT_CHUNK_ROWS) {
            let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
                "INSERT INTO {} ({}) ",
                self.table_name(),
                USER_COLUMNS
            ));
            query_builder.push_values(chunk, |mut b, row| {
                b.push_bind(row.user_id.clone())
                    .push_bind(row.first_name.clone())
                    .push_bind(row.last_name.clone())
                    .push_bind(row.birthdate.clone())
                    .push_bind(row.img_path.clone());
            });

            query_builder.build().execute(&mut **tx).await.map_err(|e| {
                error!("Failed to insert users: {}", e);
                DatabaseError::QueryError(e.to_string())
            })?;
        }
        Ok(())
    }

    async fn delete_in(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        ids: &[String],
    ) -> Result<u64, DatabaseError> {
        let mut deleted = 0;
        for chunk in ids.chunks(DELETE_CHUNK_IDS) {
            let mut query_builder: QueryBuilder<Postgres> =
                QueryBuilder::new(format!("DELETE FROM {} WHERE ", self.table_name()));
            let mut predicates = query_builder.separated(" OR ");
            for id in chunk {
                predicates.push("user_id = ");
                predicates.push_bind_unseparated(id.clone());
            }

            deleted += query_builder
                .build()
                .execute(&mut **tx)
                .await
                .map_err(|e| {
                    error!("Failed to delete users: {}", e);
                    DatabaseError::QueryError(e.to_string())
                })?
                .rows_affected();
        }
        Ok(deleted)
    }
}

async fn commit(tx: Transaction<'static, Postgres>) -> Result<(), DatabaseError> {
    tx.commit()
        .await
        .map_err(|e| DatabaseError::QueryError(e.to_string()))
}

#[async_trait]
impl Database for PostgresDatabase {
    async fn ensure_schema(&self) -> Result<(), DatabaseError> {
        if let Some(schema_name) = &self.schema {
            info!("Initializing schema: {}", schema_name);
            self.execute(
                &format!("CREATE SCHEMA IF NOT EXISTS {}", schema_name),
                "create schema",
            )
            .await?;
        }

        let create_table_query = format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.table_name(),
            users_table_definition()
        );
        self.execute(&create_table_query, "create users table")
            .await?;

        info!("Table '{}' is ready", self.table_name());
        Ok(())
    }

    async fn get_user_ids(&self) -> Result<Vec<String>, DatabaseError> {
        let query = format!("SELECT user_id FROM {}", self.table_name());

        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to fetch user ids: {}", e);
                DatabaseError::QueryError(e.to_string())
            })?;

        rows.into_iter()
            .map(|row| {
                row.try_get::<String, _>("user_id")
                    .map_err(|e| DatabaseError::DeserializationError(e.to_string()))
            })
            .collect()
    }

    async fn get_users(&self) -> Result<Vec<UserRow>, DatabaseError> {
        let query = format!(
            "SELECT {} FROM {} ORDER BY id ASC",
            USER_COLUMNS,
            self.table_name()
        );

        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to fetch users: {}", e);
                DatabaseError::QueryError(e.to_string())
            })?;
        debug!("Query returned {} rows", rows.len());

        let mut result = Vec::with_capacity(rows.len());
        for row in rows {
            result.push(user_from_row(row)?);
        }
        Ok(result)
    }

    async fn insert_users(&self, rows: &[UserRow]) -> Result<(), DatabaseError> {
        if rows.is_empty() {
            return Ok(());
        }

        let mut tx = self.begin().await?;
        self.insert_in(&mut tx, rows).await?;
        commit(tx).await?;

        info!("Inserted {} users into {}", rows.len(), self.table_name());
        Ok(())
    }

    async fn delete_users_by_ids(&self, ids: &[String]) -> Result<u64, DatabaseError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut tx = self.begin().await?;
        let deleted = self.delete_in(&mut tx, ids).await?;
        commit(tx).await?;

        debug!("Deleted {} rows for {} ids", deleted, ids.len());
        Ok(deleted)
    }

    async fn replace_users(&self, ids: &[String], rows: &[UserRow]) -> Result<u64, DatabaseError> {
        // Any error drops `tx` uncommitted, rolling back the delete too
        let mut tx = self.begin().await?;
        let deleted = self.delete_in(&mut tx, ids).await?;
        self.insert_in(&mut tx, rows).await?;
        commit(tx).await?;

        info!(
            "Replaced {} rows with {} users in {}",
            deleted,
            rows.len(),
            self.table_name()
        );
        Ok(deleted)
    }

    async fn clear_users(&self) -> Result<(), DatabaseError> {
        self.execute(
            &format!("TRUNCATE TABLE {}", self.table_name()),
            "truncate users table",
        )
        .await?;
        Ok(())
    }
}
