use crate::db::error::DatabaseError;
use crate::db::models::{UserRow, USER_COLUMN_WIDTHS};
use sqlx::postgres::PgRow;
use sqlx::Row as _;

/// Helper macro to extract a field from a database row with error handling
macro_rules! pg_get_field {
    ($row:expr, $field:expr) => {
        $row.try_get($field)
            .map_err(|e| DatabaseError::DeserializationError(e.to_string()))?
    };
}

pub const USERS_TABLE: &str = "users";

/// Columns of the users table in flat-row order
pub const USER_COLUMNS: &str = "user_id, first_name, last_name, birthdate, img_path";

/// Column definitions for the users table.
///
/// `user_id` carries no uniqueness constraint: the mirror sync keeps ids
/// unique by deleting before it inserts.
pub fn users_table_definition() -> String {
    let mut columns = vec!["id SERIAL PRIMARY KEY NOT NULL".to_string()];
    columns.extend(
        USER_COLUMN_WIDTHS
            .iter()
            .map(|(column, width)| format!("{} VARCHAR({}) NOT NULL", column, width)),
    );
    columns.join(", ")
}

pub fn user_from_row(row: PgRow) -> Result<UserRow, DatabaseError> {
    Ok(UserRow {
        user_id: pg_get_field!(row, "user_id"),
        first_name: pg_get_field!(row, "first_name"),
        last_name: pg_get_field!(row, "last_name"),
        birthdate: pg_get_field!(row, "birthdate"),
        img_path: pg_get_field!(row, "img_path"),
    })
}
