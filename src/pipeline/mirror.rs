use crate::db::{Database, UserRow, USER_ROW_WIDTH};
use crate::pipeline::error::PipelineError;
use std::collections::HashSet;
use tracing::{debug, info};

/// What a mirror sync changed in the users table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MirrorSummary {
    /// Incoming users that already had rows, which were deleted first
    pub replaced: usize,
    /// Rows inserted, one per incoming user
    pub inserted: usize,
}

/// Bring the users table in line with a flat snapshot row list
/// (`[user_id1, first_name1, last_name1, birthts1, img_path1, user_id2, ...]`).
///
/// Rows of incoming ids are deleted and every incoming row is re-inserted in
/// one transaction, so a failed insert keeps the previous rows. Ids that exist
/// only in the table are left alone.
pub async fn upsert_all<D: Database>(
    database: &D,
    flat_rows: &[String],
) -> Result<MirrorSummary, PipelineError> {
    if flat_rows.len() % USER_ROW_WIDTH != 0 {
        return Err(PipelineError::MalformedRows(flat_rows.len()));
    }

    let rows: Vec<UserRow> = flat_rows
        .chunks_exact(USER_ROW_WIDTH)
        .filter_map(UserRow::from_fields)
        .collect();

    let stored_ids: HashSet<String> = database.get_user_ids().await?.into_iter().collect();

    let mut seen: HashSet<&str> = HashSet::new();
    let existing_ids: Vec<String> = rows
        .iter()
        .map(|row| row.user_id.as_str())
        .filter(|id| stored_ids.contains(*id) && seen.insert(*id))
        .map(str::to_string)
        .collect();

    if !rows.is_empty() {
        let deleted = database.replace_users(&existing_ids, &rows).await?;
        debug!(
            "Deleted {} stale rows for {} users",
            deleted,
            existing_ids.len()
        );
    }

    info!(
        "Mirror sync complete: {} users replaced, {} rows inserted",
        existing_ids.len(),
        rows.len()
    );

    Ok(MirrorSummary {
        replaced: existing_ids.len(),
        inserted: rows.len(),
    })
}
