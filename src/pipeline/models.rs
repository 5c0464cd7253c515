use crate::db::UserRow;
use serde::{Deserialize, Serialize};

/// Image path recorded for users that have no image file next to their CSV
pub const NO_IMAGE: &str = "No image found";

/// One user of the consolidated snapshot.
///
/// `birthts` keeps the exact text of the source file (milliseconds since the
/// epoch) so the snapshot and the mirror reproduce it byte for byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub birthts: String,
    pub img_path: String,
}

impl UserRecord {
    pub fn has_image(&self) -> bool {
        self.img_path != NO_IMAGE
    }
}

impl From<UserRecord> for UserRow {
    fn from(record: UserRecord) -> Self {
        UserRow {
            user_id: record.user_id,
            first_name: record.first_name,
            last_name: record.last_name,
            birthdate: record.birthts,
            img_path: record.img_path,
        }
    }
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        UserRecord {
            user_id: row.user_id,
            first_name: row.first_name,
            last_name: row.last_name,
            birthts: row.birthdate,
            img_path: row.img_path,
        }
    }
}
