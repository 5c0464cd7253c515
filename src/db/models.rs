use serde::{Deserialize, Serialize};

/// Number of fields a user occupies in a flat row list
pub const USER_ROW_WIDTH: usize = 5;

/// Column names of the users table with their VARCHAR widths, in flat-row order
pub const USER_COLUMN_WIDTHS: [(&str, usize); USER_ROW_WIDTH] = [
    ("user_id", 20),
    ("first_name", 30),
    ("last_name", 30),
    ("birthdate", 30),
    ("img_path", 250),
];

/// One row of the users table, without its surrogate key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserRow {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub birthdate: String,
    pub img_path: String,
}

impl UserRow {
    /// Build a row from exactly `USER_ROW_WIDTH` fields in column order.
    /// Returns None for any other length.
    pub fn from_fields(fields: &[String]) -> Option<Self> {
        match fields {
            [user_id, first_name, last_name, birthdate, img_path] => Some(Self {
                user_id: user_id.clone(),
                first_name: first_name.clone(),
                last_name: last_name.clone(),
                birthdate: birthdate.clone(),
                img_path: img_path.clone(),
            }),
            _ => None,
        }
    }

    /// First column whose value does not fit its VARCHAR width, with the value's length
    pub fn oversized_column(&self) -> Option<(&'static str, usize)> {
        let values = [
            &self.user_id,
            &self.first_name,
            &self.last_name,
            &self.birthdate,
            &self.img_path,
        ];
        USER_COLUMN_WIDTHS
            .iter()
            .zip(values)
            .map(|(&(column, width), value)| (column, width, value.chars().count()))
            .find(|&(_, width, length)| length > width)
            .map(|(column, _, length)| (column, length))
    }

    pub fn into_fields(self) -> [String; USER_ROW_WIDTH] {
        [
            self.user_id,
            self.first_name,
            self.last_name,
            self.birthdate,
            self.img_path,
        ]
    }
}

/// Flatten rows into `[user_id1, first_name1, ..., img_path1, user_id2, ...]`
pub fn flatten_rows(rows: Vec<UserRow>) -> Vec<String> {
    rows.into_iter().flat_map(UserRow::into_fields).collect()
}
