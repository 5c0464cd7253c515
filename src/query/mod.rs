pub mod error;
pub mod filters;
#[cfg(test)]
mod tests;

pub use error::QueryError;
pub use filters::{ImageFilter, QueryFilters};

use crate::db::Database;
use crate::pipeline::NO_IMAGE;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Average year length used for age computation
pub const MILLIS_PER_YEAR: f64 = 365.25 * 86_400_000.0;

/// A user as returned by queries, keyed by user id in the result map
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserView {
    pub first_name: String,
    pub last_name: String,
    pub birthts: String,
    pub img_path: String,
}

/// Age in fractional years at `now_millis`, or `None` when `birthts` is not a number
pub fn age_in_years(birthts: &str, now_millis: i64) -> Option<f64> {
    let birth = birthts.trim().parse::<f64>().ok().filter(|b| b.is_finite())?;
    Some((now_millis as f64 - birth) / MILLIS_PER_YEAR)
}

/// Read-only filtered access to the mirrored users table
pub struct QueryService<D: Database> {
    database: Arc<D>,
}

impl<D: Database> QueryService<D> {
    pub fn new(database: Arc<D>) -> Self {
        Self { database }
    }

    pub async fn query(
        &self,
        filters: &QueryFilters,
    ) -> Result<BTreeMap<String, UserView>, QueryError> {
        self.query_at(filters, chrono::Utc::now().timestamp_millis())
            .await
    }

    /// Query with ages computed against a fixed clock.
    ///
    /// When several rows share a user id the last one in table order wins.
    pub async fn query_at(
        &self,
        filters: &QueryFilters,
        now_millis: i64,
    ) -> Result<BTreeMap<String, UserView>, QueryError> {
        let rows = self.database.get_users().await?;
        let total = rows.len();

        let mut users = BTreeMap::new();
        for row in rows {
            if !filters.image.matches(row.img_path != NO_IMAGE) {
                continue;
            }
            if filters.has_age_bounds() {
                let Some(age) = age_in_years(&row.birthdate, now_millis) else {
                    warn!(
                        "Skipping user '{}' with non-numeric birthts '{}'",
                        row.user_id, row.birthdate
                    );
                    continue;
                };
                if !filters.matches_age(age) {
                    continue;
                }
            }
            users.insert(
                row.user_id,
                UserView {
                    first_name: row.first_name,
                    last_name: row.last_name,
                    birthts: row.birthdate,
                    img_path: row.img_path,
                },
            );
        }

        debug!("Query {:?} matched {} of {} rows", filters, users.len(), total);
        Ok(users)
    }
}
