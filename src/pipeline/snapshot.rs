use crate::pipeline::error::SnapshotError;
use crate::pipeline::models::UserRecord;
use crate::s3::{Storage, StorageError};
use bytes::Bytes;
use csv::{ReaderBuilder, Trim, WriterBuilder};
use std::sync::Arc;
use tracing::{debug, info};

/// Object name of the consolidated snapshot inside the processed bucket
pub const SNAPSHOT_OBJECT: &str = "output.csv";

pub const SNAPSHOT_HEADER: [&str; 5] = ["user_id", "first_name", "last_name", "birthts", "img_path"];

/// Owner of the consolidated `output.csv` snapshot.
///
/// Every mutation reads the whole snapshot, merges in memory and writes the
/// whole object back; there is no append path.
pub struct SnapshotReconciler<S: Storage> {
    storage: Arc<S>,
    bucket: String,
}

impl<S: Storage> SnapshotReconciler<S> {
    pub fn new(storage: Arc<S>, bucket: impl Into<String>) -> Self {
        Self {
            storage,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Make sure the processed bucket exists and holds at least a header-only snapshot
    pub async fn bootstrap(&self) -> Result<(), SnapshotError> {
        self.storage.ensure_bucket(&self.bucket).await?;

        if self.load().await?.is_none() {
            info!(
                "Creating empty snapshot {}/{}",
                self.bucket, SNAPSHOT_OBJECT
            );
            self.storage
                .put_object(&self.bucket, SNAPSHOT_OBJECT, encode_snapshot(&[])?)
                .await?;
        }
        Ok(())
    }

    /// Insert a record, replacing any record with the same user id
    pub async fn upsert(&self, record: UserRecord) -> Result<(), SnapshotError> {
        self.upsert_batch(vec![record]).await
    }

    /// Same final content as calling `upsert` for each record in order, with
    /// a single read and a single rewrite.
    pub async fn upsert_batch(&self, records: Vec<UserRecord>) -> Result<(), SnapshotError> {
        if records.is_empty() {
            return Ok(());
        }

        let existing = self.load().await?;
        let existed = existing.is_some();
        let mut merged = existing.unwrap_or_default();

        for record in records {
            debug!("Upserting user {} into snapshot", record.user_id);
            merged.retain(|row| row.user_id != record.user_id);
            merged.push(record);
        }

        self.replace(&merged, existed).await
    }

    /// Every record of the snapshot, header excluded
    pub async fn read_all(&self) -> Result<Vec<UserRecord>, SnapshotError> {
        self.load()
            .await?
            .ok_or_else(|| SnapshotError::NotFound(format!("{}/{}", self.bucket, SNAPSHOT_OBJECT)))
    }

    /// Drop every record, leaving only the header
    pub async fn clear(&self) -> Result<(), SnapshotError> {
        let existed = self.load().await?.is_some();
        self.replace(&[], existed).await
    }

    async fn load(&self) -> Result<Option<Vec<UserRecord>>, SnapshotError> {
        match self.storage.get_object(&self.bucket, SNAPSHOT_OBJECT).await {
            Ok(data) => decode_snapshot(&data).map(Some),
            Err(StorageError::ObjectNotFound(_)) => {
                debug!("Snapshot {}/{} does not exist", self.bucket, SNAPSHOT_OBJECT);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    // Delete-then-put: readers can briefly observe a missing snapshot
    async fn replace(&self, records: &[UserRecord], existed: bool) -> Result<(), SnapshotError> {
        let data = encode_snapshot(records)?;
        if existed {
            self.storage
                .remove_object(&self.bucket, SNAPSHOT_OBJECT)
                .await?;
        }
        self.storage
            .put_object(&self.bucket, SNAPSHOT_OBJECT, data)
            .await?;

        info!(
            "Rewrote snapshot {}/{} with {} users",
            self.bucket,
            SNAPSHOT_OBJECT,
            records.len()
        );
        Ok(())
    }
}

/// Serialize records as CSV with the snapshot header first
pub fn encode_snapshot(records: &[UserRecord]) -> Result<Bytes, SnapshotError> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer
        .write_record(SNAPSHOT_HEADER)
        .map_err(|e| SnapshotError::Encode(e.to_string()))?;

    for record in records {
        writer
            .write_record([
                &record.user_id,
                &record.first_name,
                &record.last_name,
                &record.birthts,
                &record.img_path,
            ])
            .map_err(|e| SnapshotError::Encode(e.to_string()))?;
    }

    writer
        .into_inner()
        .map(Bytes::from)
        .map_err(|e| SnapshotError::Encode(e.to_string()))
}

/// Parse a snapshot object. The first non-blank line is the header; every
/// other line must hold exactly five values.
pub fn decode_snapshot(data: &[u8]) -> Result<Vec<UserRecord>, SnapshotError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(data);

    let mut records = Vec::new();
    let mut header_seen = false;

    for result in reader.records() {
        let row = result.map_err(|e| SnapshotError::Malformed {
            line: e.position().map_or(0, |p| p.line()),
            reason: e.to_string(),
        })?;
        let line = row.position().map_or(0, |p| p.line());

        if row.iter().all(|value| value.is_empty()) {
            continue;
        }
        if !header_seen {
            header_seen = true;
            continue;
        }

        match row.iter().collect::<Vec<_>>().as_slice() {
            [user_id, first_name, last_name, birthts, img_path] => records.push(UserRecord {
                user_id: user_id.to_string(),
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                birthts: birthts.to_string(),
                img_path: img_path.to_string(),
            }),
            values => {
                return Err(SnapshotError::Malformed {
                    line,
                    reason: format!("expected 5 values, found {}", values.len()),
                })
            }
        }
    }

    Ok(records)
}
