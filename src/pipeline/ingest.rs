use crate::db::{flatten_rows, Database, UserRow};
use crate::pipeline::error::{PipelineError, SnapshotError, ValidationError};
use crate::pipeline::mirror::{self, MirrorSummary};
use crate::pipeline::models::{UserRecord, NO_IMAGE};
use crate::pipeline::snapshot::SnapshotReconciler;
use crate::pipeline::validation::{validate_source_csv, SourceFiles};
use crate::s3::Storage;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Result of a single `process` call that did not fail on a store
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Snapshot rewritten and mirror synchronized
    Completed(RunSummary),
    /// Source files failed validation; nothing was written
    Rejected(ValidationError),
    /// Another run was in progress; nothing was read or written
    Skipped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub run_id: Uuid,
    /// Users read from the source bucket in this run
    pub users_ingested: usize,
    /// Users in the snapshot after the merge
    pub snapshot_users: usize,
    pub mirror: MirrorSummary,
}

/// Moves validated per-user source files into the snapshot and its relational mirror
pub struct IngestionPipeline<S: Storage, D: Database> {
    storage: Arc<S>,
    database: Arc<D>,
    source_bucket: String,
    snapshot: SnapshotReconciler<S>,
    run_lock: Mutex<()>,
}

impl<S: Storage, D: Database> IngestionPipeline<S, D> {
    pub fn new(
        storage: Arc<S>,
        database: Arc<D>,
        source_bucket: impl Into<String>,
        processed_bucket: impl Into<String>,
    ) -> Self {
        let snapshot = SnapshotReconciler::new(storage.clone(), processed_bucket);
        Self {
            storage,
            database,
            source_bucket: source_bucket.into(),
            snapshot,
            run_lock: Mutex::new(()),
        }
    }

    pub fn snapshot(&self) -> &SnapshotReconciler<S> {
        &self.snapshot
    }

    /// Create both buckets, the header-only snapshot and the users table when missing
    pub async fn bootstrap(&self) -> Result<(), PipelineError> {
        self.storage.ensure_bucket(&self.source_bucket).await?;
        self.snapshot.bootstrap().await?;
        self.database.ensure_schema().await?;
        info!(
            "Stores ready: source bucket '{}', processed bucket '{}'",
            self.source_bucket,
            self.snapshot.bucket()
        );
        Ok(())
    }

    /// Run one ingestion pass.
    ///
    /// Validation problems come back as `RunOutcome::Rejected` after zero
    /// writes. Store failures are errors; whatever was written before the
    /// failure stays.
    pub async fn process(&self) -> Result<RunOutcome, PipelineError> {
        let Ok(_guard) = self.run_lock.try_lock() else {
            warn!("Ingestion already in progress, skipping this trigger");
            return Ok(RunOutcome::Skipped);
        };

        let run_id = Uuid::new_v4();
        info!("[Run {}] Starting ingestion from '{}'", run_id, self.source_bucket);

        let object_names = self.storage.list_objects(&self.source_bucket).await?;
        let files = SourceFiles::discover(object_names, &self.source_bucket);
        debug!(
            "[Run {}] Found {} csv files and {} image files",
            run_id,
            files.csv_files.len(),
            files.image_files.len()
        );

        let records = match self.collect_records(&files).await {
            Ok(records) => records,
            Err(PipelineError::Validation(reason)) => {
                warn!("[Run {}] Source files rejected: {}", run_id, reason);
                return Ok(RunOutcome::Rejected(reason));
            }
            Err(e) => return Err(e),
        };
        let users_ingested = records.len();

        self.snapshot.upsert_batch(records).await?;

        // An untouched, never bootstrapped snapshot is the same as an empty one
        let snapshot = match self.snapshot.read_all().await {
            Ok(snapshot) => snapshot,
            Err(SnapshotError::NotFound(_)) if users_ingested == 0 => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        let snapshot_users = snapshot.len();

        let flat_rows = flatten_rows(snapshot.into_iter().map(UserRow::from).collect());
        let mirror = mirror::upsert_all(self.database.as_ref(), &flat_rows).await?;

        info!(
            "[Run {}] Ingested {} users, snapshot holds {} users",
            run_id, users_ingested, snapshot_users
        );

        Ok(RunOutcome::Completed(RunSummary {
            run_id,
            users_ingested,
            snapshot_users,
            mirror,
        }))
    }

    /// Run `process` and log the outcome instead of returning it
    pub async fn process_and_log(&self) {
        match self.process().await {
            Ok(RunOutcome::Completed(summary)) => info!(
                "[Run {}] Completed: {} users ingested, {} users replaced in mirror",
                summary.run_id, summary.users_ingested, summary.mirror.replaced
            ),
            Ok(RunOutcome::Rejected(reason)) => {
                warn!("Ingestion rejected, nothing was written: {}", reason)
            }
            Ok(RunOutcome::Skipped) => debug!("Ingestion skipped"),
            Err(e) => error!("Ingestion failed: {}", e),
        }
    }

    /// Empty the snapshot down to its header and truncate the users table
    pub async fn reset(&self) -> Result<(), PipelineError> {
        let _guard = self.run_lock.lock().await;
        self.snapshot.clear().await?;
        self.database.clear_users().await?;
        info!("Snapshot and users table have been reset");
        Ok(())
    }

    // Every source file is read and validated before anything is written
    async fn collect_records(&self, files: &SourceFiles) -> Result<Vec<UserRecord>, PipelineError> {
        files.check_counts()?;

        let mut records = Vec::with_capacity(files.csv_files.len());
        for csv_file in &files.csv_files {
            let data = self
                .storage
                .get_object(&self.source_bucket, &csv_file.path)
                .await?;
            let fields = validate_source_csv(&csv_file.path, &data)?;

            let img_path = files
                .image_for(&csv_file.user_id)
                .unwrap_or(NO_IMAGE)
                .to_string();

            records.push(UserRecord {
                user_id: csv_file.user_id.clone(),
                first_name: fields.first_name,
                last_name: fields.last_name,
                birthts: fields.birthts,
                img_path,
            });
        }
        Ok(records)
    }
}
