pub mod error;
pub mod ingest;
pub mod mirror;
pub mod models;
pub mod snapshot;
pub mod validation;

pub use error::{PipelineError, SnapshotError, ValidationError};
pub use ingest::{IngestionPipeline, RunOutcome, RunSummary};
pub use models::{UserRecord, NO_IMAGE};
pub use snapshot::SnapshotReconciler;
