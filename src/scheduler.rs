use crate::db::Database;
use crate::pipeline::IngestionPipeline;
use crate::s3::Storage;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::info;

/// Time between two scheduled ingestion runs
pub const PROCESS_INTERVAL: Duration = Duration::from_secs(600);

/// Run `process` every `period`, starting one period from now.
///
/// A tick that lands while a run is still going is skipped by the pipeline itself.
pub fn spawn_periodic_processing<S: Storage, D: Database>(
    pipeline: Arc<IngestionPipeline<S, D>>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Scheduled processing every {} seconds", period.as_secs());

        loop {
            ticker.tick().await;
            info!("Scheduled processing triggered");
            pipeline.process_and_log().await;
        }
    })
}
