use crate::config::WatcherError;
use pagewatch::{PassReport, Watcher};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, info, warn};

pub type SharedWatcher = Arc<Mutex<Watcher>>;

/// Runs one pass unless another is still in flight.
///
/// Overlapping ticks are skipped rather than queued, so a slow pass can never
/// pile up work behind it. Returns `None` for a skipped tick.
pub async fn run_guarded_pass(watcher: &SharedWatcher) -> Option<PassReport> {
    let Ok(mut guard) = watcher.try_lock() else {
        warn!("Previous pass still running, skipping this tick");
        return None;
    };

    Some(guard.run_pass().await)
}

pub struct PassScheduler {
    watcher: SharedWatcher,
    scheduler: JobScheduler,
}

impl PassScheduler {
    pub async fn new(watcher: SharedWatcher) -> Result<Self, WatcherError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| WatcherError::Scheduler(e.to_string()))?;

        Ok(Self { watcher, scheduler })
    }

    /// Registers the recurring pass and starts ticking
    pub async fn start(&self, expression: &str) -> Result<(), WatcherError> {
        let watcher = Arc::clone(&self.watcher);

        let job = Job::new_async(expression, move |_uuid, _lock| {
            let watcher = Arc::clone(&watcher);

            Box::pin(async move {
                debug!("Scheduled pass triggered");
                run_guarded_pass(&watcher).await;
            })
        })
        .map_err(|e| WatcherError::Schedule {
            expression: expression.to_string(),
            reason: e.to_string(),
        })?;

        let job_id = self
            .scheduler
            .add(job)
            .await
            .map_err(|e| WatcherError::Scheduler(e.to_string()))?;

        self.scheduler
            .start()
            .await
            .map_err(|e| WatcherError::Scheduler(e.to_string()))?;

        info!(job = %job_id, schedule = %expression, "Pass scheduler started");
        Ok(())
    }

    pub async fn shutdown(mut self) {
        if let Err(e) = self.scheduler.shutdown().await {
            warn!("Failed to stop pass scheduler: {}", e);
        }
    }
}
