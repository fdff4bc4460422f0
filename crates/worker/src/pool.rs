//! Fixed-size worker pool.
//!
//! N independent executor tasks poll the queue, claim one job at a time,
//! and run its full lifecycle before claiming another. A failure inside
//! one job's execution is recorded on that job and never takes an
//! executor down.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use vidfetch_core::logging::sanitize_for_log;
use vidfetch_db::models::job::Job;
use vidfetch_db::repositories::JobRepo;
use vidfetch_db::DbPool;

use crate::engine::{self, EngineConfig};

/// How often an idle executor checks for a claimable job.
const CLAIM_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Worker pool settings.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Number of concurrent executors.
    pub concurrency: usize,
    /// Engine settings shared by every executor.
    pub engine: EngineConfig,
    /// How long terminal job records stay queryable.
    pub retention: chrono::Duration,
}

/// Spawn the executor tasks. They run until `cancel` is triggered; the
/// returned handles let the caller await drain on shutdown.
pub fn spawn(
    pool: DbPool,
    config: Arc<WorkerConfig>,
    cancel: CancellationToken,
) -> Vec<JoinHandle<()>> {
    (0..config.concurrency)
        .map(|worker_id| {
            let pool = pool.clone();
            let config = Arc::clone(&config);
            let cancel = cancel.clone();
            tokio::spawn(run_executor(worker_id, pool, config, cancel))
        })
        .collect()
}

/// One executor loop: claim, execute, persist outcome, repeat.
async fn run_executor(
    worker_id: usize,
    pool: DbPool,
    config: Arc<WorkerConfig>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(CLAIM_POLL_INTERVAL);
    tracing::info!(worker_id, "Worker executor started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(worker_id, "Worker executor shutting down");
                break;
            }
            _ = ticker.tick() => {
                match JobRepo::claim_next(&pool).await {
                    Ok(Some(job)) => execute_job(worker_id, &pool, &config, job).await,
                    Ok(None) => {}
                    Err(e) => {
                        // Store-layer fault: log and keep polling.
                        tracing::error!(worker_id, error = %e, "Failed to claim a job");
                    }
                }
            }
        }
    }
}

/// Run one claimed job to its terminal state.
async fn execute_job(worker_id: usize, pool: &DbPool, config: &WorkerConfig, job: Job) {
    tracing::info!(
        worker_id,
        job_id = %job.id,
        url = %sanitize_for_log(&job.url),
        format = %job.format,
        "Job claimed"
    );

    // Progress events stream in while the subprocess runs; persist them
    // from a side task so the engine never blocks on the store.
    let (progress_tx, mut progress_rx) = mpsc::channel::<f64>(32);
    let progress_pool = pool.clone();
    let progress_job_id = job.id.clone();
    let progress_task = tokio::spawn(async move {
        while let Some(pct) = progress_rx.recv().await {
            if let Err(e) =
                JobRepo::update_progress(&progress_pool, &progress_job_id, pct).await
            {
                tracing::warn!(
                    job_id = %progress_job_id,
                    error = %e,
                    "Failed to persist progress update"
                );
            }
        }
    });

    let outcome = engine::run_download(&config.engine, &job.url, job.format, progress_tx).await;

    // The engine has dropped its sender; drain pending progress writes so
    // none can land after the terminal update below.
    let _ = progress_task.await;

    match outcome {
        Ok(path) => {
            let path_str = path.to_string_lossy();
            match JobRepo::complete(pool, &job.id, &path_str, config.retention).await {
                Ok(()) => {
                    tracing::info!(worker_id, job_id = %job.id, path = %path_str, "Job finished");
                }
                Err(e) => {
                    tracing::error!(job_id = %job.id, error = %e, "Failed to mark job finished");
                }
            }
        }
        Err(err) => {
            let reason = err.to_string();
            tracing::warn!(
                worker_id,
                job_id = %job.id,
                error = %sanitize_for_log(&reason),
                "Job failed"
            );
            if let Err(e) = JobRepo::fail(pool, &job.id, &reason, config.retention).await {
                tracing::error!(job_id = %job.id, error = %e, "Failed to mark job failed");
            }
        }
    }
}
