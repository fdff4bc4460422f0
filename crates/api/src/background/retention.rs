//! Periodic maintenance of the job table: stalled-job reclamation and
//! expired-row purging.
//!
//! Terminal jobs carry an `expires_at` stamp; once it passes they stop
//! being visible to status queries, and this task deletes the rows on a
//! fixed interval so the table does not grow without bound.
//!
//! The same tick also reclaims orphaned running jobs. The store is
//! durable, so a worker-process crash leaves its claimed rows running
//! with no executor ever writing to them again; any running row older
//! than the job timeout plus a margin is failed with a generic reason.
//! The first tick fires immediately, so a restart reclaims orphans
//! before new work is accepted.

use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use vidfetch_db::repositories::JobRepo;
use vidfetch_db::DbPool;

/// How often the maintenance tick runs.
const PURGE_INTERVAL: Duration = Duration::from_secs(3600); // 1 hour

/// Grace period past the job timeout before a running row counts as
/// abandoned. Covers a live worker whose terminal write is merely slow.
const STALL_MARGIN: Duration = Duration::from_secs(60);

/// Run the maintenance loop until `cancel` is triggered.
///
/// `job_timeout` is the engine's per-job wall-clock limit; `retention` is
/// the window applied to reclaimed rows, matching the worker's.
pub async fn run(
    pool: DbPool,
    job_timeout: Duration,
    retention: chrono::Duration,
    cancel: CancellationToken,
) {
    let stall_after = chrono::Duration::from_std(job_timeout + STALL_MARGIN)
        .unwrap_or_else(|_| chrono::Duration::hours(1));

    tracing::info!(
        interval_secs = PURGE_INTERVAL.as_secs(),
        stall_after_secs = stall_after.num_seconds(),
        "Job maintenance task started"
    );

    let mut interval = tokio::time::interval(PURGE_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Job maintenance task stopping");
                break;
            }
            _ = interval.tick() => {
                match JobRepo::fail_stalled(&pool, Utc::now() - stall_after, retention).await {
                    Ok(reclaimed) => {
                        if reclaimed > 0 {
                            tracing::warn!(reclaimed, "Job maintenance: failed stalled running jobs");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Job maintenance: stalled-job reclaim failed");
                    }
                }

                match JobRepo::purge_expired(&pool).await {
                    Ok(purged) => {
                        if purged > 0 {
                            tracing::info!(purged, "Job maintenance: purged expired rows");
                        } else {
                            tracing::debug!("Job maintenance: no rows to purge");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Job maintenance: purge failed");
                    }
                }
            }
        }
    }
}
