//! Repository for the `jobs` table.
//!
//! All status transitions go through here. Terminal updates carry a
//! status guard in the WHERE clause so a finished or failed job can never
//! transition again, and the claim is a single UPDATE statement so two
//! workers can never claim the same job.

use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;
use vidfetch_core::media::MediaFormat;

use crate::models::job::Job;
use crate::models::status::JobStatus;

/// Column list for `jobs` queries.
const COLUMNS: &str = "\
    id, url, format, status, progress, result_path, error, \
    created_at, started_at, finished_at, expires_at";

/// Provides CRUD operations for download jobs.
pub struct JobRepo;

impl JobRepo {
    /// Create a new queued job with a fresh id and zero progress.
    ///
    /// Safe to call from any number of concurrent submitters.
    pub async fn submit(
        pool: &SqlitePool,
        url: &str,
        format: MediaFormat,
    ) -> Result<Job, sqlx::Error> {
        let query = format!(
            "INSERT INTO jobs (id, url, format, status, progress, created_at) \
             VALUES (?1, ?2, ?3, ?4, 0, ?5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(Uuid::now_v7().to_string())
            .bind(url)
            .bind(format.as_str())
            .bind(JobStatus::Queued)
            .bind(Utc::now())
            .fetch_one(pool)
            .await
    }

    /// Find a job by id. Returns `None` for unknown ids and for terminal
    /// records whose retention window has elapsed.
    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Job>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM jobs \
             WHERE id = ?1 AND (expires_at IS NULL OR expires_at > ?2)"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .bind(Utc::now())
            .fetch_optional(pool)
            .await
    }

    /// Atomically claim the oldest queued job.
    ///
    /// A single UPDATE with a subselect: SQLite serializes writers, so
    /// concurrent claims see each other's committed status change and at
    /// most one caller receives any given job. Claiming resets progress
    /// to zero and stamps `started_at`.
    pub async fn claim_next(pool: &SqlitePool) -> Result<Option<Job>, sqlx::Error> {
        let query = format!(
            "UPDATE jobs \
             SET status = ?1, progress = 0, started_at = ?2 \
             WHERE id = ( \
                 SELECT id FROM jobs \
                 WHERE status = ?3 \
                 ORDER BY created_at ASC, id ASC \
                 LIMIT 1 \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(JobStatus::Running)
            .bind(Utc::now())
            .bind(JobStatus::Queued)
            .fetch_optional(pool)
            .await
    }

    /// Record a progress update from the owning worker.
    ///
    /// Clamped to `[0, 100]` and monotone: a stale lower value never
    /// overwrites a higher one, and nothing is written once the job has
    /// left the running state.
    pub async fn update_progress(
        pool: &SqlitePool,
        id: &str,
        percent: f64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE jobs \
             SET progress = MAX(progress, MIN(?2, 100.0)) \
             WHERE id = ?1 AND status = ?3",
        )
        .bind(id)
        .bind(percent)
        .bind(JobStatus::Running)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Mark a running job finished with its verified result path.
    ///
    /// Sets progress to 100 and starts the retention window.
    pub async fn complete(
        pool: &SqlitePool,
        id: &str,
        result_path: &str,
        retention: Duration,
    ) -> Result<(), sqlx::Error> {
        let now = Utc::now();
        sqlx::query(
            "UPDATE jobs \
             SET status = ?2, progress = 100, result_path = ?3, \
                 finished_at = ?4, expires_at = ?5 \
             WHERE id = ?1 AND status = ?6",
        )
        .bind(id)
        .bind(JobStatus::Finished)
        .bind(result_path)
        .bind(now)
        .bind(now + retention)
        .bind(JobStatus::Running)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Mark a job failed with a descriptive message.
    ///
    /// Also accepted from the queued state so a claim-side fault can still
    /// be surfaced; never from a terminal state.
    pub async fn fail(
        pool: &SqlitePool,
        id: &str,
        error: &str,
        retention: Duration,
    ) -> Result<(), sqlx::Error> {
        let now = Utc::now();
        sqlx::query(
            "UPDATE jobs \
             SET status = ?2, progress = 0, error = ?3, \
                 finished_at = ?4, expires_at = ?5 \
             WHERE id = ?1 AND status IN (?6, ?7)",
        )
        .bind(id)
        .bind(JobStatus::Failed)
        .bind(error)
        .bind(now)
        .bind(now + retention)
        .bind(JobStatus::Running)
        .bind(JobStatus::Queued)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Fail running jobs whose worker is gone.
    ///
    /// The store outlives the process: if a worker crashes while owning a
    /// job, nothing ever writes to that row again and clients would poll a
    /// running status forever. Any row still running with `started_at` at
    /// or before `stalled_before` is moved to failed with a generic reason.
    /// Returns the number of reclaimed rows.
    pub async fn fail_stalled(
        pool: &SqlitePool,
        stalled_before: chrono::DateTime<Utc>,
        retention: Duration,
    ) -> Result<u64, sqlx::Error> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE jobs \
             SET status = ?1, progress = 0, error = ?2, \
                 finished_at = ?3, expires_at = ?4 \
             WHERE status = ?5 AND started_at IS NOT NULL AND started_at <= ?6",
        )
        .bind(JobStatus::Failed)
        .bind("download abandoned: worker timed out or crashed")
        .bind(now)
        .bind(now + retention)
        .bind(JobStatus::Running)
        .bind(stalled_before)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete terminal records whose retention window has elapsed.
    ///
    /// Returns the number of purged rows.
    pub async fn purge_expired(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM jobs WHERE expires_at IS NOT NULL AND expires_at <= ?1",
        )
        .bind(Utc::now())
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
