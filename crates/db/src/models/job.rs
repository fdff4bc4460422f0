//! Job entity model.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use vidfetch_core::media::MediaFormat;

use super::status::JobStatus;

/// A row from the `jobs` table.
///
/// Mutated only through [`crate::repositories::JobRepo`]; the atomic claim
/// guarantees a single writer per job after submission.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Job {
    pub id: String,
    pub url: String,
    #[sqlx(try_from = "String")]
    pub format: MediaFormat,
    pub status: JobStatus,
    pub progress: f64,
    pub result_path: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}
