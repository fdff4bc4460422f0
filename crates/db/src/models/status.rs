//! Job status enum and the client-facing status projection.

use serde::{Deserialize, Serialize};

use super::job::Job;

/// Raw job execution status, stored as lowercase TEXT.
///
/// Transitions: `Queued -> Running -> { Finished, Failed }`. Finished and
/// Failed are terminal; the repository guards every terminal update so a
/// job never leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Finished,
    Failed,
}

/// Read-only projection of a job record for status queries.
///
/// Exactly one of `result_path`/`error` is present, and only in the
/// matching terminal state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobStatusView {
    pub status: JobStatus,
    pub progress: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobStatusView {
    /// Resolve the raw record state into the client contract.
    ///
    /// Performs no mutation. Progress is meaningful only while running or
    /// after finishing; it is forced to 100 on finished and 0 otherwise,
    /// regardless of what the record holds.
    pub fn resolve(job: &Job) -> Self {
        match job.status {
            JobStatus::Finished => Self {
                status: JobStatus::Finished,
                progress: 100.0,
                result_path: job.result_path.clone(),
                error: None,
            },
            JobStatus::Failed => Self {
                status: JobStatus::Failed,
                progress: 0.0,
                result_path: None,
                error: job.error.clone(),
            },
            JobStatus::Running => Self {
                status: JobStatus::Running,
                progress: job.progress,
                result_path: None,
                error: None,
            },
            JobStatus::Queued => Self {
                status: JobStatus::Queued,
                progress: 0.0,
                result_path: None,
                error: None,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
