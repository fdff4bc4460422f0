//! Handlers for the `/downloads` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use vidfetch_core::error::CoreError;
use vidfetch_core::logging::sanitize_for_log;
use vidfetch_core::media::{self, MediaFormat};
use vidfetch_db::models::status::JobStatusView;
use vidfetch_db::repositories::JobRepo;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for submitting a download.
///
/// The format arrives as a raw string so an unsupported value maps to a
/// 400 validation error rather than a body-decoding rejection.
#[derive(Debug, Deserialize)]
pub struct SubmitDownload {
    pub url: String,
    pub format: String,
}

/// Submission acknowledgement payload.
#[derive(Debug, Serialize)]
pub struct SubmittedDownload {
    pub job_id: String,
}

// ---------------------------------------------------------------------------
// Submit
// ---------------------------------------------------------------------------

/// POST /api/v1/downloads
///
/// Queue a new download. Returns 202 with the job id immediately; the
/// job is picked up by a worker and progresses in the background.
pub async fn submit_download(
    State(state): State<AppState>,
    Json(input): Json<SubmitDownload>,
) -> AppResult<impl IntoResponse> {
    media::validate_url(&input.url)?;
    let format: MediaFormat = input.format.parse()?;

    let job = JobRepo::submit(&state.pool, &input.url, format).await?;

    tracing::info!(
        job_id = %job.id,
        url = %sanitize_for_log(&input.url),
        format = %format,
        "Download submitted",
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: SubmittedDownload { job_id: job.id },
        }),
    ))
}

// ---------------------------------------------------------------------------
// Get
// ---------------------------------------------------------------------------

/// GET /api/v1/downloads/{id}
///
/// Get the current status of a download. Unknown ids and jobs past their
/// retention window both return 404.
pub async fn get_download(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let job = JobRepo::find_by_id(&state.pool, &job_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Download",
            id: job_id,
        }))?;

    Ok(Json(DataResponse {
        data: JobStatusView::resolve(&job),
    }))
}
