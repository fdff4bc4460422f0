//! Route definitions for the `/downloads` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::downloads;
use crate::state::AppState;

/// Routes mounted at `/downloads`.
///
/// ```text
/// POST   /        -> submit_download
/// GET    /{id}    -> get_download
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(downloads::submit_download))
        .route("/{id}", get(downloads::get_download))
}
