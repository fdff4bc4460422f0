pub mod downloads;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /downloads           submit (POST)
/// /downloads/{id}      status (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/downloads", downloads::router())
}
