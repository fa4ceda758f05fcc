//! Route definitions

use super::handlers::{
    analyze_project, build_project, clear_logs, delete_project, download_artifact, get_logs,
    get_project, health, list_projects, setup_project, stop_project, upload_project,
    validate_file,
};
use super::AppState;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Room for multipart framing on top of the upload limit.
const BODY_LIMIT_SLACK: usize = 1024 * 1024;

pub fn create_router(state: AppState) -> Router {
    // Accept slightly oversized uploads so validation can report the size.
    let body_limit = usize::try_from(state.max_upload_bytes)
        .unwrap_or(usize::MAX)
        .saturating_mul(2)
        .saturating_add(BODY_LIMIT_SLACK);

    let api_routes = Router::new()
        .route("/projects", get(list_projects))
        .route("/projects/validate", post(validate_file))
        .route("/projects/upload", post(upload_project))
        .route("/projects/{id}", get(get_project).delete(delete_project))
        .route("/projects/{id}/analyze", post(analyze_project))
        .route("/projects/{id}/setup", post(setup_project))
        .route("/projects/{id}/build", post(build_project))
        .route("/projects/{id}/stop", post(stop_project))
        .route("/projects/{id}/download", get(download_artifact))
        .route("/projects/{id}/logs", get(get_logs).delete(clear_logs))
        .layer(DefaultBodyLimit::max(body_limit));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
