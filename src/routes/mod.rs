//! Router assembly.

pub mod blocks;
pub mod files;
pub mod workflows;

use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/blocks", get(blocks::list_blocks))
        .route("/workflows/execute", post(workflows::execute_workflow))
        .route("/workflows/{id}/status", get(workflows::get_workflow_status))
        .route("/workflows/{id}/results", get(workflows::get_workflow_results))
        .route("/workflows/{id}/pause", post(workflows::pause_workflow))
        .route("/workflows/{id}/resume", post(workflows::resume_workflow))
        .route("/workflows/{id}", delete(workflows::delete_workflow))
        .route("/files", get(files::list_files))
        .route("/files/upload", post(files::upload_file))
        .route("/files/{filename}", get(files::download_file))
        .route("/files/{filename}/preview", get(files::preview_file))
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
