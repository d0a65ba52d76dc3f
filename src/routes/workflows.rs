//! Workflow lifecycle routes: create+start, status, results, pause,
//! resume, delete.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};

use crate::dataframe::FrameResultPayload;
use crate::engine::{BlockDefinition, EngineError, WorkflowState, WorkflowStatus};
use crate::error::ExecutionError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WorkflowRequest {
    pub blocks: Vec<BlockDefinition>,
}

#[derive(Debug, Serialize)]
pub struct WorkflowCreateResponse {
    pub workflow_id: String,
    pub message: &'static str,
}

/// `POST /workflows/execute` — create a workflow and run it in the
/// background. Returns immediately; poll `/workflows/{id}/status`.
pub async fn execute_workflow(
    State(state): State<AppState>,
    Json(request): Json<WorkflowRequest>,
) -> Json<WorkflowCreateResponse> {
    let workflow_id = state.engine.create_workflow(request.blocks);

    let engine = state.engine.clone();
    let ctx = state.block_context();
    let id_for_task = workflow_id.clone();
    tokio::spawn(async move {
        if let Err(e) = engine.execute_workflow(&id_for_task, &ctx, 0, 0).await {
            tracing::error!(workflow_id = %id_for_task, error = %e, "workflow execution task failed");
        }
    });

    Json(WorkflowCreateResponse { workflow_id, message: "Workflow started" })
}

/// `GET /workflows/{id}/status`.
pub async fn get_workflow_status(
    State(state): State<AppState>,
    Path(workflow_id): Path<String>,
) -> Result<Json<WorkflowState>, StatusCode> {
    state.engine.get_workflow_status(&workflow_id).map(Json).ok_or(StatusCode::NOT_FOUND)
}

/// `GET /workflows/{id}/results` — only available once `COMPLETED`.
pub async fn get_workflow_results(
    State(state): State<AppState>,
    Path(workflow_id): Path<String>,
) -> Result<Json<FrameResultPayload>, StatusCode> {
    let status = state.engine.get_workflow_status(&workflow_id).ok_or(StatusCode::NOT_FOUND)?;
    if status.status != WorkflowStatus::Completed {
        return Err(StatusCode::BAD_REQUEST);
    }
    let frame = state.engine.get_workflow_result(&workflow_id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(FrameResultPayload { columns: frame.columns.clone(), row_count: frame.len(), data: frame.to_records() }))
}

#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    pub accepted: bool,
}

/// `POST /workflows/{id}/pause`.
pub async fn pause_workflow(
    State(state): State<AppState>,
    Path(workflow_id): Path<String>,
) -> Json<AcceptedResponse> {
    Json(AcceptedResponse { accepted: state.engine.request_pause(&workflow_id) })
}

/// `POST /workflows/{id}/resume`.
pub async fn resume_workflow(
    State(state): State<AppState>,
    Path(workflow_id): Path<String>,
) -> Result<Json<AcceptedResponse>, StatusCode> {
    let engine = state.engine.clone();
    let ctx = state.block_context();
    let id_for_task = workflow_id.clone();

    // Validate resumability synchronously so the caller gets an
    // immediate rejection; the actual resume runs in the background,
    // exactly like `execute_workflow`.
    match state.engine.get_workflow_status(&workflow_id) {
        None => return Err(StatusCode::NOT_FOUND),
        Some(s) if s.status != WorkflowStatus::Paused => return Ok(Json(AcceptedResponse { accepted: false })),
        Some(_) => {}
    }

    tokio::spawn(async move {
        if let Err(e) = engine.resume_workflow(&id_for_task, &ctx).await {
            tracing::error!(workflow_id = %id_for_task, error = %e, "workflow resume task failed");
        }
    });

    Ok(Json(AcceptedResponse { accepted: true }))
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// `DELETE /workflows/{id}`.
pub async fn delete_workflow(State(state): State<AppState>, Path(workflow_id): Path<String>) -> Json<MessageResponse> {
    state.engine.cleanup_workflow(&workflow_id);
    Json(MessageResponse { message: "Workflow deleted" })
}

/// Maps an engine-level error to its HTTP status.
#[allow(dead_code)]
fn engine_error_to_status(err: &EngineError) -> StatusCode {
    match err {
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::CannotResume(_, _) => StatusCode::BAD_REQUEST,
    }
}

/// Maps a block-execution error to its HTTP status, for any surface that
/// needs to report `ExecutionError` directly.
#[allow(dead_code)]
fn execution_error_to_status(err: &ExecutionError) -> StatusCode {
    match err {
        ExecutionError::ConfigMissing(_) | ExecutionError::ConfigInvalid(_) | ExecutionError::EmptyInput => {
            StatusCode::BAD_REQUEST
        }
        ExecutionError::IoNotFound(_) => StatusCode::NOT_FOUND,
        ExecutionError::IoFailure(_) | ExecutionError::Internal(_) | ExecutionError::UpstreamFailure(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[cfg(test)]
#[path = "workflows_test.rs"]
mod tests;
