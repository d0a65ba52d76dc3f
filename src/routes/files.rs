//! File surface: list/upload/download/preview CSV files under the
//! configured data directory, with a root-directory `data.csv` fallback.
//! Grounded in `original_source/backend/main.py`'s file endpoints.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use axum::extract::{Multipart, Path as AxumPath, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};

use crate::dataframe::DataFrame;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct FileListResponse {
    pub files: Vec<String>,
}

/// `GET /files` — every `*.csv` in the data directory, plus `data.csv`
/// in the root directory if it exists there.
pub async fn list_files(State(state): State<AppState>) -> Json<FileListResponse> {
    let mut files: HashSet<String> = HashSet::new();

    if let Ok(entries) = std::fs::read_dir(&state.config.data_dir) {
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(".csv") {
                files.insert(name);
            }
        }
    }

    if state.config.root_dir.join("data.csv").exists() {
        files.insert("data.csv".to_string());
    }

    let mut files: Vec<String> = files.into_iter().collect();
    files.sort();
    Json(FileListResponse { files })
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub filename: String,
    pub message: &'static str,
}

/// `POST /files/upload` — multipart upload into the data directory.
/// Rejects anything not ending in `.csv`.
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, (StatusCode, String)> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?
        .ok_or((StatusCode::BAD_REQUEST, "missing file field".to_string()))?;

    let filename = field.file_name().map(str::to_string).ok_or((StatusCode::BAD_REQUEST, "missing filename".to_string()))?;
    if !filename.ends_with(".csv") {
        return Err((StatusCode::BAD_REQUEST, "Only CSV files are allowed".to_string()));
    }

    let bytes = field.bytes().await.map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    std::fs::create_dir_all(&state.config.data_dir).map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let dest = state.config.data_dir.join(&filename);
    std::fs::write(&dest, &bytes).map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(UploadResponse { filename, message: "File uploaded successfully" }))
}

/// Resolve `filename` against the data directory first, then the root
/// directory, matching `original_source`'s two-step lookup.
fn resolve_existing(state: &AppState, filename: &str) -> Option<PathBuf> {
    let in_data = state.config.data_dir.join(filename);
    if in_data.exists() {
        return Some(in_data);
    }
    let in_root = state.config.root_dir.join(filename);
    if in_root.exists() {
        return Some(in_root);
    }
    None
}

/// `GET /files/{filename}` — raw CSV download.
pub async fn download_file(State(state): State<AppState>, AxumPath(filename): AxumPath<String>) -> Result<Response, StatusCode> {
    let path = resolve_existing(&state, &filename).ok_or(StatusCode::NOT_FOUND)?;
    let body = std::fs::read(&path).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, "text/csv".parse().unwrap());
    headers.insert(
        header::CONTENT_DISPOSITION,
        format!("attachment; filename=\"{filename}\"").parse().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?,
    );
    Ok((headers, body).into_response())
}

#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    #[serde(default = "default_preview_rows")]
    pub rows: usize,
}

fn default_preview_rows() -> usize {
    10
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub columns: Vec<String>,
    pub data: Vec<serde_json::Map<String, serde_json::Value>>,
}

/// `GET /files/{filename}/preview?rows=N` — first `rows` records.
pub async fn preview_file(
    State(state): State<AppState>,
    AxumPath(filename): AxumPath<String>,
    Query(query): Query<PreviewQuery>,
) -> Result<Json<PreviewResponse>, StatusCode> {
    let path = resolve_existing(&state, &filename).ok_or(StatusCode::NOT_FOUND)?;
    let frame = read_csv_for_preview(&path).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(PreviewResponse { columns: frame.columns.clone(), data: frame.preview(query.rows) }))
}

fn read_csv_for_preview(path: &Path) -> Result<DataFrame, crate::error::ExecutionError> {
    DataFrame::read_csv(path)
}

#[cfg(test)]
#[path = "files_test.rs"]
mod tests;
