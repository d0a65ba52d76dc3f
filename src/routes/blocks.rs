//! `GET /blocks` — the static block catalog.

use axum::response::Json;

use crate::blocks::{self, BlockCatalogEntry};

pub async fn list_blocks() -> Json<Vec<BlockCatalogEntry>> {
    Json(blocks::catalog())
}
