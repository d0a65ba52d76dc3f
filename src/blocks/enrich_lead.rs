//! `ENRICH_LEAD` — batched concurrent fan-out to the enrichment client.
//! Grounded in `original_source/backend/blocks/api_blocks.py::EnrichLeadBlock`.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use super::{concurrency_config, config_str_or, Block, BlockConfig, BlockContext, BlockKind, BlockOutcome, ProgressCallback, PauseCallback};
use crate::dataframe::DataFrame;
use crate::enrichment_client::{EnrichmentClient, LeadInfo};
use crate::error::ExecutionError;

pub struct EnrichLeadBlock;

const DEFAULT_MAX_CONCURRENT: usize = 1;

/// Normalize the `struct` config key: either a list of
/// `{name, description}` objects or a direct name->description mapping.
/// An empty result means "default fields" (passed as `None` downstream).
fn normalize_struct(config: &BlockConfig) -> BTreeMap<String, String> {
    match config.get("struct") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| {
                let obj = item.as_object()?;
                let name = obj.get("name")?.as_str()?.to_string();
                let description = obj.get("description").and_then(Value::as_str).unwrap_or_default().to_string();
                Some((name, description))
            })
            .collect(),
        Some(Value::Object(map)) => {
            map.iter().filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string()))).collect()
        }
        _ => BTreeMap::new(),
    }
}

fn build_lead_info(row: &crate::dataframe::Row, name_col: &str, company_col: &str, linkedin_col: &str) -> LeadInfo {
    LeadInfo {
        name: row.get_string(name_col),
        company: row.get_string(company_col),
        linkedin: row.get_string(linkedin_col),
        email: row.get_string("email"),
        location: row.get_string("company_location"),
    }
}

#[async_trait::async_trait]
impl Block for EnrichLeadBlock {
    fn kind(&self) -> BlockKind {
        BlockKind::EnrichLead
    }

    async fn execute(
        &self,
        frame_in: Option<DataFrame>,
        config: &BlockConfig,
        ctx: &BlockContext,
        progress_cb: ProgressCallback<'_>,
        pause_cb: PauseCallback<'_>,
        start_row: usize,
    ) -> Result<BlockOutcome, ExecutionError> {
        let mut frame = frame_in.filter(|f| !f.is_empty()).ok_or(ExecutionError::EmptyInput)?;

        let (max_concurrent, batch_size) = concurrency_config(config, DEFAULT_MAX_CONCURRENT)?;
        let struct_fields = normalize_struct(config);
        let name_col = config_str_or(config, "name_column", "name");
        let company_col = config_str_or(config, "company_column", "company");
        let linkedin_col = config_str_or(config, "linkedin_column", "linkedin");

        let total = frame.rows.len();
        let mut current = start_row.min(total);

        info!(total, batch_size, max_concurrent, "enrich_lead: starting");

        while current < total {
            if pause_cb() {
                info!(row = current, total, "enrich_lead: pausing at batch boundary");
                return Ok(BlockOutcome::Paused { partial_frame: frame, last_processed_row: current });
            }

            let batch_end = (current + batch_size).min(total);
            let semaphore = Arc::new(Semaphore::new(max_concurrent));
            let client = Arc::clone(&ctx.enrichment_client);
            let struct_fields = if struct_fields.is_empty() { None } else { Some(struct_fields.clone()) };

            let mut tasks = Vec::with_capacity(batch_end - current);
            for row in &frame.rows[current..batch_end] {
                let lead = build_lead_info(row, &name_col, &company_col, &linkedin_col);
                let row_id = row.id;
                let semaphore = Arc::clone(&semaphore);
                let client = Arc::clone(&client);
                let struct_fields = struct_fields.clone();
                tasks.push(tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await.expect("semaphore never closed");
                    let result = client.enrich_lead(&lead, struct_fields.as_ref()).await;
                    (row_id, result)
                }));
            }

            let results = futures::future::join_all(tasks).await;
            for joined in results {
                let (row_id, result) = joined.map_err(|e| ExecutionError::Internal(e.to_string()))?;
                match result {
                    Ok(data) => {
                        for (key, value) in &data {
                            if key == "success" || key == "error" {
                                continue;
                            }
                            frame.set_cell(row_id, &format!("enriched_{key}"), value.clone());
                        }
                    }
                    Err(e) => {
                        warn!(row_id, error = %e, "enrich_lead: upstream failure, row left unenriched");
                    }
                }
            }

            current = batch_end;
            let progress = ((current as f64 / total as f64) * 100.0).floor() as u8;
            progress_cb(progress);
        }

        progress_cb(100);
        info!(total, "enrich_lead: completed");
        Ok(BlockOutcome::Done(frame))
    }
}

#[cfg(test)]
#[path = "enrich_lead_test.rs"]
mod tests;
