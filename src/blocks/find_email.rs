//! `FIND_EMAIL` — batched concurrent fan-out to the enrichment client's
//! email-discovery endpoint, with a `skip_existing` prefilter. Grounded
//! in `original_source/backend/blocks/api_blocks.py::FindEmailBlock`.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use super::{
    concurrency_config, config_bool_or, config_str_or, Block, BlockConfig, BlockContext, BlockKind, BlockOutcome,
    PauseCallback, ProgressCallback,
};
use crate::dataframe::{DataFrame, RowId};
use crate::enrichment_client::LeadInfo;
use crate::error::ExecutionError;

pub struct FindEmailBlock;

const DEFAULT_MAX_CONCURRENT: usize = 10;

#[async_trait::async_trait]
impl Block for FindEmailBlock {
    fn kind(&self) -> BlockKind {
        BlockKind::FindEmail
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
        let mode = config_str_or(config, "mode", "PROFESSIONAL");
        let name_col = config_str_or(config, "name_column", "name");
        let company_col = config_str_or(config, "company_column", "company");
        let linkedin_col = config_str_or(config, "linkedin_column", "linkedin");
        let output_col = config_str_or(config, "output_column", "found_email");
        let skip_existing = config_bool_or(config, "skip_existing", true);

        frame.ensure_column(&output_col);

        // Split into "already has an email" (resolved immediately) and the
        // candidate list actually dispatched to the client, preserving
        // source row order within the candidate list.
        let mut candidates: Vec<RowId> = Vec::new();
        for row in &frame.rows {
            let existing_email = row.get_string("email").filter(|s| !s.is_empty());
            if skip_existing {
                if let Some(email) = existing_email {
                    frame.set_cell(row.id, &output_col, Value::String(email));
                    continue;
                }
            }
            candidates.push(row.id);
        }

        let total = candidates.len();
        if total == 0 {
            progress_cb(100);
            return Ok(BlockOutcome::Done(frame));
        }

        let mut current = start_row.min(total);

        info!(total, batch_size, max_concurrent, "find_email: starting");

        while current < total {
            if pause_cb() {
                info!(row = current, total, "find_email: pausing at batch boundary");
                return Ok(BlockOutcome::Paused { partial_frame: frame, last_processed_row: current });
            }

            let batch_end = (current + batch_size).min(total);
            let semaphore = Arc::new(Semaphore::new(max_concurrent));
            let client = Arc::clone(&ctx.enrichment_client);

            let mut tasks = Vec::with_capacity(batch_end - current);
            for &row_id in &candidates[current..batch_end] {
                let row = frame.rows.iter().find(|r| r.id == row_id).expect("candidate row must exist");
                let lead =
                    LeadInfo { name: row.get_string(&name_col), company: row.get_string(&company_col), linkedin: row.get_string(&linkedin_col), email: None, location: None };
                let semaphore = Arc::clone(&semaphore);
                let client = Arc::clone(&client);
                let mode = mode.clone();
                tasks.push(tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await.expect("semaphore never closed");
                    let result = client.find_email(&lead, &mode).await;
                    (row_id, result)
                }));
            }

            let results = futures::future::join_all(tasks).await;
            for joined in results {
                let (row_id, result) = joined.map_err(|e| ExecutionError::Internal(e.to_string()))?;
                match result {
                    Ok(data) => {
                        let email = data.get("email").or_else(|| data.get("found_email")).and_then(Value::as_str);
                        if let Some(email) = email.filter(|e| !e.is_empty()) {
                            frame.set_cell(row_id, &output_col, Value::String(email.to_string()));
                        }
                    }
                    Err(e) => {
                        warn!(row_id, error = %e, "find_email: upstream failure, row left without email");
                    }
                }
            }

            current = batch_end;
            let progress = ((current as f64 / total as f64) * 100.0).floor() as u8;
            progress_cb(progress);
        }

        progress_cb(100);
        info!(total, "find_email: completed");
        Ok(BlockOutcome::Done(frame))
    }
}

#[cfg(test)]
#[path = "find_email_test.rs"]
mod tests;
