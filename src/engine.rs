//! Workflow Execution Engine — the state machine that drives a block
//! sequence, coordinates pause/resume, and owns the intermediate frame.
//!
//! DESIGN
//! ======
//! Two private registries, `workflow_id -> WorkflowState` and
//! `workflow_id -> DataFrame`, mirror `original_source/backend/engine.py`'s
//! `self.workflows` / `self._dataframes` dicts, generalized into a
//! map-of-state idiom. Each `WorkflowState` lives behind
//! its own `std::sync::RwLock` so `progress_cb`/`pause_cb` — plain
//! synchronous closures, never `.await`ed — can update it without an
//! async lock. Guards are always dropped before crossing an `.await`
//! point; nothing here holds a lock across suspension.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};
use uuid::Uuid;

use crate::blocks::{self, BlockConfig, BlockContext, BlockKind, BlockOutcome};
use crate::dataframe::DataFrame;
use crate::error::ExecutionError;

// =============================================================================
// WIRE / STATE TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    Pending,
    Running,
    Paused,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockStatus {
    Pending,
    Running,
    Paused,
    Completed,
    Failed,
    Skipped,
}

/// A single block in a workflow request: id, kind, and its config map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockDefinition {
    pub id: String,
    pub kind: BlockKind,
    #[serde(default)]
    pub config: BlockConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockProgress {
    pub block_id: String,
    pub kind: BlockKind,
    pub status: BlockStatus,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
}

impl BlockProgress {
    fn pending(def: &BlockDefinition) -> Self {
        Self { block_id: def.id.clone(), kind: def.kind, status: BlockStatus::Pending, progress: 0, error: None, started_at: None, completed_at: None }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkflowState {
    pub workflow_id: String,
    pub status: WorkflowStatus,
    pub blocks: Vec<BlockProgress>,
    pub current_block_index: usize,
    #[serde(skip)]
    pub blocks_config: Vec<BlockDefinition>,
    pub pause_requested: bool,
    pub last_processed_row: usize,
    pub result_columns: Vec<String>,
    pub result_row_count: usize,
    pub result_preview: Vec<serde_json::Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else { return 0 };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("workflow {0} not found")]
    NotFound(String),

    #[error("workflow {0} cannot be resumed from status {1:?}")]
    CannotResume(String, WorkflowStatus),
}

// =============================================================================
// ENGINE
// =============================================================================

type WorkflowEntry = Arc<RwLock<WorkflowState>>;

#[derive(Clone)]
pub struct WorkflowEngine {
    workflows: Arc<RwLock<HashMap<String, WorkflowEntry>>>,
    frames: Arc<RwLock<HashMap<String, DataFrame>>>,
}

impl WorkflowEngine {
    #[must_use]
    pub fn new() -> Self {
        Self { workflows: Arc::new(RwLock::new(HashMap::new())), frames: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Allocate a fresh workflow id and materialize its initial state.
    pub fn create_workflow(&self, blocks: Vec<BlockDefinition>) -> String {
        let workflow_id = Uuid::new_v4().to_string();
        let block_progress = blocks.iter().map(BlockProgress::pending).collect();
        let state = WorkflowState {
            workflow_id: workflow_id.clone(),
            status: WorkflowStatus::Pending,
            blocks: block_progress,
            current_block_index: 0,
            blocks_config: blocks,
            pause_requested: false,
            last_processed_row: 0,
            result_columns: Vec::new(),
            result_row_count: 0,
            result_preview: Vec::new(),
            started_at: None,
            completed_at: None,
            error: None,
        };
        self.workflows.write().unwrap().insert(workflow_id.clone(), Arc::new(RwLock::new(state)));
        workflow_id
    }

    #[must_use]
    pub fn get_workflow_status(&self, workflow_id: &str) -> Option<WorkflowState> {
        let entry = self.workflows.read().unwrap().get(workflow_id).cloned()?;
        Some(entry.read().unwrap().clone())
    }

    #[must_use]
    pub fn get_workflow_result(&self, workflow_id: &str) -> Option<DataFrame> {
        self.frames.read().unwrap().get(workflow_id).cloned()
    }

    pub fn cleanup_workflow(&self, workflow_id: &str) {
        self.workflows.write().unwrap().remove(workflow_id);
        self.frames.write().unwrap().remove(workflow_id);
    }

    /// Set the cooperative pause flag. Valid only while `RUNNING`.
    /// Idempotent.
    pub fn request_pause(&self, workflow_id: &str) -> bool {
        let Some(entry) = self.workflows.read().unwrap().get(workflow_id).cloned() else { return false };
        let mut state = entry.write().unwrap();
        if state.status != WorkflowStatus::Running {
            return false;
        }
        state.pause_requested = true;
        true
    }

    /// Drive `workflow_id` from `start_block_index`/`start_row` through
    /// to `COMPLETED`, `FAILED`, or `PAUSED`.
    pub async fn execute_workflow(
        &self,
        workflow_id: &str,
        ctx: &BlockContext,
        start_block_index: usize,
        start_row: usize,
    ) -> Result<(), EngineError> {
        let entry = self.workflows.read().unwrap().get(workflow_id).cloned().ok_or_else(|| EngineError::NotFound(workflow_id.to_string()))?;

        let (blocks_config, mut current_frame) = {
            let mut state = entry.write().unwrap();
            state.status = WorkflowStatus::Running;
            state.pause_requested = false;
            if state.started_at.is_none() {
                state.started_at = Some(now_ms());
            }
            (state.blocks_config.clone(), None::<DataFrame>)
        };

        if start_block_index > 0 {
            current_frame = self.frames.read().unwrap().get(workflow_id).cloned();
        }

        info!(workflow_id, start_block_index, start_row, "engine: executing workflow");

        for (i, block_def) in blocks_config.iter().enumerate() {
            if i < start_block_index {
                continue;
            }

            {
                let mut state = entry.write().unwrap();
                state.current_block_index = i;
                state.blocks[i].status = BlockStatus::Running;
                if state.blocks[i].started_at.is_none() {
                    state.blocks[i].started_at = Some(now_ms());
                }
            }

            let block = blocks::construct(block_def.kind);
            let block_start_row = if i == start_block_index { start_row } else { 0 };

            let entry_for_progress = Arc::clone(&entry);
            let progress_cb = move |progress: u8| {
                let mut state = entry_for_progress.write().unwrap();
                state.blocks[i].progress = progress;
            };

            let entry_for_pause = Arc::clone(&entry);
            let pause_cb = move || entry_for_pause.read().unwrap().pause_requested;

            let outcome = block.execute(current_frame.take(), &block_def.config, ctx, &progress_cb, &pause_cb, block_start_row).await;

            match outcome {
                Ok(BlockOutcome::Done(frame)) => {
                    self.frames.write().unwrap().insert(workflow_id.to_string(), frame.clone());
                    let mut state = entry.write().unwrap();
                    state.blocks[i].status = BlockStatus::Completed;
                    state.blocks[i].progress = 100;
                    state.blocks[i].completed_at = Some(now_ms());
                    refresh_preview(&mut state, &frame);
                    current_frame = Some(frame);
                }
                Ok(BlockOutcome::Paused { partial_frame, last_processed_row }) => {
                    self.frames.write().unwrap().insert(workflow_id.to_string(), partial_frame.clone());
                    let mut state = entry.write().unwrap();
                    state.status = WorkflowStatus::Paused;
                    state.blocks[i].status = BlockStatus::Paused;
                    state.last_processed_row = last_processed_row;
                    refresh_preview(&mut state, &partial_frame);
                    info!(workflow_id, block_id = %block_def.id, last_processed_row, "engine: workflow paused");
                    return Ok(());
                }
                Err(e) => {
                    let mut state = entry.write().unwrap();
                    state.status = WorkflowStatus::Failed;
                    state.blocks[i].status = BlockStatus::Failed;
                    state.blocks[i].error = Some(e.to_string());
                    state.blocks[i].completed_at = Some(now_ms());
                    state.error = Some(e.to_string());
                    state.completed_at = Some(now_ms());
                    error!(workflow_id, block_id = %block_def.id, error = %e, "engine: block failed");
                    return Ok(());
                }
            }
        }

        let mut state = entry.write().unwrap();
        state.status = WorkflowStatus::Completed;
        state.completed_at = Some(now_ms());
        info!(workflow_id, "engine: workflow completed");
        Ok(())
    }

    /// Resume a `PAUSED` workflow from its saved cursor.
    pub async fn resume_workflow(&self, workflow_id: &str, ctx: &BlockContext) -> Result<(), EngineError> {
        let entry = self.workflows.read().unwrap().get(workflow_id).cloned().ok_or_else(|| EngineError::NotFound(workflow_id.to_string()))?;

        let (status, current_block_index, last_processed_row) = {
            let state = entry.read().unwrap();
            (state.status, state.current_block_index, state.last_processed_row)
        };

        if status != WorkflowStatus::Paused {
            return Err(EngineError::CannotResume(workflow_id.to_string(), status));
        }

        self.execute_workflow(workflow_id, ctx, current_block_index, last_processed_row).await
    }
}

impl Default for WorkflowEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn refresh_preview(state: &mut WorkflowState, frame: &DataFrame) {
    state.result_columns = frame.columns.clone();
    state.result_row_count = frame.len();
    state.result_preview = frame.preview(10);
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
