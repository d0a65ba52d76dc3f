//! `READ_CSV` — source block. Reads a CSV file into a frame.
//!
//! Resolves `file_path` by trying, in order: absolute path, a path
//! relative to the configured data directory, a path relative to the
//! configured root directory. Grounded in
//! `original_source/backend/blocks/csv_blocks.py::ReadCSVBlock`.

use std::path::{Path, PathBuf};

use super::{config_str, Block, BlockConfig, BlockContext, BlockKind, BlockOutcome, ProgressCallback, PauseCallback};
use crate::dataframe::DataFrame;
use crate::error::ExecutionError;

pub struct ReadCsvBlock;

fn resolve_path(file_path: &str, data_dir: &Path, root_dir: &Path) -> Option<PathBuf> {
    let as_given = PathBuf::from(file_path);
    if as_given.is_absolute() {
        return as_given.exists().then_some(as_given);
    }

    let in_data_dir = data_dir.join(file_path);
    if in_data_dir.exists() {
        return Some(in_data_dir);
    }

    let in_root_dir = root_dir.join(file_path);
    if in_root_dir.exists() {
        return Some(in_root_dir);
    }

    as_given.exists().then_some(as_given)
}

#[async_trait::async_trait]
impl Block for ReadCsvBlock {
    fn kind(&self) -> BlockKind {
        BlockKind::ReadCsv
    }

    async fn execute(
        &self,
        _frame_in: Option<DataFrame>,
        config: &BlockConfig,
        ctx: &BlockContext,
        progress_cb: ProgressCallback<'_>,
        _pause_cb: PauseCallback<'_>,
        _start_row: usize,
    ) -> Result<BlockOutcome, ExecutionError> {
        let file_path = config_str(config, "file_path").ok_or_else(|| ExecutionError::ConfigMissing("file_path".into()))?;

        let resolved = resolve_path(&file_path, &ctx.data_dir, &ctx.root_dir)
            .ok_or_else(|| ExecutionError::IoNotFound(file_path.clone()))?;

        progress_cb(10);

        let frame = tokio::task::spawn_blocking(move || DataFrame::read_csv(&resolved))
            .await
            .map_err(|e| ExecutionError::Internal(e.to_string()))??;

        progress_cb(100);
        Ok(BlockOutcome::Done(frame))
    }
}

#[cfg(test)]
#[path = "csv_source_test.rs"]
mod tests;
