//! `SAVE_CSV` — sink block. Writes the current frame to a file under the
//! data directory. Returns the frame unchanged. Grounded in
//! `original_source/backend/blocks/csv_blocks.py::SaveCSVBlock`.

use super::{config_str_or, Block, BlockConfig, BlockContext, BlockKind, BlockOutcome, ProgressCallback, PauseCallback};
use crate::dataframe::DataFrame;
use crate::error::ExecutionError;

pub struct SaveCsvBlock;

#[async_trait::async_trait]
impl Block for SaveCsvBlock {
    fn kind(&self) -> BlockKind {
        BlockKind::SaveCsv
    }

    async fn execute(
        &self,
        frame_in: Option<DataFrame>,
        config: &BlockConfig,
        ctx: &BlockContext,
        progress_cb: ProgressCallback<'_>,
        _pause_cb: PauseCallback<'_>,
        _start_row: usize,
    ) -> Result<BlockOutcome, ExecutionError> {
        let frame = frame_in.ok_or(ExecutionError::EmptyInput)?;

        let mut file_name = config_str_or(config, "file_name", "output.csv");
        if !file_name.ends_with(".csv") {
            file_name.push_str(".csv");
        }
        let output_path = ctx.data_dir.join(file_name);

        progress_cb(10);

        let write_frame = frame.clone();
        tokio::task::spawn_blocking(move || write_frame.write_csv(&output_path))
            .await
            .map_err(|e| ExecutionError::Internal(e.to_string()))??;

        progress_cb(100);
        Ok(BlockOutcome::Done(frame))
    }
}

#[cfg(test)]
#[path = "csv_sink_test.rs"]
mod tests;
