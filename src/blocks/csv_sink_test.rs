use std::sync::Arc;

use serde_json::json;

use super::*;
use crate::enrichment_client::UnconfiguredClient;

fn no_op_progress(_: u8) {}
fn never_pause() -> bool {
    false
}

fn scratch_dir(label: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("enrichment-engine-{label}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn test_ctx(dir: &std::path::Path) -> BlockContext {
    BlockContext { data_dir: dir.to_path_buf(), root_dir: dir.to_path_buf(), enrichment_client: Arc::new(UnconfiguredClient) }
}

fn sample_frame() -> DataFrame {
    let mut frame = DataFrame::new(vec!["name".into()]);
    frame.push_row(std::collections::HashMap::from([("name".to_string(), json!("Alice"))]));
    frame
}

#[tokio::test]
async fn empty_input_is_rejected() {
    let dir = scratch_dir("csv-sink-empty");
    let ctx = test_ctx(&dir);
    let config = serde_json::Map::new();
    let err = SaveCsvBlock.execute(None, &config, &ctx, &no_op_progress, &never_pause, 0).await.unwrap_err();
    assert!(matches!(err, ExecutionError::EmptyInput));
    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn appends_csv_extension_when_missing() {
    let dir = scratch_dir("csv-sink-ext");
    let ctx = test_ctx(&dir);
    let config: BlockConfig = serde_json::from_value(json!({ "file_name": "out" })).unwrap();

    let outcome = SaveCsvBlock.execute(Some(sample_frame()), &config, &ctx, &no_op_progress, &never_pause, 0).await.unwrap();
    assert!(matches!(outcome, BlockOutcome::Done(_)));
    assert!(dir.join("out.csv").exists());

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn defaults_to_output_csv() {
    let dir = scratch_dir("csv-sink-default");
    let ctx = test_ctx(&dir);
    let config = serde_json::Map::new();

    SaveCsvBlock.execute(Some(sample_frame()), &config, &ctx, &no_op_progress, &never_pause, 0).await.unwrap();
    assert!(dir.join("output.csv").exists());

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn returns_input_frame_unchanged() {
    let dir = scratch_dir("csv-sink-unchanged");
    let ctx = test_ctx(&dir);
    let config = serde_json::Map::new();

    let outcome = SaveCsvBlock.execute(Some(sample_frame()), &config, &ctx, &no_op_progress, &never_pause, 0).await.unwrap();
    let BlockOutcome::Done(frame) = outcome else { panic!("expected Done") };
    assert_eq!(frame.len(), 1);

    std::fs::remove_dir_all(&dir).ok();
}
