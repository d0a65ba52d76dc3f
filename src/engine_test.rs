use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::json;
use tokio::sync::Notify;

use super::*;
use crate::blocks::BlockContext;
use crate::enrichment_client::{EnrichmentClient, EnrichmentData, LeadInfo, UnconfiguredClient, UpstreamError};

fn test_ctx(client: Arc<dyn EnrichmentClient>, dir: &std::path::Path) -> BlockContext {
    BlockContext { data_dir: dir.to_path_buf(), root_dir: dir.to_path_buf(), enrichment_client: client }
}

fn scratch_dir(label: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("enrichment-engine-test-{label}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn create_workflow_starts_pending_with_one_progress_entry_per_block() {
    let engine = WorkflowEngine::new();
    let blocks = vec![BlockDefinition { id: "a".into(), kind: BlockKind::Filter, config: serde_json::Map::new() }];
    let id = engine.create_workflow(blocks);
    let state = engine.get_workflow_status(&id).unwrap();
    assert_eq!(state.status, WorkflowStatus::Pending);
    assert_eq!(state.blocks.len(), 1);
    assert_eq!(state.blocks[0].status, BlockStatus::Pending);
}

#[test]
fn request_pause_is_rejected_unless_running() {
    let engine = WorkflowEngine::new();
    let id = engine.create_workflow(vec![]);
    assert!(!engine.request_pause(&id));
    assert!(!engine.request_pause("does-not-exist"));
}

#[tokio::test]
async fn execute_workflow_completes_a_single_read_csv_block() {
    let dir = scratch_dir("complete");
    std::fs::write(dir.join("leads.csv"), "name\nAlice\nBob\n").unwrap();

    let engine = WorkflowEngine::new();
    let ctx = test_ctx(Arc::new(UnconfiguredClient), &dir);
    let blocks = vec![BlockDefinition {
        id: "read".into(),
        kind: BlockKind::ReadCsv,
        config: json!({ "file_path": "leads.csv" }).as_object().unwrap().clone(),
    }];
    let id = engine.create_workflow(blocks);

    engine.execute_workflow(&id, &ctx, 0, 0).await.unwrap();

    let state = engine.get_workflow_status(&id).unwrap();
    assert_eq!(state.status, WorkflowStatus::Completed);
    assert_eq!(state.result_row_count, 2);
    assert_eq!(state.blocks[0].status, BlockStatus::Completed);
    assert!(engine.get_workflow_result(&id).is_some());

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn execute_workflow_fails_the_workflow_on_block_error() {
    let dir = scratch_dir("fail");
    std::fs::write(dir.join("leads.csv"), "name\nAlice\n").unwrap();

    let engine = WorkflowEngine::new();
    let ctx = test_ctx(Arc::new(UnconfiguredClient), &dir);
    let blocks = vec![
        BlockDefinition {
            id: "read".into(),
            kind: BlockKind::ReadCsv,
            config: json!({ "file_path": "leads.csv" }).as_object().unwrap().clone(),
        },
        BlockDefinition {
            id: "filter".into(),
            kind: BlockKind::Filter,
            config: json!({ "column": "missing_column" }).as_object().unwrap().clone(),
        },
    ];
    let id = engine.create_workflow(blocks);

    engine.execute_workflow(&id, &ctx, 0, 0).await.unwrap();

    let state = engine.get_workflow_status(&id).unwrap();
    assert_eq!(state.status, WorkflowStatus::Failed);
    assert_eq!(state.blocks[0].status, BlockStatus::Completed);
    assert_eq!(state.blocks[1].status, BlockStatus::Failed);
    assert!(state.error.is_some());

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn resume_workflow_rejects_non_paused_status() {
    let dir = scratch_dir("resume-reject");
    let engine = WorkflowEngine::new();
    let ctx = test_ctx(Arc::new(UnconfiguredClient), &dir);
    let id = engine.create_workflow(vec![]);

    let err = engine.resume_workflow(&id, &ctx).await.unwrap_err();
    assert!(matches!(err, EngineError::CannotResume(_, WorkflowStatus::Pending)));

    std::fs::remove_dir_all(&dir).ok();
}

/// Blocks its first call on a `Notify` so the test can deterministically
/// observe the engine mid-batch before releasing it, rather than racing
/// on real wall-clock timing.
struct BlockingOnceClient {
    notify: Arc<Notify>,
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl EnrichmentClient for BlockingOnceClient {
    async fn enrich_lead(
        &self,
        _lead: &LeadInfo,
        _struct_fields: Option<&BTreeMap<String, String>>,
    ) -> Result<EnrichmentData, UpstreamError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            self.notify.notified().await;
        }
        Ok(EnrichmentData::default())
    }

    async fn find_email(&self, _lead: &LeadInfo, _mode: &str) -> Result<EnrichmentData, UpstreamError> {
        unreachable!("not exercised by this test")
    }
}

#[tokio::test]
async fn pause_mid_batch_then_resume_completes_the_remaining_rows() {
    let dir = scratch_dir("pause-resume");
    std::fs::write(dir.join("leads.csv"), "name\nAlice\nBob\n").unwrap();

    let notify = Arc::new(Notify::new());
    let client = Arc::new(BlockingOnceClient { notify: Arc::clone(&notify), calls: AtomicUsize::new(0) });
    let ctx = test_ctx(client, &dir);

    let engine = WorkflowEngine::new();
    let blocks = vec![
        BlockDefinition {
            id: "read".into(),
            kind: BlockKind::ReadCsv,
            config: json!({ "file_path": "leads.csv" }).as_object().unwrap().clone(),
        },
        BlockDefinition {
            id: "enrich".into(),
            kind: BlockKind::EnrichLead,
            config: json!({ "batch_size": 1, "max_concurrent": 1 }).as_object().unwrap().clone(),
        },
    ];
    let id = engine.create_workflow(blocks);

    let engine_for_task = engine.clone();
    let id_for_task = id.clone();
    let ctx_for_task = BlockContext {
        data_dir: ctx.data_dir.clone(),
        root_dir: ctx.root_dir.clone(),
        enrichment_client: Arc::clone(&ctx.enrichment_client),
    };
    let handle = tokio::spawn(async move { engine_for_task.execute_workflow(&id_for_task, &ctx_for_task, 0, 0).await });

    // Wait until the enrich block is actually running (blocked on row 0)
    // before requesting a pause, purely via cooperative yields.
    for _ in 0..10_000 {
        if let Some(state) = engine.get_workflow_status(&id) {
            if state.blocks[1].status == BlockStatus::Running {
                break;
            }
        }
        tokio::task::yield_now().await;
    }
    assert!(engine.request_pause(&id), "workflow should be running by now");

    notify.notify_one();
    handle.await.unwrap().unwrap();

    let paused_state = engine.get_workflow_status(&id).unwrap();
    assert_eq!(paused_state.status, WorkflowStatus::Paused);
    assert_eq!(paused_state.last_processed_row, 1);

    engine.resume_workflow(&id, &ctx).await.unwrap();

    let final_state = engine.get_workflow_status(&id).unwrap();
    assert_eq!(final_state.status, WorkflowStatus::Completed);
    assert_eq!(final_state.result_row_count, 2);

    std::fs::remove_dir_all(&dir).ok();
}
