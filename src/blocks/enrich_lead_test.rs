use std::sync::Arc;

use serde_json::json;

use super::*;
use crate::enrichment_client::testing::MockEnrichmentClient;

fn no_op_progress(_: u8) {}
fn never_pause() -> bool {
    false
}
fn always_pause() -> bool {
    true
}

fn test_ctx(client: MockEnrichmentClient) -> BlockContext {
    BlockContext { data_dir: "/tmp".into(), root_dir: "/tmp".into(), enrichment_client: Arc::new(client) }
}

fn leads_frame(n: usize) -> DataFrame {
    let mut frame = DataFrame::new(vec!["name".into(), "company".into()]);
    for i in 0..n {
        frame.push_row(std::collections::HashMap::from([
            ("name".to_string(), json!(format!("Lead {i}"))),
            ("company".to_string(), json!("Acme")),
        ]));
    }
    frame
}

#[tokio::test]
async fn empty_frame_is_rejected() {
    let ctx = test_ctx(MockEnrichmentClient::new(vec![]));
    let config = serde_json::Map::new();
    let err = EnrichLeadBlock.execute(Some(DataFrame::new(vec!["name".into()])), &config, &ctx, &no_op_progress, &never_pause, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, ExecutionError::EmptyInput));
}

#[tokio::test]
async fn merges_enrichment_fields_with_prefix() {
    let response = Ok(serde_json::Map::from_iter([
        ("success".to_string(), json!(true)),
        ("title".to_string(), json!("VP Sales")),
    ]));
    let ctx = test_ctx(MockEnrichmentClient::new(vec![response]));
    let config = serde_json::Map::new();

    let outcome = EnrichLeadBlock.execute(Some(leads_frame(2)), &config, &ctx, &no_op_progress, &never_pause, 0).await.unwrap();
    let BlockOutcome::Done(frame) = outcome else { panic!("expected Done") };
    assert!(frame.columns.iter().any(|c| c == "enriched_title"));
    assert!(!frame.columns.iter().any(|c| c == "enriched_success"));
    assert_eq!(frame.rows[0].get_string("enriched_title").as_deref(), Some("VP Sales"));
}

#[tokio::test]
async fn upstream_failure_is_absorbed_per_row() {
    let ctx = test_ctx(MockEnrichmentClient::new(vec![Err(crate::enrichment_client::UpstreamError::Timeout(600))]));
    let config = serde_json::Map::new();

    let outcome = EnrichLeadBlock.execute(Some(leads_frame(1)), &config, &ctx, &no_op_progress, &never_pause, 0).await.unwrap();
    let BlockOutcome::Done(frame) = outcome else { panic!("expected Done") };
    assert_eq!(frame.len(), 1);
}

#[tokio::test]
async fn pauses_at_batch_boundary() {
    let ctx = test_ctx(MockEnrichmentClient::new(vec![Ok(serde_json::Map::new())]));
    let config: BlockConfig = serde_json::from_value(json!({ "batch_size": 1, "max_concurrent": 1 })).unwrap();

    let outcome = EnrichLeadBlock.execute(Some(leads_frame(3)), &config, &ctx, &no_op_progress, &always_pause, 0).await.unwrap();
    match outcome {
        BlockOutcome::Paused { last_processed_row, .. } => assert_eq!(last_processed_row, 0),
        BlockOutcome::Done(_) => panic!("expected Paused"),
    }
}

#[tokio::test]
async fn resumes_from_start_row() {
    let ctx = test_ctx(MockEnrichmentClient::new(vec![Ok(serde_json::Map::new())]));
    let config: BlockConfig = serde_json::from_value(json!({ "batch_size": 1 })).unwrap();

    let outcome = EnrichLeadBlock.execute(Some(leads_frame(3)), &config, &ctx, &no_op_progress, &never_pause, 2).await.unwrap();
    let BlockOutcome::Done(frame) = outcome else { panic!("expected Done") };
    assert_eq!(frame.len(), 3);
}

#[test]
fn normalize_struct_accepts_list_of_name_description_objects() {
    let config: BlockConfig =
        serde_json::from_value(json!({ "struct": [{ "name": "title", "description": "job title" }] })).unwrap();
    let fields = normalize_struct(&config);
    assert_eq!(fields.get("title").map(String::as_str), Some("job title"));
}

#[test]
fn normalize_struct_accepts_direct_mapping() {
    let config: BlockConfig = serde_json::from_value(json!({ "struct": { "title": "job title" } })).unwrap();
    let fields = normalize_struct(&config);
    assert_eq!(fields.get("title").map(String::as_str), Some("job title"));
}

#[test]
fn normalize_struct_defaults_to_empty() {
    let config = serde_json::Map::new();
    assert!(normalize_struct(&config).is_empty());
}
