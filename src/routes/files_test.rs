use std::sync::Arc;

use super::*;
use crate::config::EngineConfig;
use crate::enrichment_client::UnconfiguredClient;

fn scratch_state(label: &str) -> (AppState, std::path::PathBuf, std::path::PathBuf) {
    let root = std::env::temp_dir().join(format!("enrichment-engine-files-{label}-{}", std::process::id()));
    let data = root.join("data");
    std::fs::create_dir_all(&data).unwrap();
    let config = EngineConfig { data_dir: data.clone(), root_dir: root.clone(), port: 3000 };
    (AppState::new(config, Arc::new(UnconfiguredClient)), root, data)
}

#[test]
fn resolve_existing_prefers_data_dir() {
    let (state, root, data) = scratch_state("resolve");
    std::fs::write(data.join("leads.csv"), "name\nAlice\n").unwrap();
    std::fs::write(root.join("leads.csv"), "name\nBob\n").unwrap();

    let resolved = resolve_existing(&state, "leads.csv").unwrap();
    assert_eq!(resolved, data.join("leads.csv"));

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn resolve_existing_falls_back_to_root_dir() {
    let (state, root, _data) = scratch_state("resolve-fallback");
    std::fs::write(root.join("data.csv"), "name\nAlice\n").unwrap();

    let resolved = resolve_existing(&state, "data.csv").unwrap();
    assert_eq!(resolved, root.join("data.csv"));

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn resolve_existing_returns_none_when_absent() {
    let (state, root, _data) = scratch_state("resolve-missing");
    assert!(resolve_existing(&state, "nope.csv").is_none());
    std::fs::remove_dir_all(&root).ok();
}

#[tokio::test]
async fn list_files_includes_root_data_csv_fallback() {
    let (state, root, data) = scratch_state("list");
    std::fs::write(data.join("a.csv"), "name\n").unwrap();
    std::fs::write(root.join("data.csv"), "name\n").unwrap();

    let Json(response) = list_files(State(state)).await;
    assert!(response.files.contains(&"a.csv".to_string()));
    assert!(response.files.contains(&"data.csv".to_string()));

    std::fs::remove_dir_all(&root).ok();
}

#[tokio::test]
async fn preview_file_respects_row_limit() {
    let (state, root, data) = scratch_state("preview");
    std::fs::write(data.join("leads.csv"), "name\nAlice\nBob\nCarol\n").unwrap();

    let Json(result) = preview_file(State(state), AxumPath("leads.csv".to_string()), Query(PreviewQuery { rows: 2 })).await.unwrap();
    assert_eq!(result.data.len(), 2);
    assert_eq!(result.columns, vec!["name".to_string()]);

    std::fs::remove_dir_all(&root).ok();
}

#[tokio::test]
async fn preview_file_missing_is_not_found() {
    let (state, root, _data) = scratch_state("preview-missing");
    let err = preview_file(State(state), AxumPath("nope.csv".to_string()), Query(PreviewQuery { rows: 10 })).await.unwrap_err();
    assert_eq!(err, StatusCode::NOT_FOUND);
    std::fs::remove_dir_all(&root).ok();
}
