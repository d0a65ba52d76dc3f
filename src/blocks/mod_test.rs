use serde_json::json;

use super::*;

#[test]
fn kind_as_str_matches_serde_rename() {
    assert_eq!(BlockKind::ReadCsv.as_str(), "READ_CSV");
    assert_eq!(BlockKind::FindEmail.as_str(), "FIND_EMAIL");
}

#[test]
fn kind_round_trips_through_json() {
    let value = serde_json::to_value(BlockKind::EnrichLead).unwrap();
    assert_eq!(value, json!("ENRICH_LEAD"));
    let back: BlockKind = serde_json::from_value(value).unwrap();
    assert_eq!(back, BlockKind::EnrichLead);
}

#[test]
fn unknown_kind_fails_to_deserialize() {
    let result: Result<BlockKind, _> = serde_json::from_value(json!("NOT_A_BLOCK"));
    assert!(result.is_err());
}

#[test]
fn concurrency_config_defaults_batch_size_to_max_concurrent() {
    let config: BlockConfig = serde_json::from_value(json!({ "max_concurrent": 4 })).unwrap();
    let (max_concurrent, batch_size) = concurrency_config(&config, 1).unwrap();
    assert_eq!(max_concurrent, 4);
    assert_eq!(batch_size, 4);
}

#[test]
fn concurrency_config_rejects_zero() {
    let config: BlockConfig = serde_json::from_value(json!({ "max_concurrent": 0 })).unwrap();
    assert!(concurrency_config(&config, 1).is_err());
}

#[test]
fn catalog_has_one_entry_per_block_kind() {
    let entries = catalog();
    assert_eq!(entries.len(), 5);
    let kinds: Vec<&str> = entries.iter().map(|e| e.kind).collect();
    assert!(kinds.contains(&"READ_CSV"));
    assert!(kinds.contains(&"FIND_EMAIL"));
}

#[test]
fn construct_returns_matching_kind() {
    for kind in [BlockKind::ReadCsv, BlockKind::SaveCsv, BlockKind::Filter, BlockKind::EnrichLead, BlockKind::FindEmail] {
        assert_eq!(construct(kind).kind(), kind);
    }
}
