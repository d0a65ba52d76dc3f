use std::path::PathBuf;

use super::*;

/// # Safety
/// Tests must run with `--test-threads=1` to avoid env races.
unsafe fn clear_engine_env() {
    unsafe {
        std::env::remove_var("DATA_DIR");
        std::env::remove_var("ROOT_DIR");
        std::env::remove_var("PORT");
    }
}

#[test]
fn defaults_when_env_absent() {
    unsafe { clear_engine_env() };
    let config = EngineConfig::from_env();
    assert_eq!(config.data_dir, PathBuf::from("./data"));
    assert_eq!(config.root_dir, PathBuf::from("."));
    assert_eq!(config.port, 3000);
}

#[test]
fn invalid_port_falls_back_to_default() {
    unsafe {
        clear_engine_env();
        std::env::set_var("PORT", "not-a-number");
    }
    let config = EngineConfig::from_env();
    assert_eq!(config.port, 3000);
    unsafe { clear_engine_env() };
}

#[test]
fn reads_overrides_from_env() {
    unsafe {
        clear_engine_env();
        std::env::set_var("DATA_DIR", "/tmp/enrichment-data");
        std::env::set_var("PORT", "9090");
    }
    let config = EngineConfig::from_env();
    assert_eq!(config.data_dir, PathBuf::from("/tmp/enrichment-data"));
    assert_eq!(config.port, 9090);
    unsafe { clear_engine_env() };
}
