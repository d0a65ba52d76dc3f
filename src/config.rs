//! Engine configuration parsed from environment variables.
//!
//! Grounded in `llm/config.rs`'s `LlmConfig::from_env` pattern: typed,
//! defaulted, parsed once at startup.

use std::path::PathBuf;

const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_ROOT_DIR: &str = ".";
const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub data_dir: PathBuf,
    pub root_dir: PathBuf,
    pub port: u16,
}

impl EngineConfig {
    /// Build engine config from environment variables.
    ///
    /// - `DATA_DIR`: directory CSV blocks read/write relative paths
    ///   against (default `"./data"`).
    /// - `ROOT_DIR`: fallback directory for resolving `READ_CSV` paths
    ///   (default `"."`).
    /// - `PORT`: HTTP listen port (default `3000`).
    #[must_use]
    pub fn from_env() -> Self {
        let data_dir = std::env::var("DATA_DIR").map_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from);
        let root_dir = std::env::var("ROOT_DIR").map_or_else(|_| PathBuf::from(DEFAULT_ROOT_DIR), PathBuf::from);
        let port = std::env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(DEFAULT_PORT);
        Self { data_dir, root_dir, port }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
