//! Shared application state, injected into Axum handlers via the
//! `State` extractor: one `Clone`-able struct whose inner fields are
//! `Arc`-wrapped.

use std::sync::Arc;

use crate::blocks::BlockContext;
use crate::config::EngineConfig;
use crate::engine::WorkflowEngine;
use crate::enrichment_client::EnrichmentClient;

#[derive(Clone)]
pub struct AppState {
    pub engine: WorkflowEngine,
    pub config: Arc<EngineConfig>,
    pub enrichment_client: Arc<dyn EnrichmentClient>,
}

impl AppState {
    #[must_use]
    pub fn new(config: EngineConfig, enrichment_client: Arc<dyn EnrichmentClient>) -> Self {
        Self { engine: WorkflowEngine::new(), config: Arc::new(config), enrichment_client }
    }

    /// Build the per-execution context blocks need: resolved data/root
    /// directories plus the injected enrichment client.
    #[must_use]
    pub fn block_context(&self) -> BlockContext {
        BlockContext {
            data_dir: self.config.data_dir.clone(),
            root_dir: self.config.root_dir.clone(),
            enrichment_client: Arc::clone(&self.enrichment_client),
        }
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
