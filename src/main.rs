use std::sync::Arc;

use enrichment_workflow_engine::config::EngineConfig;
use enrichment_workflow_engine::enrichment_client::{EnrichmentClient, SixtyfourClient, UnconfiguredClient};
use enrichment_workflow_engine::routes;
use enrichment_workflow_engine::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = EngineConfig::from_env();
    std::fs::create_dir_all(&config.data_dir).expect("failed to create data directory");

    // Initialize the enrichment client (non-fatal: enrichment blocks fail
    // per-workflow instead of refusing to boot if the key is missing).
    let enrichment_client: Arc<dyn EnrichmentClient> = match SixtyfourClient::from_env() {
        Ok(client) => {
            tracing::info!("enrichment client initialized");
            Arc::new(client)
        }
        Err(e) => {
            tracing::warn!(error = %e, "enrichment client not configured — enrichment blocks will fail");
            Arc::new(UnconfiguredClient)
        }
    };

    let port = config.port;
    let state = AppState::new(config, enrichment_client);
    let app = routes::app(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await.expect("failed to bind");

    tracing::info!(%port, "enrichment workflow engine listening");
    axum::serve(listener, app).await.expect("server failed");
}
