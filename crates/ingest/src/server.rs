use std::sync::Arc;
use std::time::Duration;

use agentpulse_core::error::{PulseError, Result};
use agentpulse_store::Store;
use tracing::info;

use crate::http::{ApiState, router};

pub struct ServerConfig {
    pub http_addr: String,
    pub api_key: String,
    pub allow_anonymous: bool,
    pub correlation_window: Duration,
}

pub async fn run_http_server(store: Store, cfg: ServerConfig) -> Result<()> {
    let state = ApiState {
        store,
        api_key: Arc::from(cfg.api_key.as_str()),
        allow_anonymous: cfg.allow_anonymous,
        correlation_window: cfg.correlation_window,
    };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&cfg.http_addr)
        .await
        .map_err(|e| PulseError::Io(format!("failed to bind {}: {e}", cfg.http_addr)))?;
    info!(addr = %cfg.http_addr, "ingestion api listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| PulseError::Ingest(format!("http server failed: {e}")))
}
