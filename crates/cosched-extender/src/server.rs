use crate::handlers::*;
use crate::ExtenderState;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Extender server configuration
#[derive(Debug, Clone)]
pub struct ExtenderConfig {
    /// Address to listen on
    pub listen_addr: SocketAddr,
}

impl Default for ExtenderConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8888)),
        }
    }
}

/// HTTP endpoint for kube-scheduler's extender webhooks
pub struct ExtenderServer {
    config: ExtenderConfig,
    state: Arc<ExtenderState>,
}

impl ExtenderServer {
    /// Create a new extender server
    pub fn new(config: ExtenderConfig, state: Arc<ExtenderState>) -> Self {
        Self { config, state }
    }

    /// Build the router
    pub fn build_router(&self) -> Router {
        router(self.state.clone())
    }

    /// Serve until the state's cancellation token fires
    pub async fn run(self) -> Result<(), std::io::Error> {
        let app = self.build_router();

        info!(
            addr = %self.config.listen_addr,
            timeout_ms = self.state.request_timeout.as_millis() as u64,
            "Starting scheduler extender"
        );

        let listener = TcpListener::bind(self.config.listen_addr).await?;
        let token = self.state.token.clone();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move { token.cancelled().await })
            .await?;

        info!("Scheduler extender stopped");
        Ok(())
    }
}

/// Routes served by the extender
pub fn router(state: Arc<ExtenderState>) -> Router {
    Router::new()
        // Health checks
        .route("/healthz", get(healthz))
        .route("/livez", get(livez))
        .route("/readyz", get(readyz))
        // Extender webhooks
        .route("/filter", post(filter_nodes))
        .route("/prioritize", post(prioritize_nodes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
