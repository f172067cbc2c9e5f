//! Server Module
//!
//! HTTP server exposing the vector store. The load is started when the
//! server runs, and requests are answered while it is still in progress.

mod config;
mod handlers;
mod response;

pub use config::{Config, ConfigError};
pub use handlers::{DEFAULT_ANALOGY_TOPN, DEFAULT_NEIGHBORS_TOPN};
pub use response::ApiError;

use axum::http::Method;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::loading::LoadingCoordinator;
use crate::metrics::Metrics;
use crate::observability::HealthCheck;

/// Per-query limits enforced at the HTTP boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryLimits {
    pub max_topn: usize,
    pub max_word_len: usize,
}

impl From<&Config> for QueryLimits {
    fn from(config: &Config) -> Self {
        Self {
            max_topn: config.max_topn,
            max_word_len: config.max_word_len,
        }
    }
}

/// Shared handler state
#[derive(Debug, Clone)]
pub struct AppState {
    pub coordinator: Arc<LoadingCoordinator>,
    pub health: HealthCheck,
    pub metrics: Arc<Metrics>,
    pub limits: QueryLimits,
}

impl AppState {
    pub fn new(coordinator: Arc<LoadingCoordinator>, limits: QueryLimits) -> Self {
        Self {
            health: HealthCheck::new(Arc::clone(&coordinator)),
            coordinator,
            metrics: Arc::new(Metrics::new()),
            limits,
        }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready))
        .route("/loading-status", get(handlers::loading_status))
        .route("/similarity", get(handlers::similarity))
        .route("/neighbors", get(handlers::neighbors))
        .route("/analogy", get(handlers::analogy))
        .route("/vocabulary", get(handlers::vocabulary))
        .route("/stats", get(handlers::stats))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Word vector HTTP server
pub struct Server {
    config: Config,
    state: AppState,
}

impl Server {
    /// Create a new server with the given configuration
    pub fn new(config: Config) -> Self {
        let state = AppState::new(
            Arc::new(LoadingCoordinator::new()),
            QueryLimits::from(&config),
        );
        Self { config, state }
    }

    /// Start the background load, then serve until shutdown
    pub async fn run(self) -> std::io::Result<()> {
        if let Err(e) = self.state.coordinator.start(self.config.vectors_path.clone()) {
            warn!(error = %e, "Vector load already started");
        }

        let addr = self.config.addr();
        let listener = TcpListener::bind(&addr).await?;
        info!("wordvec server listening on {}", addr);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Shutting down. {}", self.state.metrics.summary());
        Ok(())
    }

    /// Router over this server's state (for testing)
    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    pub fn coordinator(&self) -> &Arc<LoadingCoordinator> {
        &self.state.coordinator
    }

    /// Get metrics reference
    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.state.metrics
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
