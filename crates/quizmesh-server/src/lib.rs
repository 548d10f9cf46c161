//! QuizMesh Server - Quiz Orchestration Backend
//!
//! A thin axum adapter over `quizmesh-core`, providing:
//! - The orchestrator action endpoint (`POST/GET /api/orchestrator`)
//! - A live event stream of the orchestration log (SSE)
//! - An LLM chat completion proxy (`POST /api/chat`)
//! - The background agent discovery loop
//!
//! This crate can be used standalone or embedded (e.g. by the `quizmesh` CLI).

pub mod api;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use quizmesh_core::state::{AppState, AppStateInner};
use quizmesh_core::OrchestratorConfig;

/// Configuration for the QuizMesh backend server.
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub orchestrator: OrchestratorConfig,
    /// Run agent discovery at startup and on the configured interval.
    pub discovery: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3210,
            orchestrator: OrchestratorConfig::default(),
            discovery: true,
        }
    }
}

/// Create a shared `AppState` from an orchestrator configuration.
///
/// This is useful when you need to share the state between the HTTP server
/// and other consumers (e.g. CLI commands using the action router).
pub fn create_app_state(config: OrchestratorConfig) -> AppState {
    Arc::new(AppStateInner::new(config))
}

/// Install the global tracing subscriber. Safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "quizmesh_server=info,quizmesh_core=info,tower_http=info".into()
            }),
        )
        .try_init();
}

/// Start the QuizMesh backend server.
///
/// Returns the actual address the server is listening on.
pub async fn start_server(config: ServerConfig) -> Result<SocketAddr, String> {
    init_tracing();

    tracing::info!(
        "Starting QuizMesh server on {}:{} ({} known agents)",
        config.host,
        config.port,
        config.orchestrator.agents.len()
    );

    let state = create_app_state(config.orchestrator.clone());
    if config.discovery {
        spawn_discovery_loop(state.clone());
    }

    start_server_with_state(config, state).await
}

/// Start the HTTP server with a pre-built `AppState`.
///
/// The discovery loop is not started here; callers that share the state
/// decide whether to run it.
pub async fn start_server_with_state(
    config: ServerConfig,
    state: AppState,
) -> Result<SocketAddr, String> {
    let app = app(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| format!("Invalid address: {}", e))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;

    let local_addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to get local address: {}", e))?;

    tracing::info!("QuizMesh server listening on {}", local_addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok(local_addr)
}

/// The complete application router with CORS and request tracing.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api::api_router())
        .route("/api/health", axum::routing::get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run discovery once now and then every `discovery_interval`.
pub fn spawn_discovery_loop(state: AppState) -> JoinHandle<()> {
    let interval = state.config.discovery_interval();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let report = state.registry.discover().await;
            tracing::debug!(
                "[Discovery] Pass complete: {} online, {} offline",
                report.online,
                report.offline
            );
        }
    })
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "server": "quizmesh-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
