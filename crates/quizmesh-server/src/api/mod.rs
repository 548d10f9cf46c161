pub mod chat;
pub mod orchestrator;

use axum::Router;

use quizmesh_core::state::AppState;

/// Build the complete API router with all sub-routes.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/api/orchestrator", orchestrator::router())
        .nest("/api/chat", chat::router())
}
