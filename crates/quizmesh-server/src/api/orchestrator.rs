//! Orchestrator API
//!
//! POST /api/orchestrator         - `{ action, ...data }` action dispatch
//! GET  /api/orchestrator?action= - read-only variants (health, status,
//!                                  chat_history, workflows, agents)
//! GET  /api/orchestrator/events  - SSE stream of orchestration log entries

use std::convert::Infallible;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;

use quizmesh_core::actions::ActionRouter;
use quizmesh_core::error::ServerError;
use quizmesh_core::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(query_action).post(post_action))
        .route("/events", get(events))
}

async fn post_action(
    State(state): State<AppState>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let result = match body {
        Ok(Json(body)) => ActionRouter::new(state).handle_value(body).await,
        Err(rejection) => Err(rejection.into()),
    };
    if let Err(ServerError::BadRequest(message)) = &result {
        tracing::warn!("[Orchestrator API] Rejected request: {}", message);
    }
    Ok(Json(result?))
}

#[derive(Debug, Deserialize)]
struct ActionQuery {
    action: Option<String>,
}

async fn query_action(
    State(state): State<AppState>,
    Query(query): Query<ActionQuery>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let result = ActionRouter::new(state)
        .handle_query(query.action.as_deref())
        .await?;
    Ok(Json(result))
}

async fn events(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(state.chat_log.subscribe()).filter_map(|message| {
        match message {
            Ok(message) => Event::default()
                .event("chat")
                .id(message.id.clone())
                .json_data(&message)
                .ok()
                .map(Ok::<Event, Infallible>),
            // Slow subscribers skip what they missed; the log keeps it.
            Err(_) => None,
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
