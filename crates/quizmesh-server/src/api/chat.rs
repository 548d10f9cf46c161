//! Chat API
//!
//! POST /api/chat - `{ messages: [{ role, content }] }` → `{ content, model }`

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::Deserialize;

use quizmesh_core::error::ServerError;
use quizmesh_core::llm::LlmMessage;
use quizmesh_core::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(chat_completion))
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    messages: Vec<LlmMessage>,
}

async fn chat_completion(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let Json(body) = body?;
    if body.messages.is_empty() {
        return Err(ServerError::BadRequest("messages must not be empty".into()));
    }

    let response = state.llm.complete(&body.messages).await?;
    Ok(Json(serde_json::json!({
        "content": response.content,
        "model": response.model,
    })))
}
