//! Core error type for the QuizMesh orchestrator.
//!
//! `ServerError` is used throughout the core domain (registry, workflows,
//! action router). When the `axum` feature is enabled, it also implements
//! `IntoResponse` so it can be used directly as an axum handler error type.

use crate::a2a::AgentCallError;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AgentCallError> for ServerError {
    fn from(err: AgentCallError) -> Self {
        ServerError::Upstream(err.to_string())
    }
}

impl From<serde_yaml::Error> for ServerError {
    fn from(err: serde_yaml::Error) -> Self {
        ServerError::BadRequest(format!("Invalid configuration: {}", err))
    }
}

// ---------------------------------------------------------------------------
// axum integration (opt-in via feature flag)
// ---------------------------------------------------------------------------

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let status = match &self {
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

/// Malformed bodies and a missing `Content-Type` become 400 `{ error }`
/// instead of axum's plain-text rejections.
#[cfg(feature = "axum")]
impl From<axum::extract::rejection::JsonRejection> for ServerError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        ServerError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}
