//! QuizMesh Core — Transport-agnostic orchestration logic for quiz generation.
//!
//! This crate contains the agent registry, per-agent circuit breakers, the
//! workflow engine, the orchestration event log and the clients used to talk
//! to sibling agents and the LLM provider. It has **no HTTP framework
//! dependency** by default, making it suitable for use in:
//!
//! - HTTP servers (via `quizmesh-server`)
//! - CLI tools (via `quizmesh-cli`)
//!
//! # Feature Flags
//!
//! - `axum` — Enables `IntoResponse` impl on `ServerError` for use in axum handlers.

pub mod a2a;
pub mod actions;
pub mod breaker;
pub mod chat_log;
pub mod config;
pub mod error;
pub mod fallback;
pub mod llm;
pub mod models;
pub mod registry;
pub mod state;
pub mod workflow;

// Convenience re-exports
pub use actions::{ActionRouter, OrchestratorAction};
pub use config::OrchestratorConfig;
pub use error::ServerError;
pub use state::{AppState, AppStateInner};
