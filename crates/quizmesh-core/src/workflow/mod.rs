//! Workflow engine — hand-authored, strictly sequential multi-agent flows.
//!
//! # Architecture
//!
//! ```text
//! QuizRequest ──► templates::quiz_workflow ──► Workflow ──► WorkflowEngine
//!                                                              │
//!                                        CircuitBreakers ◄─────┤
//!                                                              │
//!                                                         A2aClient (HTTP)
//!                                                              │
//!                                                 quiz agent / manual agent
//!                                                              │ (on failure)
//!                                                        fallback content
//! ```

pub mod engine;
pub mod store;
pub mod templates;

pub use engine::WorkflowEngine;
pub use store::WorkflowStore;
pub use templates::{manual_workflow, quiz_workflow};
