//! CLI command implementations.
//!
//! Each submodule corresponds to a top-level CLI command and reuses
//! the quizmesh-core orchestration logic through `AppState`.

pub mod action;
pub mod discover;
pub mod health;
pub mod server;
pub mod workflow;

use std::path::Path;
use std::sync::Arc;

use quizmesh_core::state::{AppState, AppStateInner};
use quizmesh_core::OrchestratorConfig;

/// Resolve the orchestrator configuration: defaults, the optional YAML file,
/// then `QUIZMESH_*` environment overrides.
pub fn load_config(path: Option<&str>) -> Result<OrchestratorConfig, String> {
    OrchestratorConfig::load(path.map(Path::new)).map_err(|e| e.to_string())
}

/// Initialize a shared `AppState` for one-shot commands.
///
/// This mirrors `quizmesh_server::create_app_state` without starting the
/// HTTP server or the discovery loop.
pub fn init_state(config_path: Option<&str>) -> AppState {
    let config = load_config(config_path).unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::process::exit(1);
    });
    tracing::debug!(
        "[Cli] Loaded configuration with {} agents (fallback {})",
        config.agents.len(),
        if config.fallback_enabled { "on" } else { "off" }
    );
    Arc::new(AppStateInner::new(config))
}

/// Pretty-print a JSON value to stdout.
pub fn print_json(value: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    );
}
