//! Integration tests for the quizmesh-cli commands.
//!
//! These tests exercise the same code paths as the binary, using an
//! in-memory `AppState` whose agents are unreachable local ports.

use std::sync::Arc;

use quizmesh_cli::commands;
use quizmesh_core::actions::ActionRouter;
use quizmesh_core::config::{AgentEndpoint, OrchestratorConfig, ROLE_MANUAL, ROLE_QUIZ};
use quizmesh_core::state::{AppState, AppStateInner};

/// Create an AppState whose agents refuse connections.
fn test_state() -> AppState {
    let mut config = OrchestratorConfig {
        agents: vec![
            AgentEndpoint::new("http://127.0.0.1:1", Some(ROLE_QUIZ)),
            AgentEndpoint::new("http://127.0.0.1:2", Some(ROLE_MANUAL)),
        ],
        probe_timeout_ms: 500,
        request_timeout_ms: 1_000,
        retry_base_delay_ms: 1,
        ..OrchestratorConfig::default()
    };
    config.llm.api_key = None;
    Arc::new(AppStateInner::new(config))
}

async fn run_action(state: &AppState, name: &str, params: &str) -> serde_json::Value {
    let request = commands::action::build_request(name, params).expect("valid request");
    ActionRouter::new(state.clone())
        .handle_value(request)
        .await
        .expect("action should succeed")
}

#[tokio::test]
async fn test_agents_start_unknown() {
    let state = test_state();
    let result = run_action(&state, "get_agents", "{}").await;

    let agents = result["agents"].as_array().expect("Expected agents array");
    assert_eq!(agents.len(), 2);
    assert!(agents.iter().all(|a| a["status"] == "unknown"));
}

#[tokio::test]
async fn test_discover_marks_unreachable_agents_offline() {
    let state = test_state();
    let result = run_action(&state, "discover_agents", "{}").await;
    assert_eq!(result["success"], true);
    assert_eq!(result["online"], 0);
    assert_eq!(result["offline"], 2);

    // The discovery pass is recorded in the event log.
    let history = run_action(&state, "get_chat_history", "{}").await;
    assert_eq!(history["count"], 1);
}

#[tokio::test]
async fn test_quiz_action_falls_back_when_agents_are_down() {
    let state = test_state();
    let result = run_action(
        &state,
        "orchestrate_quiz_workflow",
        r#"{"topic":"Volcanoes","questionCount":3,"difficulty":"hard"}"#,
    )
    .await;

    assert_eq!(result["success"], true);
    assert_eq!(result["source"], "fallback");
    assert_eq!(result["quiz"]["difficulty"], "hard");
    assert_eq!(result["quiz"]["questions"].as_array().unwrap().len(), 3);

    let workflows = run_action(&state, "get_workflows", "{}").await;
    assert_eq!(workflows["workflows"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_quiz_and_manual_commands_complete() {
    let state = test_state();
    commands::workflow::quiz(&state, "Volcanoes", 2, "easy")
        .await
        .expect("quiz command");
    commands::workflow::manual(&state, "Volcanoes")
        .await
        .expect("manual command");
    assert_eq!(state.workflows.list().len(), 2);

    let err = commands::workflow::quiz(&state, "Volcanoes", 2, "extreme")
        .await
        .unwrap_err();
    assert!(err.contains("Invalid difficulty"));
}

#[tokio::test]
async fn test_health_command_reports_unhealthy() {
    let state = test_state();
    commands::health::run(&state).await.expect("health command");

    let report = run_action(&state, "monitor_system_health", "{}").await;
    assert_eq!(report["status"], "unhealthy");
    assert_eq!(report["totalAgents"], 2);
}

#[tokio::test]
async fn test_unknown_action_is_rejected() {
    let state = test_state();
    let err = commands::action::call(&state, "unknown_action", "{}")
        .await
        .unwrap_err();
    assert!(err.contains("Unknown action"));
}
