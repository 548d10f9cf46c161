//! Orchestrator actions — the typed request surface of the orchestrator.
//!
//! Requests arrive as a flat JSON object `{ "action": "...", ...data }`.
//! `ActionRouter` validates the body into an [`OrchestratorAction`] before
//! anything runs, so handlers only ever see well-typed payloads. It has no
//! HTTP dependency and is used from:
//!
//! - The axum handlers in `quizmesh-server`
//! - The `quizmesh action` CLI command
//!
//! # Supported Actions
//!
//! | Action                          | Description                                |
//! |---------------------------------|--------------------------------------------|
//! | `discover_agents`               | Probe every known agent once               |
//! | `orchestrate_quiz_workflow`     | Run the manual → quiz workflow             |
//! | `orchestrate_manual_workflow`   | Run the outline → manual workflow          |
//! | `monitor_system_health`         | Probe agent health, report breakers        |
//! | `get_chat_history`              | Full orchestration event log               |
//! | `get_workflow_chat_history`     | Event log entries of one workflow          |
//! | `clear_chat_history`            | Empty the event log                        |
//! | `get_workflows`                 | All workflows, newest first                |
//! | `get_workflow`                  | One workflow by id                         |
//! | `get_agents`                    | All registered agents                      |
//! | `get_agent`                     | One agent with its breaker state           |
//! | `determine_agent_for_query`     | Rank agents for a free-form query          |
//! | `execute_agent_with_resilience` | Call one agent skill with retries          |
//! | `handle_general_mcp_query`      | Answer a free-form chat query              |

pub mod agents;
pub mod chat;
pub mod health;
pub mod resilience;
pub mod workflows;

use serde::Deserialize;

use crate::error::ServerError;
use crate::models::{ManualRequest, QuizRequest};
use crate::state::AppState;

pub use agents::AgentIdParams;
pub use chat::{QueryParams, WorkflowIdParams};
pub use resilience::ResilienceParams;

/// Every action name accepted by [`ActionRouter::handle_value`].
pub const ACTIONS: &[&str] = &[
    "discover_agents",
    "orchestrate_quiz_workflow",
    "orchestrate_manual_workflow",
    "monitor_system_health",
    "get_chat_history",
    "get_workflow_chat_history",
    "clear_chat_history",
    "get_workflows",
    "get_workflow",
    "get_agents",
    "get_agent",
    "determine_agent_for_query",
    "execute_agent_with_resilience",
    "handle_general_mcp_query",
];

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum OrchestratorAction {
    DiscoverAgents,
    OrchestrateQuizWorkflow(QuizRequest),
    OrchestrateManualWorkflow(ManualRequest),
    MonitorSystemHealth,
    GetChatHistory,
    GetWorkflowChatHistory(WorkflowIdParams),
    ClearChatHistory,
    GetWorkflows,
    GetWorkflow(WorkflowIdParams),
    GetAgents,
    GetAgent(AgentIdParams),
    DetermineAgentForQuery(QueryParams),
    ExecuteAgentWithResilience(ResilienceParams),
    HandleGeneralMcpQuery(QueryParams),
}

impl OrchestratorAction {
    /// Validate a raw request body.
    ///
    /// A missing or unrecognized `action` is reported as `Unknown action`;
    /// a known action with a bad payload as `Invalid parameters for <action>`.
    /// Fields may also be nested under a `data` object.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ServerError> {
        let serde_json::Value::Object(mut body) = value else {
            return Err(ServerError::BadRequest(
                "Unknown action: request body must be a JSON object".to_string(),
            ));
        };

        let name = match body.get("action") {
            Some(serde_json::Value::String(name)) => name.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };
        if !ACTIONS.contains(&name.as_str()) {
            return Err(ServerError::BadRequest(format!("Unknown action: {}", name)));
        }

        if let Some(serde_json::Value::Object(data)) = body.remove("data") {
            for (key, value) in data {
                body.entry(key).or_insert(value);
            }
        }

        serde_json::from_value(serde_json::Value::Object(body)).map_err(|e| {
            ServerError::BadRequest(format!("Invalid parameters for {}: {}", name, e))
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::DiscoverAgents => "discover_agents",
            Self::OrchestrateQuizWorkflow(_) => "orchestrate_quiz_workflow",
            Self::OrchestrateManualWorkflow(_) => "orchestrate_manual_workflow",
            Self::MonitorSystemHealth => "monitor_system_health",
            Self::GetChatHistory => "get_chat_history",
            Self::GetWorkflowChatHistory(_) => "get_workflow_chat_history",
            Self::ClearChatHistory => "clear_chat_history",
            Self::GetWorkflows => "get_workflows",
            Self::GetWorkflow(_) => "get_workflow",
            Self::GetAgents => "get_agents",
            Self::GetAgent(_) => "get_agent",
            Self::DetermineAgentForQuery(_) => "determine_agent_for_query",
            Self::ExecuteAgentWithResilience(_) => "execute_agent_with_resilience",
            Self::HandleGeneralMcpQuery(_) => "handle_general_mcp_query",
        }
    }
}

/// Transport-agnostic action dispatcher.
///
/// ```ignore
/// let router = ActionRouter::new(app_state);
/// let result = router
///     .handle_value(serde_json::json!({ "action": "get_agents" }))
///     .await?;
/// ```
#[derive(Clone)]
pub struct ActionRouter {
    state: AppState,
}

impl ActionRouter {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Validate and dispatch a raw `{ action, ...data }` body.
    pub async fn handle_value(
        &self,
        value: serde_json::Value,
    ) -> Result<serde_json::Value, ServerError> {
        let action = OrchestratorAction::from_value(value)?;
        self.dispatch(action).await
    }

    pub async fn dispatch(
        &self,
        action: OrchestratorAction,
    ) -> Result<serde_json::Value, ServerError> {
        tracing::debug!("[Actions] Dispatching {}", action.name());
        let state = &self.state;
        match action {
            // ----- Agents -----
            OrchestratorAction::DiscoverAgents => to_json(agents::discover(state).await),
            OrchestratorAction::GetAgents => to_json(agents::list(state)),
            OrchestratorAction::GetAgent(p) => to_json(agents::get(state, p)?),
            OrchestratorAction::DetermineAgentForQuery(p) => {
                to_json(agents::determine_for_query(state, p)?)
            }

            // ----- Workflows -----
            OrchestratorAction::OrchestrateQuizWorkflow(p) => {
                to_json(workflows::orchestrate_quiz(state, p).await?)
            }
            OrchestratorAction::OrchestrateManualWorkflow(p) => {
                to_json(workflows::orchestrate_manual(state, p).await?)
            }
            OrchestratorAction::GetWorkflows => to_json(workflows::list(state)),
            OrchestratorAction::GetWorkflow(p) => to_json(workflows::get(state, p)?),

            // ----- Chat log -----
            OrchestratorAction::GetChatHistory => to_json(chat::history(state)),
            OrchestratorAction::GetWorkflowChatHistory(p) => {
                to_json(chat::workflow_history(state, p))
            }
            OrchestratorAction::ClearChatHistory => to_json(chat::clear(state)),
            OrchestratorAction::HandleGeneralMcpQuery(p) => {
                to_json(chat::general_query(state, p).await?)
            }

            // ----- Health & resilience -----
            OrchestratorAction::MonitorSystemHealth => to_json(health::monitor(state).await),
            OrchestratorAction::ExecuteAgentWithResilience(p) => {
                to_json(resilience::execute(state, p).await?)
            }
        }
    }

    /// Handle the read-only `GET ?action=` variants. `None` means `status`.
    pub async fn handle_query(
        &self,
        action: Option<&str>,
    ) -> Result<serde_json::Value, ServerError> {
        let state = &self.state;
        match action.unwrap_or("status") {
            "health" => to_json(health::monitor(state).await),
            "status" => to_json(health::status(state)),
            "chat_history" => to_json(chat::history(state)),
            "workflows" => to_json(workflows::list(state)),
            "agents" => to_json(agents::list(state)),
            other => Err(ServerError::BadRequest(format!("Unknown action: {}", other))),
        }
    }
}

fn to_json<T: serde::Serialize>(value: T) -> Result<serde_json::Value, ServerError> {
    serde_json::to_value(value)
        .map_err(|e| ServerError::Internal(format!("Failed to serialize response: {}", e)))
}
