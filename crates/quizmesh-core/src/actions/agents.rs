//! Agent actions.
//!
//! - `discover_agents`           — one discovery pass over the known URLs
//! - `get_agents`                — all registered agents
//! - `get_agent`                 — one agent with its breaker state
//! - `determine_agent_for_query` — weighted agent ranking for a query

use serde::{Deserialize, Serialize};

use crate::breaker::BreakerSnapshot;
use crate::error::ServerError;
use crate::models::{Agent, ChatMessageType};
use crate::registry::{select_agent, AgentSelection, DiscoveryReport};
use crate::state::AppState;

use super::chat::QueryParams;

// ---------------------------------------------------------------------------
// discover_agents
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct DiscoverResult {
    pub success: bool,
    #[serde(flatten)]
    pub report: DiscoveryReport,
}

pub async fn discover(state: &AppState) -> DiscoverResult {
    let report = state.registry.discover().await;
    state.chat_log.append(
        ChatMessageType::System,
        format!(
            "Agent discovery finished: {} online, {} offline",
            report.online, report.offline
        ),
        None,
    );
    DiscoverResult {
        success: true,
        report,
    }
}

// ---------------------------------------------------------------------------
// get_agents
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ListResult {
    pub agents: Vec<Agent>,
}

pub fn list(state: &AppState) -> ListResult {
    ListResult {
        agents: state.registry.get_all(),
    }
}

// ---------------------------------------------------------------------------
// get_agent
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentIdParams {
    #[serde(alias = "agent_id")]
    pub agent_id: String,
}

#[derive(Debug, Serialize)]
pub struct GetResult {
    pub agent: Agent,
    pub circuit: BreakerSnapshot,
}

pub fn get(state: &AppState, params: AgentIdParams) -> Result<GetResult, ServerError> {
    let agent = state
        .registry
        .get(&params.agent_id)
        .ok_or_else(|| ServerError::NotFound(format!("Agent {} not found", params.agent_id)))?;
    let circuit = state.breakers.snapshot_of(&agent.id);
    Ok(GetResult { agent, circuit })
}

// ---------------------------------------------------------------------------
// determine_agent_for_query
// ---------------------------------------------------------------------------

pub fn determine_for_query(
    state: &AppState,
    params: QueryParams,
) -> Result<AgentSelection, ServerError> {
    let query = params.validated()?;
    Ok(select_agent(query, &state.registry.get_all(), &state.breakers))
}
