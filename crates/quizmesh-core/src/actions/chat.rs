//! Chat log actions and free-form queries.
//!
//! - `get_chat_history`          — the whole event log
//! - `get_workflow_chat_history` — entries tagged with one workflow id
//! - `clear_chat_history`        — empty the log
//! - `handle_general_mcp_query`  — answer a user query, routed to the best agent

use serde::{Deserialize, Serialize};

use crate::error::ServerError;
use crate::llm::LlmMessage;
use crate::models::{ChatMessage, ChatMessageType, ChatMetadata};
use crate::registry::{select_agent, AgentSelection};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowIdParams {
    #[serde(alias = "workflow_id")]
    pub workflow_id: String,
}

#[derive(Debug, Deserialize)]
pub struct QueryParams {
    pub query: String,
}

impl QueryParams {
    pub fn validated(&self) -> Result<&str, ServerError> {
        let query = self.query.trim();
        if query.is_empty() {
            return Err(ServerError::BadRequest("query must not be empty".to_string()));
        }
        Ok(query)
    }
}

// ---------------------------------------------------------------------------
// get_chat_history / get_workflow_chat_history / clear_chat_history
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub count: usize,
}

pub fn history(state: &AppState) -> HistoryResult {
    let messages = state.chat_log.get_all();
    HistoryResult {
        workflow_id: None,
        count: messages.len(),
        messages,
    }
}

pub fn workflow_history(state: &AppState, params: WorkflowIdParams) -> HistoryResult {
    let messages = state.chat_log.get_by_workflow(&params.workflow_id);
    HistoryResult {
        workflow_id: Some(params.workflow_id),
        count: messages.len(),
        messages,
    }
}

#[derive(Debug, Serialize)]
pub struct ClearResult {
    pub success: bool,
}

pub fn clear(state: &AppState) -> ClearResult {
    state.chat_log.clear();
    tracing::info!("[Actions] Chat history cleared");
    ClearResult { success: true }
}

// ---------------------------------------------------------------------------
// handle_general_mcp_query
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralQueryResult {
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// True when `response` is a canned reply rather than an LLM answer.
    pub fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub selection: AgentSelection,
}

pub async fn general_query(
    state: &AppState,
    params: QueryParams,
) -> Result<GeneralQueryResult, ServerError> {
    let query = params.validated()?;
    state
        .chat_log
        .append(ChatMessageType::User, query, None);

    let selection = select_agent(query, &state.registry.get_all(), &state.breakers);
    let agent_id = selection.selected.as_ref().map(|s| s.agent_id.clone());

    let (response, model, fallback, error) = if state.llm.is_configured() {
        let messages = [
            LlmMessage::system(system_prompt(&selection)),
            LlmMessage::user(query),
        ];
        match state.llm.complete(&messages).await {
            Ok(reply) => (reply.content, Some(reply.model), false, None),
            Err(e) => {
                tracing::warn!("[Actions] LLM query failed, using canned reply: {}", e);
                (canned_reply(&selection), None, true, Some(e.to_string()))
            }
        }
    } else {
        (canned_reply(&selection), None, true, None)
    };

    let metadata = agent_id
        .as_deref()
        .map(|id| ChatMetadata::default().with_agent(id));
    state
        .chat_log
        .append(ChatMessageType::Orchestrator, response.clone(), metadata);

    Ok(GeneralQueryResult {
        response,
        agent_id,
        model,
        fallback,
        error,
        selection,
    })
}

fn system_prompt(selection: &AgentSelection) -> String {
    let mut prompt = String::from(
        "You are the orchestrator of a study assistant that generates multiple-choice \
         quizzes and study manuals. Answer the user's question briefly and, when it fits, \
         suggest generating a quiz or manual on their topic.",
    );
    if let Some(agent) = &selection.selected {
        prompt.push_str(&format!(
            "\nThe request will be handled by the agent \"{}\" ({}).",
            agent.name, agent.reason
        ));
    }
    prompt
}

fn canned_reply(selection: &AgentSelection) -> String {
    match &selection.selected {
        Some(agent) => format!(
            "I can route this to {}, which handles {}. Ask me to generate a quiz or a manual \
             on your topic to get started.",
            agent.name,
            agent.matched_capabilities.join(", ")
        ),
        None => "I could not find an agent for that request. Try asking for a quiz or a \
                 study manual on a specific topic."
            .to_string(),
    }
}
