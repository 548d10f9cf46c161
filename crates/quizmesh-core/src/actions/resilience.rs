//! `execute_agent_with_resilience` — one agent skill call with breaker
//! gating, rerouting and exponential-backoff retries.

use serde::{Deserialize, Serialize};

use crate::a2a::AgentCallError;
use crate::error::ServerError;
use crate::models::{normalize_agent_url, AgentStatus, ChatMessageType, ChatMetadata};
use crate::state::AppState;

const DEFAULT_MAX_RETRIES: u32 = 2;
const MAX_RETRIES_LIMIT: u32 = 5;
const DEFAULT_ARTIFACT: &str = "result.json";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResilienceParams {
    #[serde(alias = "agent_id")]
    pub agent_id: String,
    pub skill: String,
    #[serde(default)]
    pub input: serde_json::Value,
    /// Artifact to extract from the finished task; the first one if absent.
    #[serde(default)]
    pub artifact: Option<String>,
    #[serde(default = "default_max_retries", alias = "max_retries")]
    pub max_retries: u32,
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResilienceResult {
    pub success: bool,
    pub agent_id: String,
    /// Set when the call was rerouted away from an agent with an open breaker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rerouted_from: Option<String>,
    pub attempts: u32,
    pub result: serde_json::Value,
}

pub async fn execute(
    state: &AppState,
    params: ResilienceParams,
) -> Result<ResilienceResult, ServerError> {
    if params.skill.trim().is_empty() {
        return Err(ServerError::BadRequest("skill must not be empty".to_string()));
    }
    let requested = normalize_agent_url(&params.agent_id);
    let (agent_id, rerouted_from) = choose_agent(state, &requested, &params.skill)?;
    let artifact = params.artifact.as_deref().unwrap_or(DEFAULT_ARTIFACT);
    let max_retries = params.max_retries.min(MAX_RETRIES_LIMIT);
    let base_delay = state.config.retry_base_delay();

    let mut attempts = 0;
    let mut last_error: Option<AgentCallError> = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let delay = base_delay.saturating_mul(1 << (attempt - 1));
            tracing::info!(
                "[Actions] Retrying {} on {} in {:?} (attempt {})",
                params.skill,
                agent_id,
                delay,
                attempt + 1
            );
            tokio::time::sleep(delay).await;
            if !state.breakers.is_available(&agent_id) {
                last_error = Some(AgentCallError::CircuitOpen {
                    agent_id: agent_id.clone(),
                });
                break;
            }
        }

        attempts += 1;
        match state
            .a2a
            .send_task(&agent_id, &params.skill, &params.input, artifact)
            .await
        {
            Ok(result) => {
                state.breakers.record_success(&agent_id);
                return Ok(ResilienceResult {
                    success: true,
                    agent_id,
                    rerouted_from,
                    attempts,
                    result,
                });
            }
            Err(err) => {
                tracing::warn!(
                    "[Actions] Attempt {} of {} on {} failed: {}",
                    attempts,
                    params.skill,
                    agent_id,
                    err
                );
                state.breakers.record_failure(&agent_id);
                last_error = Some(err);
            }
        }
    }

    let message = match last_error {
        Some(err) => format!(
            "Agent {} failed after {} attempts: {}",
            agent_id, attempts, err
        ),
        None => format!("Agent {} failed after {} attempts", agent_id, attempts),
    };
    state.chat_log.append(
        ChatMessageType::System,
        message.clone(),
        Some(ChatMetadata::default().with_agent(&agent_id).with_status("failed")),
    );
    Err(ServerError::Upstream(message))
}

/// The requested agent if its breaker allows a call, otherwise an online
/// agent with the same capability whose breaker does.
fn choose_agent(
    state: &AppState,
    requested: &str,
    skill: &str,
) -> Result<(String, Option<String>), ServerError> {
    if state.breakers.is_available(requested) {
        return Ok((requested.to_string(), None));
    }

    let alternative = state
        .registry
        .get_by_capability(skill)
        .into_iter()
        .find(|a| {
            a.id != requested
                && a.status == AgentStatus::Online
                && state.breakers.is_available(&a.id)
        });

    match alternative {
        Some(agent) => {
            tracing::info!(
                "[Actions] Circuit open for {}; rerouting {} to {}",
                requested,
                skill,
                agent.id
            );
            Ok((agent.id, Some(requested.to_string())))
        }
        None => Err(AgentCallError::CircuitOpen {
            agent_id: requested.to_string(),
        }
        .into()),
    }
}
