//! Shared orchestrator state, constructed once and passed to every handler.

use std::sync::Arc;

use crate::a2a::{A2aClient, PollSettings};
use crate::breaker::CircuitBreakers;
use crate::chat_log::ChatLog;
use crate::config::OrchestratorConfig;
use crate::llm::LlmClient;
use crate::registry::AgentRegistry;
use crate::workflow::WorkflowStore;

/// Shared state accessible by all API handlers and CLI commands.
pub struct AppStateInner {
    pub config: OrchestratorConfig,
    pub registry: AgentRegistry,
    pub breakers: CircuitBreakers,
    pub workflows: WorkflowStore,
    pub chat_log: ChatLog,
    pub a2a: A2aClient,
    pub llm: LlmClient,
}

pub type AppState = Arc<AppStateInner>;

impl AppStateInner {
    pub fn new(config: OrchestratorConfig) -> Self {
        let a2a = A2aClient::new(
            config.request_timeout(),
            PollSettings {
                interval: config.poll_interval(),
                max_polls: config.max_polls,
            },
        );
        Self {
            registry: AgentRegistry::new(config.agent_urls(), a2a.clone(), config.probe_timeout()),
            breakers: CircuitBreakers::new(config.breaker.clone()),
            workflows: WorkflowStore::new(),
            chat_log: ChatLog::new(config.chat_log_capacity),
            llm: LlmClient::new(config.llm.clone()),
            a2a,
            config,
        }
    }
}
