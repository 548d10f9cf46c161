//! System health and status.
//!
//! `monitor_system_health` actively probes every agent's health endpoint;
//! `status` only reports what is already in memory.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinSet;

use crate::breaker::{BreakerSnapshot, CircuitState};
use crate::models::AgentStatus;
use crate::state::AppState;
use crate::workflow::store::WorkflowCounts;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OverallHealth {
    Healthy,
    Degraded,
    Unhealthy,
}

impl OverallHealth {
    /// All healthy, some healthy, or none. No agents at all is unhealthy.
    pub fn from_counts(healthy: usize, total: usize) -> Self {
        if total == 0 || healthy == 0 {
            Self::Unhealthy
        } else if healthy == total {
            Self::Healthy
        } else {
            Self::Degraded
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentHealth {
    pub agent_id: String,
    pub name: String,
    pub registry_status: AgentStatus,
    pub reachable: bool,
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub circuit: BreakerSnapshot,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: OverallHealth,
    pub timestamp: DateTime<Utc>,
    pub healthy_agents: usize,
    pub total_agents: usize,
    pub agents: Vec<AgentHealth>,
    pub workflows: WorkflowCounts,
    pub chat_log_size: usize,
}

/// Probe `GET {agent}/health` on every known agent concurrently.
///
/// An agent is healthy when the probe succeeds and its breaker is not open.
pub async fn monitor(state: &AppState) -> HealthReport {
    let mut probes = JoinSet::new();
    for url in state.registry.known_urls() {
        let client = state.a2a.clone();
        let url = url.clone();
        let timeout = state.config.probe_timeout();
        probes.spawn(async move {
            let result = client.check_health(&url, timeout).await;
            (url, result.map_err(|e| e.to_string()))
        });
    }

    let mut probe_results = std::collections::HashMap::new();
    while let Some(joined) = probes.join_next().await {
        match joined {
            Ok((url, result)) => {
                probe_results.insert(url, result);
            }
            Err(e) => tracing::error!("[Actions] Health probe task panicked: {}", e),
        }
    }

    let agents: Vec<AgentHealth> = state
        .registry
        .get_all()
        .into_iter()
        .map(|agent| {
            let probe = probe_results
                .remove(&agent.id)
                .unwrap_or_else(|| Err("probe did not complete".to_string()));
            let circuit = state.breakers.snapshot_of(&agent.id);
            let reachable = probe.is_ok();
            AgentHealth {
                healthy: reachable && circuit.state != CircuitState::Open,
                agent_id: agent.id,
                name: agent.name,
                registry_status: agent.status,
                reachable,
                error: probe.err(),
                circuit,
            }
        })
        .collect();

    let healthy_agents = agents.iter().filter(|a| a.healthy).count();
    let status = OverallHealth::from_counts(healthy_agents, agents.len());
    tracing::info!(
        "[Actions] System health: {:?} ({}/{} agents healthy)",
        status,
        healthy_agents,
        agents.len()
    );

    HealthReport {
        status,
        timestamp: Utc::now(),
        healthy_agents,
        total_agents: agents.len(),
        agents,
        workflows: state.workflows.counts(),
        chat_log_size: state.chat_log.len(),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub agents_online: usize,
    pub agents_total: usize,
    pub breakers: Vec<BreakerSnapshot>,
    pub workflows: WorkflowCounts,
    pub chat_log_size: usize,
    pub fallback_enabled: bool,
}

/// In-memory status without probing anything.
pub fn status(state: &AppState) -> StatusReport {
    let agents = state.registry.get_all();
    StatusReport {
        status: "ok",
        timestamp: Utc::now(),
        agents_online: agents
            .iter()
            .filter(|a| a.status == AgentStatus::Online)
            .count(),
        agents_total: agents.len(),
        breakers: state.breakers.snapshot(),
        workflows: state.workflows.counts(),
        chat_log_size: state.chat_log.len(),
        fallback_enabled: state.config.fallback_enabled,
    }
}
