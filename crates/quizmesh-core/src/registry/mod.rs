//! Agent Registry — best-effort liveness and capability info for a fixed set
//! of well-known agent URLs.
//!
//! Discovery probes every known URL concurrently. A successful probe upserts
//! the agent as `online` with fresh card metadata; a failed or timed-out
//! probe marks it `offline`. Probe errors never reach the caller, only the
//! resulting status does. Reads are served from memory and may be stale
//! relative to an in-flight discovery pass.

pub mod selection;

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::task::JoinSet;

use crate::a2a::A2aClient;
use crate::models::{normalize_agent_url, Agent, AgentCard, AgentStatus};

pub use selection::{select_agent, AgentSelection, ScoredAgent};

/// Outcome of one discovery pass.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryReport {
    pub online: usize,
    pub offline: usize,
    pub agents: Vec<Agent>,
}

/// In-flight calls against one agent and the status it returns to once the
/// last of them finishes.
#[derive(Debug, Clone, Copy)]
struct BusyHold {
    count: usize,
    resting: AgentStatus,
}

struct Entries {
    agents: HashMap<String, Agent>,
    holds: HashMap<String, BusyHold>,
}

pub struct AgentRegistry {
    known_urls: Vec<String>,
    entries: RwLock<Entries>,
    client: A2aClient,
    probe_timeout: Duration,
}

impl AgentRegistry {
    pub fn new(known_urls: Vec<String>, client: A2aClient, probe_timeout: Duration) -> Self {
        let mut normalized: Vec<String> = Vec::with_capacity(known_urls.len());
        for url in known_urls.iter().map(|u| normalize_agent_url(u)) {
            if !normalized.contains(&url) {
                normalized.push(url);
            }
        }
        let known_urls = normalized;
        let agents = known_urls
            .iter()
            .map(|url| (url.clone(), Agent::unknown(url)))
            .collect();
        Self {
            known_urls,
            entries: RwLock::new(Entries {
                agents,
                holds: HashMap::new(),
            }),
            client,
            probe_timeout,
        }
    }

    pub fn known_urls(&self) -> &[String] {
        &self.known_urls
    }

    /// Probe every known URL once and update the registry.
    pub async fn discover(&self) -> DiscoveryReport {
        let mut probes = JoinSet::new();
        for url in &self.known_urls {
            let client = self.client.clone();
            let url = url.clone();
            let timeout = self.probe_timeout;
            probes.spawn(async move {
                let result = client.fetch_card(&url, timeout).await;
                (url, result)
            });
        }

        while let Some(joined) = probes.join_next().await {
            match joined {
                Ok((url, Ok(card))) => self.mark_online(&url, &card),
                Ok((url, Err(e))) => {
                    tracing::warn!("[Registry] Probe of {} failed: {}", url, e);
                    self.mark_status(&url, AgentStatus::Offline);
                }
                Err(e) => tracing::error!("[Registry] Probe task panicked: {}", e),
            }
        }

        let agents = self.get_all();
        let online = agents
            .iter()
            .filter(|a| a.status == AgentStatus::Online)
            .count();
        let offline = agents
            .iter()
            .filter(|a| a.status == AgentStatus::Offline)
            .count();

        tracing::info!(
            "[Registry] Discovery finished: {} online, {} offline",
            online,
            offline
        );

        DiscoveryReport {
            online,
            offline,
            agents,
        }
    }

    fn mark_online(&self, url: &str, card: &AgentCard) {
        let mut entries = self.write();
        let Entries { agents, holds } = &mut *entries;
        let agent = agents
            .entry(url.to_string())
            .or_insert_with(|| Agent::unknown(url));
        agent.apply_card(card);
        agent.last_seen = Some(Utc::now());
        match holds.get_mut(url) {
            Some(hold) => hold.resting = AgentStatus::Online,
            None => agent.status = AgentStatus::Online,
        }
    }

    /// Set an agent's status. Unknown ids are ignored; the registry only
    /// tracks the configured URLs. While calls are in flight the agent stays
    /// `busy` and the new status applies once the last one is released.
    pub fn mark_status(&self, agent_id: &str, status: AgentStatus) {
        let mut entries = self.write();
        let Entries { agents, holds } = &mut *entries;
        let Some(agent) = agents.get_mut(agent_id) else {
            return;
        };
        match holds.get_mut(agent_id) {
            Some(hold) => hold.resting = status,
            None => agent.status = status,
        }
    }

    /// Mark an agent busy for the duration of one call and return the status
    /// it had before any call was in flight. Every `mark_busy` must be paired
    /// with one `release`.
    pub fn mark_busy(&self, agent_id: &str) -> Option<AgentStatus> {
        let mut entries = self.write();
        let Entries { agents, holds } = &mut *entries;
        let agent = agents.get_mut(agent_id)?;
        let hold = holds.entry(agent_id.to_string()).or_insert(BusyHold {
            count: 0,
            resting: agent.status,
        });
        hold.count += 1;
        agent.status = AgentStatus::Busy;
        Some(hold.resting)
    }

    /// End one call started with `mark_busy`.
    ///
    /// A successful call proves the agent is alive, so it returns to `online`
    /// with a fresh `last_seen`. A failed call leaves the status it had before
    /// (or whatever was set meanwhile). The agent stays `busy` until its last
    /// in-flight call is released.
    pub fn release(&self, agent_id: &str, succeeded: bool) {
        let mut entries = self.write();
        let Entries { agents, holds } = &mut *entries;
        let (Some(agent), Some(hold)) = (agents.get_mut(agent_id), holds.get_mut(agent_id))
        else {
            return;
        };
        if succeeded {
            hold.resting = AgentStatus::Online;
            agent.last_seen = Some(Utc::now());
        }
        hold.count = hold.count.saturating_sub(1);
        if hold.count == 0 {
            agent.status = hold.resting;
            holds.remove(agent_id);
        }
    }

    /// All agents in configuration order.
    pub fn get_all(&self) -> Vec<Agent> {
        let entries = self.read();
        self.known_urls
            .iter()
            .filter_map(|url| entries.agents.get(url).cloned())
            .collect()
    }

    pub fn get(&self, agent_id: &str) -> Option<Agent> {
        self.read()
            .agents
            .get(&normalize_agent_url(agent_id))
            .cloned()
    }

    pub fn get_by_capability(&self, tag: &str) -> Vec<Agent> {
        self.get_all()
            .into_iter()
            .filter(|a| a.has_capability(tag))
            .collect()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Entries> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }
}
