//! Per-agent circuit breakers.
//!
//! A breaker decides whether a call to an agent should be attempted at all.
//! It never performs the call itself; callers report outcomes through
//! [`CircuitBreakers::record_success`] and [`CircuitBreakers::record_failure`].
//!
//! ```text
//!            failures >= failure_threshold
//!   Closed ───────────────────────────────► Open
//!     ▲                                      │  now - last_failure > timeout
//!     │ successes >= success_threshold       ▼
//!     └───────────────────────────────── HalfOpen ──► Open (on failure threshold)
//! ```

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half-open",
        }
    }
}

/// Thresholds shared by every breaker of one [`CircuitBreakers`] instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub timeout_ms: u64,
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            timeout_ms: 60_000,
            success_threshold: 3,
        }
    }
}

impl CircuitBreakerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone)]
struct BreakerEntry {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    last_failure: Option<Instant>,
    last_failure_time: Option<DateTime<Utc>>,
}

impl Default for BreakerEntry {
    fn default() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            success_count: 0,
            last_failure: None,
            last_failure_time: None,
        }
    }
}

/// Serializable view of one agent's breaker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakerSnapshot {
    pub agent_id: String,
    pub state: CircuitState,
    pub failure_count: u32,
    pub success_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_failure_time: Option<DateTime<Utc>>,
}

/// Breakers for every agent, keyed by agent id.
pub struct CircuitBreakers {
    config: CircuitBreakerConfig,
    entries: Mutex<HashMap<String, BreakerEntry>>,
}

impl CircuitBreakers {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Whether a call to `agent_id` may be attempted now.
    ///
    /// An open breaker whose timeout has elapsed moves to half-open.
    pub fn is_available(&self, agent_id: &str) -> bool {
        self.is_available_at(agent_id, Instant::now())
    }

    fn is_available_at(&self, agent_id: &str, now: Instant) -> bool {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(agent_id) else {
            return true;
        };

        match entry.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let elapsed = entry
                    .last_failure
                    .map(|t| now.saturating_duration_since(t))
                    .unwrap_or(Duration::MAX);
                if elapsed > self.config.timeout() {
                    entry.state = CircuitState::HalfOpen;
                    entry.success_count = 0;
                    tracing::info!("[Breaker] {} moved to half-open", agent_id);
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn record_success(&self, agent_id: &str) {
        let mut entries = self.lock();
        let entry = entries.entry(agent_id.to_string()).or_default();
        entry.failure_count = 0;
        entry.success_count = entry.success_count.saturating_add(1);

        if entry.state == CircuitState::HalfOpen
            && entry.success_count >= self.config.success_threshold
        {
            entry.state = CircuitState::Closed;
            entry.success_count = 0;
            tracing::info!("[Breaker] {} closed after successful trial calls", agent_id);
        }
    }

    pub fn record_failure(&self, agent_id: &str) {
        self.record_failure_at(agent_id, Instant::now());
    }

    fn record_failure_at(&self, agent_id: &str, now: Instant) {
        let mut entries = self.lock();
        let entry = entries.entry(agent_id.to_string()).or_default();
        entry.failure_count = entry.failure_count.saturating_add(1);
        entry.success_count = 0;
        entry.last_failure = Some(now);
        entry.last_failure_time = Some(Utc::now());

        if entry.failure_count >= self.config.failure_threshold
            && entry.state != CircuitState::Open
        {
            entry.state = CircuitState::Open;
            tracing::warn!(
                "[Breaker] {} opened after {} consecutive failures",
                agent_id,
                entry.failure_count
            );
        }
    }

    pub fn state(&self, agent_id: &str) -> CircuitState {
        self.lock()
            .get(agent_id)
            .map(|e| e.state)
            .unwrap_or(CircuitState::Closed)
    }

    pub fn snapshot_of(&self, agent_id: &str) -> BreakerSnapshot {
        let entries = self.lock();
        let entry = entries.get(agent_id).cloned().unwrap_or_default();
        to_snapshot(agent_id, &entry)
    }

    /// All known breakers, sorted by agent id.
    pub fn snapshot(&self) -> Vec<BreakerSnapshot> {
        let entries = self.lock();
        let mut all: Vec<BreakerSnapshot> = entries
            .iter()
            .map(|(id, entry)| to_snapshot(id, entry))
            .collect();
        all.sort_by(|a, b| a.agent_id.cmp(&b.agent_id));
        all
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, BreakerEntry>> {
        // Entries hold plain counters, so a poisoned lock still has usable data.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn to_snapshot(agent_id: &str, entry: &BreakerEntry) -> BreakerSnapshot {
    BreakerSnapshot {
        agent_id: agent_id.to_string(),
        state: entry.state,
        failure_count: entry.failure_count,
        success_count: entry.success_count,
        last_failure_time: entry.last_failure_time,
    }
}
