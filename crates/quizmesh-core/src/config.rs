//! Orchestrator configuration.
//!
//! Resolution order: built-in defaults, then an optional YAML file, then
//! environment overrides.
//!
//! ```yaml
//! agents:
//!   - url: "http://localhost:5001"
//!     role: quiz
//!   - url: "http://localhost:5002"
//!     role: manual
//! probe_timeout_ms: 5000
//! discovery_interval_secs: 30
//! breaker:
//!   failure_threshold: 5
//!   timeout_ms: 60000
//!   success_threshold: 3
//! fallback_enabled: true
//! llm:
//!   base_url: "https://api.openai.com/v1"
//!   model: "gpt-4o-mini"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::breaker::CircuitBreakerConfig;
use crate::error::ServerError;
use crate::models::normalize_agent_url;

pub const ROLE_QUIZ: &str = "quiz";
pub const ROLE_MANUAL: &str = "manual";

/// A well-known agent URL, optionally tagged with the role it plays in the
/// built-in workflows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentEndpoint {
    pub url: String,
    #[serde(default)]
    pub role: Option<String>,
}

impl AgentEndpoint {
    pub fn new(url: &str, role: Option<&str>) -> Self {
        Self {
            url: normalize_agent_url(url),
            role: role.map(|r| r.to_string()),
        }
    }

    /// Parse `role=url` or a bare `url`.
    pub fn parse(entry: &str) -> Option<Self> {
        let entry = entry.trim();
        if entry.is_empty() {
            return None;
        }
        match entry.split_once('=') {
            Some((role, url)) if !role.contains("://") => {
                Some(Self::new(url, Some(role.trim())))
            }
            _ => Some(Self::new(entry, None)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            timeout_ms: 120_000,
        }
    }
}

impl LlmConfig {
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub agents: Vec<AgentEndpoint>,
    pub probe_timeout_ms: u64,
    pub discovery_interval_secs: u64,
    pub request_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub max_polls: u32,
    pub breaker: CircuitBreakerConfig,
    pub chat_log_capacity: usize,
    pub fallback_enabled: bool,
    pub retry_base_delay_ms: u64,
    pub llm: LlmConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            agents: vec![
                AgentEndpoint::new("http://localhost:5001", Some(ROLE_QUIZ)),
                AgentEndpoint::new("http://localhost:5002", Some(ROLE_MANUAL)),
            ],
            probe_timeout_ms: 5_000,
            discovery_interval_secs: 30,
            request_timeout_ms: 60_000,
            poll_interval_ms: 500,
            max_polls: 20,
            breaker: CircuitBreakerConfig::default(),
            chat_log_capacity: 1_000,
            fallback_enabled: true,
            retry_base_delay_ms: 200,
            llm: LlmConfig::default(),
        }
    }
}

impl OrchestratorConfig {
    /// Build the effective configuration: defaults, then `path` (if any),
    /// then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ServerError> {
        let mut config = match path {
            Some(p) => Self::from_yaml_file(p)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ServerError> {
        let mut config: Self = serde_yaml::from_str(yaml)?;
        for agent in &mut config.agents {
            agent.url = normalize_agent_url(&agent.url);
        }
        Ok(config)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self, ServerError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ServerError::BadRequest(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml(&content)
    }

    /// Apply `QUIZMESH_*` environment overrides.
    pub fn apply_env(&mut self) {
        if let Ok(urls) = std::env::var("QUIZMESH_AGENT_URLS") {
            let agents: Vec<AgentEndpoint> =
                urls.split(',').filter_map(AgentEndpoint::parse).collect();
            if !agents.is_empty() {
                self.agents = agents;
            }
        }

        if let Some(ms) = env_u64("QUIZMESH_PROBE_TIMEOUT_MS") {
            self.probe_timeout_ms = ms;
        }
        if let Some(secs) = env_u64("QUIZMESH_DISCOVERY_INTERVAL_SECS") {
            self.discovery_interval_secs = secs;
        }
        if let Ok(flag) = std::env::var("QUIZMESH_FALLBACK_ENABLED") {
            self.fallback_enabled = !matches!(flag.as_str(), "0" | "false" | "no" | "off");
        }

        if let Ok(base_url) = std::env::var("QUIZMESH_LLM_BASE_URL") {
            self.llm.base_url = base_url;
        }
        if let Ok(model) = std::env::var("QUIZMESH_LLM_MODEL") {
            self.llm.model = model;
        }
        if let Ok(key) =
            std::env::var("QUIZMESH_LLM_API_KEY").or_else(|_| std::env::var("OPENAI_API_KEY"))
        {
            self.llm.api_key = Some(key);
        }
    }

    pub fn agent_urls(&self) -> Vec<String> {
        self.agents.iter().map(|a| a.url.clone()).collect()
    }

    /// The configured URL for `role`, if any.
    pub fn agent_for_role(&self, role: &str) -> Option<&str> {
        self.agents
            .iter()
            .find(|a| a.role.as_deref().is_some_and(|r| r.eq_ignore_ascii_case(role)))
            .map(|a| a.url.as_str())
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn discovery_interval(&self) -> Duration {
        Duration::from_secs(self.discovery_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.agents.len(), 2);
        assert_eq!(config.agent_for_role("quiz"), Some("http://localhost:5001"));
        assert_eq!(config.agent_for_role("MANUAL"), Some("http://localhost:5002"));
        assert_eq!(config.breaker.failure_threshold, 5);
        assert_eq!(config.breaker.timeout_ms, 60_000);
        assert_eq!(config.breaker.success_threshold, 3);
        assert!(config.fallback_enabled);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
agents:
  - url: "http://quiz.internal:8000/"
    role: quiz
breaker:
  failure_threshold: 2
fallback_enabled: false
"#;
        let config = OrchestratorConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.agent_urls(), vec!["http://quiz.internal:8000"]);
        assert_eq!(config.breaker.failure_threshold, 2);
        assert_eq!(config.breaker.success_threshold, 3);
        assert_eq!(config.probe_timeout_ms, 5_000);
        assert!(!config.fallback_enabled);
        assert!(config.agent_for_role("manual").is_none());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "probe_timeout_ms: 250\nchat_log_capacity: 10").unwrap();

        let config = OrchestratorConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.probe_timeout(), Duration::from_millis(250));
        assert_eq!(config.chat_log_capacity, 10);
    }

    #[test]
    fn test_invalid_yaml_is_bad_request() {
        let err = OrchestratorConfig::from_yaml("agents: 42").unwrap_err();
        assert!(matches!(err, ServerError::BadRequest(_)));
    }

    #[test]
    fn test_parse_agent_endpoint() {
        assert_eq!(
            AgentEndpoint::parse("quiz=http://localhost:9000/"),
            Some(AgentEndpoint::new("http://localhost:9000", Some("quiz")))
        );
        assert_eq!(
            AgentEndpoint::parse(" http://localhost:9001 "),
            Some(AgentEndpoint::new("http://localhost:9001", None))
        );
        assert_eq!(AgentEndpoint::parse("  "), None);
    }
}
