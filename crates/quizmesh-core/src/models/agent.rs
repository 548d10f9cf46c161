use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Online,
    Offline,
    Unknown,
    Busy,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Unknown => "unknown",
            Self::Busy => "busy",
        }
    }

    /// Liveness weight used when ranking agents for a query.
    pub fn liveness(&self) -> f64 {
        match self {
            Self::Online => 1.0,
            Self::Busy => 0.5,
            Self::Unknown => 0.2,
            Self::Offline => 0.0,
        }
    }
}

/// A sibling service known to the orchestrator.
///
/// The agent's base URL doubles as its identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
    pub status: AgentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
}

impl Agent {
    /// A placeholder entry for a URL that has not been probed yet.
    pub fn unknown(url: &str) -> Self {
        Self {
            id: normalize_agent_url(url),
            name: normalize_agent_url(url),
            description: None,
            version: None,
            capabilities: Vec::new(),
            status: AgentStatus::Unknown,
            last_seen: None,
        }
    }

    /// Refresh name, description and capabilities from a fetched card.
    pub fn apply_card(&mut self, card: &AgentCard) {
        self.name = card.name.clone();
        self.description = card.description.clone();
        self.version = card.version.clone();
        self.capabilities = card.capability_tags();
    }

    pub fn has_capability(&self, tag: &str) -> bool {
        self.capabilities.iter().any(|c| c.eq_ignore_ascii_case(tag))
    }
}

/// Metadata document an agent serves at `/.well-known/agent.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub skills: Vec<AgentSkill>,
    #[serde(default)]
    pub capabilities: serde_json::Value,
}

impl AgentCard {
    /// Skill ids followed by skill tags, deduplicated, in first-seen order.
    pub fn capability_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        let candidates = self
            .skills
            .iter()
            .map(|s| s.id.clone())
            .chain(self.skills.iter().flat_map(|s| s.tags.iter().cloned()));
        for tag in candidates {
            if !tags.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
                tags.push(tag);
            }
        }
        tags
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSkill {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Strip trailing slashes so `http://host:5001/` and `http://host:5001` map
/// to the same registry entry.
pub fn normalize_agent_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
