use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatMessageType {
    User,
    Orchestrator,
    Agent,
    System,
}

/// Optional links from a log entry back to the workflow activity it describes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl ChatMetadata {
    pub fn workflow(workflow_id: &str) -> Self {
        Self {
            workflow_id: Some(workflow_id.to_string()),
            ..Default::default()
        }
    }

    pub fn with_agent(mut self, agent_id: &str) -> Self {
        self.agent_id = Some(agent_id.to_string());
        self
    }

    pub fn with_step(mut self, step_id: &str) -> Self {
        self.step_id = Some(step_id.to_string());
        self
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.status = Some(status.to_string());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    #[serde(rename = "type")]
    pub message_type: ChatMessageType,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ChatMetadata>,
}

impl ChatMessage {
    pub fn new(
        message_type: ChatMessageType,
        content: impl Into<String>,
        metadata: Option<ChatMetadata>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            message_type,
            content: content.into(),
            timestamp: Utc::now(),
            metadata,
        }
    }

    pub fn workflow_id(&self) -> Option<&str> {
        self.metadata.as_ref()?.workflow_id.as_deref()
    }
}
