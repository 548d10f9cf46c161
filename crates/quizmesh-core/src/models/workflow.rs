use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl WorkflowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowKind {
    Quiz,
    Manual,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStep {
    pub id: String,
    pub name: String,
    pub agent_id: String,
    /// Skill id invoked on the agent.
    pub operation: String,
    /// Artifact name expected back from the agent.
    pub artifact: String,
    pub input: serde_json::Value,
    #[serde(default)]
    pub dependencies: Vec<String>,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Set when `result` was synthesized locally instead of produced by the agent.
    #[serde(default)]
    pub fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl WorkflowStep {
    pub fn new(
        id: &str,
        name: &str,
        agent_id: &str,
        operation: &str,
        artifact: &str,
        input: serde_json::Value,
        dependencies: Vec<String>,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            agent_id: agent_id.to_string(),
            operation: operation.to_string(),
            artifact: artifact.to_string(),
            input,
            dependencies,
            status: StepStatus::Pending,
            result: None,
            error: None,
            fallback: false,
            started_at: None,
            completed_at: None,
        }
    }

    /// Whether this step can serve as a satisfied dependency.
    pub fn has_usable_result(&self) -> bool {
        self.status == StepStatus::Completed
            && match &self.result {
                None | Some(serde_json::Value::Null) => false,
                Some(serde_json::Value::Object(map)) => !map.is_empty(),
                Some(serde_json::Value::Array(items)) => !items.is_empty(),
                Some(serde_json::Value::String(s)) => !s.is_empty(),
                Some(_) => true,
            }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: String,
    pub name: String,
    pub kind: WorkflowKind,
    pub steps: Vec<WorkflowStep>,
    pub status: WorkflowStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// True when at least one step result came from the local fallback.
    #[serde(default)]
    pub degraded: bool,
}

impl Workflow {
    pub fn new(name: impl Into<String>, kind: WorkflowKind, steps: Vec<WorkflowStep>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            kind,
            steps,
            status: WorkflowStatus::Pending,
            created_at: Utc::now(),
            completed_at: None,
            degraded: false,
        }
    }

    pub fn step(&self, step_id: &str) -> Option<&WorkflowStep> {
        self.steps.iter().find(|s| s.id == step_id)
    }

    /// Dependencies of `step_id` that are not completed with a usable result.
    pub fn unmet_dependencies(&self, step_id: &str) -> Vec<String> {
        let Some(step) = self.step(step_id) else {
            return Vec::new();
        };
        step.dependencies
            .iter()
            .filter(|dep| !self.step(dep).is_some_and(|d| d.has_usable_result()))
            .cloned()
            .collect()
    }

    /// Status implied by the step statuses: failed if any step failed,
    /// completed only if every step completed.
    pub fn derived_status(&self) -> WorkflowStatus {
        if self.steps.iter().any(|s| s.status == StepStatus::Failed) {
            WorkflowStatus::Failed
        } else if !self.steps.is_empty()
            && self.steps.iter().all(|s| s.status == StepStatus::Completed)
        {
            WorkflowStatus::Completed
        } else if self.steps.iter().any(|s| s.status != StepStatus::Pending) {
            WorkflowStatus::Running
        } else {
            self.status
        }
    }
}
