use std::collections::HashMap;
use std::sync::RwLock;

use serde::Serialize;

use crate::models::{Workflow, WorkflowStatus};

/// In-memory workflow history. Workflows live for the process lifetime.
pub struct WorkflowStore {
    workflows: RwLock<HashMap<String, Workflow>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkflowCounts {
    pub total: usize,
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    pub degraded: usize,
}

impl WorkflowStore {
    pub fn new() -> Self {
        Self {
            workflows: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or replace a workflow snapshot.
    pub fn save(&self, workflow: &Workflow) {
        self.workflows
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(workflow.id.clone(), workflow.clone());
    }

    pub fn get(&self, workflow_id: &str) -> Option<Workflow> {
        self.read().get(workflow_id).cloned()
    }

    /// All workflows, newest first.
    pub fn list(&self) -> Vec<Workflow> {
        let mut all: Vec<Workflow> = self.read().values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all
    }

    pub fn counts(&self) -> WorkflowCounts {
        let workflows = self.read();
        let mut counts = WorkflowCounts {
            total: workflows.len(),
            ..Default::default()
        };
        for wf in workflows.values() {
            match wf.status {
                WorkflowStatus::Pending => counts.pending += 1,
                WorkflowStatus::Running => counts.running += 1,
                WorkflowStatus::Completed => counts.completed += 1,
                WorkflowStatus::Failed => counts.failed += 1,
            }
            if wf.degraded {
                counts.degraded += 1;
            }
        }
        counts
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Workflow>> {
        self.workflows.read().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for WorkflowStore {
    fn default() -> Self {
        Self::new()
    }
}
