//! Workflow actions.
//!
//! - `orchestrate_quiz_workflow`   — manual → quiz, returns the quiz
//! - `orchestrate_manual_workflow` — outline → manual, returns the manual
//! - `get_workflows`               — workflow history, newest first
//! - `get_workflow`                — one workflow by id

use serde::Serialize;

use crate::error::ServerError;
use crate::models::{
    Manual, ManualRequest, Quiz, QuizRequest, StepStatus, Workflow, WorkflowStatus,
};
use crate::state::AppState;
use crate::workflow::templates::{SKILL_GENERATE_MANUAL, SKILL_GENERATE_QUIZ, SKILL_OUTLINE_MANUAL};
use crate::workflow::WorkflowEngine;

use super::chat::WorkflowIdParams;

pub const SOURCE_AGENT: &str = "agent";
pub const SOURCE_FALLBACK: &str = "fallback";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepSummary {
    pub id: String,
    pub name: String,
    pub agent_id: String,
    pub status: StepStatus,
    pub fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn step_summaries(workflow: &Workflow) -> Vec<StepSummary> {
    workflow
        .steps
        .iter()
        .map(|s| StepSummary {
            id: s.id.clone(),
            name: s.name.clone(),
            agent_id: s.agent_id.clone(),
            status: s.status,
            fallback: s.fallback,
            error: s.error.clone(),
        })
        .collect()
}

/// Where the headline artifact of a workflow came from.
fn source_of(workflow: &Workflow, step_id: &str) -> &'static str {
    match workflow.step(step_id) {
        Some(step) if !step.fallback => SOURCE_AGENT,
        _ => SOURCE_FALLBACK,
    }
}

fn decode_result<T: serde::de::DeserializeOwned>(
    workflow: &Workflow,
    step_id: &str,
) -> Result<T, ServerError> {
    let value = workflow
        .step(step_id)
        .and_then(|s| s.result.clone())
        .ok_or_else(|| {
            ServerError::Internal(format!(
                "Workflow {} finished without a result for {}",
                workflow.id, step_id
            ))
        })?;
    serde_json::from_value(value).map_err(|e| {
        ServerError::Internal(format!("Result of {} has unexpected shape: {}", step_id, e))
    })
}

// ---------------------------------------------------------------------------
// orchestrate_quiz_workflow
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub success: bool,
    pub workflow_id: String,
    pub status: WorkflowStatus,
    /// True when any part of the result was synthesized locally.
    pub degraded: bool,
    /// `agent` or `fallback`, for the quiz itself.
    pub source: &'static str,
    pub quiz: Quiz,
    pub manual: Manual,
    pub steps: Vec<StepSummary>,
}

pub async fn orchestrate_quiz(
    state: &AppState,
    request: QuizRequest,
) -> Result<QuizResult, ServerError> {
    let workflow = WorkflowEngine::new(state).orchestrate_quiz(&request).await?;

    Ok(QuizResult {
        success: workflow.status == WorkflowStatus::Completed,
        workflow_id: workflow.id.clone(),
        status: workflow.status,
        degraded: workflow.degraded,
        source: source_of(&workflow, SKILL_GENERATE_QUIZ),
        quiz: decode_result(&workflow, SKILL_GENERATE_QUIZ)?,
        manual: decode_result(&workflow, SKILL_GENERATE_MANUAL)?,
        steps: step_summaries(&workflow),
    })
}

// ---------------------------------------------------------------------------
// orchestrate_manual_workflow
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualResult {
    pub success: bool,
    pub workflow_id: String,
    pub status: WorkflowStatus,
    pub degraded: bool,
    pub source: &'static str,
    pub manual: Manual,
    pub outline: serde_json::Value,
    pub steps: Vec<StepSummary>,
}

pub async fn orchestrate_manual(
    state: &AppState,
    request: ManualRequest,
) -> Result<ManualResult, ServerError> {
    let workflow = WorkflowEngine::new(state).orchestrate_manual(&request).await?;

    Ok(ManualResult {
        success: workflow.status == WorkflowStatus::Completed,
        workflow_id: workflow.id.clone(),
        status: workflow.status,
        degraded: workflow.degraded,
        source: source_of(&workflow, SKILL_GENERATE_MANUAL),
        manual: decode_result(&workflow, SKILL_GENERATE_MANUAL)?,
        outline: decode_result(&workflow, SKILL_OUTLINE_MANUAL)?,
        steps: step_summaries(&workflow),
    })
}

// ---------------------------------------------------------------------------
// get_workflows / get_workflow
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ListResult {
    pub workflows: Vec<Workflow>,
}

pub fn list(state: &AppState) -> ListResult {
    ListResult {
        workflows: state.workflows.list(),
    }
}

pub fn get(state: &AppState, params: WorkflowIdParams) -> Result<Workflow, ServerError> {
    state
        .workflows
        .get(&params.workflow_id)
        .ok_or_else(|| ServerError::NotFound(format!("Workflow {} not found", params.workflow_id)))
}
