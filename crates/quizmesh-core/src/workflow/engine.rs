//! Workflow Engine — runs a workflow step by step against the agents.
//!
//! The engine:
//! 1. Marks the workflow `running` and records it in the store
//! 2. Runs each step in list order, never in parallel
//! 3. Refuses to start a step whose dependencies lack a usable result
//! 4. Gates every agent call on that agent's circuit breaker
//! 5. Substitutes local fallback content for failed agent calls (if enabled)
//!
//! Every transition is saved to the [`WorkflowStore`](super::WorkflowStore)
//! and appended to the chat log.

use chrono::Utc;

use crate::a2a::AgentCallError;
use crate::config::ROLE_MANUAL;
use crate::error::ServerError;
use crate::fallback;
use crate::models::{
    AgentStatus, ChatMessageType, ChatMetadata, Manual, ManualRequest, QuizRequest, StepStatus,
    Workflow, WorkflowStatus, WorkflowStep,
};
use crate::state::AppStateInner;

use super::templates::{
    manual_workflow, quiz_workflow, resolve_agent, resolve_quiz_agents, validate_result,
    SKILL_GENERATE_QUIZ, SKILL_OUTLINE_MANUAL,
};

pub struct WorkflowEngine<'a> {
    state: &'a AppStateInner,
}

impl<'a> WorkflowEngine<'a> {
    pub fn new(state: &'a AppStateInner) -> Self {
        Self { state }
    }

    /// Build and run the quiz workflow for `request`.
    pub async fn orchestrate_quiz(&self, request: &QuizRequest) -> Result<Workflow, ServerError> {
        request.validate().map_err(ServerError::BadRequest)?;
        let (manual_agent, quiz_agent) =
            resolve_quiz_agents(&self.state.registry, &self.state.config);
        self.run(quiz_workflow(request, &manual_agent, &quiz_agent))
            .await
    }

    /// Build and run the manual workflow for `request`.
    pub async fn orchestrate_manual(
        &self,
        request: &ManualRequest,
    ) -> Result<Workflow, ServerError> {
        request.validate().map_err(ServerError::BadRequest)?;
        let manual_agent = resolve_agent(
            &self.state.registry,
            &self.state.config,
            SKILL_OUTLINE_MANUAL,
            ROLE_MANUAL,
        );
        self.run(manual_workflow(request, &manual_agent)).await
    }

    /// Execute `workflow` to a terminal state.
    ///
    /// Returns the completed workflow, or an error once the workflow has
    /// been stored as `failed`. Workflows without steps are rejected and
    /// never stored.
    pub async fn run(&self, mut workflow: Workflow) -> Result<Workflow, ServerError> {
        if workflow.steps.is_empty() {
            return Err(ServerError::BadRequest(format!(
                "Workflow \"{}\" has no steps",
                workflow.name
            )));
        }
        workflow.status = WorkflowStatus::Running;
        self.state.workflows.save(&workflow);

        tracing::info!(
            "[Workflow] Starting {} ({}) with {} steps",
            workflow.name,
            workflow.id,
            workflow.steps.len()
        );
        self.log(
            ChatMessageType::Orchestrator,
            format!(
                "Starting workflow \"{}\" with {} steps",
                workflow.name,
                workflow.steps.len()
            ),
            ChatMetadata::workflow(&workflow.id).with_status(WorkflowStatus::Running.as_str()),
        );

        for index in 0..workflow.steps.len() {
            let step_id = workflow.steps[index].id.clone();

            let unmet = workflow.unmet_dependencies(&step_id);
            if !unmet.is_empty() {
                let message = format!(
                    "Step {} cannot run: dependencies not satisfied ({})",
                    step_id,
                    unmet.join(", ")
                );
                let step = &mut workflow.steps[index];
                step.status = StepStatus::Failed;
                step.error = Some(message.clone());
                step.completed_at = Some(Utc::now());
                return Err(self.fail(workflow, &step_id, ServerError::Internal(message)));
            }

            let input = step_input(&workflow, index);
            {
                let step = &mut workflow.steps[index];
                step.input = input.clone();
                step.status = StepStatus::Running;
                step.started_at = Some(Utc::now());
            }
            self.state.workflows.save(&workflow);

            let step = workflow.steps[index].clone();
            tracing::info!(
                "[Workflow] Step {}/{}: {} -> {}",
                index + 1,
                workflow.steps.len(),
                step.operation,
                step.agent_id
            );
            self.log(
                ChatMessageType::Orchestrator,
                format!("Running step \"{}\" on {}", step.name, step.agent_id),
                ChatMetadata::workflow(&workflow.id)
                    .with_step(&step.id)
                    .with_agent(&step.agent_id)
                    .with_status(StepStatus::Running.as_str()),
            );

            match self.call_agent(&step, &input).await {
                Ok(result) => {
                    let entry = &mut workflow.steps[index];
                    entry.result = Some(result);
                    entry.status = StepStatus::Completed;
                    entry.completed_at = Some(Utc::now());
                    self.log(
                        ChatMessageType::Agent,
                        format!("Step \"{}\" completed", step.name),
                        ChatMetadata::workflow(&workflow.id)
                            .with_step(&step.id)
                            .with_agent(&step.agent_id)
                            .with_status(StepStatus::Completed.as_str()),
                    );
                }
                Err(err) => {
                    tracing::warn!("[Workflow] Step {} failed: {}", step.id, err);

                    let synthesized = if self.state.config.fallback_enabled {
                        fallback::synthesize(&step.operation, &input)
                    } else {
                        None
                    };

                    let Some(result) = synthesized else {
                        let entry = &mut workflow.steps[index];
                        entry.status = StepStatus::Failed;
                        entry.error = Some(err.to_string());
                        entry.completed_at = Some(Utc::now());
                        return Err(self.fail(workflow, &step.id, err.into()));
                    };

                    let entry = &mut workflow.steps[index];
                    entry.result = Some(result);
                    entry.error = Some(err.to_string());
                    entry.fallback = true;
                    entry.status = StepStatus::Completed;
                    entry.completed_at = Some(Utc::now());
                    workflow.degraded = true;
                    self.log(
                        ChatMessageType::System,
                        format!(
                            "Agent unavailable for \"{}\" ({}); using fallback content",
                            step.name, err
                        ),
                        ChatMetadata::workflow(&workflow.id)
                            .with_step(&step.id)
                            .with_agent(&step.agent_id)
                            .with_status("fallback"),
                    );
                }
            }
            self.state.workflows.save(&workflow);
        }

        workflow.status = workflow.derived_status();
        workflow.completed_at = Some(Utc::now());
        self.state.workflows.save(&workflow);

        tracing::info!(
            "[Workflow] {} finished: {} (degraded: {})",
            workflow.id,
            workflow.status.as_str(),
            workflow.degraded
        );
        self.log(
            ChatMessageType::Orchestrator,
            if workflow.degraded {
                format!("Workflow \"{}\" completed with fallback content", workflow.name)
            } else {
                format!("Workflow \"{}\" completed", workflow.name)
            },
            ChatMetadata::workflow(&workflow.id).with_status(workflow.status.as_str()),
        );

        Ok(workflow)
    }

    /// One breaker-gated call to the step's agent.
    async fn call_agent(
        &self,
        step: &WorkflowStep,
        input: &serde_json::Value,
    ) -> Result<serde_json::Value, AgentCallError> {
        let agent_id = step.agent_id.as_str();
        if !self.state.breakers.is_available(agent_id) {
            return Err(AgentCallError::CircuitOpen {
                agent_id: agent_id.to_string(),
            });
        }

        if let Some(previous) = self.state.registry.mark_busy(agent_id) {
            tracing::debug!("[Workflow] {} busy (was {})", agent_id, previous.as_str());
        }
        let result = self
            .state
            .a2a
            .send_task(agent_id, &step.operation, input, &step.artifact)
            .await
            .and_then(|value| {
                validate_result(&step.operation, &value)
                    .map(|_| value)
                    .map_err(|message| AgentCallError::Protocol {
                        url: agent_id.to_string(),
                        message,
                    })
            });
        self.state.registry.release(agent_id, result.is_ok());

        match &result {
            Ok(_) => self.state.breakers.record_success(agent_id),
            Err(err) => {
                self.state.breakers.record_failure(agent_id);
                if matches!(
                    err,
                    AgentCallError::Transport { .. } | AgentCallError::Timeout { .. }
                ) {
                    self.state
                        .registry
                        .mark_status(agent_id, AgentStatus::Offline);
                }
            }
        }
        result
    }

    fn fail(&self, mut workflow: Workflow, step_id: &str, err: ServerError) -> ServerError {
        workflow.status = WorkflowStatus::Failed;
        workflow.completed_at = Some(Utc::now());
        self.state.workflows.save(&workflow);

        tracing::error!("[Workflow] {} failed at {}: {}", workflow.id, step_id, err);
        self.log(
            ChatMessageType::System,
            format!("Workflow \"{}\" failed at step {}: {}", workflow.name, step_id, err),
            ChatMetadata::workflow(&workflow.id)
                .with_step(step_id)
                .with_status(WorkflowStatus::Failed.as_str()),
        );
        err
    }

    fn log(&self, message_type: ChatMessageType, content: String, metadata: ChatMetadata) {
        self.state.chat_log.append(message_type, content, Some(metadata));
    }
}

/// The step's own input plus the results of its dependencies under
/// `context.<step id>`. A quiz step without source text gets the manual text.
fn step_input(workflow: &Workflow, index: usize) -> serde_json::Value {
    let step = &workflow.steps[index];
    let mut input = match &step.input {
        serde_json::Value::Object(map) => map.clone(),
        other => {
            let mut map = serde_json::Map::new();
            map.insert("input".to_string(), other.clone());
            map
        }
    };

    let mut context = serde_json::Map::new();
    for dep in &step.dependencies {
        if let Some(result) = workflow.step(dep).and_then(|d| d.result.clone()) {
            context.insert(dep.clone(), result);
        }
    }

    if step.operation == SKILL_GENERATE_QUIZ
        && !input.get("content").is_some_and(|c| !c.is_null())
    {
        let manual_text = context
            .values()
            .find_map(|v| serde_json::from_value::<Manual>(v.clone()).ok())
            .map(|m| m.to_text());
        if let Some(text) = manual_text {
            input.insert("content".to_string(), serde_json::Value::String(text));
        }
    }

    if !context.is_empty() {
        input.insert("context".to_string(), serde_json::Value::Object(context));
    }
    serde_json::Value::Object(input)
}
