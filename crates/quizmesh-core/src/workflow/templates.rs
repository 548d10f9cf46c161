//! Built-in workflow templates.
//!
//! Each workflow kind has a fixed step list; nothing is planned dynamically.
//!
//! | Kind   | Steps                                        |
//! |--------|----------------------------------------------|
//! | quiz   | `generate_manual` → `generate_quiz`          |
//! | manual | `outline_manual` → `generate_manual`         |

use crate::config::{OrchestratorConfig, ROLE_MANUAL, ROLE_QUIZ};
use crate::models::{
    AgentStatus, Manual, ManualRequest, Quiz, QuizRequest, Workflow, WorkflowKind, WorkflowStep,
};
use crate::registry::AgentRegistry;

pub const SKILL_GENERATE_QUIZ: &str = "generate_quiz";
pub const SKILL_GENERATE_MANUAL: &str = "generate_manual";
pub const SKILL_OUTLINE_MANUAL: &str = "outline_manual";

pub const ARTIFACT_QUIZ: &str = "quiz.json";
pub const ARTIFACT_MANUAL: &str = "manual.json";
pub const ARTIFACT_OUTLINE: &str = "outline.json";

pub fn quiz_workflow(request: &QuizRequest, manual_agent: &str, quiz_agent: &str) -> Workflow {
    let steps = vec![
        WorkflowStep::new(
            SKILL_GENERATE_MANUAL,
            "Generate study manual",
            manual_agent,
            SKILL_GENERATE_MANUAL,
            ARTIFACT_MANUAL,
            serde_json::json!({
                "topic": request.topic,
                "content": request.content,
            }),
            vec![],
        ),
        WorkflowStep::new(
            SKILL_GENERATE_QUIZ,
            "Generate quiz",
            quiz_agent,
            SKILL_GENERATE_QUIZ,
            ARTIFACT_QUIZ,
            serde_json::json!({
                "topic": request.topic,
                "question_count": request.question_count,
                "difficulty": request.difficulty,
                "content": request.content,
            }),
            vec![SKILL_GENERATE_MANUAL.to_string()],
        ),
    ];
    Workflow::new(format!("Quiz: {}", request.topic), WorkflowKind::Quiz, steps)
}

pub fn manual_workflow(request: &ManualRequest, manual_agent: &str) -> Workflow {
    let steps = vec![
        WorkflowStep::new(
            SKILL_OUTLINE_MANUAL,
            "Outline manual",
            manual_agent,
            SKILL_OUTLINE_MANUAL,
            ARTIFACT_OUTLINE,
            serde_json::json!({
                "topic": request.topic,
                "content": request.content,
            }),
            vec![],
        ),
        WorkflowStep::new(
            SKILL_GENERATE_MANUAL,
            "Generate manual",
            manual_agent,
            SKILL_GENERATE_MANUAL,
            ARTIFACT_MANUAL,
            serde_json::json!({
                "topic": request.topic,
                "content": request.content,
            }),
            vec![SKILL_OUTLINE_MANUAL.to_string()],
        ),
    ];
    Workflow::new(format!("Manual: {}", request.topic), WorkflowKind::Manual, steps)
}

/// Pick the agent for `skill`: an online agent advertising it, then any
/// agent advertising it, then the URL configured for `role`.
pub fn resolve_agent(
    registry: &AgentRegistry,
    config: &OrchestratorConfig,
    skill: &str,
    role: &str,
) -> String {
    let candidates = registry.get_by_capability(skill);
    if let Some(agent) = candidates
        .iter()
        .find(|a| a.status == AgentStatus::Online)
        .or_else(|| candidates.first())
    {
        return agent.id.clone();
    }

    config
        .agent_for_role(role)
        .map(|url| url.to_string())
        .unwrap_or_else(|| format!("unresolved://{}", role))
}

pub fn resolve_quiz_agents(registry: &AgentRegistry, config: &OrchestratorConfig) -> (String, String) {
    (
        resolve_agent(registry, config, SKILL_GENERATE_MANUAL, ROLE_MANUAL),
        resolve_agent(registry, config, SKILL_GENERATE_QUIZ, ROLE_QUIZ),
    )
}

/// Check that an agent's artifact has the shape the next consumer expects.
pub fn validate_result(operation: &str, value: &serde_json::Value) -> Result<(), String> {
    match operation {
        SKILL_GENERATE_QUIZ => {
            let quiz: Quiz = serde_json::from_value(value.clone())
                .map_err(|e| format!("quiz artifact has unexpected shape: {}", e))?;
            if quiz.questions.is_empty() {
                return Err("quiz artifact contains no questions".to_string());
            }
            if let Some(bad) = quiz.questions.iter().find(|q| !q.is_well_formed()) {
                return Err(format!(
                    "quiz question {} has no text or an answer outside its options",
                    bad.id
                ));
            }
            Ok(())
        }
        SKILL_GENERATE_MANUAL => serde_json::from_value::<Manual>(value.clone())
            .map(|_| ())
            .map_err(|e| format!("manual artifact has unexpected shape: {}", e)),
        _ => Ok(()),
    }
}
