//! `quizmesh quiz` / `quizmesh manual` — Run a built-in workflow end to end.
//!
//! Agents are discovered first so the workflow can route to whatever is
//! online; unreachable agents fall back to locally synthesized content when
//! the configuration allows it.

use console::style;

use quizmesh_core::actions::{agents, workflows};
use quizmesh_core::models::{Difficulty, ManualRequest, QuizRequest};
use quizmesh_core::state::AppState;

pub fn parse_difficulty(value: &str) -> Result<Difficulty, String> {
    serde_json::from_value(serde_json::Value::String(value.trim().to_lowercase())).map_err(|_| {
        format!(
            "Invalid difficulty '{}': expected easy, medium or hard",
            value
        )
    })
}

pub async fn quiz(
    state: &AppState,
    topic: &str,
    count: usize,
    difficulty: &str,
) -> Result<(), String> {
    let request = QuizRequest {
        difficulty: parse_difficulty(difficulty)?,
        ..QuizRequest::new(topic, count)
    };
    agents::discover(state).await;

    let result = workflows::orchestrate_quiz(state, request)
        .await
        .map_err(|e| e.to_string())?;

    println!(
        "{} ({} questions, {}, source: {})",
        style(&result.quiz.title).bold(),
        result.quiz.questions.len(),
        result.quiz.difficulty.as_str(),
        source_label(result.source)
    );
    for question in &result.quiz.questions {
        println!("\n{}. {}", question.id, question.question);
        for option in &question.options {
            let line = format!("   {}) {}", option.letter, option.text);
            if option.letter == question.correct_answer {
                println!("{}", style(line).green());
            } else {
                println!("{}", line);
            }
        }
        if !question.explanation.is_empty() {
            println!("   {}", style(&question.explanation).dim());
        }
    }
    println!("\nWorkflow {}", style(&result.workflow_id).dim());
    Ok(())
}

pub async fn manual(state: &AppState, topic: &str) -> Result<(), String> {
    agents::discover(state).await;

    let result = workflows::orchestrate_manual(
        state,
        ManualRequest {
            topic: topic.to_string(),
            content: None,
        },
    )
    .await
    .map_err(|e| e.to_string())?;

    println!(
        "{} (source: {})",
        style(&result.manual.title).bold(),
        source_label(result.source)
    );
    for section in &result.manual.sections {
        println!("\n{}\n{}", style(&section.heading).cyan().bold(), section.body);
    }
    println!("\nWorkflow {}", style(&result.workflow_id).dim());
    Ok(())
}

fn source_label(source: &str) -> String {
    if source == workflows::SOURCE_FALLBACK {
        style(source).yellow().to_string()
    } else {
        style(source).green().to_string()
    }
}
