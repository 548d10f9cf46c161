//! Quiz and manual payloads exchanged with the generation agents.
//!
//! These use snake_case field names to match what the quiz and manual agents
//! emit in their artifacts.

use serde::{Deserialize, Serialize};

pub const DEFAULT_QUESTION_COUNT: usize = 5;
pub const MAX_QUESTION_COUNT: usize = 50;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuizOption {
    pub letter: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: u32,
    pub question: String,
    pub options: Vec<QuizOption>,
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: String,
}

impl QuizQuestion {
    /// A question is well formed when it has text and its answer is one of
    /// the listed option letters.
    pub fn is_well_formed(&self) -> bool {
        !self.question.trim().is_empty()
            && self.options.iter().any(|o| o.letter == self.correct_answer)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub title: String,
    pub topic: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub questions: Vec<QuizQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualSection {
    pub heading: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manual {
    pub title: String,
    pub topic: String,
    pub sections: Vec<ManualSection>,
}

impl Manual {
    /// Flatten the manual into plain text, used as quiz source material.
    pub fn to_text(&self) -> String {
        let mut text = format!("# {}\n", self.title);
        for section in &self.sections {
            text.push_str(&format!("\n## {}\n{}\n", section.heading, section.body));
        }
        text
    }
}

/// Parameters of a quiz generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizRequest {
    pub topic: String,
    #[serde(default = "default_question_count", alias = "questionCount")]
    pub question_count: usize,
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Optional source text pasted by the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

fn default_question_count() -> usize {
    DEFAULT_QUESTION_COUNT
}

impl QuizRequest {
    pub fn new(topic: impl Into<String>, question_count: usize) -> Self {
        Self {
            topic: topic.into(),
            question_count,
            difficulty: Difficulty::default(),
            content: None,
        }
    }

    /// Out-of-range question counts are rejected, not clamped.
    pub fn validate(&self) -> Result<(), String> {
        if self.topic.trim().is_empty() {
            return Err("topic must not be empty".to_string());
        }
        if self.question_count == 0 || self.question_count > MAX_QUESTION_COUNT {
            return Err(format!(
                "question_count must be between 1 and {}",
                MAX_QUESTION_COUNT
            ));
        }
        Ok(())
    }
}

/// Parameters of a manual generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualRequest {
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ManualRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.topic.trim().is_empty() {
            return Err("topic must not be empty".to_string());
        }
        Ok(())
    }
}
