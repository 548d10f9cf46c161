//! Locally synthesized quiz and manual content.
//!
//! Used when a generation agent cannot be reached. Everything produced here
//! is deterministic for a given input and is always reported to callers as
//! `fallback` content, never as an agent result.

use crate::models::{
    Difficulty, Manual, ManualSection, Quiz, QuizOption, QuizQuestion, DEFAULT_QUESTION_COUNT,
    MAX_QUESTION_COUNT,
};

pub const OPTION_LETTERS: [&str; 4] = ["A", "B", "C", "D"];

struct QuestionTemplate {
    question: &'static str,
    correct: &'static str,
    distractors: [&'static str; 3],
    explanation: &'static str,
}

const QUESTION_TEMPLATES: &[QuestionTemplate] = &[
    QuestionTemplate {
        question: "Which statement best describes the central idea of {topic}?",
        correct: "It explains how the key parts of {topic} work together",
        distractors: [
            "It is an isolated fact with no wider context",
            "It only applies to historical examples",
            "It is a purely theoretical idea with no practical use",
        ],
        explanation: "Understanding {topic} starts with how its parts relate to each other.",
    },
    QuestionTemplate {
        question: "What is the best first step when studying {topic}?",
        correct: "Learn the core vocabulary and definitions of {topic}",
        distractors: [
            "Memorize advanced edge cases first",
            "Skip the fundamentals and start with exceptions",
            "Study an unrelated subject instead",
        ],
        explanation: "Core terms give you the language needed for the rest of {topic}.",
    },
    QuestionTemplate {
        question: "Why is {topic} considered important?",
        correct: "It connects to many other concepts and real-world situations",
        distractors: [
            "It has no connection to other subjects",
            "It is only relevant for exams",
            "It was replaced and is no longer used",
        ],
        explanation: "{topic} matters because it links to other ideas and everyday situations.",
    },
    QuestionTemplate {
        question: "Which approach helps you check your understanding of {topic}?",
        correct: "Explaining {topic} in your own words and testing it on examples",
        distractors: [
            "Re-reading notes without reflection",
            "Avoiding practice questions",
            "Relying only on memorized phrases",
        ],
        explanation: "Active recall and worked examples reveal gaps in understanding.",
    },
    QuestionTemplate {
        question: "What is a common mistake when learning about {topic}?",
        correct: "Confusing related terms that describe different parts of {topic}",
        distractors: [
            "Asking questions about unclear parts",
            "Reviewing the material over several sessions",
            "Connecting new facts to prior knowledge",
        ],
        explanation: "Keeping related terms distinct prevents most misunderstandings of {topic}.",
    },
    QuestionTemplate {
        question: "How can {topic} be applied in practice?",
        correct: "By using its principles to explain or solve a concrete problem",
        distractors: [
            "It cannot be applied outside a textbook",
            "Only experts are able to apply it",
            "By ignoring its underlying principles",
        ],
        explanation: "Applying {topic} to concrete problems shows real understanding.",
    },
];

/// A template quiz with exactly `question_count` questions about `topic`.
///
/// Correct answers rotate through the option letters so they are not all `A`.
pub fn fallback_quiz(topic: &str, question_count: usize, difficulty: Difficulty) -> Quiz {
    let topic = topic.trim();
    let questions = (0..question_count)
        .map(|i| {
            let template = &QUESTION_TEMPLATES[i % QUESTION_TEMPLATES.len()];
            let round = i / QUESTION_TEMPLATES.len();
            let correct_index = i % OPTION_LETTERS.len();

            let mut texts: Vec<String> = template
                .distractors
                .iter()
                .map(|d| fill(d, topic))
                .collect();
            texts.insert(correct_index, fill(template.correct, topic));

            let options = OPTION_LETTERS
                .iter()
                .zip(texts)
                .map(|(letter, text)| QuizOption {
                    letter: letter.to_string(),
                    text,
                })
                .collect();

            let mut question = fill(template.question, topic);
            if round > 0 {
                question = format!("{} (review {})", question, round + 1);
            }

            QuizQuestion {
                id: (i + 1) as u32,
                question,
                options,
                correct_answer: OPTION_LETTERS[correct_index].to_string(),
                explanation: fill(template.explanation, topic),
            }
        })
        .collect();

    Quiz {
        title: format!("{} Quiz", topic),
        topic: topic.to_string(),
        difficulty,
        questions,
    }
}

/// A fixed-structure study manual for `topic`.
pub fn fallback_manual(topic: &str) -> Manual {
    let topic = topic.trim();
    Manual {
        title: format!("{} Study Manual", topic),
        topic: topic.to_string(),
        sections: vec![
            ManualSection {
                heading: "Overview".to_string(),
                body: format!(
                    "This manual introduces {topic}: what it is, why it matters, and how its main parts fit together."
                ),
            },
            ManualSection {
                heading: "Key Concepts".to_string(),
                body: format!(
                    "Start with the core vocabulary of {topic}. Define each term, note how it relates to the others, and collect one example for each."
                ),
            },
            ManualSection {
                heading: "Study Tips".to_string(),
                body: format!(
                    "Explain {topic} in your own words, test yourself with practice questions, and revisit the material over several short sessions."
                ),
            },
        ],
    }
}

/// Build a stand-in result for a workflow step from the step's own input.
///
/// Returns `None` for operations with no local equivalent.
pub fn synthesize(operation: &str, input: &serde_json::Value) -> Option<serde_json::Value> {
    let topic = input
        .get("topic")
        .and_then(|t| t.as_str())
        .filter(|t| !t.trim().is_empty())
        .unwrap_or("General Knowledge");

    match operation {
        "generate_quiz" => {
            let count = input
                .get("question_count")
                .and_then(|c| c.as_u64())
                .map(|c| (c as usize).clamp(1, MAX_QUESTION_COUNT))
                .unwrap_or(DEFAULT_QUESTION_COUNT);
            let difficulty = input
                .get("difficulty")
                .cloned()
                .and_then(|d| serde_json::from_value(d).ok())
                .unwrap_or_default();
            serde_json::to_value(fallback_quiz(topic, count, difficulty)).ok()
        }
        "generate_manual" => serde_json::to_value(fallback_manual(topic)).ok(),
        "outline_manual" => {
            let manual = fallback_manual(topic);
            Some(serde_json::json!({
                "title": manual.title,
                "topic": manual.topic,
                "headings": manual.sections.iter().map(|s| s.heading.clone()).collect::<Vec<_>>(),
            }))
        }
        _ => None,
    }
}

fn fill(template: &str, topic: &str) -> String {
    template.replace("{topic}", topic)
}
