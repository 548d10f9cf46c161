//! Weighted agent selection for free-form queries.
//!
//! score = 0.6 × capability match + 0.25 × liveness + 0.15 × breaker availability
//!
//! Only agents with a non-zero capability match can be selected.

use serde::Serialize;

use crate::breaker::{CircuitBreakers, CircuitState};
use crate::models::Agent;

const CAPABILITY_WEIGHT: f64 = 0.6;
const LIVENESS_WEIGHT: f64 = 0.25;
const BREAKER_WEIGHT: f64 = 0.15;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredAgent {
    pub agent_id: String,
    pub name: String,
    pub score: f64,
    pub matched_capabilities: Vec<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSelection {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<ScoredAgent>,
    pub candidates: Vec<ScoredAgent>,
}

pub fn select_agent(query: &str, agents: &[Agent], breakers: &CircuitBreakers) -> AgentSelection {
    let query_tokens = tokenize(query);

    let mut candidates: Vec<ScoredAgent> = agents
        .iter()
        .map(|agent| score_agent(agent, &query_tokens, breakers))
        .collect();

    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });

    let selected = candidates
        .iter()
        .find(|c| !c.matched_capabilities.is_empty())
        .cloned();

    AgentSelection {
        query: query.to_string(),
        selected,
        candidates,
    }
}

fn score_agent(agent: &Agent, query_tokens: &[String], breakers: &CircuitBreakers) -> ScoredAgent {
    let matched: Vec<String> = agent
        .capabilities
        .iter()
        .filter(|cap| tokenize(cap).iter().any(|t| query_tokens.contains(t)))
        .cloned()
        .collect();

    let capability_score = if agent.capabilities.is_empty() {
        0.0
    } else {
        matched.len() as f64 / agent.capabilities.len() as f64
    };
    let breaker_open = breakers.state(&agent.id) == CircuitState::Open;
    let breaker_score = if breaker_open { 0.0 } else { 1.0 };

    let score = CAPABILITY_WEIGHT * capability_score
        + LIVENESS_WEIGHT * agent.status.liveness()
        + BREAKER_WEIGHT * breaker_score;

    let reason = if matched.is_empty() {
        format!("no capability matches the query (status {})", agent.status.as_str())
    } else {
        format!(
            "matches {} (status {}, breaker {})",
            matched.join(", "),
            agent.status.as_str(),
            if breaker_open { "open" } else { "available" }
        )
    };

    ScoredAgent {
        agent_id: agent.id.clone(),
        name: agent.name.clone(),
        score: (score * 1000.0).round() / 1000.0,
        matched_capabilities: matched,
        reason,
    }
}

/// Lowercase alphanumeric words of three or more characters, with a plural
/// `s` dropped so "quizzes"/"quiz" and "manuals"/"manual" line up.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() >= 3)
        .map(|w| normalize_word(&w.to_lowercase()))
        .collect()
}

fn normalize_word(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("zes") {
        return stem.to_string();
    }
    if word.len() > 3 && word.ends_with('s') && !word.ends_with("ss") {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breaker::CircuitBreakerConfig;
    use crate::models::AgentStatus;

    fn agent(id: &str, name: &str, caps: &[&str], status: AgentStatus) -> Agent {
        let mut a = Agent::unknown(id);
        a.name = name.to_string();
        a.capabilities = caps.iter().map(|c| c.to_string()).collect();
        a.status = status;
        a
    }

    fn agents() -> Vec<Agent> {
        vec![
            agent(
                "http://quiz",
                "Quiz Agent",
                &["generate_quiz", "quiz", "assessment"],
                AgentStatus::Online,
            ),
            agent(
                "http://manual",
                "Manual Agent",
                &["generate_manual", "manual", "documentation"],
                AgentStatus::Online,
            ),
        ]
    }

    #[test]
    fn test_tokenize_normalizes_plurals() {
        assert_eq!(tokenize("Make quizzes!"), vec!["make", "quiz"]);
        assert_eq!(tokenize("user manuals, a b"), vec!["user", "manual"]);
        assert_eq!(tokenize("class"), vec!["class"]);
    }

    #[test]
    fn test_selects_matching_agent() {
        let breakers = CircuitBreakers::new(CircuitBreakerConfig::default());
        let selection = select_agent("Create a quiz about photosynthesis", &agents(), &breakers);

        let selected = selection.selected.unwrap();
        assert_eq!(selected.agent_id, "http://quiz");
        assert_eq!(selected.matched_capabilities, vec!["generate_quiz", "quiz"]);
        assert_eq!(selection.candidates.len(), 2);
        assert!(selection.candidates[0].score > selection.candidates[1].score);
    }

    #[test]
    fn test_no_match_selects_nothing() {
        let breakers = CircuitBreakers::new(CircuitBreakerConfig::default());
        let selection = select_agent("what's the weather", &agents(), &breakers);
        assert!(selection.selected.is_none());
        assert_eq!(selection.candidates.len(), 2);
    }

    #[test]
    fn test_offline_and_open_breaker_lower_the_score() {
        let breakers = CircuitBreakers::new(CircuitBreakerConfig {
            failure_threshold: 1,
            ..Default::default()
        });
        let mut list = agents();
        list.push(agent(
            "http://quiz-2",
            "Backup Quiz Agent",
            &["generate_quiz", "quiz", "assessment"],
            AgentStatus::Offline,
        ));
        breakers.record_failure("http://quiz");

        let selection = select_agent("quiz me", &list, &breakers);
        let quiz = selection
            .candidates
            .iter()
            .find(|c| c.agent_id == "http://quiz")
            .unwrap();
        let backup = selection
            .candidates
            .iter()
            .find(|c| c.agent_id == "http://quiz-2")
            .unwrap();
        // online + open breaker (0.25) beats offline + closed breaker (0.15)
        assert!(quiz.score > backup.score);
        assert!(quiz.reason.contains("breaker open"));
    }
}
