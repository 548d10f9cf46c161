//! A2A Agent Client — talks to sibling agents over HTTP.
//!
//! Each agent exposes:
//!
//! - `GET  {agent}/.well-known/agent.json` — agent card (name, skills)
//! - `GET  {agent}/health`                 — liveness
//! - `POST {agent}/tasks/send`             — start a task for a skill
//! - `GET  {agent}/tasks/{id}`             — poll a running task
//!
//! A task finishes with a list of named artifacts; the caller picks the one
//! it expects (e.g. `quiz.json`) and gets its JSON payload back.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::AgentCard;

pub const AGENT_CARD_PATH: &str = "/.well-known/agent.json";
pub const HEALTH_PATH: &str = "/health";

#[derive(Debug, thiserror::Error)]
pub enum AgentCallError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("unexpected response from {url}: {message}")]
    Protocol { url: String, message: String },

    #[error("task {task_id} failed: {message}")]
    TaskFailed { task_id: String, message: String },

    #[error("circuit breaker open for agent {agent_id}")]
    CircuitOpen { agent_id: String },
}

impl AgentCallError {
    fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AgentCallError::Timeout {
                url: url.to_string(),
            }
        } else {
            AgentCallError::Transport {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
    Submitted,
    Working,
    InputRequired,
    Completed,
    Failed,
    Canceled,
}

impl TaskState {
    /// Only submitted and working tasks are worth polling. An agent asking
    /// for input will not finish on its own.
    pub fn needs_polling(&self) -> bool {
        matches!(self, Self::Submitted | Self::Working)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatus {
    pub state: TaskState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Part {
    Text { text: String },
    Data { data: serde_json::Value },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct A2aTask {
    pub id: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
}

impl A2aTask {
    /// Decode the artifact named `name` (or the first artifact when none
    /// matches) into JSON. Text parts must contain JSON.
    pub fn artifact_json(&self, name: &str) -> Result<serde_json::Value, String> {
        let artifact = self
            .artifacts
            .iter()
            .find(|a| a.name.as_deref() == Some(name))
            .or_else(|| self.artifacts.first())
            .ok_or_else(|| format!("task {} completed without artifacts", self.id))?;

        let part = artifact
            .parts
            .first()
            .ok_or_else(|| format!("artifact {:?} has no parts", artifact.name))?;

        match part {
            Part::Data { data } => Ok(data.clone()),
            Part::Text { text } => serde_json::from_str(strip_code_fence(text))
                .map_err(|e| format!("artifact {:?} is not valid JSON: {}", artifact.name, e)),
        }
    }
}

/// Agents backed by an LLM sometimes wrap JSON in a markdown code fence.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[derive(Debug, Clone, Serialize)]
struct SendTaskRequest<'a> {
    id: String,
    skill: &'a str,
    input: &'a serde_json::Value,
}

/// Polling behaviour for long-running tasks.
#[derive(Debug, Clone)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_polls: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            max_polls: 20,
        }
    }
}

/// HTTP client for the agent protocol.
#[derive(Clone)]
pub struct A2aClient {
    client: reqwest::Client,
    poll: PollSettings,
}

impl A2aClient {
    pub fn new(request_timeout: Duration, poll: PollSettings) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(request_timeout)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            poll,
        }
    }

    /// Fetch the agent card, giving up after `timeout`.
    pub async fn fetch_card(
        &self,
        agent_url: &str,
        timeout: Duration,
    ) -> Result<AgentCard, AgentCallError> {
        let url = format!("{}{}", agent_url, AGENT_CARD_PATH);
        let response = self
            .client
            .get(&url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| AgentCallError::from_reqwest(&url, e))?;

        if !response.status().is_success() {
            return Err(AgentCallError::Status {
                url,
                status: response.status().as_u16(),
            });
        }

        response
            .json::<AgentCard>()
            .await
            .map_err(|e| AgentCallError::Protocol {
                url,
                message: e.to_string(),
            })
    }

    /// Any 2xx from the health endpoint counts as healthy.
    pub async fn check_health(
        &self,
        agent_url: &str,
        timeout: Duration,
    ) -> Result<(), AgentCallError> {
        let url = format!("{}{}", agent_url, HEALTH_PATH);
        let response = self
            .client
            .get(&url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| AgentCallError::from_reqwest(&url, e))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(AgentCallError::Status {
                url,
                status: response.status().as_u16(),
            })
        }
    }

    /// Run `skill` on the agent and return the JSON of the expected artifact.
    ///
    /// Tasks that come back non-terminal are polled until they finish or the
    /// poll budget is spent.
    pub async fn send_task(
        &self,
        agent_url: &str,
        skill: &str,
        input: &serde_json::Value,
        artifact: &str,
    ) -> Result<serde_json::Value, AgentCallError> {
        let url = format!("{}/tasks/send", agent_url);
        let request = SendTaskRequest {
            id: uuid::Uuid::new_v4().to_string(),
            skill,
            input,
        };

        tracing::info!("[A2A] Sending task {} ({}) to {}", request.id, skill, agent_url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentCallError::from_reqwest(&url, e))?;

        let mut task = self.read_task(&url, response).await?;

        let mut polls = 0;
        while task.status.state.needs_polling() {
            if polls >= self.poll.max_polls {
                return Err(AgentCallError::Timeout {
                    url: format!("{}/tasks/{}", agent_url, task.id),
                });
            }
            polls += 1;
            tokio::time::sleep(self.poll.interval).await;

            let poll_url = format!("{}/tasks/{}", agent_url, task.id);
            tracing::debug!("[A2A] Polling task {} (attempt {})", task.id, polls);
            let response = self
                .client
                .get(&poll_url)
                .send()
                .await
                .map_err(|e| AgentCallError::from_reqwest(&poll_url, e))?;
            task = self.read_task(&poll_url, response).await?;
        }

        match task.status.state {
            TaskState::Completed => task
                .artifact_json(artifact)
                .map_err(|message| AgentCallError::Protocol { url, message }),
            TaskState::InputRequired => Err(AgentCallError::TaskFailed {
                task_id: task.id.clone(),
                message: task
                    .status
                    .message
                    .clone()
                    .unwrap_or_else(|| "agent requested additional input".to_string()),
            }),
            _ => Err(AgentCallError::TaskFailed {
                task_id: task.id.clone(),
                message: task
                    .status
                    .message
                    .clone()
                    .unwrap_or_else(|| format!("task ended in state {:?}", task.status.state)),
            }),
        }
    }

    async fn read_task(
        &self,
        url: &str,
        response: reqwest::Response,
    ) -> Result<A2aTask, AgentCallError> {
        let status = response.status();
        if !status.is_success() {
            return Err(AgentCallError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response
            .json::<A2aTask>()
            .await
            .map_err(|e| AgentCallError::Protocol {
                url: url.to_string(),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed_task(artifacts: serde_json::Value) -> A2aTask {
        serde_json::from_value(serde_json::json!({
            "id": "t-1",
            "status": { "state": "completed" },
            "artifacts": artifacts,
        }))
        .unwrap()
    }

    #[test]
    fn test_artifact_by_name_from_text_part() {
        let task = completed_task(serde_json::json!([
            { "name": "notes.txt", "parts": [{ "type": "text", "text": "not json" }] },
            { "name": "quiz.json", "parts": [{ "type": "text", "text": "```json\n{\"title\":\"T\"}\n```" }] }
        ]));
        let value = task.artifact_json("quiz.json").unwrap();
        assert_eq!(value["title"], "T");
    }

    #[test]
    fn test_artifact_falls_back_to_first_data_part() {
        let task = completed_task(serde_json::json!([
            { "name": "result", "parts": [{ "type": "data", "data": { "ok": true } }] }
        ]));
        assert_eq!(task.artifact_json("quiz.json").unwrap()["ok"], true);
    }

    #[test]
    fn test_artifact_parse_failure_is_reported() {
        let task = completed_task(serde_json::json!([
            { "name": "quiz.json", "parts": [{ "type": "text", "text": "{broken" }] }
        ]));
        assert!(task.artifact_json("quiz.json").unwrap_err().contains("not valid JSON"));

        let empty = completed_task(serde_json::json!([]));
        assert!(empty.artifact_json("quiz.json").is_err());
    }

    #[test]
    fn test_task_state_wire_format() {
        let status: TaskStatus =
            serde_json::from_value(serde_json::json!({ "state": "input-required" })).unwrap();
        assert_eq!(status.state, TaskState::InputRequired);
        assert!(!status.state.needs_polling());
        assert!(TaskState::Working.needs_polling());
        assert!(!TaskState::Canceled.needs_polling());
    }

    /// Serve exactly one HTTP response, then stop accepting connections.
    async fn serve_once(body: serde_json::Value) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())?
                        })
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }
            let payload = body.to_string();
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                payload.len(),
                payload
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_input_required_fails_without_polling() {
        let agent = serve_once(serde_json::json!({
            "id": "t-9",
            "status": { "state": "input-required", "message": "which chapter?" },
            "artifacts": []
        }))
        .await;
        let client = A2aClient::new(
            Duration::from_secs(2),
            PollSettings {
                interval: Duration::from_millis(10),
                max_polls: 3,
            },
        );

        let err = client
            .send_task(&agent, "generate_quiz", &serde_json::json!({}), "quiz.json")
            .await
            .unwrap_err();
        match err {
            AgentCallError::TaskFailed { task_id, message } => {
                assert_eq!(task_id, "t-9");
                assert_eq!(message, "which chapter?");
            }
            other => panic!("expected TaskFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_agent_is_transport_error() {
        let client = A2aClient::new(Duration::from_secs(2), PollSettings::default());
        let err = client
            .send_task("http://127.0.0.1:1", "generate_quiz", &serde_json::json!({}), "quiz.json")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AgentCallError::Transport { .. } | AgentCallError::Timeout { .. }
        ));
    }
}
