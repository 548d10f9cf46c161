//! LLM Client — chat completions against an OpenAI-compatible endpoint.
//!
//! POST {base_url}/chat/completions
//! Headers:
//!   Authorization: Bearer {api_key}
//!   content-type: application/json

use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::ServerError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LlmMessage {
    pub role: String,
    pub content: String,
}

impl LlmMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmResponse {
    pub content: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u64>,
}

pub struct LlmClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_millis(config.timeout_ms))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            config,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    pub async fn complete(&self, messages: &[LlmMessage]) -> Result<LlmResponse, ServerError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                ServerError::Internal(
                    "No LLM API key found. Set QUIZMESH_LLM_API_KEY or OPENAI_API_KEY.".to_string(),
                )
            })?;

        if messages.is_empty() {
            return Err(ServerError::BadRequest("messages must not be empty".to_string()));
        }

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": messages,
        });

        tracing::info!("[Llm] Calling chat completions: {} (model: {})", url, self.config.model);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ServerError::Upstream(format!("LLM request failed: {}", e)))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| ServerError::Upstream(format!("Failed to read LLM response: {}", e)))?;

        if !status.is_success() {
            return Err(ServerError::Upstream(format!(
                "LLM API returned {}: {}",
                status, response_text
            )));
        }

        let json: serde_json::Value = serde_json::from_str(&response_text)
            .map_err(|e| ServerError::Upstream(format!("Failed to parse LLM response: {}", e)))?;

        parse_completion(&json, &self.config.model)
    }
}

fn parse_completion(json: &serde_json::Value, default_model: &str) -> Result<LlmResponse, ServerError> {
    let content = json
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|msg| msg.get("content"))
        .and_then(|c| c.as_str())
        .ok_or_else(|| ServerError::Upstream("LLM response has no message content".to_string()))?
        .to_string();

    let usage = json.get("usage");

    Ok(LlmResponse {
        content,
        model: json
            .get("model")
            .and_then(|m| m.as_str())
            .unwrap_or(default_model)
            .to_string(),
        input_tokens: usage
            .and_then(|u| u.get("prompt_tokens").or_else(|| u.get("input_tokens")))
            .and_then(|v| v.as_u64()),
        output_tokens: usage
            .and_then(|u| u.get("completion_tokens").or_else(|| u.get("output_tokens")))
            .and_then(|v| v.as_u64()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_completion() {
        let json = serde_json::json!({
            "model": "gpt-4o-mini-2024",
            "choices": [{ "message": { "role": "assistant", "content": "Hello" } }],
            "usage": { "prompt_tokens": 12, "completion_tokens": 3 }
        });
        let resp = parse_completion(&json, "gpt-4o-mini").unwrap();
        assert_eq!(resp.content, "Hello");
        assert_eq!(resp.model, "gpt-4o-mini-2024");
        assert_eq!(resp.input_tokens, Some(12));
        assert_eq!(resp.output_tokens, Some(3));
    }

    #[test]
    fn test_parse_completion_without_content_is_upstream_error() {
        let json = serde_json::json!({ "choices": [] });
        assert!(matches!(
            parse_completion(&json, "m"),
            Err(ServerError::Upstream(_))
        ));
    }

    #[tokio::test]
    async fn test_unconfigured_client_refuses() {
        let client = LlmClient::new(LlmConfig::default());
        assert!(!client.is_configured());
        let err = client.complete(&[LlmMessage::user("hi")]).await.unwrap_err();
        assert!(err.to_string().contains("API key"));
    }
}
