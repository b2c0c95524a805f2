//! OpenAI-compatible chat completions adapter.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::EnrichmentError;
use crate::traits::LanguageModel;

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    /// Per-call timeout. A call that exceeds it falls back locally.
    pub timeout_secs: u64,
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            timeout_secs: 20,
            max_tokens: 1024,
        }
    }
}

impl LlmConfig {
    /// Defaults overridden by `TRIP_PLANNER_LLM_URL`, `TRIP_PLANNER_LLM_MODEL`,
    /// `OPENAI_API_KEY` and `TRIP_PLANNER_LLM_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let var = |name: &str| env::var(name).ok().filter(|value| !value.trim().is_empty());
        Self {
            base_url: var("TRIP_PLANNER_LLM_URL").unwrap_or(defaults.base_url),
            model: var("TRIP_PLANNER_LLM_MODEL").unwrap_or(defaults.model),
            api_key: var("OPENAI_API_KEY"),
            timeout_secs: var("TRIP_PLANNER_LLM_TIMEOUT_SECS")
                .and_then(|value| value.parse().ok())
                .unwrap_or(defaults.timeout_secs),
            max_tokens: defaults.max_tokens,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatClient {
    config: LlmConfig,
    client: reqwest::blocking::Client,
}

impl ChatClient {
    pub fn new(config: LlmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }
}

impl LanguageModel for ChatClient {
    fn complete(&self, system: &str, prompt: &str) -> Result<String, EnrichmentError> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let body = ChatRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let mut request = self.client.post(url).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response: ChatResponse = request.send()?.error_for_status()?.json()?;
        first_content(response)
    }
}

fn first_content(response: ChatResponse) -> Result<String, EnrichmentError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(EnrichmentError::EmptyCompletion)
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let body = ChatRequest {
            model: "gpt-4o-mini",
            max_tokens: 64,
            messages: [
                ChatMessage {
                    role: "system",
                    content: "sys",
                },
                ChatMessage {
                    role: "user",
                    content: "hi",
                },
            ],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "hi");
    }

    #[test]
    fn test_first_content() {
        let response: ChatResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"role": "assistant", "content": "{}"}}]}"#).unwrap();
        assert_eq!(first_content(response).unwrap(), "{}");
    }

    #[test]
    fn test_empty_choices_is_error() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(first_content(response), Err(EnrichmentError::EmptyCompletion)));

        let response: ChatResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap();
        assert!(matches!(first_content(response), Err(EnrichmentError::EmptyCompletion)));
    }

    #[test]
    fn test_unreachable_endpoint_is_http_error() {
        let client = ChatClient::new(LlmConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 1,
            ..LlmConfig::default()
        })
        .unwrap();
        assert!(matches!(client.complete("s", "p"), Err(EnrichmentError::Http(_))));
    }
}
