//! HTTP completion service for OpenAI-compatible chat APIs.

use crate::defaults;
use crate::error::{AssistError, Result};
use crate::llm::completion::{ChatTurn, CompletionService, GenerationParams};
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

/// Configuration for the remote completion service.
#[derive(Debug, Clone)]
pub struct RemoteCompletionConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for RemoteCompletionConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::DEFAULT_COMPLETION_BASE_URL.to_string(),
            api_key: String::new(),
            model: defaults::DEFAULT_MODEL.to_string(),
            timeout: defaults::REQUEST_TIMEOUT,
        }
    }
}

/// Chat completion client for OpenAI-compatible endpoints.
pub struct RemoteCompletionService {
    config: RemoteCompletionConfig,
    client: Client,
}

impl RemoteCompletionService {
    /// Builds the client with auth headers and request timeout applied.
    pub fn new(config: RemoteCompletionConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if !config.api_key.is_empty() {
            let value = HeaderValue::from_str(&format!("Bearer {}", config.api_key)).map_err(
                |e| AssistError::ConfigInvalidValue {
                    key: "api_key".to_string(),
                    message: format!("not a valid header value: {}", e),
                },
            )?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| AssistError::Completion {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    /// Sends a trivial round-trip request to verify credentials and
    /// connectivity.
    pub fn test_connection(&self) -> Result<bool> {
        let turns = [ChatTurn::user(
            "Respond with \"Connection successful\" if you can see this message.",
        )];
        let reply = self.complete(&turns, &GenerationParams::default())?;
        Ok(reply.contains("Connection successful") || reply.contains("successful"))
    }
}

impl CompletionService for RemoteCompletionService {
    fn complete(&self, turns: &[ChatTurn], params: &GenerationParams) -> Result<String> {
        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages: turns,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            top_p: params.top_p,
            frequency_penalty: params.frequency_penalty,
            presence_penalty: params.presence_penalty,
        };

        let response = self
            .client
            .post(self.endpoint())
            .json(&request)
            .send()
            .map_err(|e| AssistError::Completion {
                message: format!("HTTP request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "failed to read error response".to_string());
            return Err(AssistError::Completion {
                message: format!("status {}: {}", status, body),
            });
        }

        let completion: ChatCompletionResponse =
            response.json().map_err(|e| AssistError::Completion {
                message: format!("failed to parse response: {}", e),
            })?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AssistError::Completion {
                message: "response contained no content".to_string(),
            })
    }

    fn name(&self) -> &'static str {
        "remote-completion"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::completion::Role;

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let service = RemoteCompletionService::new(RemoteCompletionConfig {
            base_url: "https://example.test/v1/".to_string(),
            api_key: "k".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(service.endpoint(), "https://example.test/v1/chat/completions");
    }

    #[test]
    fn test_request_serialization_includes_fixed_params() {
        let turns = vec![ChatTurn::system("sys"), ChatTurn::user("q")];
        let params = GenerationParams::default();
        let request = ChatCompletionRequest {
            model: "test-model",
            messages: &turns,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            top_p: params.top_p,
            frequency_penalty: params.frequency_penalty,
            presence_penalty: params.presence_penalty,
        };

        let json: serde_json::Value = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "test-model");
        assert_eq!(json["max_tokens"], 500);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "q");
        assert!((json["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"hi there"}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("hi there")
        );
    }

    #[test]
    fn test_response_parsing_null_content() {
        let body = r#"{"choices":[{"message":{"content":null}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }

    #[test]
    fn test_chat_turn_helpers() {
        assert_eq!(ChatTurn::system("a").role, Role::System);
        assert_eq!(ChatTurn::user("b").role, Role::User);
        assert_eq!(ChatTurn::assistant("c").role, Role::Assistant);
    }

    #[test]
    fn test_invalid_api_key_header_is_config_error() {
        let result = RemoteCompletionService::new(RemoteCompletionConfig {
            api_key: "bad\nkey".to_string(),
            ..Default::default()
        });
        assert!(matches!(
            result,
            Err(AssistError::ConfigInvalidValue { .. })
        ));
    }
}
