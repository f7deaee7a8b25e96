//! Anthropic Messages API client.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{Config, DEFAULT_ANTHROPIC_MODEL};
use crate::suggest::{CompletionClient, SuggestError, SuggestResult};

/// Configuration for the Anthropic client.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// Base URL for the API.
    pub base_url: String,
    /// Model name to use.
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.anthropic.com".into(),
            model: DEFAULT_ANTHROPIC_MODEL.into(),
            max_tokens: 150,
            temperature: 0.0,
            timeout_secs: 60,
        }
    }
}

const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

/// Blocking client for `POST /v1/messages`.
pub struct AnthropicClient {
    config: AnthropicConfig,
    api_key: String,
    agent: ureq::Agent,
}

impl AnthropicClient {
    pub fn new(config: AnthropicConfig, api_key: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();
        Self {
            config,
            api_key: api_key.into(),
            agent,
        }
    }

    /// Client using the model and key from the run configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            AnthropicConfig {
                model: config.anthropic_model.clone(),
                ..Default::default()
            },
            config.anthropic_api_key.clone(),
        )
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

impl CompletionClient for AnthropicClient {
    fn complete(&self, system: &str, prompt: &str) -> SuggestResult<String> {
        let url = format!("{}/v1/messages", self.config.base_url);
        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            system,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let resp = self
            .agent
            .post(&url)
            .set("x-api-key", &self.api_key)
            .set("anthropic-version", API_VERSION)
            .set("content-type", "application/json")
            .send_json(&request)
            .map_err(|e| match e {
                ureq::Error::Status(code, resp) => {
                    let body = resp.into_string().unwrap_or_default();
                    SuggestError::Api {
                        message: format!("status {code}: {}", api_error_message(&body)),
                    }
                }
                ureq::Error::Transport(transport) => SuggestError::Api {
                    message: transport.to_string(),
                },
            })?;

        let parsed: MessagesResponse = resp.into_json().map_err(|e| SuggestError::Api {
            message: format!("invalid response body: {e}"),
        })?;

        let text = parsed
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text)
            .collect::<Vec<_>>()
            .join("\n");
        Ok(text)
    }
}

/// Pull `error.message` out of an API error body, or return the body as-is.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.trim().to_string())
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = AnthropicConfig::default();
        assert_eq!(config.base_url, "https://api.anthropic.com");
        assert_eq!(config.model, DEFAULT_ANTHROPIC_MODEL);
        assert_eq!(config.max_tokens, 150);
        assert_eq!(config.temperature, 0.0);
    }

    #[test]
    fn from_config_uses_configured_model() {
        let config = Config::from_lookup(|name| match name {
            "ZOTERO_LIBRARY_ID" => Some("1".into()),
            "ZOTERO_API_KEY" => Some("zk".into()),
            "ANTHROPIC_API_KEY" => Some("ak".into()),
            "ANTHROPIC_MODEL" => Some("claude-test".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(AnthropicClient::from_config(&config).model(), "claude-test");
    }

    #[test]
    fn request_shape() {
        let request = MessagesRequest {
            model: "m",
            max_tokens: 150,
            temperature: 0.0,
            system: "sys",
            messages: vec![Message {
                role: "user",
                content: "hi",
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["system"], "sys");
        assert_eq!(json["max_tokens"], 150);
    }

    #[test]
    fn response_text_blocks() {
        let body = r#"{"id":"msg_1","content":[{"type":"text","text":"Biosecurity\nSecurity"}],"stop_reason":"end_turn"}"#;
        let parsed: MessagesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.content.len(), 1);
        assert_eq!(parsed.content[0].text, "Biosecurity\nSecurity");
    }

    #[test]
    fn error_message_extracted() {
        let body = r#"{"type":"error","error":{"type":"rate_limit_error","message":"Too many requests"}}"#;
        assert_eq!(api_error_message(body), "Too many requests");
        assert_eq!(api_error_message("plain text"), "plain text");
    }

    #[test]
    fn unreachable_api_is_api_error() {
        let client = AnthropicClient::new(
            AnthropicConfig {
                base_url: "http://127.0.0.1:1".into(),
                timeout_secs: 2,
                ..Default::default()
            },
            "key",
        );
        let err = client.complete("sys", "prompt").unwrap_err();
        assert!(matches!(err, SuggestError::Api { .. }));
    }

    #[test]
    fn debug_hides_key() {
        let client = AnthropicClient::new(AnthropicConfig::default(), "sk-secret");
        assert!(!format!("{client:?}").contains("sk-secret"));
    }
}
