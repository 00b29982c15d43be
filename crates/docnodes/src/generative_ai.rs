use async_trait::async_trait;
use doccore::{NodeError, NodeKind, NodeProcessor, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Returned when the upstream call succeeds but the model produced no
/// content; a valid result, distinct from a malformed response.
pub const EMPTY_AI_RESPONSE: &str = "AI returned an empty response";

/// Free-tier model used when the node config names none
pub const DEFAULT_MODEL: &str = "google/gemma-3n-e2b-it:free";

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
const DEFAULT_MAX_TOKENS: u32 = 1000;
const DEFAULT_TEMPERATURE: f64 = 0.7;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for the OpenRouter chat-completions endpoint
#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl OpenRouterConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Read `OPENROUTER_API_KEY` and `OPENROUTER_BASE_URL` from the
    /// environment. A missing key is reported when a node first tries
    /// to use it, not here.
    pub fn from_env() -> Self {
        let mut config = Self::new(std::env::var("OPENROUTER_API_KEY").unwrap_or_default());
        if let Ok(base_url) = std::env::var("OPENROUTER_BASE_URL") {
            config.base_url = base_url;
        }
        config
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Text generation node backed by OpenRouter's chat-completions API.
///
/// The node's `prompt` is mandatory; the running pipeline input, when
/// present, is appended to it separated by a blank line.
pub struct GenerativeAiProcessor {
    client: reqwest::Client,
    config: OpenRouterConfig,
}

impl GenerativeAiProcessor {
    pub fn new(config: OpenRouterConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl NodeProcessor for GenerativeAiProcessor {
    fn kind(&self) -> NodeKind {
        NodeKind::GenerativeAi
    }

    async fn process(
        &self,
        config: &HashMap<String, Value>,
        input: Option<&str>,
    ) -> Result<String, NodeError> {
        let prompt = match config.get("prompt") {
            Some(Value::String(p)) if !p.trim().is_empty() => p.as_str(),
            Some(Value::String(_)) => {
                return Err(NodeError::InvalidInput("prompt must not be empty".into()))
            }
            Some(_) => return Err(NodeError::InvalidInput("prompt must be a string".into())),
            None => {
                return Err(NodeError::InvalidInput(
                    "generative_ai node requires a prompt".into(),
                ))
            }
        };

        if self.config.api_key.is_empty() {
            return Err(NodeError::Upstream(
                "OpenRouter API key is not configured".into(),
            ));
        }

        let model = config
            .get("model")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_MODEL);
        let max_tokens = config
            .get("max_tokens")
            .and_then(Value::as_f64)
            .map(|n| n as u32)
            .unwrap_or(DEFAULT_MAX_TOKENS);
        let temperature = config
            .get("temperature")
            .and_then(Value::as_f64)
            .unwrap_or(DEFAULT_TEMPERATURE);

        let full_prompt = match input {
            Some(text) if !text.is_empty() => format!("{prompt}\n\n{text}"),
            _ => prompt.to_string(),
        };

        let request = ChatRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: &full_prompt,
            }],
            max_tokens,
            temperature,
        };

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        tracing::debug!("Calling {} with model {}", url, model);

        let response = self
            .client
            .post(&url)
            .timeout(self.config.timeout)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NodeError::Upstream(format!(
                        "request timed out after {}s",
                        self.config.timeout.as_secs()
                    ))
                } else {
                    NodeError::Upstream(format!("request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| NodeError::Upstream(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(NodeError::Upstream(format!("HTTP {status}: {body}")));
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|_| NodeError::Upstream(format!("unexpected response shape: {body}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                NodeError::Upstream("response did not contain message content".into())
            })?;

        if content.is_empty() {
            Ok(EMPTY_AI_RESPONSE.to_string())
        } else {
            Ok(content)
        }
    }
}
