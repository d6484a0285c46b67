//! ABOUTME: LLM provider abstraction — mirrors llmspell-providers::ProviderInstance,
//! ABOUTME: narrowed to the single "complete this prompt, get text back" operation
//! ABOUTME: the Agent Runtime needs.

use async_trait::async_trait;
use flowcraft_core::error::{FlowError, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;

/// A provider that turns a rendered prompt into raw text. Structured-output
/// parsing and schema validation happen one layer up, in the runtime — the
/// provider itself is prompt-in, text-out.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete(&self, system: Option<&str>, prompt: &str) -> Result<String>;

    fn name(&self) -> &str;
}

pub struct HttpLlmProviderConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl HttpLlmProviderConfig {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// OpenAI-compatible chat completions client. Temperature is fixed low per
/// the determinism contract; callers never set it per-call.
pub struct HttpLlmProvider {
    http: reqwest::Client,
    config: HttpLlmProviderConfig,
}

const FIXED_TEMPERATURE: f64 = 0.1;

impl HttpLlmProvider {
    pub fn new(config: HttpLlmProviderConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();
        Self { http, config }
    }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageOut,
}

#[derive(Deserialize)]
struct ChatMessageOut {
    content: String,
}

#[async_trait]
impl LlmProvider for HttpLlmProvider {
    #[instrument(skip(self, prompt))]
    async fn complete(&self, system: Option<&str>, prompt: &str) -> Result<String> {
        let mut messages = Vec::new();
        if let Some(system) = system {
            messages.push(serde_json::json!({ "role": "system", "content": system }));
        }
        messages.push(serde_json::json!({ "role": "user", "content": prompt }));

        let body = serde_json::json!({
            "model": self.config.model,
            "temperature": FIXED_TEMPERATURE,
            "response_format": { "type": "json_object" },
            "messages": messages,
        });

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| FlowError::Agent {
                message: format!("LLM transport error: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(FlowError::Agent {
                message: format!("LLM provider returned status {}", response.status()),
            });
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|e| FlowError::Agent {
            message: format!("LLM response shape error: {e}"),
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| FlowError::Agent {
                message: "LLM provider returned no choices".to_string(),
            })
    }

    fn name(&self) -> &str {
        "http"
    }
}
