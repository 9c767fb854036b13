//! OpenAI-compatible chat completions backend.
//!
//! Works with any server implementing `POST {api_url}/chat/completions`:
//! - Gemini (`https://generativelanguage.googleapis.com/v1beta/openai`)
//! - OpenAI (`https://api.openai.com/v1`)
//! - Ollama (`http://localhost:11434/v1`), vLLM, llama.cpp server, etc.

use crate::config::LlmConfig;
use crate::error::{AgentError, Result};
use crate::llm::{ChatMessage, LanguageModel};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// LLM backend using an OpenAI-compatible HTTP API.
pub struct OpenAiCompatLlm {
    config: LlmConfig,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatLlm {
    /// Create a client, reading the API key from `config.api_key_env`.
    ///
    /// A missing variable yields an empty key; no Authorization header is
    /// sent in that case.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = if config.api_key_env.is_empty() {
            String::new()
        } else {
            std::env::var(&config.api_key_env).unwrap_or_default()
        };
        Self::with_api_key(config, api_key)
    }

    /// Create a client with an explicit API key.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_api_key(config: &LlmConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()
            .map_err(|e| AgentError::Llm(format!("failed to build HTTP client: {e}")))?;

        info!(
            "API LLM configured: {} at {}",
            config.effective_provider_name(),
            config.api_url
        );

        Ok(Self {
            config: config.clone(),
            api_key: api_key.into(),
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.api_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl LanguageModel for OpenAiCompatLlm {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn chat(&self, system_prompt: &str, history: &[ChatMessage]) -> Result<String> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessage::system(system_prompt));
        messages.extend_from_slice(history);

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "stream": false,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        });

        let gen_start = Instant::now();
        let mut request = self.client.post(self.endpoint()).json(&body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request.send().await.map_err(|e| {
            error!(error = %e, "LLM request failed");
            AgentError::Llm(format!("connection error: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read body".into());
            error!(status = %status, body = %body, "LLM request returned error");
            return Err(map_http_error(status, &body));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AgentError::Llm(format!("invalid response body: {e}")))?;

        let text = payload
            .pointer("/choices/0/message/content")
            .and_then(|c| c.as_str())
            .ok_or_else(|| AgentError::Llm("response has no message content".into()))?
            .to_owned();

        info!(
            "LLM replied in {:.0}ms ({} chars)",
            gen_start.elapsed().as_millis(),
            text.len()
        );
        debug!("LLM reply: {text}");
        Ok(text)
    }
}

/// Map HTTP error responses to typed errors.
fn map_http_error(status: reqwest::StatusCode, body: &str) -> AgentError {
    let detail = extract_error_message(body);
    match status.as_u16() {
        401 | 403 => AgentError::Llm(format!("authentication failed: {detail}")),
        429 => AgentError::Llm(format!("rate limit exceeded: {detail}")),
        s if s >= 500 => AgentError::Llm(format!("provider error ({status}): {detail}")),
        _ => AgentError::Llm(format!("HTTP {status}: {detail}")),
    }
}

/// Extract a human-readable error message from an error response.
///
/// Gemini wraps errors in a one-element array, OpenAI in an object.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .or_else(|| v.pointer("/0/error/message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| {
            if body.is_empty() {
                "no response body".to_string()
            } else {
                body.chars().take(500).collect()
            }
        })
}
