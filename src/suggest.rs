//! Pluggable free-text suggestion backends
//!
//! The engine asks a [`SuggestionBackend`] for a mitigation text per qualifying
//! record. Any error or empty reply means "unavailable" and the deterministic
//! templates in [`crate::strategy`] are used instead.

use crate::config::BackendConfig;
use crate::record::PerformanceRecord;
use crate::resources::ResourceDimension;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const SYSTEM_PROMPT: &str = "You are an AI assistant specialized in system performance \
optimization. Provide your suggestions in plain text without code or special formatting.";

/// Suggestion backend failure; never propagated past the engine
#[derive(Debug, Error)]
pub enum SuggestError {
    #[error("suggestion backend is disabled")]
    Disabled,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned HTTP {0}")]
    Status(u16),

    #[error("backend returned an empty suggestion")]
    EmptyResponse,

    #[error("malformed backend reply: {0}")]
    MalformedResponse(String),

    #[error("backend did not answer within {0:?}")]
    Timeout(Duration),

    #[error("failed to spawn suggestion worker: {0}")]
    Spawn(std::io::Error),

    #[error("suggestion worker exited without a reply")]
    WorkerExited,
}

/// Capability: suggest a mitigation text for one record
pub trait SuggestionBackend: Send + Sync {
    /// Short identifier for logs
    fn name(&self) -> &str;

    /// `false` lets the engine skip the call entirely
    fn is_enabled(&self) -> bool {
        true
    }

    fn suggest(&self, record: &PerformanceRecord) -> Result<String, SuggestError>;
}

/// Default backend: always unavailable
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledBackend;

impl SuggestionBackend for DisabledBackend {
    fn name(&self) -> &str {
        "disabled"
    }

    fn is_enabled(&self) -> bool {
        false
    }

    fn suggest(&self, _record: &PerformanceRecord) -> Result<String, SuggestError> {
        Err(SuggestError::Disabled)
    }
}

/// OpenAI-compatible chat completions backend (Groq by default)
pub struct ChatCompletionBackend {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl ChatCompletionBackend {
    pub fn new(config: &BackendConfig, api_key: String) -> Result<Self, SuggestError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    /// Build from the API key named by `config.api_key_env`
    ///
    /// Returns `Ok(None)` when the backend is disabled or the key is not set.
    pub fn from_env(config: &BackendConfig) -> Result<Option<Self>, SuggestError> {
        if !config.enabled {
            return Ok(None);
        }
        match std::env::var(&config.api_key_env) {
            Ok(key) if !key.trim().is_empty() => {
                Self::new(config, key.trim().to_string()).map(Some)
            }
            _ => Ok(None),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl SuggestionBackend for ChatCompletionBackend {
    fn name(&self) -> &str {
        "chat-completions"
    }

    fn suggest(&self, record: &PerformanceRecord) -> Result<String, SuggestError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": build_prompt(record)},
            ],
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(SuggestError::Status(status.as_u16()));
        }

        let body = response.text()?;
        let reply: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| SuggestError::MalformedResponse(e.to_string()))?;
        let text = reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        let text = normalize_whitespace(&text);
        if text.is_empty() {
            Err(SuggestError::EmptyResponse)
        } else {
            Ok(text)
        }
    }
}

/// User prompt describing one record's statistics
pub fn build_prompt(record: &PerformanceRecord) -> String {
    format!(
        "Based on the following performance data for a system call, suggest a specific and \
         concise optimization strategy to improve its performance or reduce its resource usage. \
         Provide a brief, actionable suggestion in plain text, in one or two sentences, without \
         code or special formatting.\n\n\
         System Call: {}\n\
         Category: {}\n\
         Average Execution Time: {:.4} seconds\n\
         Variance: {:.4}\n\
         Peak Performance: {:.4} seconds\n\
         Resource Impacts:\n\
         - CPU: {:.2}%\n\
         - Memory: {:.2}%\n\
         - Disk I/O: {:.2}%\n",
        record.name,
        record.category,
        record.average_time,
        record.variance,
        record.peak_performance,
        record.impact(ResourceDimension::CpuPercent),
        record.impact(ResourceDimension::MemoryPercent),
        record.impact(ResourceDimension::DiskIoPercent),
    )
}

/// Collapse runs of whitespace (including newlines) into single spaces
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
