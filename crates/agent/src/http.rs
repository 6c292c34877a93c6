//! Reqwest-backed [`LlmClient`] for the configured provider.
//!
//! Each provider receives the output schema through its own structured-output
//! mechanism: OpenAI `response_format`, Ollama `format`, and for Anthropic a
//! system instruction carrying the schema.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};

use sentinel_core::config::{LlmConfig, LlmProvider};

use crate::llm::{CompletionRequest, LlmClient, LlmError};

const OPENAI_BASE_URL: &str = "https://api.openai.com";
const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const OLLAMA_BASE_URL: &str = "http://localhost:11434";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const ANTHROPIC_MAX_TOKENS: u32 = 1024;
const BODY_PREVIEW_CHAR_LIMIT: usize = 160;

pub struct HttpLlmClient {
    client: Client,
    provider: LlmProvider,
    base_url: String,
    model: String,
    api_key: Option<SecretString>,
}

impl HttpLlmClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        if config.provider.requires_api_key() && config.api_key.is_none() {
            return Err(LlmError::Configuration(format!(
                "provider `{}` requires an api key",
                config.provider
            )));
        }

        let base_url = match (&config.base_url, config.provider) {
            (Some(url), _) => url.trim_end_matches('/').to_string(),
            (None, LlmProvider::OpenAi) => OPENAI_BASE_URL.to_string(),
            (None, LlmProvider::Anthropic) => ANTHROPIC_BASE_URL.to_string(),
            (None, LlmProvider::Ollama) => OLLAMA_BASE_URL.to_string(),
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| LlmError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            provider: config.provider,
            base_url,
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self) -> String {
        let path = match self.provider {
            LlmProvider::OpenAi => "/v1/chat/completions",
            LlmProvider::Anthropic => "/v1/messages",
            LlmProvider::Ollama => "/api/generate",
        };
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let body = request_body(self.provider, &self.model, request);
        let mut builder = self.client.post(self.endpoint()).json(&body);

        match (self.provider, &self.api_key) {
            (LlmProvider::OpenAi, Some(key)) => {
                builder = builder.bearer_auth(key.expose_secret());
            }
            (LlmProvider::Anthropic, Some(key)) => {
                builder = builder
                    .header("x-api-key", key.expose_secret())
                    .header("anthropic-version", ANTHROPIC_VERSION);
            }
            _ => {}
        }

        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, &bytes));
        }

        let payload: Value = serde_json::from_slice(&bytes)
            .map_err(|e| LlmError::Decode(format!("invalid provider JSON: {e}")))?;
        extract_completion(self.provider, &payload)
    }
}

pub(crate) fn request_body(provider: LlmProvider, model: &str, request: &CompletionRequest) -> Value {
    match provider {
        LlmProvider::OpenAi => json!({
            "model": model,
            "messages": [{ "role": "user", "content": request.prompt }],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": request.schema_name,
                    "strict": true,
                    "schema": request.schema,
                },
            },
        }),
        LlmProvider::Anthropic => json!({
            "model": model,
            "max_tokens": ANTHROPIC_MAX_TOKENS,
            "system": format!(
                "Respond with a single JSON object and nothing else. It must conform to this JSON Schema:\n{}",
                request.schema
            ),
            "messages": [{ "role": "user", "content": request.prompt }],
        }),
        LlmProvider::Ollama => json!({
            "model": model,
            "prompt": request.prompt,
            "format": request.schema,
            "stream": false,
        }),
    }
}

pub(crate) fn extract_completion(provider: LlmProvider, payload: &Value) -> Result<String, LlmError> {
    let text = match provider {
        LlmProvider::OpenAi => payload
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_string),
        LlmProvider::Anthropic => payload.get("content").and_then(Value::as_array).map(|blocks| {
            blocks
                .iter()
                .filter(|block| block.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|block| block.get("text").and_then(Value::as_str))
                .collect::<String>()
        }),
        LlmProvider::Ollama => payload.get("response").and_then(Value::as_str).map(str::to_string),
    };

    match text {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(LlmError::EmptyResponse),
    }
}

fn map_transport_error(error: reqwest::Error) -> LlmError {
    if error.is_timeout() {
        LlmError::Timeout(error.to_string())
    } else {
        LlmError::Transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> LlmError {
    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            LlmError::Timeout(format!("status {}", status.as_u16()))
        }
        _ => LlmError::Status { status: status.as_u16(), body: body_preview(body) },
    }
}

fn body_preview(body: &[u8]) -> String {
    let compact = String::from_utf8_lossy(body).split_whitespace().collect::<Vec<_>>().join(" ");
    let preview = compact.chars().take(BODY_PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > BODY_PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
