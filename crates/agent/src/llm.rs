use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// One schema-constrained completion call.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub schema_name: String,
    pub schema: Value,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LlmError {
    #[error("llm transport error: {0}")]
    Transport(String),
    #[error("llm provider returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("llm request timed out: {0}")]
    Timeout(String),
    #[error("llm provider returned no content")]
    EmptyResponse,
    #[error("llm provider payload could not be decoded: {0}")]
    Decode(String),
    #[error("llm client is misconfigured: {0}")]
    Configuration(String),
}

/// Model-serving backend. Returns the raw completion text; callers own
/// validation of its contents.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}
