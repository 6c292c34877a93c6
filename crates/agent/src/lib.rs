//! Route price estimation backed by a language model.
//!
//! - `llm` - the [`LlmClient`] seam and its error type
//! - `http` - reqwest implementation for OpenAI, Anthropic and Ollama
//! - `estimator` - prompt rendering, schema and boundary validation of the
//!   model's answer
//!
//! The model only suggests a number. Its output is parsed as untrusted input
//! and rejected when it does not match the estimate shape.

pub mod estimator;
pub mod http;
pub mod llm;

pub use estimator::{EstimationError, PriceEstimator};
pub use http::HttpLlmClient;
pub use llm::{CompletionRequest, LlmClient, LlmError};
