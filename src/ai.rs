//! Generative AI collaborator.
//!
//! Every call is a single best-effort attempt; callers decide how to degrade
//! when one fails. `connect` picks the client named in `[ai] provider`.

mod offline;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::config::{AiProvider, AiSettings};
use crate::error::AiError;

pub use offline::OfflineClient;

/// A tool invocation requested by the chat model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    pub args: Value,
}

/// One piece of a streamed chat reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatChunk {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

/// A finite, one-shot chat reply.
pub type ChatStream = Box<dyn Iterator<Item = ChatChunk> + Send>;

pub trait AiClient: Send + Sync {
    fn generate_text(&self, prompt: &str) -> Result<String, AiError>;

    /// Produce a JSON value shaped by `schema` (a JSON-schema subset:
    /// object, array, string, integer, number, boolean, enum).
    fn generate_structured(&self, prompt: &str, schema: &Value) -> Result<Value, AiError>;

    /// Encoded image bytes.
    fn generate_image(&self, prompt: &str) -> Result<Vec<u8>, AiError>;

    fn stream_chat(&self, message: &str) -> Result<ChatStream, AiError>;
}

pub fn connect(settings: &AiSettings) -> Result<Arc<dyn AiClient>, AiError> {
    match settings.provider {
        AiProvider::None => Err(AiError::ServiceUnavailable(
            "no AI provider configured".to_string(),
        )),
        AiProvider::Offline => {
            info!(latency_ms = settings.latency_ms, "using offline AI client");
            Ok(Arc::new(OfflineClient::new(settings.latency())))
        }
    }
}

#[cfg(test)]
mod tests;
