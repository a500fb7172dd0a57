//! The seam between the agent loop and whatever model answers it.
//!
//! One [`Provider::complete`] call sends the conversation plus the tool
//! catalog and gets back a single assistant message, which either answers the
//! question or proposes tool calls.

use crate::error::ProviderError;
use crate::message::Message;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    pub model: String,

    /// Kept out of `messages`; each backend places it where its API wants it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    pub messages: Vec<Message>,

    #[serde(default)]
    pub temperature: f32,

    /// Backend default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

/// What the model sees of a tool: a name, a blurb, and a JSON Schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema of the argument object.
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub message: Message,
    pub usage: Option<Usage>,
    /// Model id reported by the backend, which can differ from the one requested.
    pub model: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// An inference backend. Implementations own their HTTP timeouts; nothing
/// above this trait retries.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Config name, e.g. `anthropic` or `openrouter`.
    fn name(&self) -> &str;

    async fn complete(&self, request: ProviderRequest) -> std::result::Result<ProviderResponse, ProviderError>;

    /// Used by `kubeclaw doctor`.
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }
}
