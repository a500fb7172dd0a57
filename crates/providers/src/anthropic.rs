//! Claude over Anthropic's Messages API.
//!
//! Every turn is sent as a list of content blocks. The system prompt rides in
//! the top-level `system` field, and tool results go back as `tool_result`
//! blocks inside a user turn.

use crate::http;
use async_trait::async_trait;
use kubeclaw_core::error::ProviderError;
use kubeclaw_core::message::{Message, MessageToolCall, Role};
use kubeclaw_core::provider::{
    Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

const API_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MAX_TOKENS: u32 = 1024;

pub struct AnthropicProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AnthropicProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            client: http::client(),
        }
    }

    /// Point at a proxy or a local stand-in instead of api.anthropic.com.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn build_request<'a>(request: &'a ProviderRequest) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &request.model,
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: request.temperature,
            system: request.system.as_deref(),
            messages: encode_conversation(&request.messages),
            tools: request.tools.iter().map(ToolSpec::from).collect(),
        }
    }
}

/// Lay the conversation out as alternating speaker turns.
///
/// Adjacent messages from the same speaker share one turn, so all results for
/// one round of tool calls travel back together.
fn encode_conversation(messages: &[Message]) -> Vec<Turn> {
    let mut turns: Vec<Turn> = Vec::new();

    for msg in messages {
        let (speaker, blocks) = match msg.role {
            Role::User => (Speaker::User, vec![Block::text(msg.text())]),
            Role::Assistant => {
                let mut blocks = Vec::with_capacity(msg.tool_calls.len() + 1);
                if !msg.text().is_empty() || msg.tool_calls.is_empty() {
                    blocks.push(Block::text(msg.text()));
                }
                blocks.extend(msg.tool_calls.iter().map(|call| Block::ToolUse {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    input: arguments_object(&call.arguments),
                }));
                (Speaker::Assistant, blocks)
            }
            Role::Tool => (
                Speaker::User,
                vec![Block::ToolResult {
                    tool_use_id: msg.tool_call_id.clone().unwrap_or_default(),
                    content: msg.text().to_string(),
                    is_error: msg.is_error,
                }],
            ),
        };

        match turns.last_mut() {
            Some(last) if last.role == speaker => last.content.extend(blocks),
            _ => turns.push(Turn {
                role: speaker,
                content: blocks,
            }),
        }
    }

    turns
}

/// Tool arguments arrive as a JSON string; the API wants an object.
fn arguments_object(arguments: &str) -> Value {
    serde_json::from_str::<Value>(arguments)
        .ok()
        .filter(Value::is_object)
        .unwrap_or_else(|| Value::Object(Default::default()))
}

fn decode_reply(reply: MessagesResponse) -> Result<ProviderResponse, ProviderError> {
    let mut texts: Vec<String> = Vec::new();
    let mut calls = Vec::new();

    for block in reply.content {
        match block {
            Block::Text { text } => texts.push(text),
            Block::ToolUse { id, name, input } => {
                let arguments = serde_json::to_string(&input)
                    .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;
                calls.push(MessageToolCall {
                    id,
                    name,
                    arguments,
                });
            }
            Block::ToolResult { .. } | Block::Unsupported => {}
        }
    }

    if let Some(reason) = &reply.stop_reason {
        debug!(stop_reason = %reason, calls = calls.len(), "Anthropic reply decoded");
    }

    let text = texts.join("\n");
    let content = (!text.is_empty()).then_some(text);
    let TokenCounts {
        input_tokens,
        output_tokens,
    } = reply.usage;

    Ok(ProviderResponse {
        message: Message::assistant_with_calls(content, calls),
        usage: Some(Usage {
            prompt_tokens: input_tokens,
            completion_tokens: output_tokens,
            total_tokens: input_tokens + output_tokens,
        }),
        model: reply.model,
    })
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let body = Self::build_request(&request);
        debug!(
            provider = "anthropic",
            model = %request.model,
            turns = body.messages.len(),
            tools = body.tools.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(http::transport_error)?;

        let reply: MessagesResponse = http::ensure_success("anthropic", response)
            .await?
            .json()
            .await
            .map_err(|e| {
                ProviderError::MalformedResponse(format!("Failed to parse Anthropic response: {e}"))
            })?;

        decode_reply(reply)
    }

    /// The Messages API has no cheap health endpoint; having a key is the only check.
    async fn health_check(&self) -> Result<bool, ProviderError> {
        Ok(!self.api_key.trim().is_empty())
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Turn>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolSpec<'a>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum Speaker {
    User,
    Assistant,
}

#[derive(Debug, Serialize)]
struct Turn {
    role: Speaker,
    content: Vec<Block>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Block {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
    /// Thinking and other block types this client does not act on.
    #[serde(other)]
    Unsupported,
}

impl Block {
    fn text(text: &str) -> Self {
        Block::Text {
            text: text.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ToolSpec<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: &'a Value,
}

impl<'a> From<&'a ToolDefinition> for ToolSpec<'a> {
    fn from(def: &'a ToolDefinition) -> Self {
        Self {
            name: &def.name,
            description: &def.description,
            input_schema: &def.parameters,
        }
    }
}

#[derive(Deserialize)]
struct MessagesResponse {
    model: String,
    content: Vec<Block>,
    usage: TokenCounts,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Deserialize)]
struct TokenCounts {
    input_tokens: u32,
    output_tokens: u32,
}
