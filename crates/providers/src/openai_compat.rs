//! Any backend speaking the OpenAI `/chat/completions` dialect.
//!
//! OpenAI itself, OpenRouter, Groq, Ollama and vLLM all land here. Tool calls
//! use the `function` calling shape, and the system prompt is sent as the
//! first message of the list.

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

const FUNCTION: &str = "function";

pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: http::client(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// Model ids advertised under `/models`.
    pub async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        let response = self
            .client
            .get(self.endpoint("models"))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(http::transport_error)?;

        let listing: ModelListing = http::ensure_success(&self.name, response)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        Ok(listing.data.into_iter().map(|m| m.id).collect())
    }
}

fn build_request(request: &ProviderRequest) -> ChatRequest<'_> {
    ChatRequest {
        model: &request.model,
        messages: encode_conversation(request.system.as_deref(), &request.messages),
        temperature: request.temperature,
        max_tokens: request.max_tokens,
        stream: false,
        tools: request.tools.iter().map(FunctionTool::from).collect(),
    }
}

fn encode_conversation(system: Option<&str>, messages: &[Message]) -> Vec<ChatMessage> {
    let preamble = system.map(|prompt| ChatMessage {
        role: ChatRole::System,
        content: Some(prompt.to_string()),
        tool_calls: Vec::new(),
        tool_call_id: None,
    });

    let body = messages.iter().map(|msg| ChatMessage {
        role: match msg.role {
            Role::User => ChatRole::User,
            Role::Assistant => ChatRole::Assistant,
            Role::Tool => ChatRole::Tool,
        },
        content: msg.content.clone(),
        tool_calls: msg.tool_calls.iter().map(FunctionCall::from).collect(),
        tool_call_id: msg.tool_call_id.clone(),
    });

    preamble.into_iter().chain(body).collect()
}

fn decode_reply(reply: ChatResponse) -> Result<ProviderResponse, ProviderError> {
    let Some(choice) = reply.choices.into_iter().next() else {
        return Err(ProviderError::MalformedResponse(
            "No choices in response".into(),
        ));
    };

    if let Some(reason) = &choice.finish_reason {
        debug!(finish_reason = %reason, "Chat completion decoded");
    }

    let ChatMessage {
        content,
        tool_calls,
        ..
    } = choice.message;
    let calls = tool_calls
        .into_iter()
        .map(|call| MessageToolCall {
            id: call.id,
            name: call.function.name,
            arguments: call.function.arguments,
        })
        .collect();

    Ok(ProviderResponse {
        message: Message::assistant_with_calls(content.filter(|c| !c.is_empty()), calls),
        usage: reply.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }),
        model: reply.model,
    })
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let body = build_request(&request);
        debug!(
            provider = %self.name,
            model = %request.model,
            messages = body.messages.len(),
            tools = body.tools.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(self.endpoint("chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(http::transport_error)?;

        let reply: ChatResponse = http::ensure_success(&self.name, response)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(format!("Failed to parse response: {e}")))?;

        decode_reply(reply)
    }

    /// Reachable and authorised if `/models` answers. Other HTTP errors mean
    /// "up but not ready" rather than a failed check.
    async fn health_check(&self) -> Result<bool, ProviderError> {
        match self.list_models().await {
            Ok(_) => Ok(true),
            Err(ProviderError::ApiError { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<FunctionTool<'a>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ChatRole {
    System,
    User,
    Assistant,
    Tool,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: ChatRole,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_empty")]
    tool_calls: Vec<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

/// Some servers send `"tool_calls": null` instead of leaving the field out.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<FunctionCall>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<Vec<FunctionCall>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: FunctionInvocation,
}

fn function_kind() -> String {
    FUNCTION.into()
}

impl From<&MessageToolCall> for FunctionCall {
    fn from(call: &MessageToolCall) -> Self {
        Self {
            id: call.id.clone(),
            kind: function_kind(),
            function: FunctionInvocation {
                name: call.name.clone(),
                arguments: call.arguments.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionInvocation {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Serialize)]
struct FunctionTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: FunctionSpec<'a>,
}

#[derive(Serialize)]
struct FunctionSpec<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a Value,
}

impl<'a> From<&'a ToolDefinition> for FunctionTool<'a> {
    fn from(def: &'a ToolDefinition) -> Self {
        Self {
            kind: FUNCTION,
            function: FunctionSpec {
                name: &def.name,
                description: &def.description,
                parameters: &def.parameters,
            },
        }
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    model: String,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct TokenUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Deserialize)]
struct ModelListing {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}
