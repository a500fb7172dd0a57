//! Shared test helpers: scripted providers and stub tools.

use async_trait::async_trait;
use kubeclaw_core::error::{ProviderError, ToolError};
use kubeclaw_core::message::{Message, MessageToolCall};
use kubeclaw_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use kubeclaw_core::tool::{Access, ParamSpec, Tool, ToolArgs};
use std::sync::Mutex;

/// A mock provider that returns a sequence of scripted replies.
///
/// Each call to `complete` returns the next reply in the queue and records
/// the request it was given. Panics if more calls are made than replies provided.
pub struct SequentialMockProvider {
    replies: Vec<Result<Message, ProviderError>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(replies: Vec<Result<Message, ProviderError>>) -> Self {
        Self {
            replies,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a provider that answers with text immediately.
    pub fn single_text(text: &str) -> Self {
        Self::new(vec![Ok(Message::assistant(text))])
    }

    /// Create a provider that first proposes `calls`, then answers.
    pub fn tool_then_answer(calls: Vec<MessageToolCall>, answer: &str) -> Self {
        Self::new(vec![
            Ok(Message::assistant_with_calls(None, calls)),
            Ok(Message::assistant(answer)),
        ])
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let index = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len() - 1
        };

        let reply = self.replies.get(index).cloned().unwrap_or_else(|| {
            panic!(
                "SequentialMockProvider: no more replies (call #{index}, have {})",
                self.replies.len()
            )
        });

        reply.map(|message| ProviderResponse {
            message,
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: "mock-model".into(),
        })
    }
}

/// A provider that waits `delay` before answering.
pub struct SlowProvider {
    pub delay: std::time::Duration,
}

#[async_trait]
impl Provider for SlowProvider {
    fn name(&self) -> &str {
        "slow"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        tokio::time::sleep(self.delay).await;
        Ok(ProviderResponse {
            message: Message::assistant("too late"),
            usage: None,
            model: "slow-model".into(),
        })
    }
}

/// A read-only tool with no arguments that returns fixed output.
pub struct StaticTool {
    name: String,
    output: String,
}

impl StaticTool {
    pub fn new(name: &str, output: &str) -> Self {
        Self {
            name: name.into(),
            output: output.into(),
        }
    }
}

#[async_trait]
impl Tool for StaticTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Returns canned output"
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![]
    }

    fn access(&self) -> Access {
        Access::ReadOnly
    }

    async fn execute(&self, _args: ToolArgs) -> Result<String, ToolError> {
        Ok(self.output.clone())
    }
}

/// Helper to create a tool call with JSON-encoded arguments.
pub fn make_tool_call(id: &str, name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall {
        id: id.into(),
        name: name.into(),
        arguments: serde_json::to_string(&args).unwrap(),
    }
}
