//! The turn controller: one question in, one answer out.

use crate::dispatcher::Dispatcher;
use crate::prompt::system_prompt;
use crate::state::{Event, TurnPhase, transition};
use kubeclaw_config::AppConfig;
use kubeclaw_core::error::TurnError;
use kubeclaw_core::event::{DomainEvent, EventBus};
use kubeclaw_core::message::Conversation;
use kubeclaw_core::provider::{Provider, ProviderRequest, ToolDefinition};
use kubeclaw_core::tool::ToolRegistry;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A finished turn: the answer plus every message exchanged to reach it.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub answer: String,
    pub conversation: Conversation,
}

/// Orchestrates model calls and tool execution for one question at a time.
///
/// Holds no per-question state; concurrent `run` calls are independent.
pub struct AgentLoop {
    /// The LLM provider to use
    provider: Arc<dyn Provider>,

    /// The model to use
    model: String,

    /// Temperature setting
    temperature: f32,

    /// Max tokens per LLM response
    max_tokens: Option<u32>,

    /// Tool registry
    tools: Arc<ToolRegistry>,

    /// Catalog sent with every model call, computed once
    definitions: Vec<ToolDefinition>,

    dispatcher: Dispatcher,

    system_prompt: String,

    /// Maximum model calls per question
    max_iterations: u32,

    /// Wall-clock budget per question
    turn_timeout: Option<Duration>,

    /// Event bus for domain events
    event_bus: Arc<EventBus>,
}

impl AgentLoop {
    /// Create a new agent loop.
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        tools: Arc<ToolRegistry>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let definitions = tools.definitions();
        Self {
            provider,
            model: model.into(),
            temperature: 0.0,
            max_tokens: None,
            system_prompt: system_prompt(&definitions),
            definitions,
            dispatcher: Dispatcher::new(tools.clone(), event_bus.clone()),
            tools,
            max_iterations: 10,
            turn_timeout: None,
            event_bus,
        }
    }

    /// Create an agent loop with every setting taken from `config`.
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let mut agent = Self::new(provider, &config.default_model, tools, event_bus)
            .with_temperature(config.default_temperature)
            .with_max_tokens(config.default_max_tokens)
            .with_max_iterations(config.agent.max_iterations)
            .with_turn_timeout(Duration::from_secs(config.agent.turn_timeout_secs))
            .with_parallel_tools(config.agent.parallel_tools);
        if let Some(prompt) = &config.agent.system_prompt_override {
            agent = agent.with_system_prompt(prompt.clone());
        }
        agent
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the max tokens per LLM response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Set the maximum number of model calls per question.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    /// Abort a question that runs longer than `timeout`.
    pub fn with_turn_timeout(mut self, timeout: Duration) -> Self {
        self.turn_timeout = Some(timeout);
        self
    }

    /// Run the tool calls of one reply concurrently.
    pub fn with_parallel_tools(mut self, parallel: bool) -> Self {
        self.dispatcher = self.dispatcher.with_parallel(parallel);
        self
    }

    /// Replace the built-in system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// The registry this loop dispatches to.
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Answer one question, returning only the final text.
    pub async fn run_turn(&self, question: &str) -> Result<String, TurnError> {
        self.run(question).await.map(|outcome| outcome.answer)
    }

    /// Answer one question, returning the final text and the full conversation.
    ///
    /// Blank questions are rejected before any model call. Inference and tool
    /// failures do not surface here; they become part of the answer.
    pub async fn run(&self, question: &str) -> Result<TurnOutcome, TurnError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(TurnError::EmptyInput);
        }

        match self.turn_timeout {
            Some(limit) => tokio::time::timeout(limit, self.drive(question))
                .await
                .map_err(|_| {
                    warn!(timeout_secs = limit.as_secs(), "Turn deadline exceeded");
                    TurnError::DeadlineExceeded {
                        timeout_secs: limit.as_secs(),
                    }
                })?,
            None => self.drive(question).await,
        }
    }

    async fn drive(&self, question: &str) -> Result<TurnOutcome, TurnError> {
        let mut conversation = Conversation::seeded(question);
        let mut phase = TurnPhase::AwaitingModel;

        info!(conversation_id = %conversation.id, "Turn started");
        self.event_bus.publish(DomainEvent::TurnStarted {
            conversation_id: conversation.id.to_string(),
            at: chrono::Utc::now(),
        });

        loop {
            let event = match &phase {
                TurnPhase::Done { answer } => {
                    info!(
                        conversation_id = %conversation.id,
                        iterations = conversation.iterations(),
                        messages = conversation.len(),
                        "Turn completed"
                    );
                    self.event_bus.publish(DomainEvent::TurnCompleted {
                        conversation_id: conversation.id.to_string(),
                        iterations: conversation.iterations(),
                        messages: conversation.len(),
                        at: chrono::Utc::now(),
                    });
                    return Ok(TurnOutcome {
                        answer: answer.clone(),
                        conversation,
                    });
                }
                TurnPhase::AwaitingModel => self.call_model(&mut conversation).await,
                TurnPhase::AwaitingTools { pending } => {
                    debug!(
                        conversation_id = %conversation.id,
                        tool_count = pending.len(),
                        "Executing tool calls"
                    );
                    Event::ToolsCompleted(self.dispatcher.dispatch(pending).await)
                }
            };

            let step = transition(&phase, event).map_err(|e| TurnError::Invariant(e.to_string()))?;
            for message in step.append {
                conversation.push(message);
            }
            phase = step.next;
        }
    }

    async fn call_model(&self, conversation: &mut Conversation) -> Event {
        if conversation.iterations() >= self.max_iterations {
            warn!(
                conversation_id = %conversation.id,
                limit = self.max_iterations,
                "Max iterations reached, ending turn"
            );
            return Event::IterationLimitReached {
                limit: self.max_iterations,
            };
        }

        conversation.record_iteration();
        debug!(
            conversation_id = %conversation.id,
            iteration = conversation.iterations(),
            "Calling model"
        );

        let request = ProviderRequest {
            model: self.model.clone(),
            system: Some(self.system_prompt.clone()),
            messages: conversation.messages().to_vec(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: self.definitions.clone(),
        };

        match self.provider.complete(request).await {
            Ok(response) => {
                self.event_bus.publish(DomainEvent::ModelReplied {
                    conversation_id: conversation.id.to_string(),
                    model: response.model.clone(),
                    proposed_calls: response.message.tool_calls.len(),
                    tokens_used: response.usage.as_ref().map(|u| u.total_tokens),
                    at: chrono::Utc::now(),
                });
                Event::ModelReplied(response.message)
            }
            Err(e) => {
                warn!(
                    conversation_id = %conversation.id,
                    provider = self.provider.name(),
                    error = %e,
                    "Model call failed"
                );
                self.event_bus.publish(DomainEvent::InferenceFailed {
                    conversation_id: conversation.id.to_string(),
                    provider: self.provider.name().to_string(),
                    reason: e.to_string(),
                    at: chrono::Utc::now(),
                });
                Event::ModelFailed(e)
            }
        }
    }
}
