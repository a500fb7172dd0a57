//! Conversation phases and the pure transition function between them.
//!
//! ```text
//!            ModelReplied (calls)            ToolsCompleted
//! AwaitingModel ──────────────────▶ AwaitingTools ──────────▶ AwaitingModel
//!      │
//!      │ ModelReplied (text) / ModelFailed / IterationLimitReached
//!      ▼
//!    Done
//! ```
//!
//! `transition` never performs I/O. It is handed what just happened and
//! answers with the next phase plus the messages to append.

use kubeclaw_core::error::ProviderError;
use kubeclaw_core::message::{Message, MessageToolCall, Role};
use kubeclaw_core::tool::ToolResult;
use std::collections::HashSet;

/// Where a turn currently stands.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnPhase {
    /// The model must be called next.
    AwaitingModel,
    /// The model proposed these calls; they must all be answered next.
    AwaitingTools { pending: Vec<MessageToolCall> },
    /// The turn is over.
    Done { answer: String },
}

impl TurnPhase {
    fn label(&self) -> &'static str {
        match self {
            TurnPhase::AwaitingModel => "AwaitingModel",
            TurnPhase::AwaitingTools { .. } => "AwaitingTools",
            TurnPhase::Done { .. } => "Done",
        }
    }
}

/// Something that happened while driving a turn.
#[derive(Debug, Clone)]
pub enum Event {
    ModelReplied(Message),
    ModelFailed(ProviderError),
    ToolsCompleted(Vec<ToolResult>),
    IterationLimitReached { limit: u32 },
}

impl Event {
    fn label(&self) -> &'static str {
        match self {
            Event::ModelReplied(_) => "ModelReplied",
            Event::ModelFailed(_) => "ModelFailed",
            Event::ToolsCompleted(_) => "ToolsCompleted",
            Event::IterationLimitReached { .. } => "IterationLimitReached",
        }
    }
}

/// The outcome of one transition.
#[derive(Debug, Clone)]
pub struct Step {
    pub next: TurnPhase,
    /// Messages to append to the conversation, in order.
    pub append: Vec<Message>,
}

/// The driver fed an event the current phase cannot accept.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("event {event} is not valid in phase {phase}")]
    UnexpectedEvent {
        phase: &'static str,
        event: &'static str,
    },

    #[error("tool results do not match pending calls: {0}")]
    ResultMismatch(String),
}

/// Compute the next phase for `event`.
pub fn transition(phase: &TurnPhase, event: Event) -> Result<Step, TransitionError> {
    match (phase, event) {
        (TurnPhase::AwaitingModel, Event::ModelReplied(message)) => Ok(on_reply(message)),

        (TurnPhase::AwaitingModel, Event::ModelFailed(error)) => {
            Ok(finish(inference_failure_text(&error)))
        }

        (TurnPhase::AwaitingModel, Event::IterationLimitReached { limit }) => {
            Ok(finish(iteration_limit_text(limit)))
        }

        (TurnPhase::AwaitingTools { pending }, Event::ToolsCompleted(results)) => {
            check_results(pending, &results)?;
            Ok(Step {
                next: TurnPhase::AwaitingModel,
                append: results
                    .into_iter()
                    .map(|r| Message::tool_result(r.call_id, r.output, r.success))
                    .collect(),
            })
        }

        (phase, event) => Err(TransitionError::UnexpectedEvent {
            phase: phase.label(),
            event: event.label(),
        }),
    }
}

fn on_reply(message: Message) -> Step {
    if let Err(problem) = check_reply(&message) {
        return finish(malformed_reply_text(&problem));
    }

    if message.has_tool_calls() {
        Step {
            next: TurnPhase::AwaitingTools {
                pending: message.tool_calls.clone(),
            },
            append: vec![message],
        }
    } else {
        Step {
            next: TurnPhase::Done {
                answer: message.text().to_string(),
            },
            append: vec![message],
        }
    }
}

/// End the turn with a synthetic assistant message.
fn finish(text: String) -> Step {
    Step {
        next: TurnPhase::Done {
            answer: text.clone(),
        },
        append: vec![Message::assistant(text)],
    }
}

fn check_reply(message: &Message) -> Result<(), String> {
    if message.role != Role::Assistant {
        return Err(format!("expected an assistant message, got {:?}", message.role));
    }

    if !message.has_tool_calls() {
        if message.text().trim().is_empty() {
            return Err("the reply had neither text nor tool calls".into());
        }
        return Ok(());
    }

    let mut seen = HashSet::new();
    for call in &message.tool_calls {
        if call.id.trim().is_empty() {
            return Err(format!("tool call '{}' has no id", call.name));
        }
        if !seen.insert(call.id.as_str()) {
            return Err(format!("tool call id '{}' is used twice", call.id));
        }
    }
    Ok(())
}

fn check_results(pending: &[MessageToolCall], results: &[ToolResult]) -> Result<(), TransitionError> {
    if pending.len() != results.len() {
        return Err(TransitionError::ResultMismatch(format!(
            "{} calls pending, {} results",
            pending.len(),
            results.len()
        )));
    }
    for (i, (call, result)) in pending.iter().zip(results).enumerate() {
        if call.id != result.call_id {
            return Err(TransitionError::ResultMismatch(format!(
                "position {i}: expected '{}', got '{}'",
                call.id, result.call_id
            )));
        }
    }
    Ok(())
}

pub(crate) fn inference_failure_text(error: &ProviderError) -> String {
    format!("I couldn't reach the language model to answer your question: {error}")
}

pub(crate) fn iteration_limit_text(limit: u32) -> String {
    let rounds = if limit == 1 { "round" } else { "rounds" };
    format!(
        "I stopped after {limit} {rounds} of cluster queries without reaching a final answer. \
         Please narrow the question and try again."
    )
}

fn malformed_reply_text(problem: &str) -> String {
    format!("The language model returned a reply I couldn't use ({problem}). Please try again.")
}
