//! Domain events emitted while a turn runs.
//!
//! The agent loop and dispatcher publish onto an [`EventBus`].
//! [`EventBus::spawn_logger`] turns the stream into structured log records
//! under the `kubeclaw::events` target. Publishing never blocks and never
//! fails when nobody listens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A question was accepted and a conversation seeded
    TurnStarted {
        conversation_id: String,
        at: DateTime<Utc>,
    },

    /// The model answered one request
    ModelReplied {
        conversation_id: String,
        model: String,
        /// Number of tool calls proposed; zero for a final answer
        proposed_calls: usize,
        tokens_used: Option<u32>,
        at: DateTime<Utc>,
    },

    /// The inference service failed; the turn ends with a failure answer
    InferenceFailed {
        conversation_id: String,
        provider: String,
        reason: String,
        at: DateTime<Utc>,
    },

    /// One proposed tool call was dispatched
    ToolExecuted {
        call_id: String,
        tool_name: String,
        success: bool,
        duration_ms: u64,
        at: DateTime<Utc>,
    },

    /// The turn reached its final answer
    TurnCompleted {
        conversation_id: String,
        iterations: u32,
        messages: usize,
        at: DateTime<Utc>,
    },
}

impl DomainEvent {
    /// Short snake_case name, matching the serialized `kind` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainEvent::TurnStarted { .. } => "turn_started",
            DomainEvent::ModelReplied { .. } => "model_replied",
            DomainEvent::InferenceFailed { .. } => "inference_failed",
            DomainEvent::ToolExecuted { .. } => "tool_executed",
            DomainEvent::TurnCompleted { .. } => "turn_completed",
        }
    }

    /// The conversation the event belongs to. Tool events only carry a call id.
    pub fn conversation_id(&self) -> Option<&str> {
        match self {
            DomainEvent::TurnStarted { conversation_id, .. }
            | DomainEvent::ModelReplied { conversation_id, .. }
            | DomainEvent::InferenceFailed { conversation_id, .. }
            | DomainEvent::TurnCompleted { conversation_id, .. } => Some(conversation_id),
            DomainEvent::ToolExecuted { .. } => None,
        }
    }
}

/// Multi-consumer fan-out of [`DomainEvent`]s over `tokio::sync::broadcast`.
///
/// Slow subscribers lag and lose old events rather than slowing a turn down.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, event: DomainEvent) {
        // Err only means nobody is subscribed.
        let _ = self.sender.send(Arc::new(event));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }

    /// Log every event published from now on. The task ends once the bus is
    /// dropped and yields the number of events it logged.
    pub fn spawn_logger(&self) -> JoinHandle<u64> {
        let mut rx = self.subscribe();
        tokio::spawn(async move {
            let mut logged = 0;
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        log_event(&event);
                        logged += 1;
                    }
                    Err(RecvError::Lagged(missed)) => {
                        warn!(target: "kubeclaw::events", missed, "Event log fell behind");
                    }
                    Err(RecvError::Closed) => return logged,
                }
            }
        })
    }
}

fn log_event(event: &DomainEvent) {
    let kind = event.kind();
    let conversation = event.conversation_id().unwrap_or("-");
    match event {
        DomainEvent::InferenceFailed {
            provider, reason, ..
        } => warn!(target: "kubeclaw::events", kind, conversation, %provider, %reason),
        DomainEvent::TurnCompleted {
            iterations,
            messages,
            ..
        } => info!(target: "kubeclaw::events", kind, conversation, iterations, messages),
        DomainEvent::ToolExecuted {
            call_id,
            tool_name,
            success,
            duration_ms,
            ..
        } => debug!(
            target: "kubeclaw::events",
            kind,
            %call_id,
            tool = %tool_name,
            success,
            duration_ms
        ),
        DomainEvent::ModelReplied {
            model,
            proposed_calls,
            tokens_used,
            ..
        } => debug!(
            target: "kubeclaw::events",
            kind,
            conversation,
            %model,
            proposed_calls,
            tokens_used
        ),
        DomainEvent::TurnStarted { .. } => debug!(target: "kubeclaw::events", kind, conversation),
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_see_published_events() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(DomainEvent::ToolExecuted {
            call_id: "c1".into(),
            tool_name: "list_pods".into(),
            success: true,
            duration_ms: 42,
            at: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        match event.as_ref() {
            DomainEvent::ToolExecuted {
                tool_name, success, ..
            } => {
                assert_eq!(tool_name, "list_pods");
                assert!(success);
            }
            other => panic!("Expected ToolExecuted, got {other:?}"),
        }
    }

    #[test]
    fn publishing_without_subscribers_is_silent() {
        let bus = EventBus::new(16);
        bus.publish(DomainEvent::InferenceFailed {
            conversation_id: "conv-1".into(),
            provider: "anthropic".into(),
            reason: "connection refused".into(),
            at: Utc::now(),
        });
    }

    #[test]
    fn kind_matches_serialized_tag() {
        let event = DomainEvent::TurnCompleted {
            conversation_id: "conv-1".into(),
            iterations: 2,
            messages: 4,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], event.kind());
        assert_eq!(event.conversation_id(), Some("conv-1"));
    }

    #[tokio::test]
    async fn logger_drains_until_the_bus_is_dropped() {
        let bus = EventBus::new(16);
        let logger = bus.spawn_logger();

        bus.publish(DomainEvent::TurnStarted {
            conversation_id: "conv-1".into(),
            at: Utc::now(),
        });
        bus.publish(DomainEvent::TurnCompleted {
            conversation_id: "conv-1".into(),
            iterations: 1,
            messages: 2,
            at: Utc::now(),
        });
        drop(bus);

        assert_eq!(logger.await.unwrap(), 2);
    }

    #[test]
    fn tool_events_have_no_conversation() {
        let event = DomainEvent::ToolExecuted {
            call_id: "c1".into(),
            tool_name: "list_namespaces".into(),
            success: false,
            duration_ms: 1,
            at: Utc::now(),
        };
        assert_eq!(event.kind(), "tool_executed");
        assert!(event.conversation_id().is_none());
    }
}
