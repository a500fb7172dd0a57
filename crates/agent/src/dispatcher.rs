//! Executes the tool calls of one assistant message.
//!
//! Every call yields exactly one [`ToolResult`], in proposal order. A failing
//! call never affects its siblings and never aborts the turn.

use futures::future::join_all;
use kubeclaw_core::error::ToolError;
use kubeclaw_core::event::{DomainEvent, EventBus};
use kubeclaw_core::message::MessageToolCall;
use kubeclaw_core::tool::{ToolCall, ToolRegistry, ToolResult};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

pub struct Dispatcher {
    tools: Arc<ToolRegistry>,
    event_bus: Arc<EventBus>,
    parallel: bool,
}

impl Dispatcher {
    pub fn new(tools: Arc<ToolRegistry>, event_bus: Arc<EventBus>) -> Self {
        Self {
            tools,
            event_bus,
            parallel: false,
        }
    }

    /// Run the calls of one reply concurrently instead of one after another.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Execute `calls`, returning one result per call in the same order.
    pub async fn dispatch(&self, calls: &[MessageToolCall]) -> Vec<ToolResult> {
        if self.parallel {
            join_all(calls.iter().map(|call| self.run_one(call))).await
        } else {
            let mut results = Vec::with_capacity(calls.len());
            for call in calls {
                results.push(self.run_one(call).await);
            }
            results
        }
    }

    async fn run_one(&self, call: &MessageToolCall) -> ToolResult {
        debug!(tool = %call.name, call_id = %call.id, "Executing tool call");
        let start = Instant::now();

        let outcome = self.execute(call).await;

        let duration_ms = start.elapsed().as_millis() as u64;
        self.event_bus.publish(DomainEvent::ToolExecuted {
            call_id: call.id.clone(),
            tool_name: call.name.clone(),
            success: outcome.is_ok(),
            duration_ms,
            at: chrono::Utc::now(),
        });

        match outcome {
            Ok(output) => ToolResult::ok(&call.id, output),
            Err(e) => {
                warn!(tool = %call.name, error = %e, duration_ms, "Tool call failed");
                ToolResult::failed(&call.id, &e)
            }
        }
    }

    /// An unknown name is reported before its arguments are parsed.
    async fn execute(&self, call: &MessageToolCall) -> Result<String, ToolError> {
        if self.tools.get(&call.name).is_none() {
            return Err(ToolError::NotFound(call.name.clone()));
        }
        let parsed = ToolCall {
            id: call.id.clone(),
            name: call.name.clone(),
            arguments: parse_arguments(&call.arguments)?,
        };
        self.tools.invoke(&parsed).await
    }
}

/// Parse a call's JSON argument string. An empty string means no arguments.
pub fn parse_arguments(raw: &str) -> Result<Value, ToolError> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(raw)
        .map_err(|e| ToolError::InvalidArguments(format!("arguments are not valid JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{StaticTool, make_tool_call};

    fn dispatcher(parallel: bool) -> (Dispatcher, Arc<EventBus>) {
        let mut registry = ToolRegistry::new();
        registry
            .register(Box::new(StaticTool::new("list_pods", "web-1\nweb-2")))
            .unwrap();
        registry
            .register(Box::new(StaticTool::new("list_namespaces", "default\ndemo")))
            .unwrap();
        let bus = Arc::new(EventBus::default());
        let d = Dispatcher::new(Arc::new(registry), bus.clone()).with_parallel(parallel);
        (d, bus)
    }

    fn raw_call(id: &str, name: &str, arguments: &str) -> MessageToolCall {
        MessageToolCall {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    #[test]
    fn empty_argument_string_is_empty_object() {
        assert_eq!(parse_arguments("").unwrap(), serde_json::json!({}));
        assert_eq!(parse_arguments("  ").unwrap(), serde_json::json!({}));
    }

    #[test]
    fn unparsable_arguments_are_invalid() {
        let err = parse_arguments("{not json").unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn one_result_per_call_in_order() {
        let (d, _) = dispatcher(false);
        let calls = vec![
            make_tool_call("c1", "list_pods", serde_json::json!({})),
            make_tool_call("c2", "list_namespaces", serde_json::json!({})),
        ];

        let results = d.dispatch(&calls).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0], ToolResult::ok("c1", "web-1\nweb-2"));
        assert_eq!(results[1], ToolResult::ok("c2", "default\ndemo"));
    }

    #[tokio::test]
    async fn failures_stay_local() {
        let (d, _) = dispatcher(false);
        let calls = vec![
            make_tool_call("c1", "list_pods", serde_json::json!({})),
            make_tool_call("c2", "delete_pod", serde_json::json!({"pod_name": "web-1"})),
            raw_call("c3", "list_pods", "{broken"),
            make_tool_call("c4", "list_namespaces", serde_json::json!({})),
        ];

        let results = d.dispatch(&calls).await;
        assert_eq!(results.len(), 4);
        assert!(results[0].success);
        assert!(!results[1].success);
        assert_eq!(results[1].output, "tool 'delete_pod' not found");
        assert!(!results[2].success);
        assert!(results[2].output.contains("not valid JSON"));
        assert!(results[3].success);
    }

    #[tokio::test]
    async fn unknown_tool_wins_over_broken_arguments() {
        let (d, _) = dispatcher(false);
        let results = d
            .dispatch(&[raw_call("c1", "delete_pod", "{\"pod_name\": ")])
            .await;

        assert_eq!(results.len(), 1);
        assert!(!results[0].success);
        assert_eq!(results[0].output, "tool 'delete_pod' not found");
    }

    #[tokio::test]
    async fn parallel_dispatch_preserves_order() {
        let (d, _) = dispatcher(true);
        let calls: Vec<_> = (0..6)
            .map(|i| {
                let name = if i % 2 == 0 { "list_pods" } else { "list_namespaces" };
                make_tool_call(&format!("c{i}"), name, serde_json::json!({}))
            })
            .collect();

        let results = d.dispatch(&calls).await;
        let ids: Vec<&str> = results.iter().map(|r| r.call_id.as_str()).collect();
        assert_eq!(ids, vec!["c0", "c1", "c2", "c3", "c4", "c5"]);
        assert!(results.iter().all(|r| r.success));
    }

    #[tokio::test]
    async fn publishes_tool_executed_events() {
        let (d, bus) = dispatcher(false);
        let mut rx = bus.subscribe();

        d.dispatch(&[make_tool_call("c1", "missing", serde_json::json!({}))])
            .await;

        let event = rx.recv().await.unwrap();
        match event.as_ref() {
            DomainEvent::ToolExecuted {
                tool_name, success, ..
            } => {
                assert_eq!(tool_name, "missing");
                assert!(!success);
            }
            other => panic!("Expected ToolExecuted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_call_list_yields_no_results() {
        let (d, _) = dispatcher(true);
        assert!(d.dispatch(&[]).await.is_empty());
    }
}
