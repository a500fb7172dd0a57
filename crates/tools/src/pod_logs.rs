//! Short log summary for one pod.

use async_trait::async_trait;
use kubeclaw_core::cluster::ClusterClient;
use kubeclaw_core::error::ToolError;
use kubeclaw_core::tool::{Access, ParamKind, ParamSpec, Tool, ToolArgs};
use std::sync::Arc;
use tracing::debug;

/// How much of a pod's log to fetch, and how much of that to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogWindow {
    /// Lines requested from the API server
    pub tail_lines: i64,
    /// Trailing lines kept in the summary
    pub summary_lines: usize,
}

impl Default for LogWindow {
    fn default() -> Self {
        Self {
            tail_lines: 20,
            summary_lines: 10,
        }
    }
}

pub struct PodLogsTool {
    cluster: Arc<dyn ClusterClient>,
    window: LogWindow,
}

impl PodLogsTool {
    pub fn new(cluster: Arc<dyn ClusterClient>, window: LogWindow) -> Self {
        Self { cluster, window }
    }
}

#[async_trait]
impl Tool for PodLogsTool {
    fn name(&self) -> &str {
        "get_pod_logs"
    }

    fn description(&self) -> &str {
        "Fetches logs for a pod. Returns only the last few lines as a summary."
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::required("pod_name", ParamKind::String, "Name of the pod"),
            ParamSpec::required("namespace", ParamKind::String, "Namespace the pod runs in"),
        ]
    }

    fn access(&self) -> Access {
        Access::ReadOnly
    }

    async fn execute(&self, args: ToolArgs) -> Result<String, ToolError> {
        let pod_name = args.str("pod_name")?;
        let namespace = args.str("namespace")?;

        let logs = self
            .cluster
            .pod_logs(pod_name, namespace, self.window.tail_lines)
            .await
            .map_err(|e| ToolError::Upstream {
                reason: format!("Failed to get logs for pod '{pod_name}'. Details: {e}"),
            })?;

        let lines: Vec<&str> = logs.lines().collect();
        debug!(pod = pod_name, namespace, fetched = lines.len(), "Summarising pod log");
        let summary = if lines.is_empty() {
            "No logs available.".to_string()
        } else {
            let skip = lines.len().saturating_sub(self.window.summary_lines);
            lines[skip..].join("\n")
        };

        Ok(format!("Log summary for '{pod_name}':\n{summary}"))
    }
}
