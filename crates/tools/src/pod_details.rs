//! Concise details for one pod: phase, node, containers and their states.

use async_trait::async_trait;
use kubeclaw_core::cluster::{ClusterClient, PodDetails};
use kubeclaw_core::error::ToolError;
use kubeclaw_core::tool::{Access, ParamKind, ParamSpec, Tool, ToolArgs};
use std::sync::Arc;

pub struct PodDetailsTool {
    cluster: Arc<dyn ClusterClient>,
}

impl PodDetailsTool {
    pub fn new(cluster: Arc<dyn ClusterClient>) -> Self {
        Self { cluster }
    }
}

#[async_trait]
impl Tool for PodDetailsTool {
    fn name(&self) -> &str {
        "get_pod_details"
    }

    fn description(&self) -> &str {
        "Retrieves concise details about a pod: name, namespace, status, node, containers and their states, start time."
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

        let details = self
            .cluster
            .get_pod(pod_name, namespace)
            .await
            .map_err(|e| ToolError::Upstream {
                reason: format!("Failed to get details for pod '{pod_name}'. Details: {e}"),
            })?;

        Ok(render(&details))
    }
}

fn or_na(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("N/A")
}

fn join_or_na(items: Vec<String>) -> String {
    if items.is_empty() {
        "N/A".into()
    } else {
        items.join(", ")
    }
}

fn render(d: &PodDetails) -> String {
    let statuses = d
        .container_states
        .iter()
        .map(|(name, state)| format!("{name}: {state}"))
        .collect();

    format!(
        "Pod: {}\nNamespace: {}\nStatus: {}\nNode: {}\nContainers: {}\nContainer Statuses: {}\nStart Time: {}",
        d.name,
        d.namespace,
        or_na(d.phase.as_deref()),
        or_na(d.node.as_deref()),
        join_or_na(d.containers.clone()),
        join_or_na(statuses),
        or_na(d.start_time.as_deref()),
    )
}
