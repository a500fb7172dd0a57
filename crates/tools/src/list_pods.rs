//! List pod names in one namespace or across the cluster.

use crate::namespace_scope;
use async_trait::async_trait;
use kubeclaw_core::cluster::ClusterClient;
use kubeclaw_core::error::ToolError;
use kubeclaw_core::tool::{Access, ParamKind, ParamSpec, Tool, ToolArgs};
use std::sync::Arc;

pub struct ListPodsTool {
    cluster: Arc<dyn ClusterClient>,
}

impl ListPodsTool {
    pub fn new(cluster: Arc<dyn ClusterClient>) -> Self {
        Self { cluster }
    }
}

#[async_trait]
impl Tool for ListPodsTool {
    fn name(&self) -> &str {
        "list_pods"
    }

    fn description(&self) -> &str {
        "Lists pod names in a namespace (or all namespaces). Returns only pod names, one per line."
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::optional(
            "namespace",
            ParamKind::String,
            "Namespace to list, or \"all\" for every namespace",
            serde_json::json!("all"),
        )]
    }

    fn access(&self) -> Access {
        Access::ReadOnly
    }

    async fn execute(&self, args: ToolArgs) -> Result<String, ToolError> {
        let namespace = args.str("namespace")?;
        let names = self
            .cluster
            .list_pods(namespace_scope(namespace))
            .await
            .map_err(|e| ToolError::Upstream {
                reason: format!("Failed to list pods. Details: {e}"),
            })?;

        if names.is_empty() {
            return Ok(format!("No pods found in namespace '{namespace}'."));
        }
        Ok(names.join("\n"))
    }
}
