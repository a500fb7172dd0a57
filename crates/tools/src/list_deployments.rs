//! List deployment names in one namespace or across the cluster.

use crate::namespace_scope;
use async_trait::async_trait;
use kubeclaw_core::cluster::ClusterClient;
use kubeclaw_core::error::ToolError;
use kubeclaw_core::tool::{Access, ParamKind, ParamSpec, Tool, ToolArgs};
use std::sync::Arc;

pub struct ListDeploymentsTool {
    cluster: Arc<dyn ClusterClient>,
}

impl ListDeploymentsTool {
    pub fn new(cluster: Arc<dyn ClusterClient>) -> Self {
        Self { cluster }
    }
}

#[async_trait]
impl Tool for ListDeploymentsTool {
    fn name(&self) -> &str {
        "list_deployments"
    }

    fn description(&self) -> &str {
        "Lists deployment names in a namespace. Returns only names, one per line."
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::optional(
            "namespace",
            ParamKind::String,
            "Namespace to list, or \"all\" for every namespace",
            serde_json::json!("default"),
        )]
    }

    fn access(&self) -> Access {
        Access::ReadOnly
    }

    async fn execute(&self, args: ToolArgs) -> Result<String, ToolError> {
        let namespace = args.str("namespace")?;
        let names = self
            .cluster
            .list_deployments(namespace_scope(namespace))
            .await
            .map_err(|e| ToolError::Upstream {
                reason: format!("Failed to list deployments. Details: {e}"),
            })?;

        if names.is_empty() {
            return Ok(format!("No deployments found in namespace '{namespace}'."));
        }
        Ok(names.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeCluster;

    fn tool() -> ListDeploymentsTool {
        let mut fake = FakeCluster::default();
        fake.deployments.insert("default".into(), vec!["api".into()]);
        fake.deployments.insert("demo".into(), vec!["web".into(), "worker".into()]);
        ListDeploymentsTool::new(Arc::new(fake))
    }

    fn args(raw: serde_json::Value) -> ToolArgs {
        ToolArgs::validate(&tool().params(), &raw).unwrap()
    }

    #[tokio::test]
    async fn defaults_to_default_namespace() {
        let out = tool().execute(args(serde_json::json!({}))).await.unwrap();
        assert_eq!(out, "api");
    }

    #[tokio::test]
    async fn lists_all_namespaces() {
        let out = tool()
            .execute(args(serde_json::json!({"namespace": "all"})))
            .await
            .unwrap();
        assert_eq!(out, "api\nweb\nworker");
    }

    #[tokio::test]
    async fn empty_namespace_message() {
        let out = tool()
            .execute(args(serde_json::json!({"namespace": "empty"})))
            .await
            .unwrap();
        assert_eq!(out, "No deployments found in namespace 'empty'.");
    }

    #[tokio::test]
    async fn upstream_failure() {
        let tool = ListDeploymentsTool::new(Arc::new(FakeCluster::failing("connection refused")));
        let err = tool.execute(args(serde_json::json!({}))).await.unwrap_err();
        assert!(matches!(err, ToolError::Upstream { .. }));
        assert!(err.to_string().contains("Failed to list deployments. Details: connection refused"));
    }
}
