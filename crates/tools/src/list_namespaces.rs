//! List every namespace in the cluster.

use async_trait::async_trait;
use kubeclaw_core::cluster::ClusterClient;
use kubeclaw_core::error::ToolError;
use kubeclaw_core::tool::{Access, ParamSpec, Tool, ToolArgs};
use std::sync::Arc;

pub struct ListNamespacesTool {
    cluster: Arc<dyn ClusterClient>,
}

impl ListNamespacesTool {
    pub fn new(cluster: Arc<dyn ClusterClient>) -> Self {
        Self { cluster }
    }
}

#[async_trait]
impl Tool for ListNamespacesTool {
    fn name(&self) -> &str {
        "list_namespaces"
    }

    fn description(&self) -> &str {
        "Lists all namespaces. Returns only namespace names, one per line."
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![]
    }

    fn access(&self) -> Access {
        Access::ReadOnly
    }

    async fn execute(&self, _args: ToolArgs) -> Result<String, ToolError> {
        let names = self
            .cluster
            .list_namespaces()
            .await
            .map_err(|e| ToolError::Upstream {
                reason: format!("Failed to list namespaces. Details: {e}"),
            })?;

        if names.is_empty() {
            return Ok("No namespaces found.".into());
        }
        Ok(names.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeCluster;

    #[tokio::test]
    async fn lists_namespaces() {
        let mut fake = FakeCluster::default();
        fake.pods.insert("default".into(), vec![]);
        fake.pods.insert("demo".into(), vec![]);
        let out = ListNamespacesTool::new(Arc::new(fake))
            .execute(ToolArgs::default())
            .await
            .unwrap();
        assert_eq!(out, "default\ndemo");
    }

    #[tokio::test]
    async fn no_namespaces() {
        let out = ListNamespacesTool::new(Arc::new(FakeCluster::default()))
            .execute(ToolArgs::default())
            .await
            .unwrap();
        assert_eq!(out, "No namespaces found.");
    }

    #[tokio::test]
    async fn idempotent_against_unchanged_cluster() {
        let mut fake = FakeCluster::default();
        fake.pods.insert("demo".into(), vec![]);
        let tool = ListNamespacesTool::new(Arc::new(fake));
        let first = tool.execute(ToolArgs::default()).await.unwrap();
        let second = tool.execute(ToolArgs::default()).await.unwrap();
        assert_eq!(first, second);
    }
}
