//! Built-in tool implementations for KubeClaw.
//!
//! Every tool is a read-only view of the cluster, bound to a shared
//! [`ClusterClient`] at startup. Tools return plain text meant for the model;
//! cluster failures come back as [`ToolError::Upstream`] with a readable reason.
//!
//! [`ToolError::Upstream`]: kubeclaw_core::error::ToolError::Upstream

pub mod list_deployments;
pub mod list_namespaces;
pub mod list_pods;
pub mod pod_details;
pub mod pod_logs;

#[cfg(test)]
pub(crate) mod fake;

use kubeclaw_core::cluster::ClusterClient;
use kubeclaw_core::error::RegistryError;
use kubeclaw_core::tool::ToolRegistry;
use std::sync::Arc;

pub use list_deployments::ListDeploymentsTool;
pub use list_namespaces::ListNamespacesTool;
pub use list_pods::ListPodsTool;
pub use pod_details::PodDetailsTool;
pub use pod_logs::{LogWindow, PodLogsTool};

/// Create the registry holding every built-in tool, bound to `cluster`.
pub fn default_registry(
    cluster: Arc<dyn ClusterClient>,
    logs: LogWindow,
) -> Result<ToolRegistry, RegistryError> {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(ListPodsTool::new(cluster.clone())))?;
    registry.register(Box::new(PodDetailsTool::new(cluster.clone())))?;
    registry.register(Box::new(PodLogsTool::new(cluster.clone(), logs)))?;
    registry.register(Box::new(ListDeploymentsTool::new(cluster.clone())))?;
    registry.register(Box::new(ListNamespacesTool::new(cluster)))?;
    Ok(registry)
}

/// `"all"` (any case) means every namespace.
pub(crate) fn namespace_scope(namespace: &str) -> Option<&str> {
    if namespace.eq_ignore_ascii_case("all") {
        None
    } else {
        Some(namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeCluster;

    #[test]
    fn default_registry_holds_five_tools_in_order() {
        let registry = default_registry(Arc::new(FakeCluster::default()), LogWindow::default()).unwrap();
        assert_eq!(
            registry.names(),
            vec![
                "list_pods",
                "get_pod_details",
                "get_pod_logs",
                "list_deployments",
                "list_namespaces"
            ]
        );
    }

    #[test]
    fn no_mutating_tool_is_exposed() {
        let registry = default_registry(Arc::new(FakeCluster::default()), LogWindow::default()).unwrap();
        for name in registry.names() {
            assert!(!name.contains("delete"));
            assert!(!name.contains("scale"));
        }
    }

    #[test]
    fn namespace_scope_handles_all() {
        assert_eq!(namespace_scope("all"), None);
        assert_eq!(namespace_scope("ALL"), None);
        assert_eq!(namespace_scope("demo"), Some("demo"));
    }
}
