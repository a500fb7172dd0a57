//! ClusterClient trait: the read-only view of a Kubernetes cluster.
//!
//! Tools are bound to a `ClusterClient` at startup. The trait returns plain
//! domain data; turning it into model-facing text is the tools' job.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ClusterError;

/// Observed state of one container in a pod.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerState {
    Running,
    Waiting,
    Terminated,
    Unknown,
}

impl std::fmt::Display for ContainerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ContainerState::Running => "running",
            ContainerState::Waiting => "waiting",
            ContainerState::Terminated => "terminated",
            ContainerState::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// The subset of a pod that the assistant reports on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodDetails {
    pub name: String,
    pub namespace: String,
    /// Pod phase (Pending, Running, Succeeded, Failed, Unknown)
    pub phase: Option<String>,
    pub node: Option<String>,
    /// Container names from the pod spec
    pub containers: Vec<String>,
    /// (container name, state) from the pod status
    pub container_states: Vec<(String, ContainerState)>,
    /// RFC 3339 start time
    pub start_time: Option<String>,
}

/// Read-only Kubernetes queries.
///
/// `namespace: None` means "every namespace".
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Pod names.
    async fn list_pods(&self, namespace: Option<&str>) -> Result<Vec<String>, ClusterError>;

    /// One pod's details.
    async fn get_pod(&self, name: &str, namespace: &str) -> Result<PodDetails, ClusterError>;

    /// The last `tail_lines` lines of a pod's log.
    async fn pod_logs(
        &self,
        name: &str,
        namespace: &str,
        tail_lines: i64,
    ) -> Result<String, ClusterError>;

    /// Deployment names.
    async fn list_deployments(&self, namespace: Option<&str>) -> Result<Vec<String>, ClusterError>;

    /// Namespace names.
    async fn list_namespaces(&self) -> Result<Vec<String>, ClusterError>;
}
