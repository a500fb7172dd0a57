//! Read-only Kubernetes client for KubeClaw.
//!
//! [`KubeClusterClient`] implements [`ClusterClient`] over `kube`. It only
//! ever issues `list`, `get` and `logs` calls.

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Namespace, Pod};
use kube::api::{Api, ListParams, LogParams};
use kube::config::KubeConfigOptions;
use kube::{Client, Config, ResourceExt};
use kubeclaw_core::cluster::{ClusterClient, ContainerState, PodDetails};
use kubeclaw_core::error::ClusterError;
use tracing::{debug, info};

/// A [`ClusterClient`] backed by the Kubernetes API server.
#[derive(Clone)]
pub struct KubeClusterClient {
    client: Client,
}

impl KubeClusterClient {
    /// Connect to the cluster.
    ///
    /// Tries the in-cluster service account first, then the local kubeconfig
    /// (using `context` when given, else the current context).
    pub async fn connect(context: Option<&str>) -> Result<Self, ClusterError> {
        let config = match Config::incluster() {
            Ok(config) => {
                info!("Loaded in-cluster Kubernetes config");
                config
            }
            Err(e) => {
                info!(reason = %e, "Not running in-cluster, loading local kubeconfig");
                let options = KubeConfigOptions {
                    context: context.map(String::from),
                    ..KubeConfigOptions::default()
                };
                Config::from_kubeconfig(&options)
                    .await
                    .map_err(|e| ClusterError::Connection(e.to_string()))?
            }
        };

        let client = Client::try_from(config).map_err(|e| ClusterError::Connection(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wrap an already-configured client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    fn pods(&self, namespace: Option<&str>) -> Api<Pod> {
        match namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        }
    }

    fn deployments(&self, namespace: Option<&str>) -> Api<Deployment> {
        match namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        }
    }
}

#[async_trait]
impl ClusterClient for KubeClusterClient {
    async fn list_pods(&self, namespace: Option<&str>) -> Result<Vec<String>, ClusterError> {
        debug!(namespace = ?namespace, "Listing pods");
        let list = self
            .pods(namespace)
            .list(&ListParams::default())
            .await
            .map_err(map_kube_error)?;
        Ok(list.items.iter().map(|p| p.name_any()).collect())
    }

    async fn get_pod(&self, name: &str, namespace: &str) -> Result<PodDetails, ClusterError> {
        debug!(pod = name, namespace, "Reading pod");
        let pod = self
            .pods(Some(namespace))
            .get(name)
            .await
            .map_err(map_kube_error)?;
        Ok(pod_details_from(&pod))
    }

    async fn pod_logs(
        &self,
        name: &str,
        namespace: &str,
        tail_lines: i64,
    ) -> Result<String, ClusterError> {
        debug!(pod = name, namespace, tail_lines, "Reading pod logs");
        let params = LogParams {
            tail_lines: Some(tail_lines),
            ..LogParams::default()
        };
        self.pods(Some(namespace))
            .logs(name, &params)
            .await
            .map_err(map_kube_error)
    }

    async fn list_deployments(&self, namespace: Option<&str>) -> Result<Vec<String>, ClusterError> {
        debug!(namespace = ?namespace, "Listing deployments");
        let list = self
            .deployments(namespace)
            .list(&ListParams::default())
            .await
            .map_err(map_kube_error)?;
        Ok(list.items.iter().map(|d| d.name_any()).collect())
    }

    async fn list_namespaces(&self) -> Result<Vec<String>, ClusterError> {
        debug!("Listing namespaces");
        let api: Api<Namespace> = Api::all(self.client.clone());
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(map_kube_error)?;
        Ok(list.items.iter().map(|n| n.name_any()).collect())
    }
}

fn map_kube_error(e: kube::Error) -> ClusterError {
    match e {
        kube::Error::Api(resp) => ClusterError::Api {
            reason: if resp.message.is_empty() {
                resp.reason
            } else {
                resp.message
            },
        },
        other => ClusterError::Api {
            reason: other.to_string(),
        },
    }
}

/// Project a `Pod` onto the fields the assistant reports.
pub fn pod_details_from(pod: &Pod) -> PodDetails {
    let spec = pod.spec.as_ref();
    let status = pod.status.as_ref();

    let containers = spec
        .map(|s| s.containers.iter().map(|c| c.name.clone()).collect())
        .unwrap_or_default();

    let container_states = status
        .and_then(|s| s.container_statuses.as_ref())
        .map(|statuses| {
            statuses
                .iter()
                .map(|cs| {
                    let state = match cs.state.as_ref() {
                        Some(st) if st.running.is_some() => ContainerState::Running,
                        Some(st) if st.waiting.is_some() => ContainerState::Waiting,
                        Some(st) if st.terminated.is_some() => ContainerState::Terminated,
                        _ => ContainerState::Unknown,
                    };
                    (cs.name.clone(), state)
                })
                .collect()
        })
        .unwrap_or_default();

    PodDetails {
        name: pod.name_any(),
        namespace: pod.namespace().unwrap_or_default(),
        phase: status.and_then(|s| s.phase.clone()),
        node: spec.and_then(|s| s.node_name.clone()),
        containers,
        container_states,
        start_time: status
            .and_then(|s| s.start_time.as_ref())
            .map(|t| t.0.to_rfc3339()),
    }
}
