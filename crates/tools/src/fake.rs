//! In-memory cluster used by the tool tests.

use async_trait::async_trait;
use kubeclaw_core::cluster::{ClusterClient, PodDetails};
use kubeclaw_core::error::ClusterError;
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct FakeCluster {
    /// namespace -> pod names
    pub pods: BTreeMap<String, Vec<String>>,
    /// namespace -> deployment names
    pub deployments: BTreeMap<String, Vec<String>>,
    /// (namespace, pod) -> details
    pub details: BTreeMap<(String, String), PodDetails>,
    /// (namespace, pod) -> full log text
    pub logs: BTreeMap<(String, String), String>,
    /// Every call fails with this reason when set
    pub failure: Option<String>,
    /// Last `tail_lines` passed to `pod_logs`
    pub last_tail: Mutex<Option<i64>>,
}

impl FakeCluster {
    pub fn failing(reason: &str) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::default()
        }
    }

    fn check(&self) -> Result<(), ClusterError> {
        match &self.failure {
            Some(reason) => Err(ClusterError::Api {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    fn names(map: &BTreeMap<String, Vec<String>>, namespace: Option<&str>) -> Vec<String> {
        match namespace {
            Some(ns) => map.get(ns).cloned().unwrap_or_default(),
            None => map.values().flatten().cloned().collect(),
        }
    }
}

#[async_trait]
impl ClusterClient for FakeCluster {
    async fn list_pods(&self, namespace: Option<&str>) -> Result<Vec<String>, ClusterError> {
        self.check()?;
        Ok(Self::names(&self.pods, namespace))
    }

    async fn get_pod(&self, name: &str, namespace: &str) -> Result<PodDetails, ClusterError> {
        self.check()?;
        self.details
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| ClusterError::Api {
                reason: format!("pods \"{name}\" not found"),
            })
    }

    async fn pod_logs(
        &self,
        name: &str,
        namespace: &str,
        tail_lines: i64,
    ) -> Result<String, ClusterError> {
        self.check()?;
        if let Ok(mut last) = self.last_tail.lock() {
            *last = Some(tail_lines);
        }
        let full = self
            .logs
            .get(&(namespace.to_string(), name.to_string()))
            .ok_or_else(|| ClusterError::Api {
                reason: format!("pods \"{name}\" not found"),
            })?;
        let lines: Vec<&str> = full.lines().collect();
        let skip = lines.len().saturating_sub(tail_lines.max(0) as usize);
        Ok(lines[skip..].join("\n"))
    }

    async fn list_deployments(&self, namespace: Option<&str>) -> Result<Vec<String>, ClusterError> {
        self.check()?;
        Ok(Self::names(&self.deployments, namespace))
    }

    async fn list_namespaces(&self) -> Result<Vec<String>, ClusterError> {
        self.check()?;
        Ok(self.pods.keys().cloned().collect())
    }
}
