//! `kubeclaw tools`: Show the tool catalog offered to the model.

use async_trait::async_trait;
use kubeclaw_core::cluster::{ClusterClient, PodDetails};
use kubeclaw_core::error::ClusterError;
use kubeclaw_core::provider::ToolDefinition;
use kubeclaw_tools::LogWindow;
use std::sync::Arc;

/// Stands in for a cluster so the catalog can be listed without a kubeconfig.
struct Offline;

fn offline() -> ClusterError {
    ClusterError::Connection("not connected; listing the catalog only".into())
}

#[async_trait]
impl ClusterClient for Offline {
    async fn list_pods(&self, _namespace: Option<&str>) -> Result<Vec<String>, ClusterError> {
        Err(offline())
    }

    async fn get_pod(&self, _name: &str, _namespace: &str) -> Result<PodDetails, ClusterError> {
        Err(offline())
    }

    async fn pod_logs(
        &self,
        _name: &str,
        _namespace: &str,
        _tail_lines: i64,
    ) -> Result<String, ClusterError> {
        Err(offline())
    }

    async fn list_deployments(&self, _namespace: Option<&str>) -> Result<Vec<String>, ClusterError> {
        Err(offline())
    }

    async fn list_namespaces(&self) -> Result<Vec<String>, ClusterError> {
        Err(offline())
    }
}

pub fn run(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let definitions = catalog()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&definitions)?);
        return Ok(());
    }

    println!("🔧 {} read-only tools available to the model:\n", definitions.len());
    for def in &definitions {
        println!("  {:<18} {}", def.name, def.description);
        for line in parameter_lines(&def.parameters) {
            println!("  {:<18}   {line}", "");
        }
    }

    Ok(())
}

fn catalog() -> Result<Vec<ToolDefinition>, Box<dyn std::error::Error>> {
    let registry = kubeclaw_tools::default_registry(Arc::new(Offline), LogWindow::default())?;
    Ok(registry.definitions())
}

/// One line per parameter: `name (type, required)` or `name (type, default: x)`.
fn parameter_lines(schema: &serde_json::Value) -> Vec<String> {
    let Some(properties) = schema["properties"].as_object() else {
        return vec![];
    };
    let required: Vec<&str> = schema["required"]
        .as_array()
        .map(|r| r.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default();

    properties
        .iter()
        .map(|(name, prop)| {
            let kind = prop["type"].as_str().unwrap_or("any");
            if required.contains(&name.as_str()) {
                format!("{name} ({kind}, required)")
            } else if let Some(default) = prop.get("default") {
                format!("{name} ({kind}, default: {default})")
            } else {
                format!("{name} ({kind})")
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_lists_every_builtin_tool() {
        let names: Vec<String> = catalog().unwrap().into_iter().map(|d| d.name).collect();
        assert_eq!(
            names,
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
    fn parameter_lines_mark_required_and_defaults() {
        let schema = serde_json::json!({
            "type": "object",
            "properties": {
                "namespace": {"type": "string", "default": "all"},
                "pod_name": {"type": "string"}
            },
            "required": ["pod_name"]
        });
        let lines = parameter_lines(&schema);
        assert!(lines.contains(&r#"namespace (string, default: "all")"#.to_string()));
        assert!(lines.contains(&"pod_name (string, required)".to_string()));
    }

    #[test]
    fn parameterless_schema_has_no_lines() {
        let schema = serde_json::json!({"type": "object", "properties": {}});
        assert!(parameter_lines(&schema).is_empty());
    }
}
