//! `kubeclaw doctor`: Diagnose system health.

use kubeclaw_cluster::KubeClusterClient;
use kubeclaw_config::AppConfig;
use kubeclaw_core::cluster::ClusterClient;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 KubeClaw Doctor — System Diagnostics");
    println!("=======================================\n");

    let mut issues = 0;

    // Config
    let config_path = AppConfig::config_path();
    let config = match AppConfig::load() {
        Ok(config) => {
            if config_path.exists() {
                println!("  ✅ Config file valid: {}", config_path.display());
            } else {
                println!("  ℹ️  No config file, using defaults (run `kubeclaw init` to create one)");
            }
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  Fix the config before running further checks.");
            return Ok(());
        }
    };

    // API key
    if config.has_api_key() {
        println!("  ✅ API key configured");
    } else {
        println!("  ⚠️  No API key configured — set ANTHROPIC_API_KEY or api_key in config.toml");
        issues += 1;
    }

    // Cluster
    match KubeClusterClient::connect(config.cluster.context.as_deref()).await {
        Ok(cluster) => match cluster.list_namespaces().await {
            Ok(namespaces) => {
                println!("  ✅ Cluster reachable ({} namespaces)", namespaces.len());
            }
            Err(e) => {
                println!("  ❌ Cluster configured but not answering: {e}");
                issues += 1;
            }
        },
        Err(e) => {
            println!("  ❌ No cluster connection: {e}");
            issues += 1;
        }
    }

    // Provider
    let router = kubeclaw_providers::build_from_config(&config);
    match router.default_provider() {
        Some(provider) => match provider.health_check().await {
            Ok(true) => println!(
                "  ✅ Provider '{}' ready (model {})",
                provider.name(),
                config.default_model
            ),
            Ok(false) => {
                println!("  ⚠️  Provider '{}' is not ready", provider.name());
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ Provider '{}' health check failed: {e}", provider.name());
                issues += 1;
            }
        },
        None => {
            println!(
                "  ❌ Provider '{}' is not configured",
                config.default_provider
            );
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
