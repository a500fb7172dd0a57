//! `kubeclaw init`: Write a default config file.

use kubeclaw_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete it and re-run init.");
        return Ok(());
    }

    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("✅ Created config.toml at: {}", config_path.display());
    println!();
    println!("📝 Next steps:");
    println!("   1. Set ANTHROPIC_API_KEY (or api_key in config.toml)");
    println!("   2. Check your kubeconfig context: kubectl config current-context");
    println!("   3. Run `kubeclaw doctor`, then `kubeclaw serve`");

    Ok(())
}
