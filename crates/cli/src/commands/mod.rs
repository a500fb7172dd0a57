pub mod ask;
pub mod doctor;
pub mod init;
pub mod serve;
pub mod tools;

use kubeclaw_config::AppConfig;

/// Load the config, turning a failure into a readable message.
pub(crate) fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

/// Fail early, with setup instructions, when no API key is configured.
pub(crate) fn require_api_key(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.has_api_key() {
        return Ok(());
    }

    eprintln!();
    eprintln!("  ERROR: No API key configured!");
    eprintln!();
    eprintln!("  Set one of these environment variables:");
    eprintln!("    ANTHROPIC_API_KEY=sk-ant-...   (default provider)");
    eprintln!("    OPENROUTER_API_KEY=sk-or-...   (with KUBECLAW_PROVIDER=openrouter)");
    eprintln!("    OPENAI_API_KEY=sk-...          (with KUBECLAW_PROVIDER=openai)");
    eprintln!("    KUBECLAW_API_KEY=...           (generic)");
    eprintln!();
    eprintln!("  Or add it to your config file:");
    eprintln!("    {}", AppConfig::config_path().display());
    eprintln!();
    Err("No API key found. See above for setup instructions.".into())
}
