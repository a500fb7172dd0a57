//! `~/.kubeclaw/config.toml`, environment overrides, and startup validation.
//!
//! Every section is optional. Missing keys fall back to the values in the
//! `Default` impls below, so an empty file is a valid config.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Provider-specific key variables. When no key is set in the file,
/// `KUBECLAW_API_KEY` wins, then the variable of `default_provider`, then the
/// rest in this order.
const PROVIDER_KEY_VARS: [(&str, &str); 3] = [
    ("anthropic", "ANTHROPIC_API_KEY"),
    ("openrouter", "OPENROUTER_API_KEY"),
    ("openai", "OPENAI_API_KEY"),
];

const CONFIG_FILE: &str = "config.toml";

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Shared key; a `[providers.<name>]` entry may carry its own.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub default_provider: String,
    pub default_model: String,
    pub default_temperature: f32,
    pub default_max_tokens: u32,
    pub gateway: GatewayConfig,
    pub agent: AgentConfig,
    pub cluster: ClusterConfig,
    pub providers: HashMap<String, ProviderConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: "anthropic".into(),
            default_model: "claude-3-haiku-20240307".into(),
            default_temperature: 0.0,
            default_max_tokens: 1024,
            gateway: GatewayConfig::default(),
            agent: AgentConfig::default(),
            cluster: ClusterConfig::default(),
            providers: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    /// CORS allow-list. Empty means any origin.
    pub allowed_origins: Vec<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Model calls allowed per question.
    pub max_iterations: u32,
    /// Wall-clock budget for one question.
    pub turn_timeout_secs: u64,
    /// Dispatch the tool calls of one reply concurrently.
    pub parallel_tools: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt_override: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            turn_timeout_secs: 120,
            parallel_tools: false,
            system_prompt_override: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// kubeconfig context; `None` means in-cluster or the current context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Lines requested from the API server per log fetch.
    pub log_tail_lines: i64,
    /// Trailing lines of that fetch handed to the model.
    pub log_summary_lines: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            context: None,
            log_tail_lines: 20,
            log_summary_lines: 10,
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Overrides the built-in endpoint for this provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

/// Debug helper that shows whether a secret is set without printing it.
struct Redacted<'a>(&'a Option<String>);

impl fmt::Debug for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.0.is_some() { "[REDACTED]" } else { "None" })
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &Redacted(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("gateway", &self.gateway)
            .field("agent", &self.agent)
            .field("cluster", &self.cluster)
            .field("providers", &self.providers)
            .finish()
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &Redacted(&self.api_key))
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl AppConfig {
    /// Read `~/.kubeclaw/config.toml`, then layer environment overrides on top.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse one file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError::ReadError {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
            }
        };

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(provider) = non_empty("KUBECLAW_PROVIDER") {
            self.default_provider = provider;
        }
        if self.api_key.is_none() {
            let matching = PROVIDER_KEY_VARS
                .iter()
                .filter(|(provider, _)| *provider == self.default_provider);
            let others = PROVIDER_KEY_VARS
                .iter()
                .filter(|(provider, _)| *provider != self.default_provider);
            self.api_key = std::iter::once("KUBECLAW_API_KEY")
                .chain(matching.chain(others).map(|(_, var)| *var))
                .find_map(|var| non_empty(var));
        }
        if let Some(model) = non_empty("KUBECLAW_MODEL") {
            self.default_model = model;
        }
        if let Some(raw) = non_empty("KUBECLAW_PORT") {
            match raw.parse::<u16>() {
                Ok(port) => self.gateway.port = port,
                Err(_) => tracing::warn!(value = %raw, "Ignoring invalid KUBECLAW_PORT"),
            }
        }
    }

    /// `~/.kubeclaw`, falling back to the working directory without a home.
    pub fn config_dir() -> PathBuf {
        let home = std::env::var_os(if cfg!(windows) { "USERPROFILE" } else { "HOME" });
        home.map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".kubeclaw")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join(CONFIG_FILE)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            (
                (0.0..=2.0).contains(&self.default_temperature),
                "default_temperature must be between 0.0 and 2.0",
            ),
            (
                self.agent.max_iterations >= 1,
                "agent.max_iterations must be at least 1",
            ),
            (
                self.agent.turn_timeout_secs >= 1,
                "agent.turn_timeout_secs must be at least 1",
            ),
            (
                self.cluster.log_tail_lines >= 1,
                "cluster.log_tail_lines must be at least 1",
            ),
            (
                self.cluster.log_summary_lines as i64 <= self.cluster.log_tail_lines,
                "cluster.log_summary_lines must not exceed cluster.log_tail_lines",
            ),
        ];

        match checks.iter().find(|(ok, _)| !ok) {
            Some((_, problem)) => Err(ConfigError::ValidationError((*problem).into())),
            None => Ok(()),
        }
    }

    /// True when the shared key or any per-provider key is set.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some() || self.providers.values().any(|p| p.api_key.is_some())
    }

    /// The file `kubeclaw init` writes.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
