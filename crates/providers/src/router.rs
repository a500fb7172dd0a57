//! Turns the `[providers]` config table into live provider handles.

use crate::anthropic::AnthropicProvider;
use crate::openai_compat::OpenAiCompatProvider;
use kubeclaw_config::AppConfig;
use kubeclaw_core::provider::Provider;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// Chat-completions endpoints that need no `api_url` in the config.
const KNOWN_ENDPOINTS: &[(&str, &str)] = &[
    ("openai", "https://api.openai.com/v1"),
    ("openrouter", "https://openrouter.ai/api/v1"),
    ("groq", "https://api.groq.com/openai/v1"),
    ("ollama", "http://localhost:11434/v1"),
    ("vllm", "http://localhost:8000/v1"),
];

/// Named providers plus the one the agent talks to by default.
pub struct ProviderRouter {
    providers: BTreeMap<String, Arc<dyn Provider>>,
    default_provider: String,
}

impl ProviderRouter {
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: BTreeMap::new(),
            default_provider: default_provider.into(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    pub fn default_provider(&self) -> Option<Arc<dyn Provider>> {
        self.get(&self.default_provider)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }
}

/// Build every configured provider, plus the default one if the config only
/// names it. A provider without a known endpoint or an `api_url` is skipped.
pub fn build_from_config(config: &AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new(&config.default_provider);

    let implicit_default = (!config.providers.contains_key(&config.default_provider))
        .then_some((&config.default_provider, None));
    let entries = config
        .providers
        .iter()
        .map(|(name, entry)| (name, Some(entry)))
        .chain(implicit_default);

    for (name, entry) in entries {
        let api_key = entry
            .and_then(|e| e.api_key.clone())
            .or_else(|| config.api_key.clone())
            .unwrap_or_default();
        let api_url = entry.and_then(|e| e.api_url.as_deref());

        match connect(name, &api_key, api_url) {
            Some(provider) => router.register(name.as_str(), provider),
            None => warn!(
                provider = %name,
                "Unknown provider has no api_url configured; skipping"
            ),
        }
    }

    router
}

fn connect(name: &str, api_key: &str, api_url: Option<&str>) -> Option<Arc<dyn Provider>> {
    if name == "anthropic" {
        let provider = AnthropicProvider::new(api_key);
        return Some(Arc::new(match api_url {
            Some(url) => provider.with_base_url(url),
            None => provider,
        }));
    }

    let base_url = api_url.or_else(|| known_endpoint(name))?;
    Some(Arc::new(OpenAiCompatProvider::new(name, base_url, api_key)))
}

fn known_endpoint(name: &str) -> Option<&'static str> {
    KNOWN_ENDPOINTS
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, url)| *url)
}
