//! Provider router — selects the generation provider based on config.
//!
//! Every provider the router hands out is wrapped in a `TimeoutProvider`
//! carrying `backend.call_timeout_secs`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use sightline_core::provider::Provider;
use tracing::warn;

use crate::dummy::DummyProvider;
use crate::openai_compat::OpenAiCompatProvider;
use crate::timeout::TimeoutProvider;

/// Routes generation calls to the configured provider.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn Provider>>,
    default_provider: String,
}

impl ProviderRouter {
    /// Create a new router with a default provider.
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider.into(),
        }
    }

    /// Register a provider.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Get the default provider.
    pub fn default(&self) -> Option<Arc<dyn Provider>> {
        self.providers.get(&self.default_provider).cloned()
    }

    /// Get a specific provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    pub fn default_name(&self) -> &str {
        &self.default_provider
    }

    /// List all registered provider names.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

/// Build providers from configuration.
///
/// A provider name with no well-known endpoint and no `api_url` is not
/// registered; asking for it as the default then yields `None`.
pub fn build_from_config(config: &sightline_config::AppConfig) -> ProviderRouter {
    let call_timeout = Duration::from_secs(config.backend.call_timeout_secs);
    let mut router = ProviderRouter::new(&config.backend.provider);

    for (name, provider_config) in &config.providers {
        let api_key = config.provider_api_key(name).unwrap_or_default();
        if let Some(provider) = create_provider(name, provider_config.api_url.clone(), &api_key) {
            router.register(name.clone(), wrap(provider, call_timeout));
        }
    }

    // Ensure the default provider exists (even if not explicitly configured)
    let default_name = config.backend.provider.clone();
    if router.get(&default_name).is_none() {
        let api_key = config.provider_api_key(&default_name).unwrap_or_default();
        if let Some(provider) = create_provider(&default_name, None, &api_key) {
            router.register(default_name, wrap(provider, call_timeout));
        }
    }

    router
}

fn create_provider(
    name: &str,
    api_url: Option<String>,
    api_key: &str,
) -> Option<Arc<dyn Provider>> {
    if name == "dummy" {
        return Some(Arc::new(DummyProvider::new()));
    }
    let Some(base_url) = api_url.or_else(|| default_base_url(name)) else {
        warn!(provider = %name, "Unknown provider without api_url, not registered");
        return None;
    };
    Some(Arc::new(OpenAiCompatProvider::new(name, &base_url, api_key)))
}

fn wrap(provider: Arc<dyn Provider>, timeout: Duration) -> Arc<dyn Provider> {
    Arc::new(TimeoutProvider::new(provider, timeout))
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> Option<String> {
    let url = match provider_name {
        "openai" => "https://api.openai.com/v1",
        "ollama" => "http://localhost:11434/v1",
        "openrouter" => "https://openrouter.ai/api/v1",
        "groq" => "https://api.groq.com/openai/v1",
        "together" => "https://api.together.xyz/v1",
        "vllm" => "http://localhost:8000/v1",
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1",
        _ => return None,
    };
    Some(url.into())
}
