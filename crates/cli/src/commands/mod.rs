pub mod describe;
pub mod doctor;
pub mod onboard;
pub mod status;
pub mod stream;

use sightline_config::AppConfig;
use sightline_memory::{JsonFileAnnotations, NarrationMemory};
use sightline_narration::{AssemblyPipeline, PipelineSettings};
use std::sync::Arc;

/// Load the config and wire the pipeline every narrating command uses.
pub fn load_pipeline() -> Result<AssemblyPipeline, Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    build_pipeline(&config)
}

pub fn build_pipeline(config: &AppConfig) -> Result<AssemblyPipeline, Box<dyn std::error::Error>> {
    let provider = &config.backend.provider;
    if needs_api_key(provider) && config.provider_api_key(provider).is_none() {
        eprintln!(
            "⚠️  No API key for provider '{}'. Set SIGHTLINE_API_KEY or add api_key to {}",
            provider,
            AppConfig::config_dir().join("config.toml").display()
        );
    }

    let annotations = JsonFileAnnotations::open(config.annotations_path())
        .map_err(|e| format!("Failed to open annotations: {e}"))?;
    let backend = sightline_narration::build_from_config(config)?;

    Ok(AssemblyPipeline::new(
        Arc::new(annotations),
        backend,
        NarrationMemory::new(),
        PipelineSettings::from_config(config),
    ))
}

/// Local providers run without credentials.
pub fn needs_api_key(provider: &str) -> bool {
    !matches!(provider, "dummy" | "ollama" | "vllm" | "llamacpp" | "llama.cpp")
}
