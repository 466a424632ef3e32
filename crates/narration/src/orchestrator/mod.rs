//! Generation orchestrator — strategies that turn a `GenerationRequest` into
//! a `GenerationResult`.
//!
//! Two strategies share one contract:
//!
//! 1. **Single-phase** — one vision call carrying every image
//! 2. **Two-phase** — one describe call per image (concurrent, order
//!    preserving), then one synthesize call on the language model
//!
//! Strategies never return an error. A failed backend call becomes
//! `GenerationResult::Failure`, tagged with `GenerationResult::ERROR_MARKER`,
//! and is not retried.

pub mod single_phase;
pub mod two_phase;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use single_phase::SinglePhaseBackend;
pub use two_phase::TwoPhaseBackend;

use async_trait::async_trait;
use sightline_config::{AppConfig, StrategyKind};
use sightline_core::error::{Error, ProviderError};
use sightline_core::generation::{GenerationRequest, GenerationResult, NarrationMode};
use sightline_core::image::CapturedImage;
use sightline_core::provider::{Provider, ProviderRequest, ProviderResponse, StructuredSchema};
use std::sync::Arc;

use crate::prompt::{PromptPlan, description_field};

/// A generation strategy.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Strategy name for logs ("single_phase", "two_phase").
    fn name(&self) -> &str;

    /// Assemble the prompts this strategy will send for `request`.
    fn build_prompt(&self, request: &GenerationRequest) -> PromptPlan;

    /// Run the strategy. Always yields a well-formed result.
    async fn generate(&self, request: &GenerationRequest) -> GenerationResult;
}

/// Model parameters shared by both strategies.
#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub vision_model: String,
    pub language_model: String,
    pub system_preamble: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Describe calls allowed in flight at once (two-phase only)
    pub describe_concurrency: usize,
}

impl BackendSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            vision_model: config.backend.vision_model.clone(),
            language_model: config.backend.language_model.clone(),
            system_preamble: config.narration.system_preamble.clone(),
            temperature: config.backend.temperature,
            max_tokens: config.backend.max_tokens,
            describe_concurrency: config.backend.describe_concurrency.max(1),
        }
    }

    /// Build a provider request from these settings.
    pub(crate) fn request(
        &self,
        model: &str,
        prompt: String,
        images: Vec<CapturedImage>,
        schema: Option<StructuredSchema>,
    ) -> ProviderRequest {
        ProviderRequest {
            model: model.to_string(),
            system_preamble: self.system_preamble.clone(),
            prompt,
            images,
            schema,
            temperature: self.temperature,
            max_tokens: Some(self.max_tokens),
        }
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Build the configured strategy around an already-routed provider.
pub fn build_backend(
    strategy: StrategyKind,
    provider: Arc<dyn Provider>,
    settings: BackendSettings,
) -> Arc<dyn GenerationBackend> {
    match strategy {
        StrategyKind::SinglePhase => Arc::new(SinglePhaseBackend::new(provider, settings)),
        StrategyKind::TwoPhase => Arc::new(TwoPhaseBackend::new(provider, settings)),
    }
}

/// Build the strategy, provider and call timeout named by the configuration.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn GenerationBackend>, Error> {
    let router = sightline_providers::build_from_config(config);
    let provider = router.default().ok_or_else(|| Error::Config {
        message: format!("provider '{}' is not available", router.default_name()),
    })?;
    Ok(build_backend(
        config.backend.strategy,
        provider,
        BackendSettings::from_config(config),
    ))
}

/// Read the final structured response into a `Success`.
pub(crate) fn parse_final(
    response: &ProviderResponse,
    mode: NarrationMode,
) -> Result<GenerationResult, ProviderError> {
    Ok(GenerationResult::Success {
        description: response.field(description_field(mode))?,
        translated_description: response.field("translated")?,
        language_code: response.field("lang")?,
    })
}
