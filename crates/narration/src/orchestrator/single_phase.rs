//! Single-phase strategy: one vision call with every image and the full
//! prompt; the structured answer is the result.

use async_trait::async_trait;
use sightline_core::generation::{GenerationRequest, GenerationResult};
use sightline_core::provider::Provider;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{BackendSettings, GenerationBackend, parse_final};
use crate::prompt::{self, PromptPlan};

pub struct SinglePhaseBackend {
    provider: Arc<dyn Provider>,
    settings: BackendSettings,
}

impl SinglePhaseBackend {
    pub fn new(provider: Arc<dyn Provider>, settings: BackendSettings) -> Self {
        Self { provider, settings }
    }
}

#[async_trait]
impl GenerationBackend for SinglePhaseBackend {
    fn name(&self) -> &str {
        "single_phase"
    }

    fn build_prompt(&self, request: &GenerationRequest) -> PromptPlan {
        prompt::single_phase(request)
    }

    async fn generate(&self, request: &GenerationRequest) -> GenerationResult {
        let PromptPlan::SinglePhase { prompt, schema } = self.build_prompt(request) else {
            return GenerationResult::failure("single-phase strategy built a two-phase plan");
        };

        let images = prompt::images_for(request);
        debug!(
            provider = %self.provider.name(),
            model = %self.settings.vision_model,
            images = images.len(),
            "Single-phase generation"
        );

        let provider_request =
            self.settings
                .request(&self.settings.vision_model, prompt, images, Some(schema));

        let outcome = self
            .provider
            .generate(provider_request)
            .await
            .and_then(|response| parse_final(&response, request.mode));

        match outcome {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "Single-phase generation failed");
                GenerationResult::failure(e)
            }
        }
    }
}
