//! Two-phase strategy.
//!
//! ```text
//! images ──► describe(img 1) ─┐
//!        ──► describe(img 2) ─┼─► "<tag>: <text>\n" × N ──► synthesize ──► result
//!        ──► describe(img N) ─┘
//! ```
//!
//! Describe calls run through a bounded, order-preserving window, so
//! response *i* always pairs with image *i*. Any failed describe call fails
//! the whole generation; there is no partial synthesis.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use sightline_core::error::ProviderError;
use sightline_core::generation::{GenerationRequest, GenerationResult};
use sightline_core::image::CapturedImage;
use sightline_core::provider::Provider;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{BackendSettings, GenerationBackend, parse_final};
use crate::prompt::{self, PromptPlan};

pub struct TwoPhaseBackend {
    provider: Arc<dyn Provider>,
    settings: BackendSettings,
}

impl TwoPhaseBackend {
    pub fn new(provider: Arc<dyn Provider>, settings: BackendSettings) -> Self {
        Self { provider, settings }
    }

    async fn describe(
        &self,
        describe_prompt: &str,
        image: &CapturedImage,
    ) -> Result<String, ProviderError> {
        let request = self.settings.request(
            &self.settings.vision_model,
            describe_prompt.to_string(),
            vec![image.clone()],
            None,
        );
        let response = self.provider.generate(request).await?;
        Ok(response.content.trim().to_string())
    }

    /// Describe every image concurrently. Results come back in image order.
    async fn describe_all(
        &self,
        describe_prompt: &str,
        images: &[CapturedImage],
    ) -> Vec<Result<String, ProviderError>> {
        // collected first: a lazy `map` over borrowed images is not `Send`
        let calls: Vec<_> = images
            .iter()
            .map(|image| self.describe(describe_prompt, image))
            .collect();
        stream::iter(calls)
            .buffered(self.settings.describe_concurrency.max(1))
            .collect()
            .await
    }
}

/// Pair each description with its image's sector tag.
fn pair_descriptions(
    images: &[CapturedImage],
    descriptions: &[String],
) -> Result<String, String> {
    if images.len() != descriptions.len() {
        return Err(format!(
            "positional mismatch: {} images but {} descriptions",
            images.len(),
            descriptions.len()
        ));
    }
    Ok(images
        .iter()
        .zip(descriptions)
        .map(|(image, text)| format!("{}: {text}\n", image.sector_tag))
        .collect())
}

#[async_trait]
impl GenerationBackend for TwoPhaseBackend {
    fn name(&self) -> &str {
        "two_phase"
    }

    fn build_prompt(&self, request: &GenerationRequest) -> PromptPlan {
        prompt::two_phase(request)
    }

    async fn generate(&self, request: &GenerationRequest) -> GenerationResult {
        let PromptPlan::TwoPhase {
            describe,
            synthesize,
            schema,
        } = self.build_prompt(request)
        else {
            return GenerationResult::failure("two-phase strategy built a single-phase plan");
        };

        let images = prompt::images_for(request);
        debug!(
            provider = %self.provider.name(),
            images = images.len(),
            concurrency = self.settings.describe_concurrency,
            "Describe phase"
        );

        let mut descriptions = Vec::with_capacity(images.len());
        for (index, outcome) in self
            .describe_all(&describe, &images)
            .await
            .into_iter()
            .enumerate()
        {
            match outcome {
                Ok(text) => descriptions.push(text),
                Err(e) => {
                    warn!(image = index, error = %e, "Describe call failed");
                    return GenerationResult::failure(format!("describe phase failed: {e}"));
                }
            }
        }

        let image_descriptions = match pair_descriptions(&images, &descriptions) {
            Ok(text) => text,
            Err(reason) => {
                warn!(%reason, "Describe phase returned out of step");
                return GenerationResult::failure(reason);
            }
        };

        info!(described = descriptions.len(), "Synthesize phase");
        let provider_request = self.settings.request(
            &self.settings.language_model,
            synthesize.render(&image_descriptions),
            Vec::new(),
            Some(schema),
        );

        match self
            .provider
            .generate(provider_request)
            .await
            .and_then(|response| parse_final(&response, request.mode))
        {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "Synthesize call failed");
                GenerationResult::failure(format!("synthesize phase failed: {e}"))
            }
        }
    }
}
