//! Shared test helpers for strategy tests.

use async_trait::async_trait;
use sightline_core::error::ProviderError;
use sightline_core::provider::{Provider, ProviderRequest, ProviderResponse};
use std::sync::Mutex;
use std::time::{Duration, Instant};

type Reply = Result<serde_json::Value, ProviderError>;

/// A mock provider that answers from a script and records every call.
///
/// Describe calls (no schema) answer with `describe_text(image tag)`.
/// Structured calls answer with `final_reply`.
pub struct ScriptedProvider {
    final_reply: Reply,
    failing_tag: Option<String>,
    delay: Duration,
    calls: Mutex<Vec<RecordedCall>>,
}

/// One call as seen by the provider.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub request: ProviderRequest,
    pub started: Instant,
    pub finished: Instant,
}

impl ScriptedProvider {
    /// Answer every structured call with `reply`.
    pub fn always(reply: Reply) -> Self {
        Self {
            final_reply: reply,
            failing_tag: None,
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Make the describe call for the image tagged `tag` fail.
    pub fn failing_describe(mut self, tag: &str) -> Self {
        self.failing_tag = Some(tag.into());
        self
    }

    /// Sleep this long inside every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

/// The text a describe call returns for an image.
pub fn describe_text(tag: &str) -> String {
    format!("what the {tag} camera sees")
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let started = Instant::now();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let finished = Instant::now();
        self.calls.lock().unwrap().push(RecordedCall {
            request: request.clone(),
            started,
            finished,
        });

        if request.schema.is_none() {
            let tag = request
                .images
                .first()
                .map(|img| img.sector_tag.clone())
                .unwrap_or_default();
            if self.failing_tag.as_deref() == Some(tag.as_str()) {
                return Err(ProviderError::Network(format!("{tag} camera call dropped")));
            }
            return Ok(ProviderResponse::text(request.model, describe_text(&tag)));
        }

        let parsed = self.final_reply.clone()?;
        Ok(ProviderResponse {
            content: parsed.to_string(),
            parsed: Some(parsed),
            model: request.model,
            usage: None,
        })
    }
}

/// The structured payload of a successful narration.
pub fn narration_payload(description: &str) -> serde_json::Value {
    serde_json::json!({
        "description": description,
        "translated": description,
        "lang": "en",
    })
}
