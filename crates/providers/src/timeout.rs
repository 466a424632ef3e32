//! Per-call timeout decorator.
//!
//! Every backend call made by a generation strategy goes through a
//! `TimeoutProvider`, so a hung endpoint surfaces as `ProviderError::Timeout`
//! instead of stalling the narration. There is no retry: the caller turns the
//! error into a failed generation.

use async_trait::async_trait;
use sightline_core::error::ProviderError;
use sightline_core::provider::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Wraps a provider and bounds each `generate()` call.
pub struct TimeoutProvider {
    inner: Arc<dyn sightline_core::Provider>,
    timeout: Duration,
}

impl TimeoutProvider {
    pub fn new(inner: Arc<dyn sightline_core::Provider>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// Wrap with the default call timeout (60s).
    pub fn with_default(inner: Arc<dyn sightline_core::Provider>) -> Self {
        Self::new(inner, Duration::from_secs(60))
    }
}

#[async_trait]
impl sightline_core::Provider for TimeoutProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn generate(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let model = request.model.clone();
        match tokio::time::timeout(self.timeout, self.inner.generate(request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    provider = %self.inner.name(),
                    model = %model,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Provider call timed out"
                );
                Err(ProviderError::Timeout(format!(
                    "Provider '{}' did not answer within {}ms",
                    self.inner.name(),
                    self.timeout.as_millis()
                )))
            }
        }
    }

    async fn list_models(&self) -> std::result::Result<Vec<String>, ProviderError> {
        match tokio::time::timeout(self.timeout, self.inner.list_models()).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(format!(
                "Provider '{}' model listing timed out",
                self.inner.name()
            ))),
        }
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        match tokio::time::timeout(self.timeout, self.inner.health_check()).await {
            Ok(result) => result,
            Err(_) => Ok(false),
        }
    }
}
