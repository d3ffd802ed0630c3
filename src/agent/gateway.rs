//! The LLM gateway: one `send` over all configured vendors, plus retry.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use super::client::create_provider;
use super::config::{LlmConfig, Vendor};
use super::message::{ChatRequest, ChatResponse};
use super::transport::{HttpTransport, ReqwestTransport};
use crate::error::LlmError;

/// Waits between retry attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspends the caller for `delay`.
    async fn sleep(&self, delay: Duration);
}

/// [`Sleeper`] backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Delay before retry number `attempt_index + 1`: `base * 2^attempt_index`.
#[must_use]
pub fn backoff_delay(base: Duration, attempt_index: u32) -> Duration {
    base.saturating_mul(2_u32.saturating_pow(attempt_index))
}

/// Uniform chat-completion entry point over the configured vendors.
///
/// The default vendor comes from [`LlmConfig::default_vendor`]; a request
/// may route itself elsewhere through [`ChatRequest::provider`]. The
/// configuration is read-only after construction, so one gateway can be
/// shared by concurrent pipeline runs.
pub struct LlmGateway {
    config: LlmConfig,
    transport: Arc<dyn HttpTransport>,
    sleeper: Arc<dyn Sleeper>,
}

impl LlmGateway {
    /// Creates a gateway that talks to vendors over HTTP.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Upstream`] if the HTTP client cannot be built.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let transport = Arc::new(ReqwestTransport::new(config.timeout)?);
        Ok(Self::with_transport(config, transport))
    }

    /// Creates a gateway over an explicit transport.
    #[must_use]
    pub fn with_transport(config: LlmConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            config,
            transport,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Replaces the backoff sleeper.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// The gateway's configuration.
    #[must_use]
    pub const fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Vendor a request will be sent to.
    #[must_use]
    pub fn vendor_for(&self, request: &ChatRequest) -> Vendor {
        request.provider.unwrap_or(self.config.default_vendor)
    }

    /// Sends one request, without retry.
    ///
    /// # Errors
    ///
    /// - [`LlmError::Configuration`] if the target vendor has no API key
    /// - [`LlmError::Upstream`] on transport, status or payload failures
    pub async fn send(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        let vendor = self.vendor_for(request);
        let provider = create_provider(vendor, &self.config, Arc::clone(&self.transport))?;
        let response = provider.chat(request).await?;
        debug!(
            vendor = %vendor,
            model = %response.model,
            prompt_tokens = response.usage.prompt_tokens,
            completion_tokens = response.usage.completion_tokens,
            "LLM call completed"
        );
        Ok(response)
    }

    /// Sends with exponential backoff, making at most `max_attempts` calls.
    ///
    /// Waits `base`, `2 * base`, `4 * base`, ... between attempts. Only
    /// retryable errors ([`LlmError::is_retryable`]) are retried; others are
    /// returned at once. When every attempt fails, the last error is
    /// returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns the last [`LlmError`] observed.
    pub async fn send_with_retry(
        &self,
        request: &ChatRequest,
        max_attempts: u32,
    ) -> Result<ChatResponse, LlmError> {
        let max_attempts = max_attempts.max(1);
        let mut attempt = 0;
        loop {
            match self.send(request).await {
                Ok(response) => return Ok(response),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    attempt += 1;
                    if attempt >= max_attempts {
                        error!(attempts = attempt, error = %e, "LLM call failed after retries");
                        return Err(e);
                    }
                    let delay = backoff_delay(self.config.retry_base_delay, attempt - 1);
                    warn!(
                        attempt,
                        max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "LLM call failed, retrying"
                    );
                    self.sleeper.sleep(delay).await;
                }
            }
        }
    }

    /// [`send_with_retry`](Self::send_with_retry) using the configured attempt count.
    ///
    /// # Errors
    ///
    /// Returns the last [`LlmError`] observed.
    pub async fn send_with_default_retry(
        &self,
        request: &ChatRequest,
    ) -> Result<ChatResponse, LlmError> {
        self.send_with_retry(request, self.config.max_retries).await
    }
}

impl std::fmt::Debug for LlmGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmGateway")
            .field("default_vendor", &self.config.default_vendor)
            .finish_non_exhaustive()
    }
}
