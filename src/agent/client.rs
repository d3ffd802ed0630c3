//! Provider factory.
//!
//! Maps a [`Vendor`] to its concrete [`LlmProvider`] implementation.

use std::sync::Arc;

use crate::agent::config::{LlmConfig, Vendor};
use crate::agent::provider::LlmProvider;
use crate::agent::providers::{DashScopeProvider, OpenAiCompatibleProvider};
use crate::agent::transport::HttpTransport;
use crate::error::LlmError;

/// Creates the [`LlmProvider`] for `vendor`.
///
/// # Supported Providers
///
/// - `zhipu` and `openai`: chat completions protocol
/// - `qwen`: `DashScope` generation protocol
///
/// # Errors
///
/// Returns [`LlmError::Configuration`] if the vendor has no API key.
pub fn create_provider(
    vendor: Vendor,
    config: &LlmConfig,
    transport: Arc<dyn HttpTransport>,
) -> Result<Box<dyn LlmProvider>, LlmError> {
    let settings = config.vendor(vendor);
    match vendor {
        Vendor::Zhipu | Vendor::OpenAi => Ok(Box::new(OpenAiCompatibleProvider::new(
            vendor, settings, transport,
        )?)),
        Vendor::Qwen => Ok(Box::new(DashScopeProvider::new(settings, transport)?)),
    }
}
