//! HTTP transport used by the vendor providers.
//!
//! Providers only build request bodies and read response bodies; the
//! POST itself goes through [`HttpTransport`] so tests can script vendor
//! replies without a network.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::error::LlmError;

/// Longest slice of an error body carried into [`LlmError::Upstream`].
const ERROR_BODY_EXCERPT: usize = 500;

/// JSON-over-HTTP POST with bearer authentication.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Posts `body` to `url` and returns the decoded JSON reply.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Upstream`] on connection failures, timeouts,
    /// non-success statuses and bodies that are not JSON.
    async fn post_json(&self, url: &str, bearer: &str, body: &Value) -> Result<Value, LlmError>;
}

/// [`HttpTransport`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a transport whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Upstream`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::upstream(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_json(&self, url: &str, bearer: &str, body: &Value) -> Result<Value, LlmError> {
        let response = self
            .client
            .post(url)
            .bearer_auth(bearer)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::upstream(format!("request to {url} timed out"))
                } else {
                    LlmError::upstream(format!("request to {url} failed: {e}"))
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::upstream(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            return Err(LlmError::Upstream {
                message: excerpt(&text).to_string(),
                status: Some(status.as_u16()),
            });
        }

        serde_json::from_str(&text).map_err(|e| LlmError::Upstream {
            message: format!("response is not JSON: {e}: {}", excerpt(&text)),
            status: Some(status.as_u16()),
        })
    }
}

/// Truncates `text` to [`ERROR_BODY_EXCERPT`] bytes on a char boundary.
fn excerpt(text: &str) -> &str {
    if text.len() <= ERROR_BODY_EXCERPT {
        return text;
    }
    let mut end = ERROR_BODY_EXCERPT;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
