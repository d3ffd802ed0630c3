//! Gateway configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::LlmError;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 60;
/// Default attempts for `send_with_retry`.
const DEFAULT_MAX_RETRIES: u32 = 3;
/// First backoff delay; doubles on each further attempt.
const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

/// Supported LLM vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vendor {
    /// Zhipu GLM (OpenAI-compatible chat completions).
    Zhipu,
    /// Alibaba Qwen via `DashScope`.
    Qwen,
    /// `OpenAI`.
    OpenAi,
}

impl Vendor {
    /// All vendors.
    pub const ALL: [Self; 3] = [Self::Zhipu, Self::Qwen, Self::OpenAi];

    /// Lowercase vendor name, as used in `LLM_PROVIDER`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Zhipu => "zhipu",
            Self::Qwen => "qwen",
            Self::OpenAi => "openai",
        }
    }

    /// Model used when none is configured.
    #[must_use]
    pub const fn default_model(&self) -> &'static str {
        match self {
            Self::Zhipu => "glm-4",
            Self::Qwen => "qwen-max",
            Self::OpenAi => "gpt-4",
        }
    }

    /// API root used when no base URL override is configured.
    #[must_use]
    pub const fn default_base_url(&self) -> &'static str {
        match self {
            Self::Zhipu => "https://open.bigmodel.cn/api/paas/v4",
            Self::Qwen => "https://dashscope.aliyuncs.com/api/v1",
            Self::OpenAi => "https://api.openai.com/v1",
        }
    }

    /// Prefix of this vendor's environment variables (`ZHIPU_API_KEY`, ...).
    #[must_use]
    pub const fn env_prefix(&self) -> &'static str {
        match self {
            Self::Zhipu => "ZHIPU",
            Self::Qwen => "QWEN",
            Self::OpenAi => "OPENAI",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Zhipu => 0,
            Self::Qwen => 1,
            Self::OpenAi => 2,
        }
    }
}

impl std::fmt::Display for Vendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Vendor {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| LlmError::UnsupportedProvider {
                name: s.to_string(),
            })
    }
}

/// Credential, model and endpoint for one vendor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorSettings {
    /// API key; `None` until configured.
    pub api_key: Option<String>,
    /// Model identifier.
    pub model: String,
    /// API root URL.
    pub base_url: String,
}

/// Configuration for the LLM gateway.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Vendor used when a request carries no override.
    pub default_vendor: Vendor,
    /// Per-vendor settings, indexed by [`Vendor`].
    vendors: [VendorSettings; 3],
    /// Per-request timeout.
    pub timeout: Duration,
    /// Attempts made by `send_with_retry` when the caller does not say.
    pub max_retries: u32,
    /// First backoff delay.
    pub retry_base_delay: Duration,
    /// Directory containing prompt template overrides.
    ///
    /// Missing files fall back to the compiled-in templates.
    pub prompt_dir: Option<PathBuf>,
}

impl LlmConfig {
    /// Creates a new builder for `LlmConfig`.
    #[must_use]
    pub fn builder() -> LlmConfigBuilder {
        LlmConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::UnsupportedProvider`] if `LLM_PROVIDER` names an
    /// unknown vendor.
    pub fn from_env() -> Result<Self, LlmError> {
        Self::builder().from_env().build()
    }

    /// Settings for `vendor`.
    #[must_use]
    pub const fn vendor(&self, vendor: Vendor) -> &VendorSettings {
        &self.vendors[vendor.index()]
    }
}

#[derive(Debug, Clone, Default)]
struct VendorOverrides {
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
}

/// Builder for [`LlmConfig`].
#[derive(Debug, Clone, Default)]
pub struct LlmConfigBuilder {
    provider: Option<String>,
    vendors: [VendorOverrides; 3],
    timeout: Option<Duration>,
    max_retries: Option<u32>,
    retry_base_delay: Option<Duration>,
    prompt_dir: Option<PathBuf>,
}

impl LlmConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(self) -> Self {
        self.from_lookup(|key| std::env::var(key).ok())
    }

    /// Populates unset fields from `lookup`. Blank values count as unset.
    #[must_use]
    pub fn from_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if self.provider.is_none() {
            self.provider = get("LLM_PROVIDER");
        }
        for vendor in Vendor::ALL {
            let prefix = vendor.env_prefix();
            let slot = &mut self.vendors[vendor.index()];
            if slot.api_key.is_none() {
                slot.api_key = get(&format!("{prefix}_API_KEY"));
            }
            if slot.model.is_none() {
                slot.model = get(&format!("{prefix}_MODEL"));
            }
            if slot.base_url.is_none() {
                slot.base_url = get(&format!("{prefix}_BASE_URL"));
            }
        }
        if self.timeout.is_none() {
            self.timeout = get("LLM_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs);
        }
        if self.max_retries.is_none() {
            self.max_retries = get("LLM_MAX_RETRIES").and_then(|v| v.parse().ok());
        }
        if self.prompt_dir.is_none() {
            self.prompt_dir = get("PROMPT_DIR").map(PathBuf::from);
        }
        self
    }

    /// Sets the default vendor by name.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the API key for `vendor`.
    #[must_use]
    pub fn api_key(mut self, vendor: Vendor, key: impl Into<String>) -> Self {
        self.vendors[vendor.index()].api_key = Some(key.into());
        self
    }

    /// Sets the model for `vendor`.
    #[must_use]
    pub fn model(mut self, vendor: Vendor, model: impl Into<String>) -> Self {
        self.vendors[vendor.index()].model = Some(model.into());
        self
    }

    /// Sets the API root URL for `vendor`.
    #[must_use]
    pub fn base_url(mut self, vendor: Vendor, url: impl Into<String>) -> Self {
        self.vendors[vendor.index()].base_url = Some(url.into());
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Sets the default number of attempts.
    #[must_use]
    pub const fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = Some(n);
        self
    }

    /// Sets the first backoff delay.
    #[must_use]
    pub const fn retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = Some(delay);
        self
    }

    /// Sets the prompt template directory.
    #[must_use]
    pub fn prompt_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompt_dir = Some(dir.into());
        self
    }

    /// Builds the [`LlmConfig`].
    ///
    /// Missing API keys are not an error here; they surface as
    /// [`LlmError::Configuration`] when that vendor is first used.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::UnsupportedProvider`] if the provider name is
    /// not a known vendor.
    pub fn build(self) -> Result<LlmConfig, LlmError> {
        let default_vendor = match self.provider.as_deref() {
            Some(name) => name.parse()?,
            None => Vendor::Zhipu,
        };
        let [zhipu, qwen, openai] = self.vendors;
        let settle = |vendor: Vendor, o: VendorOverrides| VendorSettings {
            api_key: o.api_key.filter(|k| !k.trim().is_empty()),
            model: o.model.unwrap_or_else(|| vendor.default_model().to_string()),
            base_url: o
                .base_url
                .unwrap_or_else(|| vendor.default_base_url().to_string()),
        };

        Ok(LlmConfig {
            default_vendor,
            vendors: [
                settle(Vendor::Zhipu, zhipu),
                settle(Vendor::Qwen, qwen),
                settle(Vendor::OpenAi, openai),
            ],
            timeout: self
                .timeout
                .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            max_retries: self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            retry_base_delay: self.retry_base_delay.unwrap_or(DEFAULT_RETRY_BASE_DELAY),
            prompt_dir: self.prompt_dir,
        })
    }
}
