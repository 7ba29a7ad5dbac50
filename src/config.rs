//! Configuration types for cinematic analysis and concept generation.
//!
//! All behaviour is controlled through [`CineframeConfig`], built via its
//! [`CineframeConfigBuilder`]. Callers set only what they care about and
//! rely on the documented defaults for the rest.

use crate::error::CineframeError;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Default vision model for the analysis call.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default provider name passed to `edgequake_llm::ProviderFactory`.
pub const DEFAULT_PROVIDER: &str = "gemini";

/// Default text-to-image model.
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-3.0-generate-002";

/// Base URL of the Gemini REST API.
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Environment variables checked, in order, for the image-generation key.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// Configuration for analysis and image generation.
///
/// Built via [`CineframeConfig::builder()`] or using
/// [`CineframeConfig::default()`].
///
/// # Example
/// ```rust
/// use cineframe::CineframeConfig;
///
/// let config = CineframeConfig::builder()
///     .model("gemini-2.5-pro")
///     .max_tokens(2048)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct CineframeConfig {
    /// Vision model identifier. If None, uses [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// Provider name (e.g. "gemini", "openai", "anthropic").
    /// If None along with `provider`, the provider is resolved from the
    /// environment, falling back to [`DEFAULT_PROVIDER`].
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Maximum tokens the model may generate for one analysis. Default: 4096.
    ///
    /// The reply is 2-4 paragraphs of prose plus a small JSON envelope;
    /// a tight limit truncates the JSON and turns a good answer into a
    /// `MalformedResponse`.
    pub max_tokens: usize,

    /// Custom analysis instruction. If None, uses
    /// [`crate::prompts::ANALYSIS_PROMPT`].
    pub analysis_prompt: Option<String>,

    /// Text-to-image model. Default: [`DEFAULT_IMAGE_MODEL`].
    pub image_model: String,

    /// MIME type requested for generated images. Default: `image/jpeg`.
    pub image_mime_type: String,

    /// API key for image generation. If None, read from
    /// [`API_KEY_ENV_VARS`] when needed.
    pub api_key: Option<String>,

    /// Base URL for the image-generation REST API.
    pub api_base_url: String,

    /// Per-call timeout in seconds; 0 disables the wrapper. Default: 120.
    ///
    /// Image generation in particular can take tens of seconds. The timeout
    /// only bounds a single call; nothing is retried when it fires.
    pub api_timeout_secs: u64,
}

impl Default for CineframeConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            max_tokens: 4096,
            analysis_prompt: None,
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            image_mime_type: "image/jpeg".to_string(),
            api_key: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_timeout_secs: 120,
        }
    }
}

impl fmt::Debug for CineframeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CineframeConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("max_tokens", &self.max_tokens)
            .field("analysis_prompt", &self.analysis_prompt.as_ref().map(|p| p.len()))
            .field("image_model", &self.image_model)
            .field("image_mime_type", &self.image_mime_type)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base_url", &self.api_base_url)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .finish()
    }
}

impl CineframeConfig {
    /// Create a new builder for `CineframeConfig`.
    pub fn builder() -> CineframeConfigBuilder {
        CineframeConfigBuilder {
            config: Self::default(),
        }
    }

    /// The vision model to use.
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    /// The image-generation API key: explicit value first, then environment.
    pub fn resolve_api_key(&self) -> Result<String, CineframeError> {
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            return Ok(key.to_string());
        }
        API_KEY_ENV_VARS
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|v| !v.trim().is_empty())
            .ok_or_else(|| CineframeError::ProviderNotConfigured {
                provider: "imagen".to_string(),
                hint: format!(
                    "API Key not configured for image generation.\nSet {} or pass --api-key.",
                    API_KEY_ENV_VARS.join(" or ")
                ),
            })
    }
}

/// Builder for [`CineframeConfig`].
#[derive(Debug)]
pub struct CineframeConfigBuilder {
    config: CineframeConfig,
}

impl CineframeConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn analysis_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.analysis_prompt = Some(prompt.into());
        self
    }

    pub fn image_model(mut self, model: impl Into<String>) -> Self {
        self.config.image_model = model.into();
        self
    }

    pub fn image_mime_type(mut self, mime: impl Into<String>) -> Self {
        self.config.image_mime_type = mime.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<CineframeConfig, CineframeError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(CineframeError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if !matches!(c.image_mime_type.as_str(), "image/jpeg" | "image/png") {
            return Err(CineframeError::InvalidConfig(format!(
                "image MIME type must be image/jpeg or image/png, got {}",
                c.image_mime_type
            )));
        }
        if c.image_model.trim().is_empty() {
            return Err(CineframeError::InvalidConfig(
                "image model must not be empty".into(),
            ));
        }
        if !(c.api_base_url.starts_with("http://") || c.api_base_url.starts_with("https://")) {
            return Err(CineframeError::InvalidConfig(format!(
                "API base URL must be http(s), got '{}'",
                c.api_base_url
            )));
        }
        Ok(self.config)
    }
}
