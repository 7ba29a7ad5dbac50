//! One-shot entry points: photo on disk → suggestion, prompt → image file.
//!
//! These wire the pipeline stages to real backends. Use [`crate::Session`]
//! directly when you need to keep state between attempts (or want to plug in
//! your own [`VisionBackend`](crate::pipeline::llm::VisionBackend)).

use crate::attempt::Attempt;
use crate::config::{CineframeConfig, DEFAULT_PROVIDER};
use crate::error::CineframeError;
use crate::output::{CinematicSuggestion, ConceptImage};
use crate::pipeline::imagegen::{generate_concept_image, ImagenBackend};
use crate::pipeline::input::load_image;
use crate::pipeline::llm::{analyze_image, LlmVisionBackend};
use crate::pipeline::write_atomic;
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Environment variable naming the vision provider.
pub const PROVIDER_ENV_VAR: &str = "CINEFRAME_LLM_PROVIDER";

/// Environment variable naming the vision model.
pub const MODEL_ENV_VAR: &str = "CINEFRAME_MODEL";

/// Analyse the photo at `path` as attempt `attempt`.
///
/// # Errors
/// Input errors ([`CineframeError::FileNotFound`], ...) are reported before
/// any provider is resolved.
pub async fn analyze_file(
    path: impl AsRef<Path>,
    attempt: Attempt,
    config: &CineframeConfig,
) -> Result<CinematicSuggestion, CineframeError> {
    let start = Instant::now();
    let path = path.as_ref();
    info!("Analysing {}", path.display());

    let image = load_image(path).await?;
    let backend = LlmVisionBackend::new(resolve_provider(config)?);
    let suggestion = analyze_image(&backend, &image, attempt, config).await?;

    info!(
        "Attempt {} finished in {:?}: {:?}",
        attempt,
        start.elapsed(),
        suggestion.kind()
    );
    Ok(suggestion)
}

/// Synchronous wrapper around [`analyze_file`].
///
/// Creates a temporary tokio runtime internally.
pub fn analyze_sync(
    path: impl AsRef<Path>,
    attempt: Attempt,
    config: &CineframeConfig,
) -> Result<CinematicSuggestion, CineframeError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CineframeError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(analyze_file(path, attempt, config))
}

/// Generate the concept image for `prompt` with the configured image model.
pub async fn visualize(
    prompt: &str,
    config: &CineframeConfig,
) -> Result<ConceptImage, CineframeError> {
    if prompt.trim().is_empty() {
        return Err(CineframeError::EmptyPrompt);
    }
    let backend = ImagenBackend::from_config(config)?;
    generate_concept_image(&backend, prompt, config).await
}

/// Write a generated image to `path` (temp file + rename).
pub async fn write_concept_image(
    image: &ConceptImage,
    path: impl AsRef<Path>,
) -> Result<(), CineframeError> {
    let path = path.as_ref();
    write_atomic(path, &image.bytes).await?;
    info!("Wrote {} bytes to {}", image.bytes.len(), path.display());
    Ok(())
}

fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, CineframeError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        CineframeError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the vision provider, from most-specific to least-specific:
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider** (`config.provider_name`) with the configured model.
/// 3. **Environment** (`CINEFRAME_LLM_PROVIDER`, model from
///    `CINEFRAME_MODEL` if set).
/// 4. **Default**: Gemini, which reads `GEMINI_API_KEY`.
pub fn resolve_provider(config: &CineframeConfig) -> Result<Arc<dyn LLMProvider>, CineframeError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        return create_vision_provider(name, config.model_or_default());
    }

    if let Some(name) = non_empty_env(PROVIDER_ENV_VAR) {
        let model = config
            .model
            .clone()
            .or_else(|| non_empty_env(MODEL_ENV_VAR))
            .unwrap_or_else(|| config.model_or_default().to_string());
        return create_vision_provider(&name, &model);
    }

    create_vision_provider(DEFAULT_PROVIDER, config.model_or_default())
}

fn non_empty_env(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}
