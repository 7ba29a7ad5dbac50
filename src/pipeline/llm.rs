//! Vision interaction: send the photo + instruction, get a suggestion back.
//!
//! The remote call sits behind [`VisionBackend`] so the normalisation and
//! classification around it can be tested without a network.
//! [`LlmVisionBackend`] is the production implementation on top of any
//! vision-capable `edgequake_llm` provider.
//!
//! Exactly one request is issued per attempt. There is no retry loop here:
//! a failed attempt is reported to the caller, and trying again is a new
//! attempt (with the next temperature in the rotation).

use crate::attempt::Attempt;
use crate::classify::{classified_error, Operation, RemoteFailure};
use crate::config::CineframeConfig;
use crate::error::CineframeError;
use crate::output::CinematicSuggestion;
use crate::pipeline::encode::encode_image;
use crate::pipeline::input::SourceImage;
use crate::pipeline::normalize::normalize_response;
use crate::pipeline::with_timeout;
use crate::prompts::analysis_prompt;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Everything one analysis call sends to the model.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisRequest<'a> {
    pub image: &'a SourceImage,
    pub instruction: &'a str,
    pub temperature: f32,
    pub max_tokens: usize,
}

/// A model that can look at an image and answer in text.
#[async_trait]
pub trait VisionBackend: Send + Sync {
    /// Issue one request and return the raw reply text.
    async fn complete(&self, request: &AnalysisRequest<'_>) -> Result<String, RemoteFailure>;
}

/// [`VisionBackend`] over an `edgequake_llm` provider.
#[derive(Clone)]
pub struct LlmVisionBackend {
    provider: Arc<dyn LLMProvider>,
}

impl LlmVisionBackend {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl VisionBackend for LlmVisionBackend {
    /// ## Message Layout
    ///
    /// A single user message carrying the instruction text and the photo as
    /// a base64 attachment. The instruction is not sent as a system message
    /// because some providers drop images from turns that follow a long
    /// system prompt.
    async fn complete(&self, request: &AnalysisRequest<'_>) -> Result<String, RemoteFailure> {
        let messages = vec![ChatMessage::user_with_images(
            request.instruction,
            vec![encode_image(request.image)],
        )];
        let options = build_options(request.temperature, request.max_tokens);

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| RemoteFailure::new(e.to_string()))?;

        debug!(
            "{} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );
        Ok(response.content)
    }
}

/// Build `CompletionOptions` for one attempt.
///
/// JSON mode maps to `responseMimeType: application/json` on Gemini.
fn build_options(temperature: f32, max_tokens: usize) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(temperature),
        max_tokens: Some(max_tokens),
        response_format: Some("json_object".into()),
        ..Default::default()
    }
}

/// Run one analysis attempt on `image`.
///
/// Remote failures are classified as [`Operation::Analysis`]; the reply is
/// passed through [`normalize_response`].
pub async fn analyze_image<B>(
    backend: &B,
    image: &SourceImage,
    attempt: Attempt,
    config: &CineframeConfig,
) -> Result<CinematicSuggestion, CineframeError>
where
    B: VisionBackend + ?Sized,
{
    let start = Instant::now();
    let request = AnalysisRequest {
        image,
        instruction: analysis_prompt(config.analysis_prompt.as_deref()),
        temperature: attempt.temperature(),
        max_tokens: config.max_tokens,
    };
    info!(
        "Analysing {} image, attempt {} (temperature {})",
        image.mime_type, attempt, request.temperature
    );

    let raw = with_timeout(config.api_timeout_secs, backend.complete(&request))
        .await
        .map_err(|f| classified_error(Operation::Analysis, f))?;
    debug!("Reply: {} chars in {:?}", raw.len(), start.elapsed());

    normalize_response(&raw)
}
