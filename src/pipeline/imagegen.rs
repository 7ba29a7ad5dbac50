//! Concept visualisation: one text prompt → one generated image.
//!
//! Used when the analysis decides a crop cannot make the photo cinematic and
//! returns a concept prompt instead. The adapter guards both ends of the
//! call. A blank prompt never leaves the process, and a "successful" reply
//! without image bytes is still a failure.
//!
//! [`ImagenBackend`] talks to the Gemini REST `:predict` endpoint directly
//! with `reqwest`; the edgequake provider abstraction only covers chat.

use crate::classify::{classified_error, Operation, RemoteFailure};
use crate::config::CineframeConfig;
use crate::error::CineframeError;
use crate::output::ConceptImage;
use crate::pipeline::with_timeout;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Instant;
use tracing::{debug, info, warn};

/// A service that turns a text prompt into images.
#[async_trait]
pub trait ImageBackend: Send + Sync {
    /// Request exactly one image for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<Vec<ConceptImage>, RemoteFailure>;
}

/// Generate the concept image for `prompt`.
///
/// # Errors
/// - [`CineframeError::EmptyPrompt`] before any call when `prompt` is blank
/// - a classified [`Operation::ImageGeneration`] error when the call fails
/// - [`CineframeError::NoImageReturned`] when the reply carries no image bytes
pub async fn generate_concept_image<B>(
    backend: &B,
    prompt: &str,
    config: &CineframeConfig,
) -> Result<ConceptImage, CineframeError>
where
    B: ImageBackend + ?Sized,
{
    if prompt.trim().is_empty() {
        return Err(CineframeError::EmptyPrompt);
    }

    let start = Instant::now();
    info!("Generating concept image ({} chars of prompt)", prompt.len());

    let images = with_timeout(config.api_timeout_secs, backend.generate(prompt))
        .await
        .map_err(|f| classified_error(Operation::ImageGeneration, f))?;

    let image = images
        .into_iter()
        .find(|img| !img.bytes.is_empty())
        .ok_or(CineframeError::NoImageReturned)?;

    info!(
        "Concept image ready: {} bytes {} in {:?}",
        image.bytes.len(),
        image.mime_type,
        start.elapsed()
    );
    Ok(image)
}

// ── Gemini REST backend ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
    rai_filtered_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// [`ImageBackend`] for Imagen models on the Gemini API.
#[derive(Clone)]
pub struct ImagenBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    mime_type: String,
}

impl ImagenBackend {
    /// Build a backend from the config, resolving the API key.
    pub fn from_config(config: &CineframeConfig) -> Result<Self, CineframeError> {
        let api_key = config.resolve_api_key()?;
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| CineframeError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
            model: config.image_model.clone(),
            api_key,
            mime_type: config.image_mime_type.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:predict", self.base_url, self.model)
    }
}

#[async_trait]
impl ImageBackend for ImagenBackend {
    async fn generate(&self, prompt: &str) -> Result<Vec<ConceptImage>, RemoteFailure> {
        let payload = build_payload(prompt, &self.mime_type);
        debug!(model = %self.model, "POST {}", self.endpoint());

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| RemoteFailure::new(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Image generation failed with status {}", status);
            return Err(RemoteFailure::with_status(
                status.as_u16(),
                describe_error_body(&body),
            ));
        }

        let body: PredictResponse = response
            .json()
            .await
            .map_err(|e| RemoteFailure::new(format!("invalid predict response: {e}")))?;
        images_from_predictions(body, &self.mime_type)
    }
}

fn build_payload(prompt: &str, mime_type: &str) -> Value {
    json!({
        "instances": [{ "prompt": prompt }],
        "parameters": {
            "sampleCount": 1,
            "outputOptions": { "mimeType": mime_type },
        },
    })
}

/// Flatten a Google error body to `"<STATUS>: <message>"` for the classifier.
fn describe_error_body(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(env) if !env.error.status.is_empty() => {
            format!("{}: {}", env.error.status, env.error.message)
        }
        Ok(env) => env.error.message,
        Err(_) => {
            let trimmed = body.trim();
            if trimmed.chars().count() > 500 {
                format!("{}…", trimmed.chars().take(500).collect::<String>())
            } else {
                trimmed.to_string()
            }
        }
    }
}

fn images_from_predictions(
    body: PredictResponse,
    default_mime: &str,
) -> Result<Vec<ConceptImage>, RemoteFailure> {
    let mut images = Vec::new();
    let mut filtered: Option<String> = None;

    for p in body.predictions {
        match p.bytes_base64_encoded {
            Some(b64) => match STANDARD.decode(b64.as_bytes()) {
                Ok(bytes) => images.push(ConceptImage {
                    bytes,
                    mime_type: p.mime_type.unwrap_or_else(|| default_mime.to_string()),
                }),
                Err(e) => warn!("Skipping prediction with undecodable image data: {}", e),
            },
            None => {
                if let Some(reason) = p.rai_filtered_reason {
                    filtered = Some(reason);
                }
            }
        }
    }

    // A filtered-out prediction is the service's safety filter at work.
    match filtered {
        Some(reason) if images.is_empty() => {
            Err(RemoteFailure::new(format!("SAFETY: {reason}")))
        }
        _ => Ok(images),
    }
}
