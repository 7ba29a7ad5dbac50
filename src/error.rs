//! Error types for the cineframe library.
//!
//! A single enum, [`CineframeError`], covers every way an analysis or
//! image-generation action can fail. All variants are terminal for the
//! current attempt; nothing here is retried by the library. The caller
//! displays the message and lets the user try again, which simply runs
//! the same operation as a fresh attempt.
//!
//! Problems inside optional sub-fields of a model response (an out-of-range
//! bounding box, a concept prompt that conflicts with a box) never show up
//! here. The normaliser repairs those locally and logs a warning.

use crate::classify::{FailureCategory, Operation};
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the cineframe library.
#[derive(Debug, Error)]
pub enum CineframeError {
    // ── Response errors ───────────────────────────────────────────────────
    /// The model reply could not be parsed as a JSON object.
    #[error("The AI returned a response that is not valid JSON: {detail}")]
    MalformedResponse { detail: String },

    /// The model reply parsed but lacks a mandatory field.
    #[error("AI response is missing required field: {field}.")]
    MissingRequiredField { field: &'static str },

    // ── Classified remote failures ────────────────────────────────────────
    /// The provider rejected the credential.
    #[error("{}", .operation.invalid_api_key_message())]
    InvalidApiKey { operation: Operation, detail: String },

    /// Content-safety filtering blocked the request or its output.
    #[error("{}", .operation.safety_blocked_message())]
    SafetyBlocked { operation: Operation, detail: String },

    /// Quota exhausted or request throttled.
    #[error("{}", .operation.rate_limited_message())]
    RateLimited { operation: Operation, detail: String },

    /// The image-generation service rejected the prompt as invalid.
    #[error("The provided prompt for image generation was considered invalid by the AI. Try rephrasing.")]
    InvalidPrompt { detail: String },

    /// Any remote failure no known marker matched.
    #[error("{}: {detail}", .operation.unknown_prefix())]
    Unknown { operation: Operation, detail: String },

    // ── Image-generation guards ───────────────────────────────────────────
    /// The concept prompt was empty or whitespace-only; no call was made.
    #[error("Image generation prompt cannot be empty.")]
    EmptyPrompt,

    /// The call succeeded but carried no usable image.
    #[error("AI did not return a valid image. No image data found.")]
    NoImageReturned,

    /// Visualisation was requested but the latest suggestion has no concept prompt.
    #[error("No cinematic concept prompt available to visualize.\nRun an analysis that proposes a concept first.")]
    NoConceptPrompt,

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Image file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The bytes are not an image format we can send to the model.
    #[error("Could not parse file data. Ensure it's a valid image: {detail}")]
    UnsupportedImage { detail: String },

    /// The image could not be decoded for cropping.
    #[error("Failed to decode image: {detail}")]
    ImageDecode { detail: String },

    /// A crop was requested with a box that fails the bounds check.
    #[error("Bounding box {x:.3},{y:.3} {width:.3}x{height:.3} lies outside the image")]
    InvalidBoundingBox {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },

    // ── Provider / config errors ──────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("AI provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CineframeError {
    /// The classifier category of a remote failure, if this is one.
    pub fn category(&self) -> Option<FailureCategory> {
        match self {
            CineframeError::InvalidApiKey { .. } => Some(FailureCategory::InvalidApiKey),
            CineframeError::SafetyBlocked { .. } => Some(FailureCategory::SafetyBlocked),
            CineframeError::RateLimited { .. } => Some(FailureCategory::RateLimited),
            CineframeError::InvalidPrompt { .. } => Some(FailureCategory::InvalidPrompt),
            CineframeError::Unknown { .. } => Some(FailureCategory::Unknown),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_display() {
        let e = CineframeError::MissingRequiredField {
            field: "analysisText",
        };
        assert_eq!(
            e.to_string(),
            "AI response is missing required field: analysisText."
        );
    }

    #[test]
    fn unknown_display_carries_detail() {
        let e = CineframeError::Unknown {
            operation: Operation::Analysis,
            detail: "socket closed".into(),
        };
        let msg = e.to_string();
        assert!(msg.starts_with("Failed to get cinematic suggestion from AI"), "got: {msg}");
        assert!(msg.contains("socket closed"));
    }

    #[test]
    fn invalid_api_key_differs_per_operation() {
        let a = CineframeError::InvalidApiKey {
            operation: Operation::Analysis,
            detail: String::new(),
        };
        let b = CineframeError::InvalidApiKey {
            operation: Operation::ImageGeneration,
            detail: String::new(),
        };
        assert_ne!(a.to_string(), b.to_string());
        assert!(b.to_string().contains("image generation"));
    }

    #[test]
    fn category_only_for_remote_failures() {
        assert_eq!(CineframeError::EmptyPrompt.category(), None);
        let e = CineframeError::RateLimited {
            operation: Operation::Analysis,
            detail: "RESOURCE_EXHAUSTED".into(),
        };
        assert_eq!(e.category(), Some(FailureCategory::RateLimited));
    }

    #[test]
    fn invalid_box_display() {
        let e = CineframeError::InvalidBoundingBox {
            x: 0.9,
            y: 0.9,
            width: 0.5,
            height: 0.5,
        };
        assert!(e.to_string().contains("0.900,0.900"));
    }
}
