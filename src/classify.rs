//! Best-effort classification of remote failures.
//!
//! The provider's error surface is not under our control, so classification
//! works by looking for known markers in the failure description. The
//! heuristic lives behind [`classify_failure`], a pure function, so it can be
//! exercised without any network.
//!
//! Markers are matched case-sensitively, in this order:
//!
//! | Category        | Markers                                         |
//! |-----------------|-------------------------------------------------|
//! | `InvalidApiKey` | `API key not valid`, `API_KEY_INVALID`          |
//! | `SafetyBlocked` | `SAFETY`                                        |
//! | `RateLimited`   | `RESOURCE_EXHAUSTED`, `Rate limit`, HTTP 429    |
//! | `InvalidPrompt` | `Invalid prompt` (image generation only)        |
//! | `Unknown`       | anything else                                   |

use crate::error::CineframeError;
use serde::{Deserialize, Serialize};
use std::fmt;

const INVALID_KEY_MARKERS: &[&str] = &["API key not valid", "API_KEY_INVALID"];
const SAFETY_MARKERS: &[&str] = &["SAFETY"];
const RATE_LIMIT_MARKERS: &[&str] = &["RESOURCE_EXHAUSTED", "Rate limit"];
const INVALID_PROMPT_MARKERS: &[&str] = &["Invalid prompt"];

/// Which remote call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// The vision call that produces a [`crate::CinematicSuggestion`].
    Analysis,
    /// The text-to-image call that visualises a concept prompt.
    ImageGeneration,
}

impl Operation {
    pub(crate) fn invalid_api_key_message(&self) -> &'static str {
        match self {
            Operation::Analysis => "Invalid API Key. Please check your configuration.",
            Operation::ImageGeneration => {
                "Invalid API Key for image generation. Please check your configuration."
            }
        }
    }

    pub(crate) fn safety_blocked_message(&self) -> &'static str {
        match self {
            Operation::Analysis => {
                "The image or request was blocked due to safety settings. \
                 Please try a different image or adjust your query."
            }
            Operation::ImageGeneration => {
                "The image generation prompt was blocked due to safety settings. \
                 Please try a different prompt."
            }
        }
    }

    pub(crate) fn rate_limited_message(&self) -> &'static str {
        match self {
            Operation::Analysis => {
                "The AI service is currently busy or rate limits exceeded. Please try again later."
            }
            Operation::ImageGeneration => {
                "Image generation rate limit exceeded. Please try again later."
            }
        }
    }

    pub(crate) fn unknown_prefix(&self) -> &'static str {
        match self {
            Operation::Analysis => "Failed to get cinematic suggestion from AI",
            Operation::ImageGeneration => "Failed to generate image",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Analysis => f.write_str("analysis"),
            Operation::ImageGeneration => f.write_str("image generation"),
        }
    }
}

/// Structured description of a failed remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFailure {
    /// HTTP status, when the transport exposed one.
    pub status: Option<u16>,
    /// Human-readable description as reported by the provider or transport.
    pub message: String,
}

impl RemoteFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }
}

impl fmt::Display for RemoteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "HTTP {status}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Tagged outcome of [`classify_failure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureCategory {
    InvalidApiKey,
    SafetyBlocked,
    RateLimited,
    /// Only produced for [`Operation::ImageGeneration`].
    InvalidPrompt,
    Unknown,
}

fn contains_any(haystack: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| haystack.contains(m))
}

/// Map a remote failure onto one of the fixed categories.
pub fn classify_failure(operation: Operation, failure: &RemoteFailure) -> FailureCategory {
    let msg = failure.message.as_str();

    if contains_any(msg, INVALID_KEY_MARKERS) {
        FailureCategory::InvalidApiKey
    } else if contains_any(msg, SAFETY_MARKERS) {
        FailureCategory::SafetyBlocked
    } else if contains_any(msg, RATE_LIMIT_MARKERS) || failure.status == Some(429) {
        FailureCategory::RateLimited
    } else if operation == Operation::ImageGeneration && contains_any(msg, INVALID_PROMPT_MARKERS)
    {
        FailureCategory::InvalidPrompt
    } else {
        FailureCategory::Unknown
    }
}

/// Classify `failure` and wrap it in the matching [`CineframeError`].
pub fn classified_error(operation: Operation, failure: RemoteFailure) -> CineframeError {
    let category = classify_failure(operation, &failure);
    let detail = failure.to_string();
    match category {
        FailureCategory::InvalidApiKey => CineframeError::InvalidApiKey { operation, detail },
        FailureCategory::SafetyBlocked => CineframeError::SafetyBlocked { operation, detail },
        FailureCategory::RateLimited => CineframeError::RateLimited { operation, detail },
        FailureCategory::InvalidPrompt => CineframeError::InvalidPrompt { detail },
        FailureCategory::Unknown => CineframeError::Unknown { operation, detail },
    }
}
