//! # cineframe
//!
//! Cinematic composition advice for photos using Vision Language Models.
//!
//! Give it a photo and it asks a vision model, playing a cinematographer,
//! to critique the framing against a fixed list of composition rules. The
//! answer is one of three things:
//!
//! - a **crop**: a bounding box (fractions of the image) that makes the
//!   existing photo more cinematic,
//! - a **concept**: a text-to-image prompt for a new shot, when no crop
//!   would do, or
//! - **text only**: the critique and nothing actionable.
//!
//! ## Pipeline Overview
//!
//! ```text
//! photo
//!  │
//!  ├─ 1. Input      read the file, sniff the MIME type
//!  ├─ 2. Encode     bytes → base64 ImageData
//!  ├─ 3. VLM        one call per attempt, temperature from the rotation
//!  ├─ 4. Normalize  strip fences, parse JSON, validate box, resolve conflicts
//!  ├─ 5. Crop       apply the box to the pixels (optional)
//!  └─ 6. Imagen     render the concept prompt (optional)
//! ```
//!
//! Every remote failure is classified ([`classify::FailureCategory`]) into a
//! message the user can act on. Nothing is retried automatically; asking
//! again is a new attempt, sampled at the next temperature.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cineframe::{analyze_file, Attempt, CineframeConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Gemini by default; reads GEMINI_API_KEY
//!     let config = CineframeConfig::default();
//!     let suggestion = analyze_file("street.jpg", Attempt::first(), &config).await?;
//!     println!("{}", suggestion.analysis_text);
//!     if let Some(b) = suggestion.suggested_bounding_box {
//!         println!("crop to x={} y={} w={} h={}", b.x, b.y, b.width, b.height);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `cineframe` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! ```toml
//! cineframe = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod advise;
pub mod attempt;
pub mod classify;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use advise::{analyze_file, analyze_sync, resolve_provider, visualize, write_concept_image};
pub use attempt::{Attempt, TEMPERATURE_ROTATION};
pub use classify::{classify_failure, FailureCategory, Operation, RemoteFailure};
pub use config::{CineframeConfig, CineframeConfigBuilder};
pub use error::CineframeError;
pub use output::{BoundingBox, CinematicSuggestion, ConceptImage, SuggestionKind};
pub use pipeline::crop::{crop_file, crop_to_box};
pub use pipeline::imagegen::{generate_concept_image, ImageBackend, ImagenBackend};
pub use pipeline::input::{load_image, SourceImage};
pub use pipeline::llm::{analyze_image, LlmVisionBackend, VisionBackend};
pub use pipeline::normalize::normalize_response;
pub use session::Session;
