//! Result types: the normalised suggestion and the generated concept image.
//!
//! Field names serialise in camelCase so `--json` output matches the wire
//! contract the model is asked to follow.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

/// Slack allowed when `x + width` or `y + height` slightly exceeds 1.0.
///
/// Models emit values like `0.25 + 0.7500001`; rejecting those would throw
/// away otherwise good crops. The value itself is arbitrary, carried over
/// unchanged from earlier versions of the tool rather than derived from
/// anything.
pub const BOUNDS_TOLERANCE: f64 = 0.001;

/// A normalised rectangle within the source image.
///
/// All coordinates are fractions of the image width/height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the box describes a non-empty region inside the image.
    ///
    /// Each coordinate must lie in `[0, 1]`, sizes must be positive, and the
    /// far edges may overshoot 1.0 by at most [`BOUNDS_TOLERANCE`].
    pub fn is_valid(&self) -> bool {
        let Self {
            x,
            y,
            width,
            height,
        } = *self;

        [x, y, width, height].iter().all(|v| v.is_finite())
            && width > 0.0
            && height > 0.0
            && x >= 0.0
            && y >= 0.0
            && x <= 1.0
            && y <= 1.0
            && width <= 1.0
            && height <= 1.0
            && x + width <= 1.0 + BOUNDS_TOLERANCE
            && y + height <= 1.0 + BOUNDS_TOLERANCE
    }
}

/// What kind of advice a suggestion carries besides the analysis text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    /// A crop of the uploaded photo.
    Crop,
    /// A prompt for generating a new image.
    Concept,
    /// Analysis text only.
    TextOnly,
}

/// Normalised output of one analysis attempt.
///
/// Values returned by [`crate::pipeline::normalize::normalize_response`] have
/// a non-empty `analysis_text` and at most one of `suggested_bounding_box` /
/// `cinematic_concept_prompt` set. The fields are public, so a hand-built
/// value carries no such guarantee; [`Self::kind`] prefers the box.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CinematicSuggestion {
    pub analysis_text: String,
    pub suggested_bounding_box: Option<BoundingBox>,
    pub cinematic_concept_prompt: Option<String>,
}

impl CinematicSuggestion {
    pub fn kind(&self) -> SuggestionKind {
        match (&self.suggested_bounding_box, &self.cinematic_concept_prompt) {
            (Some(_), _) => SuggestionKind::Crop,
            (None, Some(_)) => SuggestionKind::Concept,
            (None, None) => SuggestionKind::TextOnly,
        }
    }
}

/// A generated image ready for display or writing to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ConceptImage {
    /// Render as a `data:` URL, e.g. for embedding in HTML.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }

    /// File extension matching the MIME type.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/png" => "png",
            "image/webp" => "webp",
            _ => "jpg",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_inside_image_is_valid() {
        assert!(BoundingBox::new(0.1, 0.1, 0.8, 0.9).is_valid());
        assert!(BoundingBox::new(0.0, 0.0, 1.0, 1.0).is_valid());
    }

    #[test]
    fn tolerance_allows_small_overshoot() {
        assert!(BoundingBox::new(0.25, 0.0, 0.7505, 1.0).is_valid());
        assert!(!BoundingBox::new(0.25, 0.0, 0.752, 1.0).is_valid());
    }

    #[test]
    fn degenerate_boxes_rejected() {
        assert!(!BoundingBox::new(0.1, 0.1, 0.0, 0.5).is_valid());
        assert!(!BoundingBox::new(0.1, 0.1, 0.5, -0.2).is_valid());
        assert!(!BoundingBox::new(-0.01, 0.1, 0.5, 0.5).is_valid());
        assert!(!BoundingBox::new(0.9, 0.9, 0.5, 0.5).is_valid());
        assert!(!BoundingBox::new(f64::NAN, 0.1, 0.5, 0.5).is_valid());
        assert!(!BoundingBox::new(0.0, 0.0, f64::INFINITY, 0.5).is_valid());
    }

    #[test]
    fn kind_reflects_fields() {
        let mut s = CinematicSuggestion {
            analysis_text: "ok".into(),
            suggested_bounding_box: None,
            cinematic_concept_prompt: None,
        };
        assert_eq!(s.kind(), SuggestionKind::TextOnly);
        s.cinematic_concept_prompt = Some("a storm".into());
        assert_eq!(s.kind(), SuggestionKind::Concept);
        s.suggested_bounding_box = Some(BoundingBox::new(0.0, 0.0, 0.5, 0.5));
        assert_eq!(s.kind(), SuggestionKind::Crop);
    }

    #[test]
    fn suggestion_serialises_with_wire_names() {
        let s = CinematicSuggestion {
            analysis_text: "Crop tighter.".into(),
            suggested_bounding_box: None,
            cinematic_concept_prompt: None,
        };
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["analysisText"], "Crop tighter.");
        assert!(json["suggestedBoundingBox"].is_null());
        assert!(json["cinematicConceptPrompt"].is_null());
    }

    #[test]
    fn normalised_reply_serialises_one_action() {
        let s = crate::pipeline::normalize::normalize_response(
            r#"{"analysisText":"Both.","suggestedBoundingBox":{"x":0,"y":0,"width":0.5,"height":0.5},"cinematicConceptPrompt":"A storm."}"#,
        )
        .unwrap();
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["suggestedBoundingBox"]["width"], 0.5);
        assert!(json["cinematicConceptPrompt"].is_null());
    }

    #[test]
    fn data_url_prefix() {
        let img = ConceptImage {
            bytes: vec![0xFF, 0xD8, 0xFF],
            mime_type: "image/jpeg".into(),
        };
        assert_eq!(img.to_data_url(), "data:image/jpeg;base64,/9j/");
        assert_eq!(img.extension(), "jpg");
    }
}
