//! Response normalisation: raw model text → [`CinematicSuggestion`].
//!
//! ## Why accept partial replies?
//!
//! The model is probabilistic. It regularly returns JSON that is
//! structurally fine but semantically off: a crop box that runs past the
//! image edge, or both a box and a concept prompt when it was told to pick
//! one. The analysis text is still worth showing, so sub-field problems are
//! repaired in place (the offending field becomes `None`) and logged.
//!
//! Only two things are fatal:
//! - text that does not parse as a JSON object → `MalformedResponse`
//! - a missing or empty `analysisText` → `MissingRequiredField`
//!
//! ## Steps
//!
//! 1. Trim, strip an outer code fence if the model added one
//! 2. Parse as a JSON object
//! 3. Require a non-empty `analysisText`
//! 4. Box + concept prompt both set → keep the box, drop the prompt
//! 5. Validate the box; on any failure drop it
//! 6. Neither set → text-only advice (logged, not an error)

use crate::error::CineframeError;
use crate::output::{BoundingBox, CinematicSuggestion};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

const ANALYSIS_TEXT: &str = "analysisText";
const BOUNDING_BOX: &str = "suggestedBoundingBox";
const CONCEPT_PROMPT: &str = "cinematicConceptPrompt";

static RE_OUTER_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(\w*)?\s*\n?(.*?)\n?\s*```$").unwrap());

/// Normalise the raw text of one analysis reply.
pub fn normalize_response(raw: &str) -> Result<CinematicSuggestion, CineframeError> {
    let body = strip_fence(raw);

    let value: Value =
        serde_json::from_str(body).map_err(|e| CineframeError::MalformedResponse {
            detail: e.to_string(),
        })?;
    let fields = match value {
        Value::Object(fields) => fields,
        other => {
            return Err(CineframeError::MalformedResponse {
                detail: format!("expected a JSON object, got {}", json_kind(&other)),
            })
        }
    };

    let analysis_text = required_text(&fields)?;

    let raw_box = present(&fields, BOUNDING_BOX);
    let mut concept_prompt = concept_prompt(&fields);

    if raw_box.is_some() && concept_prompt.is_some() {
        warn!("Model returned both a bounding box and a concept prompt; keeping the box");
        concept_prompt = None;
    }

    let bounding_box = raw_box.and_then(|v| match parse_box(v) {
        Some(b) if b.is_valid() => Some(b),
        _ => {
            warn!("Model returned an invalid bounding box, treating as absent: {}", v);
            None
        }
    });

    if bounding_box.is_none() && concept_prompt.is_none() {
        warn!("Model returned analysis text only, with neither a bounding box nor a concept prompt");
    }

    debug!(
        "Normalised reply: {} chars of analysis, box={:?}, concept={}",
        analysis_text.len(),
        bounding_box,
        concept_prompt.is_some()
    );

    Ok(CinematicSuggestion {
        analysis_text,
        suggested_bounding_box: bounding_box,
        cinematic_concept_prompt: concept_prompt,
    })
}

/// Remove an outer ```` ``` ```` / ```` ```json ```` fence, if any.
fn strip_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    match RE_OUTER_FENCE.captures(trimmed).and_then(|c| c.get(2)) {
        Some(inner) if !inner.as_str().is_empty() => inner.as_str().trim(),
        _ => trimmed,
    }
}

fn required_text(fields: &Map<String, Value>) -> Result<String, CineframeError> {
    match fields.get(ANALYSIS_TEXT) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        _ => Err(CineframeError::MissingRequiredField {
            field: ANALYSIS_TEXT,
        }),
    }
}

/// The field's value unless it is absent or `null`.
fn present<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    fields.get(key).filter(|v| !v.is_null())
}

fn concept_prompt(fields: &Map<String, Value>) -> Option<String> {
    match present(fields, CONCEPT_PROMPT)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        other => {
            warn!("Ignoring unusable concept prompt: {}", other);
            None
        }
    }
}

/// Read the four coordinates; `None` if any is missing or not a number.
fn parse_box(value: &Value) -> Option<BoundingBox> {
    let obj = value.as_object()?;
    let num = |k: &str| obj.get(k).and_then(Value::as_f64);
    Some(BoundingBox::new(
        num("x")?,
        num("y")?,
        num("width")?,
        num("height")?,
    ))
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::BOUNDS_TOLERANCE;

    const CROP: &str = r#"{"analysisText":"Crop tighter.","suggestedBoundingBox":{"x":0.1,"y":0.1,"width":0.8,"height":0.9},"cinematicConceptPrompt":null}"#;

    // ── Fences ───────────────────────────────────────────────────────────

    #[test]
    fn fenced_equals_unfenced() {
        let plain = normalize_response(CROP).unwrap();
        for fenced in [
            format!("```json\n{CROP}\n```"),
            format!("```\n{CROP}\n```"),
            format!("  ```json\n{CROP}\n```  \n"),
            format!("```JSON\n\n{CROP}\n\n```"),
        ] {
            assert_eq!(normalize_response(&fenced).unwrap(), plain, "input: {fenced:?}");
        }
    }

    #[test]
    fn unfenced_text_untouched() {
        assert_eq!(strip_fence("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn fence_on_single_line() {
        assert_eq!(strip_fence("```{\"a\":1}```"), "{\"a\":1}");
    }

    // ── Hard failures ────────────────────────────────────────────────────

    #[test]
    fn garbage_is_malformed() {
        let err = normalize_response("Sure! Here is my analysis").unwrap_err();
        assert!(matches!(err, CineframeError::MalformedResponse { .. }));
    }

    #[test]
    fn non_object_is_malformed() {
        let err = normalize_response("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, CineframeError::MalformedResponse { .. }), "{err}");
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn missing_analysis_text_fails_regardless_of_other_fields() {
        for raw in [
            r#"{"suggestedBoundingBox":{"x":0.1,"y":0.1,"width":0.5,"height":0.5},"cinematicConceptPrompt":null}"#,
            r#"{"analysisText":"","suggestedBoundingBox":null,"cinematicConceptPrompt":"a scene"}"#,
            r#"{"analysisText":"   ","suggestedBoundingBox":null,"cinematicConceptPrompt":null}"#,
            r#"{"analysisText":null}"#,
            r#"{"analysisText":42}"#,
            r#"{}"#,
        ] {
            let err = normalize_response(raw).unwrap_err();
            assert!(
                matches!(err, CineframeError::MissingRequiredField { field: "analysisText" }),
                "input {raw} gave {err:?}"
            );
        }
    }

    // ── Scenarios ────────────────────────────────────────────────────────

    #[test]
    fn valid_crop_kept_intact() {
        let s = normalize_response(CROP).unwrap();
        assert_eq!(s.analysis_text, "Crop tighter.");
        assert_eq!(
            s.suggested_bounding_box,
            Some(BoundingBox::new(0.1, 0.1, 0.8, 0.9))
        );
        assert_eq!(s.cinematic_concept_prompt, None);
    }

    #[test]
    fn out_of_bounds_box_downgraded_not_rejected() {
        let raw = r#"{"analysisText":"Try this concept.","suggestedBoundingBox":{"x":0.9,"y":0.9,"width":0.5,"height":0.5},"cinematicConceptPrompt":null}"#;
        let s = normalize_response(raw).expect("partial acceptance is intended");
        assert_eq!(s.analysis_text, "Try this concept.");
        assert_eq!(s.suggested_bounding_box, None);
        assert_eq!(s.cinematic_concept_prompt, None);
    }

    #[test]
    fn box_wins_over_concept_prompt() {
        let raw = r#"{"analysisText":"Both.","suggestedBoundingBox":{"x":0.2,"y":0.2,"width":0.5,"height":0.5},"cinematicConceptPrompt":"A neon city"}"#;
        let s = normalize_response(raw).unwrap();
        assert_eq!(
            s.suggested_bounding_box,
            Some(BoundingBox::new(0.2, 0.2, 0.5, 0.5))
        );
        assert_eq!(s.cinematic_concept_prompt, None);
    }

    #[test]
    fn invalid_box_still_displaces_concept_prompt() {
        let raw = r#"{"analysisText":"Both, bad box.","suggestedBoundingBox":{"x":0.9,"y":0.0,"width":0.5,"height":0.5},"cinematicConceptPrompt":"A neon city"}"#;
        let s = normalize_response(raw).unwrap();
        assert_eq!(s.suggested_bounding_box, None);
        assert_eq!(s.cinematic_concept_prompt, None);
    }

    #[test]
    fn concept_prompt_alone_kept() {
        let raw = r#"{"analysisText":"Reimagine it.","suggestedBoundingBox":null,"cinematicConceptPrompt":"Golden hour, lone figure"}"#;
        let s = normalize_response(raw).unwrap();
        assert_eq!(
            s.cinematic_concept_prompt.as_deref(),
            Some("Golden hour, lone figure")
        );
        assert_eq!(s.suggested_bounding_box, None);
    }

    #[test]
    fn text_only_is_valid() {
        let raw = r#"{"analysisText":"Already cinematic.","suggestedBoundingBox":null,"cinematicConceptPrompt":null}"#;
        let s = normalize_response(raw).unwrap();
        assert_eq!(s.suggested_bounding_box, None);
        assert_eq!(s.cinematic_concept_prompt, None);
    }

    #[test]
    fn missing_optional_keys_treated_as_null() {
        let s = normalize_response(r#"{"analysisText":"Short."}"#).unwrap();
        assert_eq!(s.suggested_bounding_box, None);
        assert_eq!(s.cinematic_concept_prompt, None);
    }

    #[test]
    fn non_numeric_box_fields_downgraded() {
        for bad_box in [
            r#"{"x":"0.1","y":0.1,"width":0.5,"height":0.5}"#,
            r#"{"x":0.1,"y":0.1,"width":0.5}"#,
            r#""0.1,0.1,0.5,0.5""#,
            r#"[0.1,0.1,0.5,0.5]"#,
        ] {
            let raw = format!(
                r#"{{"analysisText":"t","suggestedBoundingBox":{bad_box},"cinematicConceptPrompt":null}}"#
            );
            let s = normalize_response(&raw).unwrap();
            assert_eq!(s.suggested_bounding_box, None, "box {bad_box}");
        }
    }

    #[test]
    fn blank_concept_prompt_dropped() {
        let raw = r#"{"analysisText":"t","suggestedBoundingBox":null,"cinematicConceptPrompt":"  "}"#;
        assert_eq!(normalize_response(raw).unwrap().cinematic_concept_prompt, None);
    }

    #[test]
    fn integer_coordinates_accepted() {
        let raw = r#"{"analysisText":"Whole frame.","suggestedBoundingBox":{"x":0,"y":0,"width":1,"height":1},"cinematicConceptPrompt":null}"#;
        let s = normalize_response(raw).unwrap();
        assert_eq!(
            s.suggested_bounding_box,
            Some(BoundingBox::new(0.0, 0.0, 1.0, 1.0))
        );
    }

    // ── Box predicate sweep ──────────────────────────────────────────────

    fn predicate(x: f64, y: f64, w: f64, h: f64) -> bool {
        w > 0.0
            && h > 0.0
            && x >= 0.0
            && y >= 0.0
            && x <= 1.0
            && y <= 1.0
            && w <= 1.0
            && h <= 1.0
            && x + w <= 1.0 + BOUNDS_TOLERANCE
            && y + h <= 1.0 + BOUNDS_TOLERANCE
    }

    #[test]
    fn accept_reject_matches_predicate_over_grid() {
        let steps = [-0.2, -0.0005, 0.0, 0.1, 0.25, 0.4995, 0.5, 0.5005, 0.75, 0.9, 1.0, 1.2];
        let mut accepted = 0usize;
        let mut rejected = 0usize;
        for &x in &steps {
            for &y in &steps {
                for &w in &steps {
                    for &h in &steps {
                        let raw = format!(
                            r#"{{"analysisText":"t","suggestedBoundingBox":{{"x":{x},"y":{y},"width":{w},"height":{h}}},"cinematicConceptPrompt":null}}"#
                        );
                        let s = normalize_response(&raw).unwrap();
                        let expect = predicate(x, y, w, h);
                        assert_eq!(
                            s.suggested_bounding_box.is_some(),
                            expect,
                            "box x={x} y={y} w={w} h={h}"
                        );
                        if let Some(b) = s.suggested_bounding_box {
                            assert_eq!(b, BoundingBox::new(x, y, w, h));
                            accepted += 1;
                        } else {
                            rejected += 1;
                        }
                    }
                }
            }
        }
        assert!(accepted > 0 && rejected > 0);
    }
}
