//! End-to-end integration tests for cineframe.
//!
//! These tests make live API calls against Gemini. They are gated behind the
//! `E2E_ENABLED` environment variable so they do not run in CI unless
//! explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 GEMINI_API_KEY=... cargo test --test e2e -- --nocapture
//!
//! To restrict to a specific test:
//!   E2E_ENABLED=1 cargo test --test e2e test_analyze_synthetic -- --nocapture

use cineframe::{
    analyze_file, visualize, Attempt, CineframeConfig, CineframeError, FailureCategory,
};
use image::{DynamicImage, Rgb, RgbImage};
use std::path::PathBuf;

// ── Test helpers ─────────────────────────────────────────────────────────────

macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
    }};
}

/// A 640×360 "horizon" frame: sky over ground with a dark subject dead centre.
fn write_test_photo(dir: &tempfile::TempDir) -> PathBuf {
    let img = RgbImage::from_fn(640, 360, |x, y| {
        let subject = (300..340).contains(&x) && (140..260).contains(&y);
        if subject {
            Rgb([20, 20, 20])
        } else if y < 180 {
            Rgb([120, 170, 230])
        } else {
            Rgb([90, 140, 60])
        }
    });
    let path = dir.path().join("horizon.jpg");
    DynamicImage::ImageRgb8(img).save(&path).unwrap();
    path
}

// ── Analysis ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_analyze_synthetic() {
    e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let photo = write_test_photo(&dir);

    let config = CineframeConfig::default();
    let s = analyze_file(&photo, Attempt::first(), &config)
        .await
        .expect("analysis failed");

    println!("{:#?}", s);
    assert!(!s.analysis_text.trim().is_empty());
    assert!(
        !(s.suggested_bounding_box.is_some() && s.cinematic_concept_prompt.is_some()),
        "box and concept prompt must never both be set"
    );
    if let Some(b) = s.suggested_bounding_box {
        assert!(b.is_valid(), "accepted box must be valid: {b:?}");
    }
}

#[tokio::test]
async fn test_analyze_second_attempt() {
    e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let photo = write_test_photo(&dir);

    let s = analyze_file(&photo, Attempt::new(2), &CineframeConfig::default())
        .await
        .expect("analysis failed");
    println!("kind: {:?}", s.kind());
    assert!(!s.analysis_text.is_empty());
}

#[tokio::test]
async fn test_analyze_nonexistent() {
    // No API call is made; runs regardless of E2E_ENABLED.
    let err = analyze_file(
        "/tmp/cineframe-e2e-missing.jpg",
        Attempt::first(),
        &CineframeConfig::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CineframeError::FileNotFound { .. }));
}

#[tokio::test]
async fn test_bad_key_is_classified() {
    e2e_skip_unless_ready!();
    let config = CineframeConfig::builder()
        .api_key("not-a-real-key")
        .build()
        .unwrap();
    let err = visualize("A lighthouse at dusk, anamorphic lens", &config)
        .await
        .unwrap_err();
    println!("{err}");
    assert_eq!(err.category(), Some(FailureCategory::InvalidApiKey));
}

// ── Visualisation ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_visualize_concept() {
    e2e_skip_unless_ready!();
    let config = CineframeConfig::default();
    let image = visualize(
        "Wide anamorphic shot of a lone figure on a rain-soaked neon street at night, \
         teal and orange grade, shallow depth of field",
        &config,
    )
    .await
    .expect("image generation failed");

    assert!(!image.bytes.is_empty());
    assert_eq!(image.mime_type, "image/jpeg");
    let decoded = image::load_from_memory(&image.bytes).expect("not a decodable image");
    println!("concept image {}x{}", decoded.width(), decoded.height());
}

