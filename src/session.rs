//! Per-photo state: the loaded image, how many attempts were made, and the
//! latest suggestion.
//!
//! A session belongs to exactly one photo. Opening another photo means a new
//! `Session`, so the attempt counter (and with it the temperature rotation)
//! restarts at the first attempt.
//!
//! ```text
//! Session::new ──▶ analyze ──▶ analyze ──▶ … ──▶ visualize_concept
//!   attempt 0      attempt 1    attempt 2          (latest concept prompt)
//! ```

use crate::attempt::Attempt;
use crate::config::CineframeConfig;
use crate::error::CineframeError;
use crate::output::{CinematicSuggestion, ConceptImage};
use crate::pipeline::imagegen::{generate_concept_image, ImageBackend};
use crate::pipeline::input::{load_image, SourceImage};
use crate::pipeline::llm::{analyze_image, VisionBackend};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Session {
    image: SourceImage,
    attempts: u32,
    latest: Option<CinematicSuggestion>,
}

impl Session {
    /// Start a session for `image`. No attempt has been made yet.
    pub fn new(image: SourceImage) -> Self {
        Self {
            image,
            attempts: 0,
            latest: None,
        }
    }

    /// Load the photo at `path` and start a session for it.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, CineframeError> {
        Ok(Self::new(load_image(path).await?))
    }

    pub fn image(&self) -> &SourceImage {
        &self.image
    }

    /// Number of analysis attempts made so far, failed ones included.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// The attempt the next [`Session::analyze`] call will run as.
    pub fn next_attempt(&self) -> Attempt {
        Attempt::new(self.attempts.saturating_add(1))
    }

    /// Suggestion from the most recent successful attempt, if that attempt
    /// was also the last one made.
    pub fn latest(&self) -> Option<&CinematicSuggestion> {
        self.latest.as_ref()
    }

    /// Run the next analysis attempt.
    ///
    /// The counter advances before the call, so a failed attempt still moves
    /// the rotation on. The previous suggestion is dropped either way.
    pub async fn analyze<B>(
        &mut self,
        backend: &B,
        config: &CineframeConfig,
    ) -> Result<&CinematicSuggestion, CineframeError>
    where
        B: VisionBackend + ?Sized,
    {
        let attempt = self.next_attempt();
        self.attempts = attempt.number();
        self.latest = None;

        let suggestion = analyze_image(backend, &self.image, attempt, config).await?;
        debug!("Attempt {} produced a {:?} suggestion", attempt, suggestion.kind());
        Ok(self.latest.insert(suggestion))
    }

    /// Generate an image from the latest suggestion's concept prompt.
    ///
    /// # Errors
    /// [`CineframeError::NoConceptPrompt`] when there is no latest suggestion
    /// or it carries no concept prompt; otherwise whatever
    /// [`generate_concept_image`] reports.
    pub async fn visualize_concept<B>(
        &self,
        backend: &B,
        config: &CineframeConfig,
    ) -> Result<ConceptImage, CineframeError>
    where
        B: ImageBackend + ?Sized,
    {
        let prompt = self
            .latest
            .as_ref()
            .and_then(|s| s.cinematic_concept_prompt.as_deref())
            .ok_or(CineframeError::NoConceptPrompt)?;
        generate_concept_image(backend, prompt, config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::RemoteFailure;
    use crate::pipeline::llm::AnalysisRequest;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replies in order, recording each request's temperature.
    struct Replies {
        queue: Mutex<VecDeque<Result<String, RemoteFailure>>>,
        temperatures: Mutex<Vec<f32>>,
    }

    impl Replies {
        fn new(replies: Vec<Result<&str, &str>>) -> Self {
            let queue = replies
                .into_iter()
                .map(|r| r.map(str::to_string).map_err(|e| RemoteFailure::new(e)))
                .collect();
            Self {
                queue: Mutex::new(queue),
                temperatures: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl VisionBackend for Replies {
        async fn complete(&self, request: &AnalysisRequest<'_>) -> Result<String, RemoteFailure> {
            self.temperatures.lock().unwrap().push(request.temperature);
            self.queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(RemoteFailure::new("no more replies")))
        }
    }

    struct Prompts(Mutex<Vec<String>>);

    #[async_trait]
    impl ImageBackend for Prompts {
        async fn generate(&self, prompt: &str) -> Result<Vec<ConceptImage>, RemoteFailure> {
            self.0.lock().unwrap().push(prompt.to_string());
            Ok(vec![ConceptImage {
                bytes: vec![0xFF, 0xD8],
                mime_type: "image/jpeg".into(),
            }])
        }
    }

    const TEXT_ONLY: &str = r#"{"analysisText":"Fine as is."}"#;
    const CONCEPT: &str =
        r#"{"analysisText":"Reshoot it.","cinematicConceptPrompt":"Rain-soaked street at night."}"#;

    fn session() -> Session {
        Session::new(SourceImage {
            bytes: vec![0x89, b'P', b'N', b'G'],
            mime_type: "image/png".into(),
        })
    }

    #[test]
    fn new_session_has_no_attempts() {
        let s = session();
        assert_eq!(s.attempts(), 0);
        assert_eq!(s.next_attempt(), Attempt::first());
        assert!(s.latest().is_none());
    }

    #[test]
    fn attempts_advance_and_rotate_temperature() {
        let backend = Replies::new(vec![Ok(TEXT_ONLY); 6]);
        let config = CineframeConfig::default();
        let mut s = session();
        tokio_test::block_on(async {
            for _ in 0..6 {
                s.analyze(&backend, &config).await.unwrap();
            }
        });
        assert_eq!(s.attempts(), 6);
        assert_eq!(
            *backend.temperatures.lock().unwrap(),
            vec![0.65, 0.75, 0.80, 0.60, 0.70, 0.65]
        );
    }

    #[test]
    fn failed_attempt_counts_and_clears_latest() {
        let backend = Replies::new(vec![Ok(TEXT_ONLY), Err("boom")]);
        let config = CineframeConfig::default();
        let mut s = session();
        tokio_test::block_on(async {
            s.analyze(&backend, &config).await.unwrap();
            assert!(s.latest().is_some());
            let err = s.analyze(&backend, &config).await.unwrap_err();
            assert!(matches!(err, CineframeError::Unknown { .. }));
        });
        assert_eq!(s.attempts(), 2);
        assert!(s.latest().is_none());
    }

    #[tokio::test]
    async fn visualize_needs_concept_prompt() {
        let images = Prompts(Mutex::new(Vec::new()));
        let config = CineframeConfig::default();
        let mut s = session();

        let err = s.visualize_concept(&images, &config).await.unwrap_err();
        assert!(matches!(err, CineframeError::NoConceptPrompt));

        let vision = Replies::new(vec![Ok(TEXT_ONLY)]);
        s.analyze(&vision, &config).await.unwrap();
        let err = s.visualize_concept(&images, &config).await.unwrap_err();
        assert!(matches!(err, CineframeError::NoConceptPrompt));
        assert!(images.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn visualize_uses_latest_concept() {
        let images = Prompts(Mutex::new(Vec::new()));
        let vision = Replies::new(vec![Ok(CONCEPT)]);
        let config = CineframeConfig::default();
        let mut s = session();

        s.analyze(&vision, &config).await.unwrap();
        let img = s.visualize_concept(&images, &config).await.unwrap();
        assert_eq!(img.mime_type, "image/jpeg");
        assert_eq!(
            *images.0.lock().unwrap(),
            vec!["Rain-soaked street at night.".to_string()]
        );
    }
}
