//! CLI binary for cineframe.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `CineframeConfig`, runs one analysis attempt and prints the result.

use anyhow::{Context, Result};
use cineframe::{
    analyze_file, crop_file, visualize, write_concept_image, Attempt, CineframeConfig,
    CineframeError, CinematicSuggestion, SuggestionKind,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

/// Steady spinner on stderr while a remote call is in flight.
fn spinner(prefix: &str, msg: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_prefix(prefix.to_string());
    bar.set_message(msg.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Ask for cinematic advice on a photo
  cineframe street.jpg

  # Ask again for a different take (next temperature in the rotation)
  cineframe --attempt 2 street.jpg

  # Save the suggested crop, scaled to at most 600px wide
  cineframe street.jpg --crop-out street-crop.jpg --crop-max-width 600

  # Render the concept image when a reshoot is suggested
  cineframe street.jpg --visualize --concept-out concept.jpg

  # JSON output for scripting
  cineframe --json street.jpg > advice.json

ATTEMPTS & TEMPERATURE:
  Attempt   1     2     3     4     5     6 …
  Temp.     0.65  0.75  0.80  0.60  0.70  0.65 …

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (analysis and image generation)
  GOOGLE_API_KEY          Fallback key for image generation
  CINEFRAME_LLM_PROVIDER  Override the vision provider (gemini, openai, anthropic, ollama)
  CINEFRAME_MODEL         Override the vision model ID
  CINEFRAME_IMAGE_MODEL   Override the image-generation model ID

SETUP:
  1. Set API key:     export GEMINI_API_KEY=...
  2. Analyse:         cineframe photo.jpg
"#;

/// Cinematic composition advice for photos using Vision LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "cineframe",
    version,
    about = "Cinematic composition advice for photos using Vision LLMs",
    long_about = "Critique a photo's framing the way a cinematographer would. The model \
either proposes a crop of the photo, or, when no crop would help, a prompt for a new \
cinematic shot that can be rendered with an image-generation model.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Photo to analyse (PNG, JPEG, WebP, GIF, BMP or TIFF).
    image: PathBuf,

    /// Attempt number; selects the sampling temperature.
    #[arg(long, env = "CINEFRAME_ATTEMPT", default_value_t = 1,
          value_parser = clap::value_parser!(u32).range(1..))]
    attempt: u32,

    /// Vision model ID (e.g. gemini-2.5-flash, gemini-2.5-pro).
    #[arg(long, env = "CINEFRAME_MODEL")]
    model: Option<String>,

    /// Vision provider: gemini, openai, anthropic, ollama.
    #[arg(long, env = "CINEFRAME_LLM_PROVIDER")]
    provider: Option<String>,

    /// Image-generation model used by --visualize.
    #[arg(long, env = "CINEFRAME_IMAGE_MODEL")]
    image_model: Option<String>,

    /// API key for image generation (defaults to GEMINI_API_KEY / GOOGLE_API_KEY).
    #[arg(long, env = "CINEFRAME_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Max model output tokens.
    #[arg(long, env = "CINEFRAME_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// Path to a text file containing a custom analysis instruction.
    #[arg(long, env = "CINEFRAME_PROMPT_FILE")]
    prompt_file: Option<PathBuf>,

    /// Write the suggested crop to this file (format from extension).
    #[arg(long, env = "CINEFRAME_CROP_OUT")]
    crop_out: Option<PathBuf>,

    /// Downscale the written crop to at most this many pixels wide.
    #[arg(long, env = "CINEFRAME_CROP_MAX_WIDTH",
          value_parser = clap::value_parser!(u32).range(1..))]
    crop_max_width: Option<u32>,

    /// Render the concept prompt with the image-generation model.
    #[arg(long, env = "CINEFRAME_VISUALIZE")]
    visualize: bool,

    /// Where to write the concept image (default: <IMAGE>-concept.<ext>).
    #[arg(long, env = "CINEFRAME_CONCEPT_OUT")]
    concept_out: Option<PathBuf>,

    /// Output structured JSON instead of text.
    #[arg(long, env = "CINEFRAME_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "CINEFRAME_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "CINEFRAME_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the result.
    #[arg(short, long, env = "CINEFRAME_QUIET")]
    quiet: bool,

    /// Per-call API timeout in seconds (0 = none).
    #[arg(long, env = "CINEFRAME_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,
}

/// `--json` output.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report<'a> {
    attempt: u32,
    temperature: f32,
    kind: SuggestionKind,
    #[serde(flatten)]
    suggestion: &'a CinematicSuggestion,
    #[serde(skip_serializing_if = "Option::is_none")]
    crop_path: Option<&'a Path>,
    #[serde(skip_serializing_if = "Option::is_none")]
    concept_image_path: Option<&'a Path>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner is the feedback; INFO lines would tear it.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli).await?;
    let attempt = Attempt::new(cli.attempt);
    let start = Instant::now();

    // ── Analysis ─────────────────────────────────────────────────────────
    let bar = show_progress.then(|| {
        spinner(
            "Analysing",
            &format!("attempt {} at temperature {:.2}", attempt, attempt.temperature()),
        )
    });
    let result = analyze_file(&cli.image, attempt, &config).await;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    let suggestion = match result {
        Ok(s) => s,
        Err(e) => {
            if !cli.quiet && e.category().is_some() {
                eprintln!(
                    "{}",
                    dim(&format!(
                        "Run again with --attempt {} for a fresh try.",
                        attempt.next().number()
                    ))
                );
            }
            return Err(e).context("Analysis failed");
        }
    };

    // ── Crop ─────────────────────────────────────────────────────────────
    let mut crop_path = None;
    if let Some(ref out) = cli.crop_out {
        match suggestion.suggested_bounding_box {
            Some(ref bbox) => {
                let (w, h) = crop_file(&cli.image, bbox, out, cli.crop_max_width)
                    .await
                    .context("Failed to write crop")?;
                if !cli.quiet && !cli.json {
                    eprintln!(
                        "{} crop {}x{}  →  {}",
                        green("✔"),
                        w,
                        h,
                        bold(&out.display().to_string())
                    );
                }
                crop_path = Some(out.as_path());
            }
            None if !cli.quiet => {
                eprintln!("{} no crop suggested; {} not written", yellow("⚠"), out.display());
            }
            None => {}
        }
    }

    // ── Concept visualisation ────────────────────────────────────────────
    let mut concept_path: Option<PathBuf> = None;
    if cli.visualize {
        let prompt = suggestion
            .cinematic_concept_prompt
            .as_deref()
            .ok_or(CineframeError::NoConceptPrompt)
            .context("Cannot visualize")?;

        let bar = show_progress.then(|| spinner("Rendering", "concept image"));
        let image = visualize(prompt, &config).await;
        if let Some(bar) = bar {
            bar.finish_and_clear();
        }
        let image = image.context("Concept generation failed")?;

        let out = cli
            .concept_out
            .clone()
            .unwrap_or_else(|| default_concept_path(&cli.image, image.extension()));
        write_concept_image(&image, &out)
            .await
            .context("Failed to write concept image")?;

        if !cli.quiet && !cli.json {
            eprintln!(
                "{} concept image  →  {}",
                green("✔"),
                bold(&out.display().to_string())
            );
        }
        concept_path = Some(out);
    }

    // ── Output ───────────────────────────────────────────────────────────
    if cli.json {
        let report = Report {
            attempt: attempt.number(),
            temperature: attempt.temperature(),
            kind: suggestion.kind(),
            suggestion: &suggestion,
            crop_path,
            concept_image_path: concept_path.as_deref(),
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise output")?
        );
        return Ok(());
    }

    print_suggestion(&suggestion);
    if !cli.quiet {
        eprintln!(
            "{}",
            dim(&format!(
                "attempt {}  ·  temperature {:.2}  ·  {}ms",
                attempt,
                attempt.temperature(),
                start.elapsed().as_millis()
            ))
        );
    }
    Ok(())
}

fn print_suggestion(s: &CinematicSuggestion) {
    println!("{}", s.analysis_text.trim_end());
    match s.kind() {
        SuggestionKind::Crop => {
            if let Some(ref b) = s.suggested_bounding_box {
                println!();
                println!(
                    "{} Suggested crop  x={:.3} y={:.3} width={:.3} height={:.3}",
                    cyan("◆"),
                    b.x,
                    b.y,
                    b.width,
                    b.height
                );
            }
        }
        SuggestionKind::Concept => {
            if let Some(ref p) = s.cinematic_concept_prompt {
                println!();
                println!("{} Cinematic concept", cyan("◆"));
                println!("{p}");
            }
        }
        SuggestionKind::TextOnly => {}
    }
}

/// `<dir>/<stem>-concept.<ext>` next to the source photo.
fn default_concept_path(image: &Path, ext: &str) -> PathBuf {
    let stem = image
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    image.with_file_name(format!("{stem}-concept.{ext}"))
}

/// Map CLI args to `CineframeConfig`.
async fn build_config(cli: &Cli) -> Result<CineframeConfig> {
    let mut builder = CineframeConfig::builder()
        .max_tokens(cli.max_tokens)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref path) = cli.prompt_file {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read analysis prompt from {:?}", path))?;
        builder = builder.analysis_prompt(prompt);
    }
    if let Some(ref m) = cli.model {
        builder = builder.model(m);
    }
    if let Some(ref p) = cli.provider {
        builder = builder.provider_name(p);
    }
    if let Some(ref m) = cli.image_model {
        builder = builder.image_model(m);
    }
    if let Some(ref k) = cli.api_key {
        builder = builder.api_key(k);
    }

    builder.build().context("Invalid configuration")
}
