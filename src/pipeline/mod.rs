//! Pipeline stages for cinematic analysis and concept visualisation.
//!
//! Each submodule implements exactly one step, so each is independently
//! testable.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ encode ──▶ llm ──▶ normalize ──▶ crop
//! (file)    (base64)   (VLM)   (validate)    (pixels)
//!
//!                      concept prompt ──▶ imagegen
//!                                         (text → image)
//! ```
//!
//! 1. [`input`]     — read the photo and sniff its MIME type
//! 2. [`encode`]    — base64-wrap the bytes for the multimodal request
//! 3. [`llm`]       — one vision call per attempt
//! 4. [`normalize`] — parse and repair the model's JSON reply
//! 5. [`crop`]      — apply an accepted bounding box to the photo
//! 6. [`imagegen`]  — one text-to-image call for a concept prompt

use crate::classify::RemoteFailure;
use crate::error::CineframeError;
use std::future::Future;
use std::path::Path;
use std::time::Duration;

pub mod crop;
pub mod encode;
pub mod imagegen;
pub mod input;
pub mod llm;
pub mod normalize;

/// Bound a remote call by `secs` seconds (0 = no bound).
///
/// Expiry is reported as an ordinary remote failure; the call is not retried.
pub(crate) async fn with_timeout<T, F>(secs: u64, call: F) -> Result<T, RemoteFailure>
where
    F: Future<Output = Result<T, RemoteFailure>>,
{
    if secs == 0 {
        return call.await;
    }
    match tokio::time::timeout(Duration::from_secs(secs), call).await {
        Ok(result) => result,
        Err(_) => Err(RemoteFailure::new(format!(
            "request timed out after {secs}s"
        ))),
    }
}

/// Write `bytes` to `path` via a sibling temp file + rename, so readers never
/// see a partial file. Parent directories are created as needed.
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CineframeError> {
    let fail = |e: std::io::Error| CineframeError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(fail)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = Path::new(&tmp_name);

    tokio::fs::write(tmp_path, bytes).await.map_err(fail)?;
    if let Err(e) = tokio::fs::rename(tmp_path, path).await {
        let _ = tokio::fs::remove_file(tmp_path).await;
        return Err(fail(e));
    }
    Ok(())
}
