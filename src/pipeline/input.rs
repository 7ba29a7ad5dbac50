//! Input resolution: turn a photo on disk (or in memory) into bytes + MIME.
//!
//! The vision API needs to be told the MIME type of the inline image. File
//! extensions lie often enough that we sniff the magic bytes with
//! [`image::guess_format`] instead, and reject anything that is not a
//! format the provider accepts before spending a request on it.

use crate::error::CineframeError;
use image::ImageFormat;
use std::path::{Path, PathBuf};
use tracing::debug;

/// An uploaded photo: raw encoded bytes plus their MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl SourceImage {
    /// Wrap in-memory image bytes, detecting the MIME type from content.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, CineframeError> {
        let format = image::guess_format(&bytes).map_err(|e| CineframeError::UnsupportedImage {
            detail: e.to_string(),
        })?;
        let mime_type = mime_for_format(format).ok_or_else(|| CineframeError::UnsupportedImage {
            detail: format!("{format:?} images are not supported"),
        })?;
        Ok(Self {
            bytes,
            mime_type: mime_type.to_string(),
        })
    }

    /// Size of the encoded image in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// MIME types accepted for inline image data.
pub fn mime_for_format(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Png => Some("image/png"),
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::WebP => Some("image/webp"),
        ImageFormat::Gif => Some("image/gif"),
        ImageFormat::Bmp => Some("image/bmp"),
        ImageFormat::Tiff => Some("image/tiff"),
        _ => None,
    }
}

/// Read a local image file.
pub async fn load_image(path: impl AsRef<Path>) -> Result<SourceImage, CineframeError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| io_error(path.to_path_buf(), e))?;

    if bytes.is_empty() {
        return Err(CineframeError::UnsupportedImage {
            detail: format!("'{}' is empty", path.display()),
        });
    }

    let image = SourceImage::from_bytes(bytes)?;
    debug!(
        "Loaded {} ({} bytes, {})",
        path.display(),
        image.len(),
        image.mime_type
    );
    Ok(image)
}

pub(crate) fn io_error(path: PathBuf, e: std::io::Error) -> CineframeError {
    match e.kind() {
        std::io::ErrorKind::PermissionDenied => CineframeError::PermissionDenied { path },
        _ => CineframeError::FileNotFound { path },
    }
}
