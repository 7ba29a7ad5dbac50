//! Apply an accepted bounding box to the photo's pixels.
//!
//! Box coordinates are fractions of the source dimensions; the pixel
//! rectangle is `W*x, H*y, W*width, H*height`, rounded and clamped so the
//! tolerance allowed by [`BoundingBox::is_valid`] never reads past an edge.

use crate::error::CineframeError;
use crate::output::BoundingBox;
use crate::pipeline::input::load_image;
use crate::pipeline::write_atomic;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};

/// Pixel rectangle `(x, y, width, height)` covered by `bbox` on a
/// `width × height` image. Always at least 1×1 and inside the image.
pub fn pixel_rect(bbox: &BoundingBox, width: u32, height: u32) -> (u32, u32, u32, u32) {
    let span = |extent: u32, origin: f64, size: f64| {
        let start = ((extent as f64 * origin).round() as u32).min(extent.saturating_sub(1));
        let len = ((extent as f64 * size).round() as u32).clamp(1, (extent - start).max(1));
        (start, len)
    };
    let (sx, sw) = span(width, bbox.x, bbox.width);
    let (sy, sh) = span(height, bbox.y, bbox.height);
    (sx, sy, sw, sh)
}

/// Crop `img` to `bbox`, optionally downscaling so the result is at most
/// `max_width` pixels wide (aspect ratio preserved).
pub fn crop_to_box(
    img: &DynamicImage,
    bbox: &BoundingBox,
    max_width: Option<u32>,
) -> Result<DynamicImage, CineframeError> {
    if !bbox.is_valid() {
        return Err(CineframeError::InvalidBoundingBox {
            x: bbox.x,
            y: bbox.y,
            width: bbox.width,
            height: bbox.height,
        });
    }

    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return Err(CineframeError::ImageDecode {
            detail: "image has no pixels".into(),
        });
    }

    let (sx, sy, sw, sh) = pixel_rect(bbox, w, h);
    debug!("Crop {}x{} → {}x{} at ({}, {})", w, h, sw, sh, sx, sy);
    let cropped = img.crop_imm(sx, sy, sw, sh);

    match max_width {
        Some(max) if max > 0 && sw > max => {
            let scaled_h = ((sh as f64 * max as f64 / sw as f64).round() as u32).max(1);
            Ok(cropped.resize_exact(max, scaled_h, FilterType::Lanczos3))
        }
        _ => Ok(cropped),
    }
}

/// Encode `img` in the format implied by `path`'s extension.
fn encode_for_path(img: &DynamicImage, path: &Path) -> Result<Vec<u8>, CineframeError> {
    let format = ImageFormat::from_path(path).map_err(|_| CineframeError::UnsupportedImage {
        detail: format!("no image format for output '{}'", path.display()),
    })?;

    // JPEG has no alpha channel.
    let img = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()),
        _ => img.clone(),
    };

    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format)
        .map_err(|e| CineframeError::UnsupportedImage {
            detail: format!("encode {format:?}: {e}"),
        })?;
    Ok(buf)
}

/// Decode `source`, crop it to `bbox` and write the result to `out`.
///
/// The output format follows `out`'s extension. Returns the final pixel
/// dimensions.
pub async fn crop_file(
    source: impl AsRef<Path>,
    bbox: &BoundingBox,
    out: impl AsRef<Path>,
    max_width: Option<u32>,
) -> Result<(u32, u32), CineframeError> {
    let source = load_image(source.as_ref()).await?;
    let img = image::load_from_memory(&source.bytes).map_err(|e| CineframeError::ImageDecode {
        detail: e.to_string(),
    })?;

    let cropped = crop_to_box(&img, bbox, max_width)?;
    let out = out.as_ref();
    let bytes = encode_for_path(&cropped, out)?;
    write_atomic(out, &bytes).await?;

    info!(
        "Wrote {}x{} crop to {}",
        cropped.width(),
        cropped.height(),
        out.display()
    );
    Ok(cropped.dimensions())
}
