//! Image encoding: [`SourceImage`] → base64 `ImageData` for the vision API.
//!
//! The photo is forwarded exactly as uploaded. Re-encoding would cost
//! quality and change the pixel grid the model's bounding box refers to.
//! `detail: "high"` keeps providers that tile images (OpenAI-style) from
//! downsampling to a single low-resolution overview tile.

use crate::pipeline::input::SourceImage;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use tracing::debug;

/// Wrap the photo as base64 inline image data.
pub fn encode_image(image: &SourceImage) -> ImageData {
    let b64 = STANDARD.encode(&image.bytes);
    debug!("Encoded image → {} bytes base64", b64.len());

    ImageData::new(b64, image.mime_type.as_str()).with_detail("high")
}
