//! Image encoding: one rendered page → the payload the OCR model accepts.
//!
//! Multimodal chat APIs take images as base64 strings in the request body.
//! PNG is used rather than JPEG: the raster exists solely to be read, and
//! lossless text edges matter more than payload size at 300 DPI. Each
//! payload lives only between render and the OCR call that consumes it.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode a rasterised page for the OCR model.
///
/// The `"high"` detail hint asks GPT-4-class models to spend their full
/// image tile budget; without it the fine print of a book scan blurs away.
pub fn encode_page(img: &DynamicImage) -> Result<ImageData, image::ImageError> {
    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)?;
    debug!(
        "Encoded {}x{} page → {} PNG bytes",
        img.width(),
        img.height(),
        png.len()
    );

    Ok(ImageData::new(STANDARD.encode(&png), "image/png").with_detail("high"))
}
