use std::io::Cursor;
use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ImageReader};
use crate::models::{ConversionTarget, EntryError};

/// Decode raster bytes, sniffing the format from the content
///
/// Empty payloads and images with a zero dimension are decode failures.
pub fn decode(payload: &[u8]) -> Result<DynamicImage, EntryError> {
    if payload.is_empty() {
        return Err(EntryError::Decode("empty payload".to_string()));
    }

    let reader = ImageReader::new(Cursor::new(payload))
        .with_guessed_format()
        .map_err(|e| EntryError::Decode(format!("Failed to detect image format: {}", e)))?;

    if reader.format() == Some(image::ImageFormat::Avif) && !cfg!(feature = "avif-native") {
        return Err(EntryError::Decode(
            "AVIF decoding is not available (build with the avif-native feature)".to_string()
        ));
    }

    let image = reader
        .decode()
        .map_err(|e| EntryError::Decode(format!("Failed to decode image: {}", e)))?;

    if image.width() == 0 || image.height() == 0 {
        return Err(EntryError::Decode(
            format!("image has zero dimension ({}x{})", image.width(), image.height())
        ));
    }

    Ok(image)
}

/// Encode a bitmap to the target format
///
/// # Arguments
/// * `quality` - 0.0 - 1.0, used by JPEG and AVIF only
/// * `avif_speed` - ravif speed, 1 - 10
///
/// JPEG has no alpha channel, so transparent pixels are flattened.
pub fn encode(
    image: &DynamicImage,
    target: ConversionTarget,
    quality: f32,
    avif_speed: u8,
) -> Result<Vec<u8>, EntryError> {
    let quality = (quality.clamp(0.0, 1.0) * 100.0).round() as u8;
    let mut buffer = Vec::new();

    let result = match target {
        ConversionTarget::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8())
            .write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, quality)),
        ConversionTarget::Png => DynamicImage::ImageRgba8(image.to_rgba8())
            .write_with_encoder(PngEncoder::new(&mut buffer)),
        ConversionTarget::WebP => DynamicImage::ImageRgba8(image.to_rgba8())
            .write_with_encoder(WebPEncoder::new_lossless(&mut buffer)),
        ConversionTarget::Avif => DynamicImage::ImageRgba8(image.to_rgba8())
            .write_with_encoder(AvifEncoder::new_with_speed_quality(&mut buffer, avif_speed, quality)),
    };

    result.map_err(|e| EntryError::Encode(format!("Failed to encode {}: {}", target, e)))?;

    if buffer.is_empty() {
        return Err(EntryError::Encode(format!("{} encoder produced no data", target)));
    }

    Ok(buffer)
}
