use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use crate::core::conversion::classifier::{replace_extension, Classification};
use crate::core::conversion::heic::{HeicDecoder, UnavailableHeicDecoder};
use crate::core::conversion::raster;
use crate::models::{
    ArchiveEntry, ConversionOutcome, ConversionTarget, EntryError, ImageFormat, ENCODE_QUALITY,
};
use crate::models::config::DEFAULT_AVIF_SPEED;

/// Everything a converter needs for one entry. Owned so it can move to a worker thread.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub name: String,
    pub payload: Vec<u8>,
    pub classification: Classification,
    pub target: ConversionTarget,
}

/// Converts one entry's payload to the target format
pub trait EntryConverter: Send + Sync {
    /// `cancel` is tripped when the caller stops waiting; implementations
    /// should check it between expensive steps and return early.
    fn convert(&self, request: ConversionRequest, cancel: &CancellationToken) -> ConversionOutcome;
}

/// Converter backed by the `image` crate, with a pluggable HEIC pre-decoder
#[derive(Clone)]
pub struct ImageConverter {
    heic: Arc<dyn HeicDecoder>,
    avif_speed: u8,
}

impl ImageConverter {
    pub fn new() -> Self {
        Self {
            heic: Arc::new(UnavailableHeicDecoder),
            avif_speed: DEFAULT_AVIF_SPEED,
        }
    }

    pub fn with_heic_decoder(mut self, decoder: Arc<dyn HeicDecoder>) -> Self {
        self.heic = decoder;
        self
    }

    pub fn with_avif_speed(mut self, speed: u8) -> Self {
        self.avif_speed = speed.clamp(1, 10);
        self
    }

    fn convert_image(
        &self,
        request: &ConversionRequest,
        cancel: &CancellationToken,
    ) -> Result<ArchiveEntry, EntryError> {
        let intermediate;
        let raster_payload: &[u8] = match request.classification {
            Classification::ImageRequiringPreDecode(_) => {
                intermediate = self.heic.decode_heic(
                    &request.payload,
                    ImageFormat::Jpeg,
                    ENCODE_QUALITY,
                )?;
                &intermediate
            }
            _ => &request.payload,
        };
        check_cancelled(cancel)?;

        let bitmap = raster::decode(raster_payload)?;
        check_cancelled(cancel)?;

        let encoded = raster::encode(&bitmap, request.target, ENCODE_QUALITY, self.avif_speed)?;
        check_cancelled(cancel)?;

        Ok(ArchiveEntry::file(
            replace_extension(&request.name, request.target.extension()),
            encoded,
        ))
    }
}

impl EntryConverter for ImageConverter {
    fn convert(&self, request: ConversionRequest, cancel: &CancellationToken) -> ConversionOutcome {
        let source = match request.classification.format() {
            None => return ConversionOutcome::SkippedNotImage,
            Some(format) => format,
        };

        if source == request.target.as_image_format() {
            debug!(entry = %request.name, "already in target format");
            return ConversionOutcome::SkippedAlreadyTarget;
        }

        if cancel.is_cancelled() {
            return ConversionOutcome::Failed(EntryError::Cancelled);
        }

        match self.convert_image(&request, cancel) {
            Ok(entry) => ConversionOutcome::Converted(entry),
            Err(e) => ConversionOutcome::Failed(e),
        }
    }
}

impl Default for ImageConverter {
    fn default() -> Self {
        Self::new()
    }
}

fn check_cancelled(cancel: &CancellationToken) -> Result<(), EntryError> {
    if cancel.is_cancelled() {
        Err(EntryError::Cancelled)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::conversion::classifier::classify;
    use image::{DynamicImage, Rgb, RgbImage};

    fn png_bytes() -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(10, 6, |x, _| Rgb([x as u8 * 20, 0, 0])));
        raster::encode(&img, ConversionTarget::Png, 0.9, 8).unwrap()
    }

    fn request(name: &str, payload: Vec<u8>, target: ConversionTarget) -> ConversionRequest {
        ConversionRequest {
            name: name.to_string(),
            payload,
            classification: classify(name),
            target,
        }
    }

    /// Pretends to decode HEIC by handing back a fixed JPEG
    struct FakeHeic(Vec<u8>);

    impl HeicDecoder for FakeHeic {
        fn decode_heic(&self, _: &[u8], intermediate: ImageFormat, _: f32) -> Result<Vec<u8>, EntryError> {
            assert_eq!(intermediate, ImageFormat::Jpeg);
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_png_to_webp_renames_entry() {
        let converter = ImageConverter::new();
        let outcome = converter.convert(
            request("dir/a.png", png_bytes(), ConversionTarget::WebP),
            &CancellationToken::new(),
        );

        match outcome {
            ConversionOutcome::Converted(entry) => {
                assert_eq!(entry.name, "dir/a.webp");
                assert_eq!(&entry.payload[8..12], b"WEBP");
            }
            other => panic!("Expected Converted, got {:?}", other),
        }
    }

    #[test]
    fn test_already_target_skips_without_decoding() {
        let converter = ImageConverter::new();
        // Payload is garbage, so any decode attempt would fail
        let outcome = converter.convert(
            request("x.webp", b"garbage".to_vec(), ConversionTarget::WebP),
            &CancellationToken::new(),
        );
        assert_eq!(outcome, ConversionOutcome::SkippedAlreadyTarget);

        let outcome = converter.convert(
            request("x.JPG", b"garbage".to_vec(), ConversionTarget::Jpeg),
            &CancellationToken::new(),
        );
        assert_eq!(outcome, ConversionOutcome::SkippedAlreadyTarget);
    }

    #[test]
    fn test_not_image_is_skipped() {
        let outcome = ImageConverter::new().convert(
            request("notes.txt", b"hi".to_vec(), ConversionTarget::Png),
            &CancellationToken::new(),
        );
        assert_eq!(outcome, ConversionOutcome::SkippedNotImage);
    }

    #[test]
    fn test_zero_byte_payload_fails_decode() {
        let outcome = ImageConverter::new().convert(
            request("broken.png", Vec::new(), ConversionTarget::Jpeg),
            &CancellationToken::new(),
        );
        assert!(matches!(outcome, ConversionOutcome::Failed(EntryError::Decode(_))));
    }

    #[test]
    fn test_heic_without_decoder_fails() {
        let outcome = ImageConverter::new().convert(
            request("IMG_1.heic", b"....ftypheic".to_vec(), ConversionTarget::Png),
            &CancellationToken::new(),
        );
        assert!(matches!(outcome, ConversionOutcome::Failed(EntryError::Decode(_))));
    }

    #[test]
    fn test_heic_goes_through_pre_decoder() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([10, 20, 30])));
        let jpeg = raster::encode(&img, ConversionTarget::Jpeg, 0.9, 8).unwrap();
        let converter = ImageConverter::new().with_heic_decoder(Arc::new(FakeHeic(jpeg)));

        let outcome = converter.convert(
            request("IMG_1.HEIC", b"heic bytes".to_vec(), ConversionTarget::Png),
            &CancellationToken::new(),
        );
        match outcome {
            ConversionOutcome::Converted(entry) => {
                assert_eq!(entry.name, "IMG_1.png");
                assert!(entry.payload.starts_with(b"\x89PNG"));
            }
            other => panic!("Expected Converted, got {:?}", other),
        }
    }

    #[test]
    fn test_cancelled_token_stops_conversion() {
        let token = CancellationToken::new();
        token.cancel();
        let outcome = ImageConverter::new().convert(
            request("a.png", png_bytes(), ConversionTarget::Jpeg),
            &token,
        );
        assert_eq!(outcome, ConversionOutcome::Failed(EntryError::Cancelled));
    }
}
