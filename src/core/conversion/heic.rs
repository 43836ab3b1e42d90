use crate::models::{EntryError, ImageFormat};

/// Decodes HEIC payloads into an intermediate raster the generic pipeline can read
pub trait HeicDecoder: Send + Sync {
    /// # Arguments
    /// * `payload` - Raw HEIC bytes
    /// * `intermediate` - Format of the returned bytes (normally JPEG)
    /// * `quality` - Encoder quality for the intermediate (0.0 - 1.0)
    fn decode_heic(
        &self,
        payload: &[u8],
        intermediate: ImageFormat,
        quality: f32,
    ) -> Result<Vec<u8>, EntryError>;
}

/// Used when no HEIC backend is wired in; every HEIC entry fails to decode
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableHeicDecoder;

impl HeicDecoder for UnavailableHeicDecoder {
    fn decode_heic(
        &self,
        _payload: &[u8],
        _intermediate: ImageFormat,
        _quality: f32,
    ) -> Result<Vec<u8>, EntryError> {
        Err(EntryError::Decode("no HEIC decoder available".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_decoder_fails() {
        let result = UnavailableHeicDecoder.decode_heic(b"ftypheic", ImageFormat::Jpeg, 0.9);
        assert!(matches!(result, Err(EntryError::Decode(_))));
    }
}
