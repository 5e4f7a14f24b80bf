use image::{ImageFormat, RgbImage};

use crate::application::ports::ImageDecoderPort;
use crate::domain::errors::{DomainError, DomainResult};

/// Decodes PNG/JPEG uploads into RGB. Any other container is rejected.
pub struct RasterDecoder;

impl RasterDecoder {
    pub const ACCEPTED: [ImageFormat; 2] = [ImageFormat::Png, ImageFormat::Jpeg];
}

impl ImageDecoderPort for RasterDecoder {
    fn decode(&self, bytes: &[u8]) -> DomainResult<RgbImage> {
        if bytes.is_empty() {
            return Err(DomainError::InvalidImage("empty upload".into()));
        }
        let format = image::guess_format(bytes)
            .map_err(|e| DomainError::InvalidImage(e.to_string()))?;
        if !Self::ACCEPTED.contains(&format) {
            return Err(DomainError::InvalidImage(format!(
                "unsupported format {format:?}, expected PNG or JPEG"
            )));
        }
        let img = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| DomainError::InvalidImage(e.to_string()))?;
        Ok(img.to_rgb8())
    }
}
