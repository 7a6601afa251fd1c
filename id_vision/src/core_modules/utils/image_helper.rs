pub mod image_helper {
    use crate::error::{VisionError, VisionResult};
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use image::{DynamicImage, ExtendedColorType, GrayImage, ImageEncoder};

    /// Strips an optional `data:<mime>;base64,` prefix, as produced by browsers.
    pub fn strip_data_url(payload: &str) -> &str {
        let payload = payload.trim();
        match payload.strip_prefix("data:") {
            Some(rest) => rest.split_once(',').map(|(_, data)| data).unwrap_or(rest),
            None => payload,
        }
    }

    /// Decodes a base64 JPEG/PNG payload into an in-memory bitmap.
    pub fn decode_base64(payload: &str) -> VisionResult<DynamicImage> {
        let bytes = STANDARD.decode(strip_data_url(payload))?;
        decode_bytes(&bytes)
    }

    pub fn decode_bytes(bytes: &[u8]) -> VisionResult<DynamicImage> {
        let image = image::load_from_memory(bytes)?;
        if image.width() == 0 || image.height() == 0 {
            return Err(VisionError::EmptyImage);
        }
        Ok(image)
    }

    /// Re-encodes a grayscale bitmap as PNG bytes.
    pub fn encode_png(image: &GrayImage) -> VisionResult<Vec<u8>> {
        let mut buffer = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buffer);
        encoder.write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::L8,
        )?;
        Ok(buffer)
    }

    pub fn encode_base64(bytes: &[u8]) -> String {
        STANDARD.encode(bytes)
    }
}
