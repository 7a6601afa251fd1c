// THEORY:
// ID cards photographed on a phone are usually small in frame and low in contrast.
// The `preprocess` module applies one fixed, parameter-free cleanup before text
// recognition: upscale toward a target size, collapse to grayscale, then stretch
// contrast around mid-gray. It is deterministic and does no per-document tuning.
//
// Order matters: the resize runs on the color image, grayscale uses the shared
// `pixel::luma` routine, and the contrast stretch runs last on the gray levels.

use crate::core_modules::pixel::pixel::luma;
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, Luma};

pub const DEFAULT_TARGET_LONG_EDGE: u32 = 1600;
pub const DEFAULT_MAX_UPSCALE: f32 = 2.0;
pub const DEFAULT_CONTRAST_FACTOR: f32 = 1.2;
/// Gray level the contrast stretch pivots around.
const CONTRAST_PIVOT: f32 = 128.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreprocessConfig {
    /// Long edge the upscale aims for, in pixels.
    pub target_long_edge: u32,
    /// Upper bound on the upscale factor.
    pub max_upscale: f32,
    pub contrast_factor: f32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            target_long_edge: DEFAULT_TARGET_LONG_EDGE,
            max_upscale: DEFAULT_MAX_UPSCALE,
            contrast_factor: DEFAULT_CONTRAST_FACTOR,
        }
    }
}

impl PreprocessConfig {
    /// Factor in `[1, max_upscale]` bringing the long edge toward the target. Never
    /// below 1: large images are left alone.
    pub fn upscale_factor(&self, width: u32, height: u32) -> f32 {
        let long_edge = width.max(height);
        if long_edge == 0 {
            return 1.0;
        }
        let wanted = self.target_long_edge as f32 / long_edge as f32;
        wanted.min(self.max_upscale).max(1.0)
    }

    /// `clamp(gray * factor + 128 * (1 - factor), 0, 255)`.
    pub fn stretch(&self, gray: u8) -> u8 {
        let intercept = CONTRAST_PIVOT * (1.0 - self.contrast_factor);
        (gray as f32 * self.contrast_factor + intercept).round().clamp(0.0, 255.0) as u8
    }
}

/// Runs the full cleanup and returns the grayscale bitmap handed to the OCR engine.
pub fn prepare_for_ocr(image: &DynamicImage, config: &PreprocessConfig) -> GrayImage {
    let (width, height) = (image.width(), image.height());
    let factor = config.upscale_factor(width, height);

    let rgba = if factor > 1.0 {
        let scaled_width = (width as f32 * factor).round() as u32;
        let scaled_height = (height as f32 * factor).round() as u32;
        image::imageops::resize(image, scaled_width, scaled_height, FilterType::CatmullRom)
    } else {
        image.to_rgba8()
    };

    // Contrast values only depend on the gray level, so stretch once per level.
    let lookup: Vec<u8> = (0..=255u8).map(|level| config.stretch(level)).collect();

    GrayImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [red, green, blue, _] = rgba.get_pixel(x, y).0;
        let gray = luma(red, green, blue).round().clamp(0.0, 255.0) as u8;
        Luma([lookup[gray as usize]])
    })
}
