// THEORY (1D Pixel Heuristics):
// The `Pixel` module is the most fundamental unit of the verification engine. It is a
// "dumb" data container for a single pixel plus the one single-pixel heuristic the
// rest of the crate depends on: luminance.
//
// Luminance is computed exactly once, here, with the Rec. 601 luma weights. Both the
// perceptual hash grid and the OCR preprocessor call `luma`, so the two stages can
// never drift apart if the weights are ever tuned.
//
// Key principles:
// 1) Single-pixel scope (1D): nothing here reads neighbors or other images.
// 2) Comparisons between pixels or images live in higher-level modules
//    (`perceptual_hash`, `face_match`).

pub mod pixel {
    pub type Byte = u8;
    pub type Channel = Byte;
    pub type Luminance = f64;

    /// Rec. 601 red weight.
    pub const LUMA_RED: Luminance = 0.299;
    /// Rec. 601 green weight.
    pub const LUMA_GREEN: Luminance = 0.587;
    /// Rec. 601 blue weight.
    pub const LUMA_BLUE: Luminance = 0.114;

    /// Perceived brightness of an RGB triple on the 0..255 scale (Rec. 601 luma).
    #[inline]
    pub fn luma(red: Channel, green: Channel, blue: Channel) -> Luminance {
        LUMA_RED * red as Luminance + LUMA_GREEN * green as Luminance + LUMA_BLUE * blue as Luminance
    }

    /// A "dumb" data container representing a single RGBA pixel.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
        /// The alpha (transparency) channel value (0-255).
        pub alpha: Channel,
    }

    impl Pixel {
        pub fn new(red: Channel, green: Channel, blue: Channel, alpha: Channel) -> Self {
            Pixel {
                red,
                green,
                blue,
                alpha,
            }
        }

        /// Luminance estimate (Rec. 601 luma). Alpha is ignored.
        pub fn luminance(&self) -> Luminance {
            luma(self.red, self.green, self.blue)
        }
    }

    impl From<image::Rgba<u8>> for Pixel {
        fn from(rgba: image::Rgba<u8>) -> Self {
            let [red, green, blue, alpha] = rgba.0;
            Pixel::new(red, green, blue, alpha)
        }
    }

    impl From<Pixel> for image::Rgba<u8> {
        fn from(pixel: Pixel) -> Self {
            image::Rgba([pixel.red, pixel.green, pixel.blue, pixel.alpha])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::pixel::*;

    #[test]
    fn luma_of_primaries_matches_weights() {
        assert!((luma(255, 0, 0) - 76.245).abs() < 1e-9);
        assert!((luma(0, 255, 0) - 149.685).abs() < 1e-9);
        assert!((luma(0, 0, 255) - 29.07).abs() < 1e-9);
    }

    #[test]
    fn gray_pixels_keep_their_level() {
        for level in [0u8, 17, 128, 200, 255] {
            let pixel = Pixel::new(level, level, level, 255);
            assert!((pixel.luminance() - level as f64).abs() < 1e-9);
        }
    }

    #[test]
    fn alpha_does_not_affect_luminance() {
        let opaque = Pixel::new(10, 20, 30, 255);
        let clear = Pixel::new(10, 20, 30, 0);
        assert_eq!(opaque.luminance(), clear.luminance());
    }
}
