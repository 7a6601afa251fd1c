// THEORY:
// The `Chunk` module represents a spatial grouping of pixels: one cell of the
// coarse grid a perceptual hash is built from.
//
// Key architectural principles:
// 1.  **Spatial Pooling**: An 8x8 hash grid turns a multi-megapixel photo into 64
//     cells. Averaging the pixels of each cell is the "downsample" step of the hash.
// 2.  **Noise Reduction**: `average_pixel` cancels out sensor noise and JPEG artifacts
//     so that only coarse structure (face outline, hair, background) survives.
// 3.  **Data Container**: `Chunk` holds a `Vec<Pixel>` and knows how to summarize it.
//     It does not know where it sits in the grid or how it compares to other chunks.

pub mod chunk {
    use crate::core_modules::pixel::pixel::Pixel;

    /// A "dumb" data container representing a rectangular block of pixels.
    pub struct Chunk {
        /// The width of the chunk in pixels.
        pub width: u32,
        /// The height of the chunk in pixels.
        pub height: u32,
        /// A flattened vector containing all the `Pixel` data within this chunk.
        pub pixels: Vec<Pixel>,
    }

    impl Chunk {
        pub fn new(width: u32, height: u32, pixels: Vec<Pixel>) -> Self {
            Self {
                width,
                height,
                pixels,
            }
        }

        /// Calculates the average pixel value for the entire chunk.
        /// Channels are averaged independently and truncated back to bytes.
        pub fn average_pixel(&self) -> Pixel {
            let num_pixels = self.pixels.len() as u64;
            if num_pixels == 0 {
                return Pixel::default();
            }

            let mut sum_r = 0u64;
            let mut sum_g = 0u64;
            let mut sum_b = 0u64;
            let mut sum_a = 0u64;

            for pixel in &self.pixels {
                sum_r += pixel.red as u64;
                sum_g += pixel.green as u64;
                sum_b += pixel.blue as u64;
                sum_a += pixel.alpha as u64;
            }

            Pixel {
                red: (sum_r / num_pixels) as u8,
                green: (sum_g / num_pixels) as u8,
                blue: (sum_b / num_pixels) as u8,
                alpha: (sum_a / num_pixels) as u8,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::chunk::Chunk;
    use crate::core_modules::pixel::pixel::Pixel;

    #[test]
    fn empty_chunk_averages_to_default() {
        let chunk = Chunk::new(0, 0, Vec::new());
        assert_eq!(chunk.average_pixel(), Pixel::default());
    }

    #[test]
    fn average_truncates_each_channel() {
        let chunk = Chunk::new(
            2,
            1,
            vec![Pixel::new(0, 10, 255, 255), Pixel::new(3, 11, 254, 255)],
        );
        assert_eq!(chunk.average_pixel(), Pixel::new(1, 10, 254, 255));
    }
}
