// THEORY:
// The `GridManager` is the bridge between a decoded image and the coarse grid a
// perceptual hash is computed from. It owns the grid geometry and performs the
// slicing of raw pixels into `Chunk`s, then collapses each chunk to its average
// pixel.
//
// Key architectural principles:
// 1.  **Data Transformation**: It turns an arbitrary-sized RGBA image into exactly
//     `grid_width * grid_height` cells, in row-major order.
// 2.  **Full Coverage**: Cell boundaries are computed proportionally, so every source
//     pixel lands in exactly one cell even when the image size is not a multiple of
//     the grid size. Images smaller than the grid still produce one pixel per cell.
// 3.  **Stateless**: Unlike a frame-by-frame analyzer, nothing is remembered between
//     calls. The same image always yields the same cell averages.

use crate::core_modules::chunk::chunk::Chunk;
use crate::core_modules::pixel::pixel::Pixel;
use image::RgbaImage;

/// Slices images into a fixed grid of averaged cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridManager {
    /// Number of cells across.
    grid_width: u32,
    /// Number of cells down.
    grid_height: u32,
}

impl GridManager {
    /// Creates a new GridManager for a given grid size in cells.
    pub fn new(grid_width: u32, grid_height: u32) -> Self {
        Self {
            grid_width: grid_width.max(1),
            grid_height: grid_height.max(1),
        }
    }

    pub fn cell_count(&self) -> usize {
        (self.grid_width * self.grid_height) as usize
    }

    /// Reduces an image to one average `Pixel` per grid cell, row-major.
    /// An image with no pixels yields an empty vector.
    pub fn process_image(&self, image: &RgbaImage) -> Vec<Pixel> {
        let (image_width, image_height) = image.dimensions();
        if image_width == 0 || image_height == 0 {
            return Vec::new();
        }

        let mut cells = Vec::with_capacity(self.cell_count());
        for cell_y in 0..self.grid_height {
            let (y0, y1) = Self::span(cell_y, self.grid_height, image_height);
            for cell_x in 0..self.grid_width {
                let (x0, x1) = Self::span(cell_x, self.grid_width, image_width);

                let mut pixels = Vec::with_capacity(((x1 - x0) * (y1 - y0)) as usize);
                for y in y0..y1 {
                    for x in x0..x1 {
                        pixels.push(Pixel::from(*image.get_pixel(x, y)));
                    }
                }

                let chunk = Chunk::new(x1 - x0, y1 - y0, pixels);
                cells.push(chunk.average_pixel());
            }
        }
        cells
    }

    /// Pixel range `[start, end)` covered by `cell` out of `cells` along an axis of
    /// `extent` pixels. Never empty while `extent > 0`.
    fn span(cell: u32, cells: u32, extent: u32) -> (u32, u32) {
        let start = (cell as u64 * extent as u64 / cells as u64) as u32;
        let end = ((cell as u64 + 1) * extent as u64 / cells as u64) as u32;
        let start = start.min(extent - 1);
        (start, end.max(start + 1).min(extent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn spans_cover_axis_without_gaps() {
        for extent in [1u32, 5, 8, 13, 64, 641] {
            let mut covered = 0;
            let mut previous_end = 0;
            for cell in 0..8 {
                let (start, end) = GridManager::span(cell, 8, extent);
                assert!(start < end, "empty span for extent {extent}");
                if extent >= 8 {
                    assert_eq!(start, previous_end);
                    covered += end - start;
                }
                previous_end = end;
            }
            if extent >= 8 {
                assert_eq!(covered, extent);
            }
        }
    }

    #[test]
    fn quadrants_average_independently() {
        let image = RgbaImage::from_fn(16, 16, |x, y| {
            if (x < 8) == (y < 8) {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            }
        });
        let cells = GridManager::new(2, 2).process_image(&image);
        assert_eq!(cells.len(), 4);
        assert_eq!(cells[0].red, 255);
        assert_eq!(cells[1].red, 0);
        assert_eq!(cells[2].red, 0);
        assert_eq!(cells[3].red, 255);
    }

    #[test]
    fn tiny_image_still_fills_grid() {
        let image = RgbaImage::from_pixel(3, 2, Rgba([9, 9, 9, 255]));
        let cells = GridManager::new(8, 8).process_image(&image);
        assert_eq!(cells.len(), 64);
        assert!(cells.iter().all(|p| p.red == 9));
    }

    #[test]
    fn empty_image_yields_no_cells() {
        let image = RgbaImage::new(0, 0);
        assert!(GridManager::new(8, 8).process_image(&image).is_empty());
    }
}
