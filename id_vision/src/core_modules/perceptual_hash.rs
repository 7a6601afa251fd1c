// THEORY:
// The `perceptual_hash` module produces a coarse visual fingerprint of an image (an
// "average hash") and measures how far apart two fingerprints are.
//
// The reduction is fixed: an 8x8 grid of averaged cells (`GridManager`), Rec. 601
// luminance per cell (`pixel::luma`), then one bit per cell set when the cell is at
// least as bright as the grid mean. Because there is exactly one reduction, two
// hashes from `PerceptualHash::compute` are always comparable. Hashes built by hand
// with `from_bits` may carry fewer bits; comparing hashes of different lengths
// yields `HashDistance::Infinite` rather than a misleading number.
//
// Bits are stored most-significant-first in cell order, so the hex form reads the
// grid row by row.

use crate::core_modules::grid_manager::GridManager;
use crate::core_modules::utils::image_helper::image_helper;
use crate::error::{VisionError, VisionResult};
use image::DynamicImage;
use serde::{Serialize, Serializer};
use std::fmt;

/// Cells across and down the hash grid.
pub const HASH_GRID_SIZE: u32 = 8;
/// Bits in a computed hash.
pub const HASH_BITS: u32 = HASH_GRID_SIZE * HASH_GRID_SIZE;
/// Absorbs float rounding in the mean so uniform cells compare as equal to it.
const MEAN_TOLERANCE: f64 = 1e-9;

/// A fixed-length bit fingerprint of an image. Immutable once computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PerceptualHash {
    bits: u64,
    bit_length: u32,
}

/// Hamming distance between two hashes, or `Infinite` when no comparison is possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashDistance {
    Bits(u32),
    Infinite,
}

impl PerceptualHash {
    /// Computes the 64-bit average hash of a decoded image.
    pub fn compute(image: &DynamicImage) -> VisionResult<Self> {
        let rgba = image.to_rgba8();
        let cells = GridManager::new(HASH_GRID_SIZE, HASH_GRID_SIZE).process_image(&rgba);
        if cells.is_empty() {
            return Err(VisionError::EmptyImage);
        }

        let luminances: Vec<f64> = cells.iter().map(|cell| cell.luminance()).collect();
        let mean = luminances.iter().sum::<f64>() / luminances.len() as f64;

        let bits = luminances
            .iter()
            .fold(0u64, |acc, &lum| (acc << 1) | u64::from(lum + MEAN_TOLERANCE >= mean));

        Ok(Self {
            bits,
            bit_length: HASH_BITS,
        })
    }

    /// Decodes a base64 JPEG/PNG and hashes it. Decode failures are returned as errors,
    /// never as a hash of garbage.
    pub fn from_base64(payload: &str) -> VisionResult<Self> {
        let image = image_helper::decode_base64(payload)?;
        Self::compute(&image)
    }

    /// Builds a hash from an explicit bit sequence (1 to 64 bits, first bit first).
    pub fn from_bits(bits: &[bool]) -> VisionResult<Self> {
        if bits.is_empty() || bits.len() > HASH_BITS as usize {
            return Err(VisionError::InvalidHashLength(bits.len()));
        }
        let packed = bits.iter().fold(0u64, |acc, &bit| (acc << 1) | u64::from(bit));
        Ok(Self {
            bits: packed,
            bit_length: bits.len() as u32,
        })
    }

    pub fn bit_length(&self) -> u32 {
        self.bit_length
    }

    /// The bits in cell order.
    pub fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.bit_length).rev().map(move |shift| (self.bits >> shift) & 1 == 1)
    }

    /// Hamming distance to another hash of the same length.
    pub fn distance(&self, other: &Self) -> HashDistance {
        if self.bit_length != other.bit_length {
            return HashDistance::Infinite;
        }
        HashDistance::Bits((self.bits ^ other.bits).count_ones())
    }

    pub fn to_hex(&self) -> String {
        let digits = self.bit_length.div_ceil(4) as usize;
        format!("{:0width$x}", self.bits, width = digits)
    }
}

/// Distance between two possibly-missing hashes. A missing side is `Infinite`.
pub fn distance(first: Option<&PerceptualHash>, second: Option<&PerceptualHash>) -> HashDistance {
    match (first, second) {
        (Some(first), Some(second)) => first.distance(second),
        _ => HashDistance::Infinite,
    }
}

impl HashDistance {
    /// True when the distance is finite and no greater than `threshold`.
    pub fn is_within(&self, threshold: u32) -> bool {
        matches!(self, HashDistance::Bits(bits) if *bits <= threshold)
    }

    pub fn bits(&self) -> Option<u32> {
        match self {
            HashDistance::Bits(bits) => Some(*bits),
            HashDistance::Infinite => None,
        }
    }
}

impl fmt::Display for PerceptualHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Display for HashDistance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashDistance::Bits(bits) => write!(f, "{bits}"),
            HashDistance::Infinite => f.write_str("infinite"),
        }
    }
}

impl Serialize for PerceptualHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl Serialize for HashDistance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            HashDistance::Bits(bits) => serializer.serialize_u32(*bits),
            HashDistance::Infinite => serializer.serialize_str("infinite"),
        }
    }
}
