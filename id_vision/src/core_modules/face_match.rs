// THEORY:
// The `face_match` module is the comparative layer on top of `perceptual_hash`. A
// hash on its own means nothing; its value is in the distance to another hash. This
// module turns that distance into the decision the onboarding wizard consumes:
// does the live face capture look like the photo on the uploaded ID?
//
// Key architectural principles:
// 1.  **Three outcomes, not two**: a missing image on either side is a plain
//     mismatch (infinite distance), but an image that cannot be decoded is
//     `Unknown`. Callers must not tell a user "your face does not match" when the
//     real problem is a corrupt upload.
// 2.  **Lenient by construction**: an 8x8 average hash is coarse. The threshold is a
//     tunable policy value, not a constant baked into the comparison.

use crate::core_modules::perceptual_hash::{HashDistance, PerceptualHash};
use serde::Serialize;
use tracing::{debug, warn};

/// Largest Hamming distance (out of 64) still treated as the same face.
pub const DEFAULT_FACE_MATCH_THRESHOLD: u32 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FaceMatch {
    Matched { distance: u32 },
    Mismatched { distance: HashDistance },
    /// One of the images could not be decoded.
    Unknown,
}

impl FaceMatch {
    pub fn is_match(&self) -> bool {
        matches!(self, FaceMatch::Matched { .. })
    }
}

/// Decision policy applied to hash distances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceMatchPolicy {
    pub max_distance: u32,
}

impl Default for FaceMatchPolicy {
    fn default() -> Self {
        Self {
            max_distance: DEFAULT_FACE_MATCH_THRESHOLD,
        }
    }
}

impl FaceMatchPolicy {
    pub fn new(max_distance: u32) -> Self {
        Self { max_distance }
    }

    pub fn decide(&self, distance: HashDistance) -> FaceMatch {
        match distance {
            HashDistance::Bits(bits) if bits <= self.max_distance => FaceMatch::Matched { distance: bits },
            other => FaceMatch::Mismatched { distance: other },
        }
    }

    /// Compares two already computed hashes.
    pub fn compare_hashes(&self, reference: &PerceptualHash, candidate: &PerceptualHash) -> FaceMatch {
        self.decide(reference.distance(candidate))
    }

    /// Compares two base64 images, either of which may be absent.
    pub fn compare_images(&self, reference: Option<&str>, candidate: Option<&str>) -> FaceMatch {
        let (Some(reference), Some(candidate)) = (reference, candidate) else {
            debug!("face comparison skipped: an image is missing");
            return FaceMatch::Mismatched {
                distance: HashDistance::Infinite,
            };
        };

        let reference = match PerceptualHash::from_base64(reference) {
            Ok(hash) => hash,
            Err(e) => {
                warn!("reference image unusable for face match: {e}");
                return FaceMatch::Unknown;
            }
        };
        let candidate = match PerceptualHash::from_base64(candidate) {
            Ok(hash) => hash,
            Err(e) => {
                warn!("live capture unusable for face match: {e}");
                return FaceMatch::Unknown;
            }
        };

        let verdict = self.compare_hashes(&reference, &candidate);
        debug!(reference = %reference, candidate = %candidate, ?verdict, "face hashes compared");
        verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash_with_flips(flips: usize) -> PerceptualHash {
        let bits: Vec<bool> = (0..64).map(|i| i < flips).collect();
        PerceptualHash::from_bits(&bits).expect("hash")
    }

    #[test]
    fn threshold_boundary() {
        let policy = FaceMatchPolicy::default();
        let base = hash_with_flips(0);
        assert_eq!(
            policy.compare_hashes(&base, &hash_with_flips(18)),
            FaceMatch::Matched { distance: 18 }
        );
        assert_eq!(
            policy.compare_hashes(&base, &hash_with_flips(19)),
            FaceMatch::Mismatched {
                distance: HashDistance::Bits(19)
            }
        );
    }

    #[test]
    fn custom_threshold_is_respected() {
        let strict = FaceMatchPolicy::new(4);
        assert!(!strict.compare_hashes(&hash_with_flips(0), &hash_with_flips(10)).is_match());
    }

    #[test]
    fn missing_image_is_a_mismatch() {
        let verdict = FaceMatchPolicy::default().compare_images(None, Some("abc"));
        assert_eq!(
            verdict,
            FaceMatch::Mismatched {
                distance: HashDistance::Infinite
            }
        );
    }

    #[test]
    fn undecodable_image_is_unknown() {
        let verdict = FaceMatchPolicy::default().compare_images(Some("@@@"), Some("@@@"));
        assert_eq!(verdict, FaceMatch::Unknown);
    }
}
