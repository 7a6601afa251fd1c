// THEORY:
// The `pipeline` module is the top-level API for the verification engine. It
// encapsulates the three independent stages (perceptual hashing, text extraction,
// document validators) behind one struct and turns their raw outputs into the
// verdicts an onboarding wizard gates on.
//
// Within one verification the stages run strictly in sequence, since each consumes
// the previous stage's output. Separate verifications share nothing mutable: the
// only long-lived resource is the lazily loaded OCR engine inside the extractor.

use crate::config::PipelineConfig;
use crate::core_modules::face_match::{FaceMatch, FaceMatchPolicy};
use crate::core_modules::ocr_engine::{SharedOcrEngine, TesseractLoader};
use crate::core_modules::perceptual_hash::PerceptualHash;
use crate::core_modules::text_extractor::{Extraction, TextExtractor};
use crate::core_modules::validators::{
    AadhaarFormat, DocumentKind, DocumentValidator, NameMatch, PanCard, extract_name,
};
use crate::error::VisionResult;
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

// Re-export key data structures for the public API.
pub use crate::core_modules::perceptual_hash::HashDistance;

/// Why a document could not be judged either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnverifiedReason {
    /// No text could be recovered (bad image, engine unavailable, blank page).
    NoText,
    /// The OCR engine did not answer in time.
    TimedOut,
}

/// Outcome of checking one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", content = "reason", rename_all = "snake_case")]
pub enum Verdict {
    Verified,
    /// Text was read and failed the document's format rule.
    Rejected,
    Unverified(UnverifiedReason),
}

impl Verdict {
    pub fn is_verified(&self) -> bool {
        matches!(self, Verdict::Verified)
    }

    fn judge(extraction: &Extraction, validator: &dyn DocumentValidator) -> Self {
        match extraction {
            Extraction::Recognized(text) if validator.validate(text) => Verdict::Verified,
            Extraction::Recognized(_) => Verdict::Rejected,
            Extraction::NoText => Verdict::Unverified(UnverifiedReason::NoText),
            Extraction::TimedOut => Verdict::Unverified(UnverifiedReason::TimedOut),
        }
    }
}

/// The result of verifying one uploaded document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentReport {
    pub kind: DocumentKind,
    pub verdict: Verdict,
    /// Holder name read off the document; empty when none was found.
    pub extracted_name: String,
    #[serde(skip)]
    pub extraction: Extraction,
}

/// The main, top-level struct for the verification engine.
pub struct VerificationPipeline {
    extractor: TextExtractor,
    aadhaar: Arc<dyn DocumentValidator>,
    pan: Arc<dyn DocumentValidator>,
    face_policy: FaceMatchPolicy,
}

impl VerificationPipeline {
    pub fn new(config: &PipelineConfig, engine: SharedOcrEngine) -> Self {
        Self {
            extractor: TextExtractor::new(engine, config.extractor_config()),
            aadhaar: Arc::new(AadhaarFormat),
            pan: Arc::new(PanCard),
            face_policy: FaceMatchPolicy::new(config.face_match_threshold),
        }
    }

    /// A pipeline backed by the Tesseract CLI named in `config`. The binary is not
    /// probed until the first document is read.
    pub fn with_tesseract(config: &PipelineConfig) -> Self {
        let loader = TesseractLoader::new(config.tesseract_command.clone());
        Self::new(config, SharedOcrEngine::new(Arc::new(loader)))
    }

    /// Swaps the Aadhaar rule, e.g. for `AadhaarChecksum`.
    pub fn with_aadhaar_validator(mut self, validator: impl DocumentValidator + 'static) -> Self {
        self.aadhaar = Arc::new(validator);
        self
    }

    pub fn with_pan_validator(mut self, validator: impl DocumentValidator + 'static) -> Self {
        self.pan = Arc::new(validator);
        self
    }

    pub fn face_policy(&self) -> FaceMatchPolicy {
        self.face_policy
    }

    pub fn extractor(&self) -> &TextExtractor {
        &self.extractor
    }

    /// Reads an Aadhaar card: format verdict plus the holder's name.
    pub async fn verify_aadhaar(&self, image_base64: &str) -> DocumentReport {
        self.verify_with(image_base64, self.aadhaar.as_ref()).await
    }

    pub async fn verify_pan(&self, image_base64: &str) -> DocumentReport {
        self.verify_with(image_base64, self.pan.as_ref()).await
    }

    /// Checks that a certificate names `reference_name`.
    pub async fn verify_certificate(&self, image_base64: &str, reference_name: &str) -> DocumentReport {
        self.verify_with(image_base64, &NameMatch::new(reference_name)).await
    }

    /// Checks several certificates concurrently. Reports come back in input order.
    pub async fn verify_certificates<S: AsRef<str>>(
        &self,
        images_base64: &[S],
        reference_name: &str,
    ) -> Vec<DocumentReport> {
        join_all(
            images_base64
                .iter()
                .map(|image| self.verify_certificate(image.as_ref(), reference_name)),
        )
        .await
    }

    /// Compares the face on an ID image with a live capture.
    pub fn match_faces(&self, id_image: Option<&str>, live_capture: Option<&str>) -> FaceMatch {
        self.face_policy.compare_images(id_image, live_capture)
    }

    /// Hashes one image; decode failures are surfaced so callers can report them.
    pub fn hash_image(&self, image_base64: &str) -> VisionResult<PerceptualHash> {
        PerceptualHash::from_base64(image_base64)
    }

    async fn verify_with(&self, image_base64: &str, validator: &dyn DocumentValidator) -> DocumentReport {
        let extraction = self.extractor.extract(image_base64).await;
        let verdict = Verdict::judge(&extraction, validator);
        let extracted_name = extract_name(extraction.text());
        info!(kind = ?validator.kind(), ?verdict, name_found = !extracted_name.is_empty(), "document checked");
        DocumentReport {
            kind: validator.kind(),
            verdict,
            extracted_name,
            extraction,
        }
    }
}
