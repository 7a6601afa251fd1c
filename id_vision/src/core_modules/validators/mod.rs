// THEORY:
// Document validators are pure predicates over OCR text. They never fail and never
// panic: empty or missing text is simply "not verified". Each validator is a
// `DocumentValidator` so the pipeline can swap a stricter rule in for a looser one
// without touching any call site.

pub mod aadhaar;
pub mod name;
pub mod pan;

use serde::Serialize;

pub use aadhaar::{AadhaarChecksum, AadhaarFormat, verhoeff_valid};
pub use name::{NameMatch, extract_name, name_matches};
pub use pan::PanCard;

/// The document a validator is responsible for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Aadhaar,
    Pan,
    Certificate,
}

/// A format rule applied to extracted document text.
pub trait DocumentValidator: Send + Sync {
    fn kind(&self) -> DocumentKind;

    /// True when `text` satisfies the rule. Empty text is never valid.
    fn validate(&self, text: &str) -> bool;
}
