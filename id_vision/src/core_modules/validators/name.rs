// Name extraction reads the holder's name off an ID card so that later documents
// (trade certificates) can be checked against it. Two passes, in order:
//   1. a `Name: ...` label line,
//   2. the first all-caps line of two or more words that is not a printed header.

use crate::core_modules::validators::{DocumentKind, DocumentValidator};
use once_cell::sync::Lazy;
use regex::Regex;

static NAME_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bname\s*:\s*([a-z][a-z ]{2,})").unwrap());
static CAPS_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z][A-Z ]*$").unwrap());

/// Headers printed on government ID cards that look like names but are not.
pub const HEADER_BLACKLIST: [&str; 8] = [
    "GOVERNMENT OF INDIA",
    "GOVT OF INDIA",
    "UNIQUE IDENTIFICATION AUTHORITY",
    "AADHAAR",
    "AADHAR",
    "INCOME TAX DEPARTMENT",
    "PERMANENT ACCOUNT NUMBER",
    "ELECTION COMMISSION",
];

/// Best-effort holder name from OCR text, or an empty string.
pub fn extract_name(text: &str) -> String {
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|line| !line.is_empty()).collect();

    let labelled = lines.iter().find_map(|line| {
        NAME_LABEL
            .captures(line)
            .and_then(|captures| captures.get(1))
            .map(|name| name.as_str().trim().to_string())
    });
    if let Some(name) = labelled {
        return name;
    }

    lines
        .iter()
        .find(|line| {
            CAPS_LINE.is_match(line)
                && line.split_whitespace().count() >= 2
                && !HEADER_BLACKLIST.iter().any(|header| line.contains(header))
        })
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
}

/// Case-insensitive substring test of `reference` inside `text`. Blank inputs never
/// match.
pub fn name_matches(reference: &str, text: &str) -> bool {
    let reference = reference.trim();
    if reference.is_empty() || text.trim().is_empty() {
        return false;
    }
    text.to_lowercase().contains(&reference.to_lowercase())
}

/// Certificate rule: the certificate must spell out the name read off the ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameMatch {
    reference: String,
}

impl NameMatch {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
        }
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }
}

impl DocumentValidator for NameMatch {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Certificate
    }

    fn validate(&self, text: &str) -> bool {
        name_matches(&self.reference, text)
    }
}
