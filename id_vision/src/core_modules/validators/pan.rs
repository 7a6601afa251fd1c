use crate::core_modules::validators::{DocumentKind, DocumentValidator};
use once_cell::sync::Lazy;
use regex::Regex;

static PAN_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Z]{5}[0-9]{4}[A-Z]\b").unwrap());

/// Headings printed on every PAN card. At least one must be present.
pub const PAN_KEYWORDS: [&str; 2] = ["INCOME TAX DEPARTMENT", "PERMANENT ACCOUNT NUMBER"];

/// PAN rule: a `AAAAA9999A` number AND one of the departmental headings. Either on
/// its own is not enough.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanCard;

impl DocumentValidator for PanCard {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Pan
    }

    fn validate(&self, text: &str) -> bool {
        let upper = text.to_uppercase();
        let has_keyword = PAN_KEYWORDS.iter().any(|keyword| upper.contains(keyword));
        has_keyword && PAN_NUMBER.is_match(&upper)
    }
}
