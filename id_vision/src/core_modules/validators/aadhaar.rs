use crate::core_modules::validators::{DocumentKind, DocumentValidator};
use once_cell::sync::Lazy;
use regex::Regex;

static GROUPED_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]{4} [0-9]{4} [0-9]{4}").unwrap());
static TWELVE_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]{12}").unwrap());
static STANDALONE_TWELVE_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[0-9]{12}\b").unwrap());
static NON_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9]").unwrap());
static NON_ALPHANUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9A-Za-z]").unwrap());

// Verhoeff dihedral group D5 multiplication and position permutation tables.
const VERHOEFF_D: [[u8; 10]; 10] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
    [1, 2, 3, 4, 0, 6, 7, 8, 9, 5],
    [2, 3, 4, 0, 1, 7, 8, 9, 5, 6],
    [3, 4, 0, 1, 2, 8, 9, 5, 6, 7],
    [4, 0, 1, 2, 3, 9, 5, 6, 7, 8],
    [5, 9, 8, 7, 6, 0, 4, 3, 2, 1],
    [6, 5, 9, 8, 7, 1, 0, 4, 3, 2],
    [7, 6, 5, 9, 8, 2, 1, 0, 4, 3],
    [8, 7, 6, 5, 9, 3, 2, 1, 0, 4],
    [9, 8, 7, 6, 5, 4, 3, 2, 1, 0],
];
const VERHOEFF_P: [[u8; 10]; 8] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
    [1, 5, 7, 6, 2, 8, 3, 0, 9, 4],
    [5, 8, 0, 3, 7, 9, 6, 1, 4, 2],
    [8, 9, 1, 6, 0, 4, 3, 5, 2, 7],
    [9, 4, 5, 3, 1, 2, 6, 8, 7, 0],
    [4, 2, 8, 6, 5, 7, 3, 9, 0, 1],
    [2, 7, 9, 3, 8, 0, 6, 4, 1, 5],
    [7, 0, 4, 6, 9, 1, 3, 2, 5, 8],
];

/// Verhoeff checksum over the digits of `number` (check digit last). Non-digits are
/// ignored; a string without digits is not valid.
pub fn verhoeff_valid(number: &str) -> bool {
    let digits: Vec<u8> = number.bytes().filter(u8::is_ascii_digit).map(|b| b - b'0').collect();
    if digits.is_empty() {
        return false;
    }
    let check = digits
        .iter()
        .rev()
        .enumerate()
        .fold(0u8, |c, (i, &digit)| VERHOEFF_D[c as usize][VERHOEFF_P[i % 8][digit as usize] as usize]);
    check == 0
}

/// Accepts text holding an Aadhaar-shaped number: `dddd dddd dddd`, or twelve
/// consecutive digits once everything but digits is stripped. No checksum.
#[derive(Debug, Clone, Copy, Default)]
pub struct AadhaarFormat;

impl DocumentValidator for AadhaarFormat {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Aadhaar
    }

    fn validate(&self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        if GROUPED_NUMBER.is_match(text) {
            return true;
        }
        let digits = NON_DIGIT.replace_all(text, "");
        TWELVE_DIGITS.is_match(&digits)
    }
}

/// Stricter rule: the card must name itself (`AADHAAR`/`AADHAR`) and carry a
/// twelve-digit number, standalone or printed `dddd dddd dddd`, that passes the
/// Verhoeff checksum.
#[derive(Debug, Clone, Copy, Default)]
pub struct AadhaarChecksum;

impl DocumentValidator for AadhaarChecksum {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Aadhaar
    }

    fn validate(&self, text: &str) -> bool {
        let cleaned = NON_ALPHANUMERIC.replace_all(text, " ").to_uppercase();
        let names_itself = cleaned.contains("AADHAAR") || cleaned.contains("AADHAR");
        if !names_itself {
            return false;
        }

        let digit_runs = NON_DIGIT.replace_all(text, " ");
        STANDALONE_TWELVE_DIGITS
            .find_iter(&digit_runs)
            .chain(GROUPED_NUMBER.find_iter(text))
            .any(|number| verhoeff_valid(number.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grouped_number_is_accepted() {
        assert!(AadhaarFormat.validate("Name: X Y Z\n1234 5678 9012"));
    }

    #[test]
    fn compact_number_is_accepted() {
        assert!(AadhaarFormat.validate("aadhaarno123456789012end"));
        assert!(AadhaarFormat.validate("1234-5678-9012"));
    }

    #[test]
    fn too_few_digits_are_rejected() {
        assert!(!AadhaarFormat.validate("no digits here"));
        assert!(!AadhaarFormat.validate("PIN 560001, phone 98450"));
        assert!(!AadhaarFormat.validate(""));
    }

    #[test]
    fn verhoeff_known_values() {
        assert!(verhoeff_valid("2363"));
        assert!(verhoeff_valid("234567890124"));
        assert!(!verhoeff_valid("234567890123"));
        assert!(!verhoeff_valid(""));
    }

    #[test]
    fn checksum_rule_needs_keyword_and_valid_number() {
        assert!(AadhaarChecksum.validate("Government of India\nAadhaar\n2345 6789 0124"));
        assert!(!AadhaarChecksum.validate("Government of India\n2345 6789 0124"));
        assert!(AadhaarChecksum.validate("aadhar no. 234567890124"));
        assert!(!AadhaarChecksum.validate("AADHAAR 2345 6789 0123"));
        assert!(!AadhaarChecksum.validate(""));
    }

    #[test]
    fn only_ascii_digits_count() {
        let devanagari = "AADHAAR २३४५ ६७८९ ०१२४";
        assert!(!AadhaarFormat.validate(devanagari));
        assert!(!AadhaarChecksum.validate(devanagari));
        assert!(!AadhaarFormat.validate("١٢٣٤٥٦٧٨٩٠١٢"));
    }

    #[test]
    fn format_rule_is_looser_than_checksum_rule() {
        let text = "AADHAAR 2345 6789 0123";
        assert!(AadhaarFormat.validate(text));
        assert!(!AadhaarChecksum.validate(text));
    }
}
