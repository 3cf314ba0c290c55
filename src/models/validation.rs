//! Field sanitizers and custom validators shared by the catalog forms

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use validator::ValidationError;

static ISBN_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\d{9}[\dX]|\d{13})$").expect("valid ISBN pattern"));

/// Trim surrounding whitespace and normalize to NFC
pub fn normalize_text(s: &str) -> String {
    s.trim().nfc().collect()
}

/// Strip hyphens and spaces and upper-case a trailing check character
pub fn compact_isbn(s: &str) -> String {
    s.chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// True when `s` is a well formed ISBN-10 or ISBN-13 with a correct check digit
pub fn is_valid_isbn(s: &str) -> bool {
    let isbn = compact_isbn(s);
    if !ISBN_SHAPE.is_match(&isbn) {
        return false;
    }

    let digits: Vec<u32> = isbn
        .chars()
        .map(|c| if c == 'X' { 10 } else { c.to_digit(10).unwrap_or(0) })
        .collect();

    match digits.len() {
        10 => {
            let sum: u32 = digits
                .iter()
                .enumerate()
                .map(|(i, d)| (10 - i as u32) * d)
                .sum();
            sum % 11 == 0
        }
        13 => {
            let sum: u32 = digits
                .iter()
                .enumerate()
                .map(|(i, d)| if i % 2 == 0 { *d } else { d * 3 })
                .sum();
            sum % 10 == 0
        }
        _ => false,
    }
}

pub fn validate_isbn(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || is_valid_isbn(value) {
        return Ok(());
    }
    Err(ValidationError::new("isbn").with_message("ISBN is invalid".into()))
}

/// Names may only hold letters and digits; emptiness is reported by the length check
pub fn validate_alphanumeric(value: &str) -> Result<(), ValidationError> {
    if value.chars().all(char::is_alphanumeric) {
        return Ok(());
    }
    Err(ValidationError::new("alphanumeric")
        .with_message("Name can't have non-alphanumeric characters".into()))
}
