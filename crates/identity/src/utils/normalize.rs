//! Input normalization and validation helpers.

use once_cell::sync::Lazy;
use regex::Regex;

static PHONE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{10,15}$").unwrap());
static NAME_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\p{L}\p{M}\s'.-]+$").unwrap());

/// Trim and title-case a free-text field: first letter of each
/// whitespace-separated word uppercased, the rest lowercased.
pub fn normalize_text(value: &str) -> String {
    value
        .trim()
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strip all non-digit characters from a phone number.
pub fn normalize_phone_number(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Check a phone number after normalization: 10 to 15 digits.
pub fn is_valid_phone_number(normalized: &str) -> bool {
    PHONE_PATTERN.is_match(normalized)
}

/// Check a name field: letters (any script), combining marks, spaces,
/// apostrophes, dots, and hyphens.
pub fn is_valid_name(value: &str) -> bool {
    NAME_PATTERN.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_title_cases_words() {
        assert_eq!(normalize_text("  sara  AHMADI "), "Sara Ahmadi");
        assert_eq!(normalize_text("o'BRIEN"), "O'brien");
        assert_eq!(normalize_text(""), "");
    }

    #[test]
    fn phone_normalization_strips_formatting() {
        assert_eq!(normalize_phone_number("+98 (912) 345-6789"), "989123456789");
        assert!(is_valid_phone_number("989123456789"));
        assert!(is_valid_phone_number("0912345678"));
        assert!(!is_valid_phone_number("123456789"));
        assert!(!is_valid_phone_number("1234567890123456"));
        assert!(!is_valid_phone_number(""));
    }

    #[test]
    fn name_pattern_accepts_unicode_letters() {
        assert!(is_valid_name("Sara"));
        assert!(is_valid_name("سارا احمدی"));
        assert!(is_valid_name("Jean-Pierre D'Arcy Jr."));
        assert!(!is_valid_name("R2D2"));
        assert!(!is_valid_name("name!"));
    }
}
