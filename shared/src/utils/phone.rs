//! Phone number utilities

use once_cell::sync::Lazy;
use regex::Regex;

// Iranian mobile number in national format (09xxxxxxxxx)
static IRAN_MOBILE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^09\d{9}$").expect("valid regex")
});

// International phone number regex (E.164 format)
static INTERNATIONAL_PHONE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+[1-9]\d{1,14}$").expect("valid regex")
});

/// Normalize a phone number by removing common formatting characters
///
/// Iranian numbers written in international form (`+989...` or `00989...`)
/// are folded into the national `09...` form so that both spellings map to
/// the same OTP identity key.
pub fn normalize_phone_number(phone: &str) -> String {
    let cleaned: String = phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();

    if let Some(rest) = cleaned.strip_prefix("+98").or_else(|| cleaned.strip_prefix("0098")) {
        if rest.len() == 10 && rest.starts_with('9') {
            return format!("0{}", rest);
        }
    }
    cleaned
}

/// Check if a phone number is a valid Iranian mobile number
pub fn is_valid_iran_mobile(phone: &str) -> bool {
    IRAN_MOBILE_REGEX.is_match(&normalize_phone_number(phone))
}

/// Check if a phone number is valid (international E.164 format)
pub fn is_valid_international_phone(phone: &str) -> bool {
    INTERNATIONAL_PHONE_REGEX.is_match(&normalize_phone_number(phone))
}

/// Check if a phone number is valid (either Iranian mobile or international)
pub fn is_valid_phone(phone: &str) -> bool {
    is_valid_iran_mobile(phone) || is_valid_international_phone(phone)
}

/// Mask a phone number for logs (e.g., 091****0000)
pub fn mask_phone_number(phone: &str) -> String {
    let normalized = normalize_phone_number(phone);
    if normalized.len() >= 7 {
        format!(
            "{}****{}",
            &normalized[0..3],
            &normalized[normalized.len() - 4..]
        )
    } else {
        "****".to_string()
    }
}
