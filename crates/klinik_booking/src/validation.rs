// --- File: crates/klinik_booking/src/validation.rs ---
use crate::error::BookingError;
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

// Mobile and landline numbers, national or +61 form, spaces removed.
static AU_PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\+61|0)[2-478]\d{8}$").expect("phone pattern compiles"));

/// Returns the trimmed value or a `MissingField` error when it is blank.
pub fn required<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str, BookingError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(BookingError::MissingField(field)),
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email.trim())
}

pub fn is_valid_au_phone(phone: &str) -> bool {
    let compact: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    AU_PHONE.is_match(&compact)
}

pub fn check_email(email: &str) -> Result<(), BookingError> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(BookingError::InvalidEmail)
    }
}
