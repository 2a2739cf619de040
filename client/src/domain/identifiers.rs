//! Identifier normalisation and validation for form inputs.
//!
//! Inputs are normalised as the user types (so the draft always holds the
//! display form) and validated again before a submission leaves the client.

use std::sync::OnceLock;

use regex::Regex;

/// Number of digits in an Aadhaar (national id) number.
pub const AADHAAR_DIGITS: usize = 12;
/// Number of digits in a phone number.
pub const PHONE_DIGITS: usize = 10;

const AADHAAR_GROUP: usize = 4;

/// Validation failures for identifier fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    /// The value does not contain exactly twelve digits.
    #[error("Please enter a valid 12-digit Aadhaar number")]
    InvalidAadhaar,
    /// The value does not contain exactly ten digits.
    #[error("Please enter a valid 10-digit phone number")]
    InvalidPhone,
    /// The value is not shaped like an email address.
    #[error("Please enter a valid email address")]
    InvalidEmail,
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        // Shape check only; deliverability is the backend's concern.
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

fn ascii_digits(raw: &str, limit: usize) -> String {
    raw.chars().filter(char::is_ascii_digit).take(limit).collect()
}

/// Normalise raw Aadhaar input for display.
///
/// Non-digits are dropped, at most twelve digits are kept and the result
/// is grouped in blocks of four separated by single spaces.
///
/// # Examples
/// ```
/// use lifetag_client::domain::format_aadhaar_input;
///
/// assert_eq!(format_aadhaar_input("123456789012abc"), "1234 5678 9012");
/// assert_eq!(format_aadhaar_input("12345"), "1234 5");
/// ```
pub fn format_aadhaar_input(raw: &str) -> String {
    let digits: Vec<char> = ascii_digits(raw, AADHAAR_DIGITS).chars().collect();
    digits
        .chunks(AADHAAR_GROUP)
        .map(|group| group.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalise raw phone input: digits only, at most ten, no formatting.
///
/// # Examples
/// ```
/// use lifetag_client::domain::format_phone_input;
///
/// assert_eq!(format_phone_input("+91 98765-43210 ext"), "9198765432");
/// ```
pub fn format_phone_input(raw: &str) -> String {
    ascii_digits(raw, PHONE_DIGITS)
}

/// Validate an Aadhaar number and return its twelve bare digits.
///
/// Whitespace is ignored; any other non-digit character is rejected.
pub fn validate_aadhaar(value: &str) -> Result<String, IdentifierError> {
    let compact: String = value.chars().filter(|ch| !ch.is_whitespace()).collect();
    if compact.len() == AADHAAR_DIGITS && compact.chars().all(|ch| ch.is_ascii_digit()) {
        Ok(compact)
    } else {
        Err(IdentifierError::InvalidAadhaar)
    }
}

/// Validate a phone number holding exactly ten digits.
pub fn validate_phone(value: &str) -> Result<String, IdentifierError> {
    let trimmed = value.trim();
    if trimmed.len() == PHONE_DIGITS && trimmed.chars().all(|ch| ch.is_ascii_digit()) {
        Ok(trimmed.to_owned())
    } else {
        Err(IdentifierError::InvalidPhone)
    }
}

/// Validate the shape of an email address and return it trimmed.
pub fn validate_email(value: &str) -> Result<String, IdentifierError> {
    let trimmed = value.trim();
    if email_regex().is_match(trimmed) {
        Ok(trimmed.to_owned())
    } else {
        Err(IdentifierError::InvalidEmail)
    }
}
