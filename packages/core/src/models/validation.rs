//! Input validation shared by the entity models.

use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::sync::OnceLock;
use thiserror::Error;

/// Validation errors for entity input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Invalid phone number: {0}")]
    InvalidPhone(String),

    #[error("Invalid parent reference: {0}")]
    InvalidParent(String),

    #[error("Invalid pagination: {0}")]
    InvalidPagination(String),
}

// Deliberately loose: one '@', no whitespace, a dot in the domain part.
const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";

// Optional leading '+', then 7 to 15 digits with optional spaces or dashes.
const PHONE_PATTERN: &str = r"^\+?[0-9][0-9 \-]{5,18}[0-9]$";

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("EMAIL_PATTERN is a valid regex"))
}

fn phone_regex() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE.get_or_init(|| Regex::new(PHONE_PATTERN).expect("PHONE_PATTERN is a valid regex"))
}

/// Reject empty or whitespace-only text for a required field
pub(crate) fn require_text(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field.to_string()));
    }
    Ok(())
}

pub(crate) fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email_regex().is_match(email) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(email.to_string()))
    }
}

pub(crate) fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    if phone_regex().is_match(phone) && (7..=15).contains(&digits) {
        Ok(())
    } else {
        Err(ValidationError::InvalidPhone(phone.to_string()))
    }
}

/// Deserialize a nullable field of a partial update
///
/// Paired with `#[serde(default)]`:
/// - field missing: `None` (leave unchanged)
/// - field is `null`: `Some(None)` (clear the reference)
/// - field has a value: `Some(Some(value))`
pub(crate) fn deserialize_optional_field<'de, D, T>(
    deserializer: D,
) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::<T>::deserialize(deserializer)?))
}
