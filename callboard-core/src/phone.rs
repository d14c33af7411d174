//! Phone number input rules.
//!
//! Numbers are national-format digits only, at most [`PHONE_MAX_DIGITS`]
//! long. Input is sanitized as it is typed rather than rejected on submit.

use crate::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum digits accepted in a phone number.
pub const PHONE_MAX_DIGITS: usize = 10;

/// Keep only ASCII digits, truncated to [`PHONE_MAX_DIGITS`].
pub fn sanitize_phone_input(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit())
        .take(PHONE_MAX_DIGITS)
        .collect()
}

/// Append one typed character to a phone buffer.
///
/// Returns `false` when the character was dropped (not a digit, or the
/// buffer is already full).
pub fn push_phone_char(buffer: &mut String, c: char) -> bool {
    if !c.is_ascii_digit() || buffer.chars().count() >= PHONE_MAX_DIGITS {
        return false;
    }
    buffer.push(c);
    true
}

/// A validated phone number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "phoneNumber".to_string(),
            });
        }
        if !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::InvalidValue {
                field: "phoneNumber".to_string(),
                reason: "must contain digits only".to_string(),
            });
        }
        if trimmed.len() > PHONE_MAX_DIGITS {
            return Err(ValidationError::InvalidValue {
                field: "phoneNumber".to_string(),
                reason: format!("must be at most {} digits", PHONE_MAX_DIGITS),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = ValidationError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<PhoneNumber> for String {
    fn from(phone: PhoneNumber) -> Self {
        phone.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sanitize_strips_formatting() {
        assert_eq!(sanitize_phone_input("(555) 123-4567"), "5551234567");
    }

    #[test]
    fn test_sanitize_caps_length() {
        assert_eq!(sanitize_phone_input("123456789012345"), "1234567890");
    }

    #[test]
    fn test_push_rejects_letters_and_overflow() {
        let mut buffer = String::from("123456789");
        assert!(!push_phone_char(&mut buffer, 'a'));
        assert!(push_phone_char(&mut buffer, '0'));
        assert!(!push_phone_char(&mut buffer, '1'));
        assert_eq!(buffer, "1234567890");
    }

    #[test]
    fn test_parse_rejects_non_digits() {
        assert!(matches!(
            PhoneNumber::parse("555-1234"),
            Err(ValidationError::InvalidValue { .. })
        ));
        assert!(matches!(
            PhoneNumber::parse("   "),
            Err(ValidationError::RequiredFieldMissing { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_sanitized_is_digits_and_capped(raw in ".{0,40}") {
            let clean = sanitize_phone_input(&raw);
            prop_assert!(clean.chars().all(|c| c.is_ascii_digit()));
            prop_assert!(clean.len() <= PHONE_MAX_DIGITS);
        }

        #[test]
        fn prop_sanitize_preserves_digit_order(raw in "[0-9a-z -]{0,40}") {
            let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
            let clean = sanitize_phone_input(&raw);
            prop_assert!(digits.starts_with(&clean));
        }

        #[test]
        fn prop_sanitized_nonempty_parses(raw in "[0-9]{1,20}") {
            let clean = sanitize_phone_input(&raw);
            prop_assert!(PhoneNumber::parse(&clean).is_ok());
        }
    }
}
