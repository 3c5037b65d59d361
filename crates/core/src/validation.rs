//! Form validation helpers.
//!
//! Every form in both applications collects problems into a [`FieldErrors`]
//! map keyed by input name, which templates render next to the field.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

#[allow(clippy::expect_used)]
static PINCODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[1-9][0-9]{5}$").expect("valid pincode regex"));

#[allow(clippy::expect_used)]
static MOBILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[6-9]\d{9}$").expect("valid mobile regex"));

#[allow(clippy::expect_used)]
static OTP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{6}$").expect("valid otp regex"));

#[allow(clippy::expect_used)]
static EXPIRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(0[1-9]|1[0-2])/\d{2}$").expect("valid expiry regex"));

/// Validation failures keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error. The first message for a field wins.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_owned())
            .or_insert_with(|| message.into());
    }

    /// Record `message` for `field` unless `ok` holds.
    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add(field, message);
        }
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// First message, used for toast summaries.
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        self.0.values().next().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(())` when nothing was recorded.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one field failed.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

/// Indian PIN code: six digits, not starting with zero.
#[must_use]
pub fn is_valid_pincode(pincode: &str) -> bool {
    PINCODE_RE.is_match(pincode.trim())
}

/// Strip everything but ASCII digits.
#[must_use]
pub fn digits_only(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

/// Indian mobile number, ignoring spaces, dashes and other separators.
///
/// A leading `+91`/`91` country code is accepted as well.
#[must_use]
pub fn is_valid_phone(phone: &str) -> bool {
    normalize_phone(phone).is_some()
}

/// Reduce a mobile number to its ten significant digits.
#[must_use]
pub fn normalize_phone(phone: &str) -> Option<String> {
    let digits = digits_only(phone);
    let local = match digits.len() {
        12 => digits.strip_prefix("91")?.to_owned(),
        _ => digits,
    };
    MOBILE_RE.is_match(&local).then_some(local)
}

#[must_use]
pub fn is_valid_otp(otp: &str) -> bool {
    OTP_RE.is_match(otp.trim())
}

/// Password strength required at registration: at least 8 characters with an
/// upper case letter, a lower case letter and a digit.
#[must_use]
pub fn is_strong_password(password: &str) -> bool {
    password.chars().count() >= 8
        && password.chars().any(char::is_uppercase)
        && password.chars().any(char::is_lowercase)
        && password.chars().any(|c| c.is_ascii_digit())
}

/// Card expiry as `MM/YY`.
#[must_use]
pub fn is_valid_card_expiry(expiry: &str) -> bool {
    EXPIRY_RE.is_match(expiry.trim())
}

/// UPI handles look like `name@bank`.
#[must_use]
pub fn is_valid_upi_id(upi_id: &str) -> bool {
    let upi_id = upi_id.trim();
    upi_id
        .split_once('@')
        .is_some_and(|(name, handle)| !name.is_empty() && !handle.is_empty())
}

/// Trim and treat empty strings as missing.
#[must_use]
pub fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pincode() {
        assert!(is_valid_pincode("400001"));
        assert!(is_valid_pincode(" 560034 "));
        assert!(!is_valid_pincode("040001"));
        assert!(!is_valid_pincode("40001"));
        assert!(!is_valid_pincode("4000012"));
        assert!(!is_valid_pincode("40a001"));
    }

    #[test]
    fn test_phone() {
        assert!(is_valid_phone("9876543210"));
        assert!(is_valid_phone("98765 43210"));
        assert!(is_valid_phone("+91 98765-43210"));
        assert!(!is_valid_phone("5876543210"));
        assert!(!is_valid_phone("987654321"));
        assert_eq!(
            normalize_phone("+91 98765 43210").as_deref(),
            Some("9876543210")
        );
    }

    #[test]
    fn test_otp() {
        assert!(is_valid_otp("123456"));
        assert!(!is_valid_otp("12345"));
        assert!(!is_valid_otp("12345a"));
    }

    #[test]
    fn test_password_strength() {
        assert!(is_strong_password("Secret123"));
        assert!(!is_strong_password("secret123"));
        assert!(!is_strong_password("SECRET123"));
        assert!(!is_strong_password("Secretabc"));
        assert!(!is_strong_password("Se1"));
    }

    #[test]
    fn test_card_expiry() {
        assert!(is_valid_card_expiry("09/27"));
        assert!(!is_valid_card_expiry("13/27"));
        assert!(!is_valid_card_expiry("9/27"));
    }

    #[test]
    fn test_upi_id() {
        assert!(is_valid_upi_id("priya@okhdfc"));
        assert!(!is_valid_upi_id("priya"));
        assert!(!is_valid_upi_id("@okhdfc"));
    }

    #[test]
    fn test_field_errors_first_message_wins() {
        let mut errors = FieldErrors::new();
        errors.add("email", "Email is required");
        errors.add("email", "Please enter a valid email");
        errors.check(false, "phone", "Phone is required");
        errors.check(true, "name", "never");

        assert_eq!(errors.get("email"), Some("Email is required"));
        assert!(errors.has("phone"));
        assert!(!errors.has("name"));
        assert_eq!(errors.len(), 2);
        assert!(errors.into_result().is_err());
    }
}
