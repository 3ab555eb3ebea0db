//! # Input Validation Module
//!
//! Validation for user-supplied registration and submission inputs: email
//! addresses, shared phone contacts, payment IDs, and withdrawal amounts.
//! Validation failures are user errors, reported back through the bot in
//! the user's language; they are never logged as application errors.

use std::sync::LazyLock;

use regex::Regex;

use crate::errors::{AppError, AppResult};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+$")
        .expect("email regex must compile")
});

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+[0-9]{7,15}$").expect("phone regex must compile"));

/// Validate an email address, returning it trimmed
pub fn validate_email(email: &str) -> AppResult<&str> {
    let trimmed = email.trim();
    if EMAIL_RE.is_match(trimmed) {
        Ok(trimmed)
    } else {
        Err(AppError::Validation(format!(
            "invalid email address format: {}",
            trimmed
        )))
    }
}

/// Validate an international phone number ("+" followed by 7-15 digits).
///
/// Telegram contact payloads omit the plus; callers should prepend it
/// before validation, matching how the number is stored.
pub fn validate_phone(phone: &str) -> AppResult<&str> {
    let trimmed = phone.trim();
    if PHONE_RE.is_match(trimmed) {
        Ok(trimmed)
    } else {
        Err(AppError::Validation(format!(
            "invalid phone number format: {}",
            trimmed
        )))
    }
}

/// Country name from the international dialling prefix.
///
/// Covers the prefixes observed in production traffic; everything else maps
/// to "Unknown", which is what the profile shows when geocoding fails.
pub fn country_from_phone(phone: &str) -> &'static str {
    let digits = phone.trim_start_matches('+');

    // Longest prefixes first so "963" is not swallowed by "96"
    const PREFIXES: &[(&str, &str)] = &[
        ("963", "Syria"),
        ("964", "Iraq"),
        ("962", "Jordan"),
        ("961", "Lebanon"),
        ("966", "Saudi Arabia"),
        ("971", "United Arab Emirates"),
        ("20", "Egypt"),
        ("90", "Turkey"),
        ("49", "Germany"),
        ("44", "United Kingdom"),
        ("33", "France"),
        ("7", "Russia"),
        ("1", "United States"),
    ];

    for (prefix, country) in PREFIXES {
        if digits.starts_with(prefix) {
            return country;
        }
    }
    "Unknown"
}

/// Validate a payment ID: digits only
pub fn validate_payment_id(payment_id: &str) -> AppResult<&str> {
    let trimmed = payment_id.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        Ok(trimmed)
    } else {
        Err(AppError::Validation(
            "payment ID must contain only numbers".to_string(),
        ))
    }
}

/// Parse a subscriber-package choice from a menu button label
pub fn parse_subscription_choice(text: &str) -> Option<i32> {
    match text.trim() {
        "100 Subscribers" | "100 مشترك" => Some(100),
        "1000 Subscribers" | "1000 مشترك" => Some(1000),
        _ => None,
    }
}

/// Validate a withdrawal amount against the user's balance and the minimum
pub fn validate_withdrawal_amount(
    text: &str,
    balance: i64,
    minimum: i64,
) -> AppResult<i64> {
    let amount = text
        .trim()
        .parse::<i64>()
        .map_err(|_| AppError::Validation("withdrawal amount must be a number".to_string()))?;

    if amount < minimum {
        return Err(AppError::Validation(format!(
            "withdrawal amount {} is below the minimum of {}",
            amount, minimum
        )));
    }
    if amount > balance {
        return Err(AppError::Validation(format!(
            "withdrawal amount {} exceeds the balance of {}",
            amount, balance
        )));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("  user.name+tag@mail.co.uk ").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("missing@tld").is_err());
        assert!(validate_email("@example.com").is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+4915112345678").is_ok());
        assert!(validate_phone("+12025550123").is_ok());
        assert!(validate_phone("4915112345678").is_err()); // missing plus
        assert!(validate_phone("+123").is_err()); // too short
        assert!(validate_phone("+49 151 1234").is_err()); // spaces
    }

    #[test]
    fn test_country_from_phone() {
        assert_eq!(country_from_phone("+9639912345678"), "Syria");
        assert_eq!(country_from_phone("+9641234567"), "Iraq");
        assert_eq!(country_from_phone("+201001234567"), "Egypt");
        assert_eq!(country_from_phone("+4915112345678"), "Germany");
        assert_eq!(country_from_phone("+35912345678"), "Unknown");
    }

    #[test]
    fn test_validate_payment_id() {
        assert!(validate_payment_id("1234567890").is_ok());
        assert!(validate_payment_id(" 42 ").is_ok());
        assert!(validate_payment_id("12a34").is_err());
        assert!(validate_payment_id("").is_err());
    }

    #[test]
    fn test_parse_subscription_choice() {
        assert_eq!(parse_subscription_choice("100 Subscribers"), Some(100));
        assert_eq!(parse_subscription_choice("1000 مشترك"), Some(1000));
        assert_eq!(parse_subscription_choice("500 Subscribers"), None);
    }

    #[test]
    fn test_validate_withdrawal_amount() {
        assert_eq!(validate_withdrawal_amount("150", 200, 100).unwrap(), 150);
        assert!(validate_withdrawal_amount("50", 200, 100).is_err()); // below minimum
        assert!(validate_withdrawal_amount("250", 200, 100).is_err()); // over balance
        assert!(validate_withdrawal_amount("abc", 200, 100).is_err());
    }
}
