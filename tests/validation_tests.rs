//! # Validation and URL Parsing Tests
//!
//! Integration tests for user-input validation and YouTube URL handling as
//! the conversation handlers use them.

#[cfg(test)]
mod tests {
    use tube_rewards::validation::{
        country_from_phone, parse_subscription_choice, validate_email, validate_payment_id,
        validate_phone, validate_withdrawal_amount,
    };
    use tube_rewards::youtube::{extract_identifier, filter_latin_segments, is_youtube_url, IdentifierKind};

    #[test]
    fn test_registration_input_validation() {
        assert!(validate_email("someone@gmail.com").is_ok());
        assert!(validate_email("nope").is_err());

        assert!(validate_phone("+9639912345678").is_ok());
        assert!(validate_phone("09912345678").is_err());

        assert_eq!(country_from_phone("+9639912345678"), "Syria");
        assert_eq!(country_from_phone("+10000000000"), "United States");
    }

    #[test]
    fn test_payment_and_package_inputs() {
        assert!(validate_payment_id("998877").is_ok());
        assert!(validate_payment_id("TX-998877").is_err());

        assert_eq!(parse_subscription_choice("100 Subscribers"), Some(100));
        assert_eq!(parse_subscription_choice("1000 مشترك"), Some(1000));
        assert_eq!(parse_subscription_choice("Cancel ❌"), None);
    }

    #[test]
    fn test_withdrawal_amount_bounds() {
        // minimum 100, balance 500
        assert!(validate_withdrawal_amount("100", 500, 100).is_ok());
        assert!(validate_withdrawal_amount("500", 500, 100).is_ok());
        assert!(validate_withdrawal_amount("99", 500, 100).is_err());
        assert!(validate_withdrawal_amount("501", 500, 100).is_err());
        assert!(validate_withdrawal_amount("-10", 500, 100).is_err());
    }

    #[test]
    fn test_channel_url_forms_resolve_to_identifiers() {
        assert!(is_youtube_url("https://www.youtube.com/@SomeOne"));
        assert!(!is_youtube_url("https://example.com/@SomeOne"));

        let cases = [
            (
                "https://www.youtube.com/channel/UC1234567890abcdefghijkl",
                IdentifierKind::ChannelId,
            ),
            ("https://www.youtube.com/c/CustomName", IdentifierKind::Custom),
            ("https://www.youtube.com/user/LegacyName", IdentifierKind::User),
            ("https://www.youtube.com/@handle", IdentifierKind::Handle),
        ];
        for (url, expected_kind) in cases {
            let identifier = extract_identifier(url)
                .unwrap_or_else(|| panic!("identifier should extract from {}", url));
            assert_eq!(identifier.kind, expected_kind, "wrong kind for {}", url);
        }
    }

    #[test]
    fn test_display_name_filtering() {
        assert_eq!(
            filter_latin_segments("Ilham Al Madfai Official", "https://youtube.com/@Ilham"),
            "Ilham Al Madfai Official"
        );
        assert_eq!(
            filter_latin_segments("قناة الأخبار", "https://youtube.com/@NewsArabia"),
            "NewsArabia"
        );
    }
}
