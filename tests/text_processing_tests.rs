//! # Text Processing Tests Module
//!
//! Tests for variant generation and the match decision stage, covering the
//! pipeline's observable contract: variant purity, both-conditions-required
//! decisions, monotonic permissiveness under concatenation, and empty-input
//! safety.

#[cfg(test)]
mod tests {
    use tube_rewards::text_processing::{
        channel_variants, MatchConfig, MatchPolicy, SubscriptionMatcher, SUBSCRIPTION_VARIANTS,
    };

    /// Variant generation is a pure function: same input, same set
    #[test]
    fn test_variant_generation_idempotent() {
        for phrase in ["Tech Channel XYZ", "NewsTV", "قناة التقنية", ""] {
            let first = channel_variants(phrase, false);
            let second = channel_variants(phrase, false);
            assert_eq!(first, second, "variant set changed between calls for {:?}", phrase);

            let first_restricted = channel_variants(phrase, true);
            let second_restricted = channel_variants(phrase, true);
            assert_eq!(first_restricted, second_restricted);
        }
    }

    /// Variant set contents for a single-word phrase
    #[test]
    fn test_variant_set_contents() {
        let variants = channel_variants("GamerTV", false);

        assert!(variants.contains("gamertv"));
        assert!(variants.contains("gamertv.com"));
        assert!(variants.contains("@gamertv"));
        assert!(variants.contains("gamer")); // TV suffix stripped

        // Everything is lowercase
        assert!(variants.iter().all(|v| v == &v.to_lowercase()));
    }

    /// First-token restriction drops later words entirely
    #[test]
    fn test_variant_first_token_only() {
        let variants = channel_variants("Alpha Beta Gamma", true);
        assert!(variants.contains("alpha"));
        assert!(!variants.iter().any(|v| v.contains("beta") || v.contains("gamma")));
    }

    /// Empty phrase yields an empty variant set, not a panic
    #[test]
    fn test_variant_empty_phrase() {
        assert!(channel_variants("", false).is_empty());
        assert!(channel_variants("   ", true).is_empty());
    }

    /// The subscription lexicon covers the three languages
    #[test]
    fn test_subscription_lexicon_contents() {
        assert!(SUBSCRIPTION_VARIANTS.contains(&"subscribed"));
        assert!(SUBSCRIPTION_VARIANTS.contains(&"تم الاشتراك"));
        assert!(SUBSCRIPTION_VARIANTS.contains(&"вы подписаны"));
    }

    /// Channel-only or subscription-only text decides false
    #[test]
    fn test_match_requires_both_conditions() {
        let matcher = SubscriptionMatcher::default();

        let channel_only = matcher.evaluate("Tech Channel XYZ videos", "Tech Channel XYZ");
        assert!(channel_only.channel && !channel_only.subscription);
        assert!(!channel_only.is_match());

        let subscription_only = matcher.evaluate("Subscribed 10K subscribers", "Tech Channel XYZ");
        assert!(!subscription_only.channel && subscription_only.subscription);
        assert!(!subscription_only.is_match());
    }

    /// The canonical positive scenario
    #[test]
    fn test_end_to_end_positive_scenario() {
        let matcher = SubscriptionMatcher::default();
        let outcome = matcher.evaluate(
            "Tech Channel XYZ · Subscribed · 10K subscribers",
            "Tech Channel XYZ",
        );
        assert!(outcome.is_match());
    }

    /// "Subscribe" is an offer, not a completed subscription
    #[test]
    fn test_subscribe_button_does_not_pass() {
        let matcher = SubscriptionMatcher::default();
        let outcome = matcher.evaluate("Tech Channel XYZ · Subscribe", "Tech Channel XYZ");
        assert!(!outcome.is_match());
        assert!(!outcome.subscription);
    }

    /// "Subscribers" alone is also not a confirmation
    #[test]
    fn test_subscribers_count_does_not_pass() {
        let matcher = SubscriptionMatcher::default();
        let outcome = matcher.evaluate("Tech Channel XYZ 10K subscribers", "Tech Channel XYZ");
        assert!(!outcome.subscription);
    }

    /// Empty OCR text decides false without raising
    #[test]
    fn test_empty_text_is_false() {
        let matcher = SubscriptionMatcher::default();
        assert!(!matcher.evaluate("", "Tech Channel XYZ").is_match());
        assert!(!matcher.evaluate(" \n\t ", "Tech Channel XYZ").is_match());
    }

    /// Appending more backend output never turns a match into a miss
    #[test]
    fn test_monotonic_permissiveness_under_concatenation() {
        let matcher = SubscriptionMatcher::default();
        let base = "Tech Channel XYZ Subscribed";
        assert!(matcher.evaluate(base, "Tech Channel XYZ").is_match());

        let noise_samples = [
            "random garbage",
            "نص عربي غير ذي صلة",
            "ещё немного текста",
            "Subscribe Subscribe Subscribe",
        ];
        let mut text = base.to_string();
        for noise in noise_samples {
            text.push(' ');
            text.push_str(noise);
            assert!(
                matcher.evaluate(&text, "Tech Channel XYZ").is_match(),
                "match lost after appending {:?}",
                noise
            );
        }
    }

    /// Enumerated OCR misreads pass; fuzzy matching also covers unseen ones
    #[test]
    fn test_misread_tolerance() {
        let matcher = SubscriptionMatcher::default();

        for misread in ["subsoribed", "subscrined", "subscribd", "subscroined"] {
            let text = format!("Tech Channel XYZ {}", misread);
            assert!(
                matcher.evaluate(&text, "Tech Channel XYZ").is_match(),
                "enumerated misread {:?} did not match",
                misread
            );
        }

        // One substitution, not in the enumerated list
        let outcome = matcher.evaluate("Tech Channel XYZ subscr1bed", "Tech Channel XYZ");
        assert!(outcome.subscription);
    }

    /// Arabic and Russian confirmations are accepted
    #[test]
    fn test_multilingual_confirmations() {
        let matcher = SubscriptionMatcher::default();

        assert!(matcher
            .evaluate("Tech تم الاشتراك", "Tech")
            .is_match());
        assert!(matcher.evaluate("Tech مشترك", "Tech").is_match());
        assert!(matcher.evaluate("Tech Вы подписаны", "Tech").is_match());
    }

    /// Disabling fuzzy matching makes the matcher exact-only
    #[test]
    fn test_fuzzy_can_be_disabled() {
        let matcher = SubscriptionMatcher::new(MatchConfig {
            fuzzy_similarity: 1.0,
            ..MatchConfig::default()
        });

        // In the enumerated list: still matches
        assert!(matcher
            .evaluate("Tech subsoribed", "Tech")
            .is_match());
        // Unlisted misread: no longer matches
        assert!(!matcher
            .evaluate("Tech subscr1bed", "Tech")
            .subscription);
    }

    /// Substring policy accepts what whole-word rejects, never the reverse
    #[test]
    fn test_substring_strictly_more_permissive() {
        let whole = SubscriptionMatcher::new(MatchConfig::default());
        let substring = SubscriptionMatcher::new(MatchConfig {
            policy: MatchPolicy::Substring,
            ..MatchConfig::default()
        });

        let samples = [
            ("Tech Channel XYZ Subscribed", "Tech Channel XYZ"),
            ("xtechx Subscribed", "tech"),
            ("Subscribe only", "tech"),
            ("", "tech"),
        ];

        for (text, phrase) in samples {
            let whole_outcome = whole.evaluate(text, phrase);
            let substring_outcome = substring.evaluate(text, phrase);
            if whole_outcome.is_match() {
                assert!(
                    substring_outcome.is_match(),
                    "substring policy rejected {:?} which whole-word accepted",
                    text
                );
            }
        }

        // And it is strictly more permissive on embedded names
        assert!(substring.evaluate("xtechx Subscribed", "tech").is_match());
        assert!(!whole.evaluate("xtechx Subscribed", "tech").is_match());
    }

    /// Handle and domain decorations found in real screenshots
    #[test]
    fn test_decorated_tokens_match() {
        let matcher = SubscriptionMatcher::default();

        assert!(matcher
            .evaluate("@techchannel Subscribed", "TechChannel")
            .is_match());
        assert!(matcher
            .evaluate("techchannel.com Subscribed", "TechChannel")
            .is_match());
    }
}
