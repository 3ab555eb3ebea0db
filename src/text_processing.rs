//! # Text Processing Module
//!
//! Fuzzy matching of OCR output against a target channel name and the
//! subscription-confirmation lexicon. This is the decision stage of the
//! verification pipeline: the OCR backends hand over concatenated raw text,
//! and this module answers whether the screenshot shows both the expected
//! channel and a completed "Subscribed" state.
//!
//! Matching policy: tokens are compared whole-word by default (substring
//! containment is available by configuration but accepts partial matches
//! inside unrelated words, so it is not the default). On top of the
//! enumerated variant sets, a normalized edit-distance threshold tolerates
//! OCR misreads the enumeration does not cover. A token that merely extends
//! a variant ("Subscribe" vs "Subscribed") must match exactly — trailing
//! morphology is how "not yet subscribed" screenshots differ from completed
//! ones, and the fuzzy pass must not erase that distinction.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

/// Spellings and translations accepted as a subscription confirmation.
///
/// The English entries are misreads observed in real OCR output; the Arabic
/// and Russian entries are the confirmation strings of the localized UIs.
/// Multi-word entries are matched against the whole normalized text.
pub const SUBSCRIPTION_VARIANTS: &[&str] = &[
    // English, including common OCR misreadings
    "subscribed",
    "subsorived",
    "subscrived",
    "subscríved",
    "subsoribed",
    "subscrined",
    "subscroined",
    "subscribd",
    "subscríbed",
    "subscroíbed",
    "subscroíned",
    // Arabic
    "مشترك",
    "مشتركون",
    "مشترک",
    "مشاریك",
    "مشترکین",
    "تم الاشتراك",
    // Russian
    "подписаны",
    "вы подписаны",
];

/// Word-level tokens: optional @ prefix, letters/digits/underscores, with
/// embedded dots kept so "channel.com" survives as one token.
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@?[\p{L}\p{N}_]+(?:\.[\p{L}\p{N}_]+)*").expect("token regex must compile")
});

/// Trailing "TV" decoration, stripped case-insensitively
static TV_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*tv$").expect("tv suffix regex must compile"));

/// How candidate variants are compared against tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// Token must equal the variant (or be within the fuzzy threshold)
    #[default]
    WholeWord,
    /// Variant may appear as a substring inside a token. Strictly more
    /// permissive than whole-word; accepts partial matches inside
    /// unrelated words.
    Substring,
}

/// Configuration for the match decision stage
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// Whole-word or substring comparison
    pub policy: MatchPolicy,
    /// Generate channel variants only from the first whitespace-delimited
    /// token of the target phrase
    pub first_token_only: bool,
    /// Minimum normalized Levenshtein similarity for a fuzzy token match,
    /// in [0, 1]. 1.0 disables fuzzy matching entirely.
    pub fuzzy_similarity: f64,
    /// Tokens shorter than this never match fuzzily (tiny words are one
    /// edit away from everything)
    pub fuzzy_min_len: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            policy: MatchPolicy::WholeWord,
            first_token_only: false,
            fuzzy_similarity: 0.9,
            fuzzy_min_len: 5,
        }
    }
}

impl MatchConfig {
    /// Validate the configuration parameters
    pub fn validate(&self) -> crate::errors::AppResult<()> {
        if !(0.0..=1.0).contains(&self.fuzzy_similarity) {
            return Err(crate::errors::AppError::Config(format!(
                "fuzzy_similarity ({}) must be within [0, 1]",
                self.fuzzy_similarity
            )));
        }
        Ok(())
    }
}

/// Outcome of the two containment checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOutcome {
    /// Some channel-name variant was found
    pub channel: bool,
    /// Some subscription-confirmation variant was found
    pub subscription: bool,
}

impl MatchOutcome {
    /// The final decision: both conditions must hold
    pub fn is_match(&self) -> bool {
        self.channel && self.subscription
    }
}

/// Generate the lowercase candidate set for a channel name.
///
/// For each base unit (every whitespace-delimited word, plus the full phrase
/// when it is multi-word; or only the first word when `first_token_only`):
/// the unit itself, the unit with ".com" appended, the unit with "@"
/// prefixed, and the unit with a trailing "TV" token stripped. Pure function
/// of its inputs.
pub fn channel_variants(target_phrase: &str, first_token_only: bool) -> BTreeSet<String> {
    let trimmed = target_phrase.trim();
    let mut units: Vec<String> = Vec::new();

    if first_token_only {
        if let Some(first) = trimmed.split_whitespace().next() {
            units.push(first.to_string());
        }
    } else {
        units.extend(trimmed.split_whitespace().map(|w| w.to_string()));
        if trimmed.contains(char::is_whitespace) {
            units.push(trimmed.to_string());
        }
    }

    let mut variants = BTreeSet::new();
    for unit in units {
        let lower = unit.to_lowercase();
        if lower.is_empty() {
            continue;
        }
        variants.insert(lower.clone());
        variants.insert(format!("{}.com", lower));
        variants.insert(format!("@{}", lower));

        let stripped = TV_SUFFIX_RE.replace(&lower, "").to_string();
        if !stripped.is_empty() {
            variants.insert(stripped);
        }
    }

    variants
}

/// The decision stage of the verification pipeline
#[derive(Debug, Clone)]
pub struct SubscriptionMatcher {
    config: MatchConfig,
    subscription_variants: BTreeSet<String>,
}

impl SubscriptionMatcher {
    pub fn new(config: MatchConfig) -> Self {
        Self {
            config,
            subscription_variants: SUBSCRIPTION_VARIANTS
                .iter()
                .map(|v| v.to_lowercase())
                .collect(),
        }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Evaluate OCR text against a target channel phrase.
    ///
    /// Empty (or whitespace-only) text decides `false` on both conditions
    /// without tokenization.
    pub fn evaluate(&self, ocr_text: &str, target_phrase: &str) -> MatchOutcome {
        if ocr_text.trim().is_empty() {
            return MatchOutcome {
                channel: false,
                subscription: false,
            };
        }

        let normalized = ocr_text.to_lowercase();
        let tokens: Vec<&str> = TOKEN_RE.find_iter(&normalized).map(|m| m.as_str()).collect();

        let channel_set = channel_variants(target_phrase, self.config.first_token_only);

        let channel = self.any_variant_matches(&normalized, &tokens, &channel_set);
        let subscription =
            self.any_variant_matches(&normalized, &tokens, &self.subscription_variants);

        debug!(
            tokens = tokens.len(),
            channel,
            subscription,
            "Match decision evaluated"
        );

        MatchOutcome {
            channel,
            subscription,
        }
    }

    /// True when any variant from the set is present in the token stream
    /// (single-word variants) or the whole text (multi-word variants).
    fn any_variant_matches(
        &self,
        normalized_text: &str,
        tokens: &[&str],
        variants: &BTreeSet<String>,
    ) -> bool {
        for variant in variants {
            if variant.contains(char::is_whitespace) {
                if normalized_text.contains(variant.as_str()) {
                    return true;
                }
                continue;
            }
            if tokens.iter().any(|token| self.token_matches(token, variant)) {
                return true;
            }
        }
        false
    }

    /// Compare one token against one single-word variant
    fn token_matches(&self, token: &str, variant: &str) -> bool {
        match self.config.policy {
            MatchPolicy::Substring => {
                if token.contains(variant) {
                    return true;
                }
            }
            MatchPolicy::WholeWord => {
                if token == variant {
                    return true;
                }
            }
        }

        // Fuzzy fallback. Never applied when one string merely extends the
        // other: that difference carries meaning ("Subscribe" is an offer,
        // "Subscribed" is the completed state).
        if self.config.fuzzy_similarity >= 1.0 {
            return false;
        }
        let token_len = token.chars().count();
        let variant_len = variant.chars().count();
        if token_len < self.config.fuzzy_min_len || variant_len < self.config.fuzzy_min_len {
            return false;
        }
        if token.starts_with(variant) || variant.starts_with(token) {
            return false;
        }

        strsim::normalized_levenshtein(token, variant) >= self.config.fuzzy_similarity
    }
}

impl Default for SubscriptionMatcher {
    fn default() -> Self {
        Self::new(MatchConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_variants_pure_function() {
        let first = channel_variants("Tech Channel", false);
        let second = channel_variants("Tech Channel", false);
        assert_eq!(first, second);
    }

    #[test]
    fn test_channel_variants_contents() {
        let variants = channel_variants("NewsTV", false);

        assert!(variants.contains("newstv"));
        assert!(variants.contains("newstv.com"));
        assert!(variants.contains("@newstv"));
        // Trailing TV decoration stripped
        assert!(variants.contains("news"));
    }

    #[test]
    fn test_channel_variants_first_token_only() {
        let variants = channel_variants("Tech Channel XYZ", true);

        assert!(variants.contains("tech"));
        assert!(variants.contains("@tech"));
        assert!(!variants.iter().any(|v| v.contains("channel")));
    }

    #[test]
    fn test_multiword_phrase_is_a_variant() {
        let variants = channel_variants("Tech Channel", false);
        assert!(variants.contains("tech channel"));
    }

    #[test]
    fn test_matcher_requires_both_conditions() {
        let matcher = SubscriptionMatcher::default();

        let only_channel = matcher.evaluate("Tech Channel XYZ videos playlists", "Tech Channel XYZ");
        assert!(only_channel.channel);
        assert!(!only_channel.subscription);
        assert!(!only_channel.is_match());

        let only_subscription = matcher.evaluate("Subscribed 10K subscribers", "Tech Channel XYZ");
        assert!(!only_subscription.channel);
        assert!(only_subscription.subscription);
        assert!(!only_subscription.is_match());
    }

    #[test]
    fn test_matcher_end_to_end_positive() {
        let matcher = SubscriptionMatcher::default();
        let outcome = matcher.evaluate(
            "Tech Channel XYZ · Subscribed · 10K subscribers",
            "Tech Channel XYZ",
        );
        assert!(outcome.is_match());
    }

    #[test]
    fn test_matcher_rejects_incomplete_subscribe() {
        let matcher = SubscriptionMatcher::default();
        let outcome = matcher.evaluate("Tech Channel XYZ · Subscribe", "Tech Channel XYZ");
        assert!(outcome.channel);
        assert!(!outcome.subscription);
        assert!(!outcome.is_match());
    }

    #[test]
    fn test_matcher_empty_text_is_false() {
        let matcher = SubscriptionMatcher::default();
        let outcome = matcher.evaluate("", "Tech Channel XYZ");
        assert!(!outcome.channel);
        assert!(!outcome.subscription);
        assert!(!outcome.is_match());

        let whitespace = matcher.evaluate("   \n\t ", "Tech Channel XYZ");
        assert!(!whitespace.is_match());
    }

    #[test]
    fn test_matcher_accepts_enumerated_misread() {
        let matcher = SubscriptionMatcher::default();
        let outcome = matcher.evaluate("Tech Channel XYZ subsoribed", "Tech Channel XYZ");
        assert!(outcome.is_match());
    }

    #[test]
    fn test_matcher_accepts_unseen_misread_via_fuzzy() {
        let matcher = SubscriptionMatcher::default();
        // "subscr1bed" is not in the enumerated list; one substitution away
        let outcome = matcher.evaluate("Tech Channel XYZ subscr1bed", "Tech Channel XYZ");
        assert!(outcome.subscription);
    }

    #[test]
    fn test_matcher_arabic_confirmation() {
        let matcher = SubscriptionMatcher::default();
        let outcome = matcher.evaluate("قناة Tech تم الاشتراك", "Tech");
        assert!(outcome.is_match());
    }

    #[test]
    fn test_matcher_russian_confirmation() {
        let matcher = SubscriptionMatcher::default();
        let outcome = matcher.evaluate("Tech Вы подписаны", "Tech");
        assert!(outcome.is_match());
    }

    #[test]
    fn test_matcher_handle_and_domain_tokens() {
        let matcher = SubscriptionMatcher::default();

        let handle = matcher.evaluate("@techchannel Subscribed", "TechChannel");
        assert!(handle.is_match());

        let domain = matcher.evaluate("techchannel.com Subscribed", "TechChannel");
        assert!(domain.is_match());
    }

    #[test]
    fn test_substring_policy_is_more_permissive() {
        let whole = SubscriptionMatcher::new(MatchConfig::default());
        let substring = SubscriptionMatcher::new(MatchConfig {
            policy: MatchPolicy::Substring,
            ..MatchConfig::default()
        });

        // Channel name embedded inside a longer token
        let text = "xtechx Subscribed";
        assert!(!whole.evaluate(text, "tech").channel);
        assert!(substring.evaluate(text, "tech").channel);
    }

    #[test]
    fn test_concatenating_more_text_never_unmatches() {
        let matcher = SubscriptionMatcher::default();
        let base = "Tech Channel XYZ Subscribed";
        assert!(matcher.evaluate(base, "Tech Channel XYZ").is_match());

        let extended = format!("{} {}", base, "random trailing garbage from another backend");
        assert!(matcher.evaluate(&extended, "Tech Channel XYZ").is_match());
    }
}
