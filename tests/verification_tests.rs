//! # Verification Pipeline Tests
//!
//! End-to-end tests of the verification entry point's failure contract:
//! whatever goes wrong inside, the caller gets an outcome, never a panic or
//! an error. OCR engines are not required; the scenarios exercise the paths
//! in front of text extraction plus the decision stage.

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tube_rewards::ocr_config::OcrConfig;
    use tube_rewards::text_processing::MatchConfig;
    use tube_rewards::verification::{SubscriptionVerifier, VerificationOutcome};

    fn verifier() -> SubscriptionVerifier {
        SubscriptionVerifier::new(OcrConfig::default(), MatchConfig::default())
            .expect("verifier construction should succeed")
    }

    /// A missing file yields an outcome, not an error
    #[tokio::test]
    async fn test_missing_file_yields_unavailable() {
        let outcome = verifier()
            .verify("definitely-not-a-file.png", "Tech Channel XYZ")
            .await;
        assert_eq!(outcome, VerificationOutcome::OcrUnavailable);
    }

    /// A corrupt image yields an outcome, not a panic
    #[tokio::test]
    async fn test_corrupt_image_yields_unavailable() {
        let mut temp = tempfile::Builder::new()
            .suffix(".png")
            .tempfile()
            .expect("temp file creation should succeed");
        temp.write_all(b"<html>this is not an image</html>")
            .expect("write should succeed");

        let outcome = verifier()
            .verify(&temp.path().to_string_lossy(), "Tech Channel XYZ")
            .await;
        assert_eq!(outcome, VerificationOutcome::OcrUnavailable);
    }

    /// An empty file is rejected by validation, again without an error
    #[tokio::test]
    async fn test_empty_file_yields_unavailable() {
        let temp = tempfile::NamedTempFile::new().expect("temp file creation should succeed");
        let outcome = verifier()
            .verify(&temp.path().to_string_lossy(), "Tech Channel XYZ")
            .await;
        assert_eq!(outcome, VerificationOutcome::OcrUnavailable);
    }

    /// The decision stage maps match results onto the widened outcome enum
    #[test]
    fn test_outcome_mapping() {
        let v = verifier();

        assert_eq!(
            v.evaluate_text("Tech Channel XYZ · Subscribed", "Tech Channel XYZ"),
            VerificationOutcome::Matched
        );
        assert_eq!(
            v.evaluate_text("Unrelated Channel · Subscribed", "Tech Channel XYZ"),
            VerificationOutcome::NoChannelMatch
        );
        assert_eq!(
            v.evaluate_text("Tech Channel XYZ · Subscribe", "Tech Channel XYZ"),
            VerificationOutcome::NoSubscriptionMatch
        );
        assert_eq!(
            v.evaluate_text("", "Tech Channel XYZ"),
            VerificationOutcome::OcrUnavailable
        );
    }

    /// Only `Matched` awards the point
    #[test]
    fn test_only_matched_is_a_match() {
        assert!(VerificationOutcome::Matched.is_match());
        assert!(!VerificationOutcome::NoChannelMatch.is_match());
        assert!(!VerificationOutcome::NoSubscriptionMatch.is_match());
        assert!(!VerificationOutcome::OcrUnavailable.is_match());
    }

    /// Outcome labels are stable (they feed metrics and logs)
    #[test]
    fn test_outcome_labels() {
        assert_eq!(VerificationOutcome::Matched.as_str(), "matched");
        assert_eq!(
            VerificationOutcome::NoChannelMatch.as_str(),
            "no_channel_match"
        );
        assert_eq!(
            VerificationOutcome::NoSubscriptionMatch.as_str(),
            "no_subscription_match"
        );
        assert_eq!(
            VerificationOutcome::OcrUnavailable.as_str(),
            "ocr_unavailable"
        );
    }
}
