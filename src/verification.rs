//! # Subscription Verification Module
//!
//! The top-level pipeline gluing preprocessing, OCR extraction, and the
//! match decision together. The single entry point is
//! [`SubscriptionVerifier::verify`], which never fails: every internal
//! error — unreadable upload, engine crash, timeout, exhausted API budget —
//! collapses into [`VerificationOutcome::OcrUnavailable`]. The bot layer
//! only ever branches on the outcome.

use std::time::Instant;

use tracing::{info, warn};

use crate::circuit_breaker::CircuitBreaker;
use crate::errors::error_logging;
use crate::observability;
use crate::ocr::OcrPipeline;
use crate::ocr_config::OcrConfig;
use crate::preprocessing;
use crate::text_processing::{MatchConfig, SubscriptionMatcher};

/// Result of a verification attempt.
///
/// Wider than the boolean the database layer consumes so the bot can give
/// precise feedback. Note that `OcrUnavailable` is intentionally
/// indistinguishable from a non-match at the persistence layer: no state
/// changes on anything but `Matched`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// Channel name and subscription confirmation both found
    Matched,
    /// The expected channel name was not found in the extracted text
    NoChannelMatch,
    /// The channel was found but no subscription confirmation
    NoSubscriptionMatch,
    /// No usable OCR text was produced (bad upload, engine failures,
    /// timeouts, exhausted budgets)
    OcrUnavailable,
}

impl VerificationOutcome {
    /// Whether this outcome awards the point
    pub fn is_match(&self) -> bool {
        matches!(self, VerificationOutcome::Matched)
    }

    /// Stable label for logging and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationOutcome::Matched => "matched",
            VerificationOutcome::NoChannelMatch => "no_channel_match",
            VerificationOutcome::NoSubscriptionMatch => "no_subscription_match",
            VerificationOutcome::OcrUnavailable => "ocr_unavailable",
        }
    }
}

/// The assembled verification pipeline
pub struct SubscriptionVerifier {
    pipeline: OcrPipeline,
    matcher: SubscriptionMatcher,
    circuit_breaker: CircuitBreaker,
}

impl SubscriptionVerifier {
    /// Build the verifier from OCR and matching configuration
    pub fn new(ocr_config: OcrConfig, match_config: MatchConfig) -> anyhow::Result<Self> {
        ocr_config
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid OCR configuration: {}", e))?;
        match_config
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid match configuration: {}", e))?;

        let circuit_breaker = CircuitBreaker::new(ocr_config.recovery.clone());
        let pipeline = OcrPipeline::new(ocr_config)?;

        Ok(Self {
            pipeline,
            matcher: SubscriptionMatcher::new(match_config),
            circuit_breaker,
        })
    }

    /// Decide an outcome from already-extracted OCR text.
    ///
    /// Separated from [`verify`](Self::verify) so the decision logic is
    /// testable without OCR engines installed.
    pub fn evaluate_text(&self, ocr_text: &str, target_phrase: &str) -> VerificationOutcome {
        if ocr_text.trim().is_empty() {
            return VerificationOutcome::OcrUnavailable;
        }

        let outcome = self.matcher.evaluate(ocr_text, target_phrase);
        if outcome.is_match() {
            VerificationOutcome::Matched
        } else if !outcome.channel {
            VerificationOutcome::NoChannelMatch
        } else {
            VerificationOutcome::NoSubscriptionMatch
        }
    }

    /// Verify a screenshot against the expected channel phrase.
    ///
    /// The input file is read-only; the preprocessed variant lives in a
    /// temporary file that is deleted when extraction finishes.
    pub async fn verify(&self, image_path: &str, target_phrase: &str) -> VerificationOutcome {
        let start_time = Instant::now();

        if self.circuit_breaker.is_open() {
            warn!(image_path = %image_path, "Circuit breaker is open, rejecting verification request");
            observability::record_verification_outcome("circuit_open", start_time.elapsed());
            return VerificationOutcome::OcrUnavailable;
        }

        let outcome = self.verify_inner(image_path, target_phrase).await;

        observability::record_verification_outcome(outcome.as_str(), start_time.elapsed());
        info!(
            image_path = %image_path,
            outcome = outcome.as_str(),
            duration_ms = start_time.elapsed().as_millis() as u64,
            "Verification completed"
        );
        outcome
    }

    async fn verify_inner(&self, image_path: &str, target_phrase: &str) -> VerificationOutcome {
        // Preprocess: ROI crop, grayscale, binarize. Failures here are bad
        // uploads, not backend failures, so the breaker is not touched.
        let config = self.pipeline.config();
        let processed = match preprocessing::preprocess_file(
            image_path,
            &config.roi,
            config.threshold,
        ) {
            Ok(image) => image,
            Err(e) => {
                error_logging::log_ocr_error(&e, "preprocess_image", None, None, None);
                return VerificationOutcome::OcrUnavailable;
            }
        };

        // The OCR backends read from a file, so park the preprocessed image
        // in a temp file that disappears when this scope ends.
        let temp = match tempfile::Builder::new().suffix(".png").tempfile() {
            Ok(temp) => temp,
            Err(e) => {
                error_logging::log_filesystem_error(&e, "create_preprocessed_temp", None);
                return VerificationOutcome::OcrUnavailable;
            }
        };
        if let Err(e) = processed.save(temp.path()) {
            error_logging::log_filesystem_error(
                &e,
                "save_preprocessed_temp",
                temp.path().to_str(),
            );
            return VerificationOutcome::OcrUnavailable;
        }

        let temp_path = temp.path().to_string_lossy().to_string();
        let ocr_text = match self.pipeline.extract_all_text(&temp_path).await {
            Ok(text) => {
                self.circuit_breaker.record_success();
                text
            }
            Err(e) => {
                self.circuit_breaker.record_failure();
                error_logging::log_ocr_error(&e, "extract_all_text", None, None, None);
                return VerificationOutcome::OcrUnavailable;
            }
        };

        self.evaluate_text(&ocr_text, target_phrase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_processing::MatchConfig;

    fn verifier() -> SubscriptionVerifier {
        SubscriptionVerifier::new(OcrConfig::default(), MatchConfig::default())
            .expect("verifier construction should succeed")
    }

    #[test]
    fn test_evaluate_text_outcomes() {
        let v = verifier();

        assert_eq!(
            v.evaluate_text("Tech Channel XYZ Subscribed", "Tech Channel XYZ"),
            VerificationOutcome::Matched
        );
        assert_eq!(
            v.evaluate_text("Subscribed to something else", "Tech Channel XYZ"),
            VerificationOutcome::NoChannelMatch
        );
        assert_eq!(
            v.evaluate_text("Tech Channel XYZ Subscribe", "Tech Channel XYZ"),
            VerificationOutcome::NoSubscriptionMatch
        );
        assert_eq!(
            v.evaluate_text("", "Tech Channel XYZ"),
            VerificationOutcome::OcrUnavailable
        );
    }

    #[tokio::test]
    async fn test_verify_unreadable_file_is_unavailable_not_panic() {
        let v = verifier();
        let outcome = v.verify("definitely-missing.png", "Tech Channel XYZ").await;
        assert_eq!(outcome, VerificationOutcome::OcrUnavailable);
    }

    #[tokio::test]
    async fn test_verify_corrupt_image_is_unavailable_not_panic() {
        use std::io::Write;

        let mut temp = tempfile::Builder::new()
            .suffix(".png")
            .tempfile()
            .expect("temp file creation should succeed");
        temp.write_all(b"this is not a png")
            .expect("write should succeed");

        let v = verifier();
        let outcome = v
            .verify(&temp.path().to_string_lossy(), "Tech Channel XYZ")
            .await;
        assert_eq!(outcome, VerificationOutcome::OcrUnavailable);
    }
}
