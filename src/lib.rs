//! # TubeRewards Telegram Bot
//!
//! A Telegram bot that rewards users with points for subscribing to YouTube
//! channels. Subscriptions are verified by running OCR over user-submitted
//! screenshots and fuzzy-matching the extracted text against the channel name
//! and a multilingual "Subscribed" lexicon.

pub mod bot;
pub mod circuit_breaker;
pub mod config;
pub mod db;
pub mod dialogue;
pub mod errors;
pub mod hosted_ocr;
pub mod instance_manager;
pub mod localization;
pub mod mailer;
pub mod observability;
pub mod ocr;
pub mod ocr_config;
pub mod ocr_errors;
pub mod pending;
pub mod preprocessing;
pub mod text_processing;
pub mod validation;
pub mod verification;
pub mod youtube;

// Re-export types for easier access
pub use text_processing::{MatchConfig, MatchOutcome, MatchPolicy, SubscriptionMatcher};
pub use verification::{SubscriptionVerifier, VerificationOutcome};
