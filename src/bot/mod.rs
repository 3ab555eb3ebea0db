//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules for better organization:
//! - `callbacks`: inline keyboard callback handling (task submission,
//!   pagination, payment selection, withdrawal processing)
//! - `command_handlers`: slash commands and menu entry points
//! - `message_handler`: text dispatch and conversation state transitions
//! - `media_handlers`: photo uploads feeding the verification pipeline
//! - `ui_builder`: keyboards and message formatting

pub mod callbacks;
pub mod command_handlers;
pub mod media_handlers;
pub mod message_handler;
pub mod ui_builder;

use std::sync::Arc;

use sqlx::postgres::PgPool;

use crate::config::AppConfig;
use crate::localization::LocalizationManager;
use crate::mailer::Mailer;
use crate::pending::PendingSubmissions;
use crate::verification::SubscriptionVerifier;
use crate::youtube::YoutubeClient;

/// Shared dependencies handed to every handler through the dispatcher
pub struct HandlerDeps {
    pub pool: Arc<PgPool>,
    pub localization: Arc<LocalizationManager>,
    pub config: Arc<AppConfig>,
    pub verifier: Arc<SubscriptionVerifier>,
    pub pending: Arc<PendingSubmissions>,
    pub youtube: Arc<YoutubeClient>,
    /// Absent when SMTP is not configured; registration then skips the
    /// confirmation-code step
    pub mailer: Option<Arc<Mailer>>,
}

// Re-export main handler functions for use in main.rs
pub use callbacks::callback_handler;
pub use message_handler::message_handler;
