//! Media Handlers module: photo uploads feeding the verification pipeline.
//!
//! A photo only means something when the user has a pending submission. The
//! flow mirrors the submission contract: download the photo to a temp file,
//! run the verification pipeline, award the point on a match, and in every
//! case delete the temp file and clear the pending entry so a stale upload
//! cannot satisfy a later task.

use anyhow::Result;
use std::io::Write;
use std::sync::Arc;
use teloxide::prelude::*;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::db;
use crate::errors::error_logging;
use crate::localization::t_lang;
use crate::observability;
use crate::verification::VerificationOutcome;

use super::HandlerDeps;

/// RAII guard for temporary files that ensures cleanup on drop
pub struct TempFileGuard {
    path: String,
}

impl TempFileGuard {
    fn new(path: String) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl std::fmt::Display for TempFileGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path)
    }
}

impl AsRef<std::path::Path> for TempFileGuard {
    fn as_ref(&self) -> &std::path::Path {
        std::path::Path::new(&self.path)
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            error_logging::log_filesystem_error(&e, "cleanup_temp_file", Some(&self.path));
        } else {
            debug!(path = %self.path, "Temporary file cleaned up successfully in drop");
        }
    }
}

/// Download a Telegram file to a guarded temp path
pub async fn download_file(
    bot: &Bot,
    file_id: teloxide::types::FileId,
    max_file_size: u64,
) -> Result<TempFileGuard> {
    let file = bot.get_file(file_id).await?;
    let file_path = file.path;
    let url = format!(
        "https://api.telegram.org/file/bot{}/{}",
        bot.token(),
        file_path
    );

    let response = reqwest::get(&url).await?;

    // Check Content-Length header to prevent downloading oversized files
    if let Some(content_length) = response.content_length() {
        if content_length > max_file_size {
            return Err(anyhow::anyhow!(
                "File too large: {} bytes (maximum allowed: {} bytes)",
                content_length,
                max_file_size
            ));
        }
    }

    let bytes = response.bytes().await?;

    let mut temp_file = NamedTempFile::new()?;
    temp_file.as_file_mut().write_all(&bytes)?;
    let path = temp_file.path().to_string_lossy().to_string();

    // The NamedTempFile is forgotten here; the guard owns cleanup from now on
    std::mem::forget(temp_file);
    Ok(TempFileGuard::new(path))
}

/// Handle an incoming photo message
pub async fn handle_photo_message(
    bot: &Bot,
    msg: &Message,
    deps: &Arc<HandlerDeps>,
    language_code: Option<&str>,
) -> Result<()> {
    let user_id = match msg.from.as_ref() {
        Some(user) => user.id.0 as i64,
        None => return Ok(()),
    };

    debug!(user_id = %user_id, "Received photo message from user");

    // A photo without a pending submission is an error from the user's side
    let submission = match deps.pending.get(user_id) {
        Some(submission) => submission,
        None => {
            bot.send_message(
                msg.chat.id,
                t_lang(&deps.localization, "verify-no-submission", language_code),
            )
            .await?;
            return Ok(());
        }
    };

    let largest_photo = match msg.photo().and_then(|photos| photos.last()) {
        Some(photo) => photo,
        None => return Ok(()),
    };

    let result = process_photo_submission(
        bot,
        msg,
        deps,
        language_code,
        user_id,
        &submission,
        largest_photo.file.id.clone(),
    )
    .await;

    // The pending entry is consumed regardless of outcome; a failed attempt
    // requires re-triggering the submission from the task list
    deps.pending.take(user_id);

    if let Err(e) = result {
        error_logging::log_internal_error(&e, "media_handlers", "process_photo_submission", Some(user_id));
        bot.send_message(
            msg.chat.id,
            t_lang(&deps.localization, "verify-processing-error", language_code),
        )
        .await?;
    }

    Ok(())
}

async fn process_photo_submission(
    bot: &Bot,
    msg: &Message,
    deps: &Arc<HandlerDeps>,
    language_code: Option<&str>,
    user_id: i64,
    submission: &crate::pending::PendingSubmission,
    file_id: teloxide::types::FileId,
) -> Result<()> {
    let temp_file_guard =
        match download_file(bot, file_id, crate::ocr_config::MAX_FILE_SIZE).await {
            Ok(guard) => {
                debug!(user_id = %user_id, temp_path = %guard, "Image downloaded successfully");
                guard
            }
            Err(e) => {
                error_logging::log_network_error(&e, "download_image_file", None, None);
                bot.send_message(
                    msg.chat.id,
                    t_lang(&deps.localization, "verify-unavailable", language_code),
                )
                .await?;
                return Ok(());
            }
        };

    let processing_msg = bot
        .send_message(
            msg.chat.id,
            t_lang(&deps.localization, "verify-in-progress", language_code),
        )
        .await?;

    let outcome = deps
        .verifier
        .verify(temp_file_guard.path(), &submission.description)
        .await;

    match outcome {
        VerificationOutcome::Matched => {
            // Upsert the processed flag, then the two counters. The upsert
            // means a repeated verification cannot double-mark the pair.
            let channel_id = db::get_link(&deps.pool, submission.link_id)
                .await?
                .map(|link| link.channel_id)
                .unwrap_or_default();

            db::mark_link_processed(&deps.pool, user_id, submission.link_id, &channel_id).await?;
            db::add_points(&deps.pool, user_id, 1).await?;
            db::increment_link_likes(&deps.pool, submission.link_id).await?;
            observability::record_points_awarded(1);

            info!(
                user_id = %user_id,
                link_id = %submission.link_id,
                "Subscription verified, point awarded"
            );

            bot.send_message(
                msg.chat.id,
                t_lang(&deps.localization, "verify-success", language_code),
            )
            .await?;
        }
        VerificationOutcome::NoChannelMatch => {
            warn!(user_id = %user_id, link_id = %submission.link_id, "Verification failed: channel not found");
            bot.send_message(
                msg.chat.id,
                t_lang(&deps.localization, "verify-no-channel", language_code),
            )
            .await?;
        }
        VerificationOutcome::NoSubscriptionMatch => {
            warn!(user_id = %user_id, link_id = %submission.link_id, "Verification failed: no subscription confirmation");
            bot.send_message(
                msg.chat.id,
                t_lang(&deps.localization, "verify-no-subscription", language_code),
            )
            .await?;
        }
        VerificationOutcome::OcrUnavailable => {
            warn!(user_id = %user_id, link_id = %submission.link_id, "Verification failed: OCR unavailable");
            bot.send_message(
                msg.chat.id,
                t_lang(&deps.localization, "verify-unavailable", language_code),
            )
            .await?;
        }
    }

    // Remove the transient "verifying" notice; failures here are harmless
    let _ = bot.delete_message(msg.chat.id, processing_msg.id).await;

    Ok(())
}
