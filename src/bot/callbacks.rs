//! Callback query handling: task submission buttons, task-list pagination,
//! channel selection for payment, and admin withdrawal processing.

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::MaybeInaccessibleMessage;
use tracing::{debug, warn};

use crate::db;
use crate::dialogue::{BotDialogue, BotDialogueState};
use crate::localization::{t_args_lang, t_lang};
use crate::pending::PendingSubmission;

use super::command_handlers::{send_links_page, send_withdrawals_page};
use super::HandlerDeps;

/// Handle all inline keyboard callbacks
pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    deps: Arc<HandlerDeps>,
    dialogue: BotDialogue,
) -> Result<()> {
    bot.answer_callback_query(q.id.clone()).await?;

    let data = match q.data.as_deref() {
        Some(data) => data.to_string(),
        None => return Ok(()),
    };

    let user_id = q.from.id.0 as i64;
    let language_code = q.from.language_code.as_deref();

    let (chat_id, message_id) = match &q.message {
        Some(MaybeInaccessibleMessage::Regular(msg)) => (msg.chat.id, Some(msg.id)),
        Some(MaybeInaccessibleMessage::Inaccessible(_)) | None => {
            (ChatId::from(q.from.id), None)
        }
    };

    // Banned users get nothing past this point
    if db::is_banned(&deps.pool, user_id).await.unwrap_or(false) {
        bot.send_message(
            chat_id,
            t_lang(&deps.localization, "access-revoked", language_code),
        )
        .await?;
        return Ok(());
    }

    debug!(user_id = %user_id, data = %data, "Handling callback query");

    if let Some(link_id) = data.strip_prefix("submit_") {
        handle_submit_callback(
            &bot,
            &deps,
            chat_id,
            user_id,
            language_code,
            link_id.parse().unwrap_or(0),
        )
        .await?;
    } else if let Some(page) = data
        .strip_prefix("prev_")
        .or_else(|| data.strip_prefix("next_"))
    {
        let page = page.parse().unwrap_or(0);
        send_links_page(&bot, &deps, chat_id, user_id, language_code, page).await?;
        // Replace the old navigation row; the deletion is best-effort
        if let Some(message_id) = message_id {
            let _ = bot.delete_message(chat_id, message_id).await;
        }
    } else if let Some(description) = data.strip_prefix("channel_") {
        bot.send_message(
            chat_id,
            t_lang(&deps.localization, "payment-enter-id", language_code),
        )
        .await?;
        dialogue
            .update(BotDialogueState::AwaitingPaymentId {
                channel_description: description.to_string(),
            })
            .await?;
    } else if let Some(withdrawal_id) = data.strip_prefix("approve_") {
        handle_approve_callback(
            &bot,
            &deps,
            chat_id,
            user_id,
            language_code,
            withdrawal_id.parse().unwrap_or(0),
        )
        .await?;
    } else if let Some(page) = data.strip_prefix("wpage_") {
        if deps.config.is_admin(user_id) {
            let page = page.parse().unwrap_or(0);
            send_withdrawals_page(&bot, &deps, chat_id, language_code, page).await?;
            if let Some(message_id) = message_id {
                let _ = bot.delete_message(chat_id, message_id).await;
            }
        }
    } else {
        warn!(data = %data, "Unknown callback data");
    }

    Ok(())
}

/// A "Submit Image" button was pressed: record the pending submission and
/// prompt for the screenshot
async fn handle_submit_callback(
    bot: &Bot,
    deps: &Arc<HandlerDeps>,
    chat_id: ChatId,
    user_id: i64,
    language_code: Option<&str>,
    link_id: i64,
) -> Result<()> {
    let message_id = match db::get_message_id(&deps.pool, user_id, chat_id.0, link_id).await? {
        Some(message_id) => message_id,
        None => {
            bot.send_message(
                chat_id,
                t_lang(&deps.localization, "session-expired", language_code),
            )
            .await?;
            return Ok(());
        }
    };

    let link = match db::get_link(&deps.pool, link_id).await? {
        Some(link) => link,
        None => {
            bot.send_message(
                chat_id,
                t_lang(&deps.localization, "link-unavailable", language_code),
            )
            .await?;
            return Ok(());
        }
    };

    deps.pending.insert(
        user_id,
        PendingSubmission {
            link_id,
            chat_id: chat_id.0,
            message_id,
            description: link.description.clone(),
        },
    );

    bot.send_message(
        chat_id,
        t_args_lang(
            &deps.localization,
            "submit-prompt",
            &[("description", link.description.as_str())],
            language_code,
        ),
    )
    .await?;
    Ok(())
}

/// An admin pressed a withdrawal row: mark it sent and notify the user
async fn handle_approve_callback(
    bot: &Bot,
    deps: &Arc<HandlerDeps>,
    chat_id: ChatId,
    user_id: i64,
    language_code: Option<&str>,
    withdrawal_id: i64,
) -> Result<()> {
    if !deps.config.is_admin(user_id) {
        bot.send_message(
            chat_id,
            t_lang(&deps.localization, "admin-denied", language_code),
        )
        .await?;
        return Ok(());
    }

    let withdrawal = match db::get_withdrawal(&deps.pool, withdrawal_id).await? {
        Some(withdrawal) => withdrawal,
        None => {
            bot.send_message(
                chat_id,
                t_lang(&deps.localization, "wd-not-found", language_code),
            )
            .await?;
            return Ok(());
        }
    };

    if !db::mark_withdrawal_processed(&deps.pool, withdrawal_id).await? {
        bot.send_message(
            chat_id,
            t_lang(&deps.localization, "wd-not-found", language_code),
        )
        .await?;
        return Ok(());
    }

    bot.send_message(
        chat_id,
        t_lang(&deps.localization, "wd-marked-sent", language_code),
    )
    .await?;

    // Notify the requester; their chat may be closed, so this is best-effort
    let notice = t_args_lang(
        &deps.localization,
        "withdraw-processed-notice",
        &[("amount", withdrawal.amount.to_string().as_str())],
        None,
    );
    if let Err(e) = bot
        .send_message(ChatId(withdrawal.telegram_id), notice)
        .await
    {
        warn!(
            telegram_id = withdrawal.telegram_id,
            error = %e,
            "Could not notify user about processed withdrawal"
        );
    }

    Ok(())
}
