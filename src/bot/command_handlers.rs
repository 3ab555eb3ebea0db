//! Command Handlers module for processing bot commands and menu entry points

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::debug;

use crate::db;
use crate::dialogue::{BotDialogue, BotDialogueState};
use crate::errors::error_logging;
use crate::localization::{t_args_lang, t_lang};

use super::ui_builder::{
    self, LINKS_PER_PAGE, WITHDRAWALS_PER_PAGE,
};
use super::HandlerDeps;

/// Handle the /start command: welcome plus the main menu
pub async fn handle_start_command(
    bot: &Bot,
    msg: &Message,
    deps: &Arc<HandlerDeps>,
    language_code: Option<&str>,
) -> Result<()> {
    let first_name = msg
        .from
        .as_ref()
        .map(|user| user.first_name.clone())
        .unwrap_or_default();
    let user_id = msg.from.as_ref().map(|user| user.id.0 as i64).unwrap_or(0);

    let menu = ui_builder::create_main_menu(
        &deps.localization,
        language_code,
        deps.config.is_admin(user_id),
    );

    bot.send_message(
        msg.chat.id,
        t_args_lang(
            &deps.localization,
            "welcome",
            &[("name", first_name.as_str())],
            language_code,
        ),
    )
    .reply_markup(menu)
    .await?;
    Ok(())
}

/// Show the main menu again
pub async fn handle_main_menu_command(
    bot: &Bot,
    msg: &Message,
    deps: &Arc<HandlerDeps>,
    language_code: Option<&str>,
) -> Result<()> {
    let user_id = msg.from.as_ref().map(|user| user.id.0 as i64).unwrap_or(0);
    bot.send_message(
        msg.chat.id,
        t_lang(&deps.localization, "main-menu-title", language_code),
    )
    .reply_markup(ui_builder::create_main_menu(
        &deps.localization,
        language_code,
        deps.config.is_admin(user_id),
    ))
    .await?;
    Ok(())
}

/// Start the registration conversation
pub async fn handle_register_command(
    bot: &Bot,
    msg: &Message,
    deps: &Arc<HandlerDeps>,
    dialogue: &BotDialogue,
    language_code: Option<&str>,
) -> Result<()> {
    let user_id = match msg.from.as_ref() {
        Some(user) => user.id.0 as i64,
        None => return Ok(()),
    };

    if db::is_registered(&deps.pool, user_id).await? {
        bot.send_message(
            msg.chat.id,
            t_lang(&deps.localization, "already-registered", language_code),
        )
        .await?;
        return Ok(());
    }

    bot.send_message(
        msg.chat.id,
        t_lang(&deps.localization, "register-enter-email", language_code),
    )
    .await?;
    dialogue.update(BotDialogueState::AwaitingEmail).await?;
    Ok(())
}

/// Show the user's profile
pub async fn handle_profile_command(
    bot: &Bot,
    msg: &Message,
    deps: &Arc<HandlerDeps>,
    language_code: Option<&str>,
) -> Result<()> {
    let user_id = match msg.from.as_ref() {
        Some(user) => user.id.0 as i64,
        None => return Ok(()),
    };

    debug!(user_id = %user_id, "Handling profile command");

    match db::get_user_by_telegram_id(&deps.pool, user_id).await? {
        Some(user) => {
            let profile = ui_builder::format_profile(&deps.localization, language_code, &user);
            bot.send_message(msg.chat.id, profile).await?;
        }
        None => {
            bot.send_message(
                msg.chat.id,
                t_lang(&deps.localization, "profile-not-found", language_code),
            )
            .await?;
        }
    }
    Ok(())
}

/// Show the first page of available task links
pub async fn handle_view_links_command(
    bot: &Bot,
    msg: &Message,
    deps: &Arc<HandlerDeps>,
    language_code: Option<&str>,
) -> Result<()> {
    let user_id = match msg.from.as_ref() {
        Some(user) => user.id.0 as i64,
        None => return Ok(()),
    };

    if !db::is_registered(&deps.pool, user_id).await? {
        bot.send_message(
            msg.chat.id,
            t_lang(&deps.localization, "register-first", language_code),
        )
        .await?;
        return Ok(());
    }

    send_links_page(bot, deps, msg.chat.id, user_id, language_code, 0).await
}

/// Send one page of task links, each with its submit button, then the
/// pagination row when more pages exist
pub async fn send_links_page(
    bot: &Bot,
    deps: &Arc<HandlerDeps>,
    chat_id: ChatId,
    user_id: i64,
    language_code: Option<&str>,
    page: i64,
) -> Result<()> {
    let (links, total_pages) =
        db::list_available_links(&deps.pool, user_id, page, LINKS_PER_PAGE).await?;

    if links.is_empty() {
        bot.send_message(
            chat_id,
            t_lang(&deps.localization, "links-none", language_code),
        )
        .await?;
        return Ok(());
    }

    for link in &links {
        let text = ui_builder::format_link_entry(&deps.localization, language_code, link);
        let keyboard = teloxide::types::InlineKeyboardMarkup::new(vec![vec![
            teloxide::types::InlineKeyboardButton::callback(
                t_lang(&deps.localization, "submit-image-button", language_code),
                format!("submit_{}", link.id),
            ),
        ]]);

        let message = bot.send_message(chat_id, text).reply_markup(keyboard).await?;

        // Track the message so the upload prompt can thread back to it
        if let Err(e) =
            db::store_message_id(&deps.pool, user_id, chat_id.0, link.id, message.id.0).await
        {
            error_logging::log_database_error(&e, "store_message_id", Some(user_id));
        }
    }

    if let Some(keyboard) = ui_builder::create_links_pagination_keyboard(
        &deps.localization,
        language_code,
        page,
        total_pages,
    ) {
        bot.send_message(
            chat_id,
            t_lang(&deps.localization, "links-navigate", language_code),
        )
        .reply_markup(keyboard)
        .await?;
    }

    Ok(())
}

/// List the user's channels as inline buttons for payment-ID attachment
pub async fn handle_my_channels_command(
    bot: &Bot,
    msg: &Message,
    deps: &Arc<HandlerDeps>,
    language_code: Option<&str>,
) -> Result<()> {
    let user_id = match msg.from.as_ref() {
        Some(user) => user.id.0 as i64,
        None => return Ok(()),
    };

    if !db::is_registered(&deps.pool, user_id).await? {
        bot.send_message(
            msg.chat.id,
            t_lang(&deps.localization, "register-first", language_code),
        )
        .await?;
        return Ok(());
    }

    let links = db::list_user_links(&deps.pool, user_id).await?;
    if links.is_empty() {
        bot.send_message(
            msg.chat.id,
            t_lang(&deps.localization, "channels-empty", language_code),
        )
        .await?;
        return Ok(());
    }

    let keyboard = ui_builder::create_channels_keyboard(&deps.localization, language_code, &links);
    bot.send_message(
        msg.chat.id,
        t_lang(&deps.localization, "channels-title", language_code),
    )
    .reply_markup(keyboard)
    .await?;
    Ok(())
}

/// List the user's paid channels with their like counters
pub async fn handle_my_channels_paid_command(
    bot: &Bot,
    msg: &Message,
    deps: &Arc<HandlerDeps>,
    language_code: Option<&str>,
) -> Result<()> {
    let user_id = match msg.from.as_ref() {
        Some(user) => user.id.0 as i64,
        None => return Ok(()),
    };

    if !db::is_registered(&deps.pool, user_id).await? {
        bot.send_message(
            msg.chat.id,
            t_lang(&deps.localization, "register-first", language_code),
        )
        .await?;
        return Ok(());
    }

    let channels = db::list_user_links_with_likes(&deps.pool, user_id).await?;
    if channels.is_empty() {
        bot.send_message(
            msg.chat.id,
            t_lang(&deps.localization, "channels-paid-empty", language_code),
        )
        .await?;
        return Ok(());
    }

    let mut response = vec![t_lang(&deps.localization, "channels-paid-title", language_code)];
    for (index, (link, likes)) in channels.iter().enumerate() {
        response.push(ui_builder::format_paid_channel_entry(
            &deps.localization,
            language_code,
            index + 1,
            link,
            *likes,
        ));
    }

    // Split long messages to stay under the Telegram message limit
    for chunk in ui_builder::split_message(&response.join("\n\n")) {
        bot.send_message(msg.chat.id, chunk).await?;
    }
    Ok(())
}

/// Start the withdrawal conversation
pub async fn handle_withdraw_command(
    bot: &Bot,
    msg: &Message,
    deps: &Arc<HandlerDeps>,
    dialogue: &BotDialogue,
    language_code: Option<&str>,
) -> Result<()> {
    let user_id = match msg.from.as_ref() {
        Some(user) => user.id.0 as i64,
        None => return Ok(()),
    };

    let user = match db::get_user_by_telegram_id(&deps.pool, user_id).await? {
        Some(user) => user,
        None => {
            bot.send_message(
                msg.chat.id,
                t_lang(&deps.localization, "register-first", language_code),
            )
            .await?;
            return Ok(());
        }
    };

    bot.send_message(
        msg.chat.id,
        t_args_lang(
            &deps.localization,
            "withdraw-enter-amount",
            &[
                ("balance", user.points.to_string().as_str()),
                (
                    "minimum",
                    deps.config.min_withdrawal_points.to_string().as_str(),
                ),
            ],
            language_code,
        ),
    )
    .await?;
    dialogue
        .update(BotDialogueState::AwaitingWithdrawalAmount)
        .await?;
    Ok(())
}

/// Show the admin panel keyboard (admins only)
pub async fn handle_admin_panel_command(
    bot: &Bot,
    msg: &Message,
    deps: &Arc<HandlerDeps>,
    language_code: Option<&str>,
) -> Result<()> {
    let user_id = msg.from.as_ref().map(|user| user.id.0 as i64).unwrap_or(0);

    if !deps.config.is_admin(user_id) {
        bot.send_message(
            msg.chat.id,
            t_lang(&deps.localization, "admin-denied", language_code),
        )
        .await?;
        return Ok(());
    }

    bot.send_message(
        msg.chat.id,
        t_lang(&deps.localization, "admin-panel-title", language_code),
    )
    .reply_markup(ui_builder::create_admin_panel_menu(
        &deps.localization,
        language_code,
    ))
    .await?;
    Ok(())
}

/// Show a page of pending withdrawals to an admin
pub async fn send_withdrawals_page(
    bot: &Bot,
    deps: &Arc<HandlerDeps>,
    chat_id: ChatId,
    language_code: Option<&str>,
    page: i64,
) -> Result<()> {
    let (withdrawals, total_pages) =
        db::list_withdrawals(&deps.pool, "pending", page, WITHDRAWALS_PER_PAGE).await?;

    if withdrawals.is_empty() {
        bot.send_message(
            chat_id,
            t_lang(&deps.localization, "wd-empty", language_code),
        )
        .await?;
        return Ok(());
    }

    let header = t_args_lang(
        &deps.localization,
        "wd-list-title",
        &[
            ("page", (page + 1).to_string().as_str()),
            ("pages", total_pages.to_string().as_str()),
        ],
        language_code,
    );
    let body = withdrawals
        .iter()
        .map(ui_builder::format_withdrawal_entry)
        .collect::<Vec<_>>()
        .join("\n\n");

    let keyboard = ui_builder::create_withdrawals_keyboard(
        &deps.localization,
        language_code,
        &withdrawals,
        page,
        total_pages,
    );

    bot.send_message(chat_id, format!("{}\n\n{}", header, body))
        .reply_markup(keyboard)
        .await?;
    Ok(())
}
