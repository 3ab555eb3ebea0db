//! Message Handler module: text dispatch and conversation state transitions.
//!
//! Incoming messages route through three layers: photos go straight to the
//! verification flow, an active dialogue state consumes the next input, and
//! everything else is matched against slash commands and the bilingual menu
//! labels.

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{debug, warn};

use crate::db;
use crate::dialogue::{BotDialogue, BotDialogueState, ChannelDraft};
use crate::errors::error_logging;
use crate::localization::{t_args_lang, t_lang};
use crate::mailer;
use crate::validation;
use crate::youtube;

use super::command_handlers;
use super::media_handlers;
use super::ui_builder;
use super::HandlerDeps;

/// Menu actions reachable from the reply keyboards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    Start,
    Register,
    SubmitChannel,
    ViewLinks,
    Profile,
    MyChannels,
    MyChannelsPaid,
    Withdraw,
    AdminPanel,
    MainMenu,
    AdminBanClient,
    AdminUnbanClient,
    AdminDeleteChannel,
    AdminWithdrawals,
}

/// Compare a message text against a label in every supported locale
fn matches_label(deps: &Arc<HandlerDeps>, text: &str, key: &str) -> bool {
    ["en", "ar"].iter().any(|locale| {
        deps.localization.get_message_in_language(key, locale, None) == text
    })
}

/// Resolve a menu button press (in either language) to its action
fn resolve_menu_action(deps: &Arc<HandlerDeps>, text: &str) -> Option<MenuAction> {
    const LABELS: &[(&str, MenuAction)] = &[
        ("menu-start", MenuAction::Start),
        ("menu-register", MenuAction::Register),
        ("menu-submit-channel", MenuAction::SubmitChannel),
        ("menu-view-links", MenuAction::ViewLinks),
        ("menu-profile", MenuAction::Profile),
        ("menu-my-channels", MenuAction::MyChannels),
        ("menu-my-channels-paid", MenuAction::MyChannelsPaid),
        ("menu-withdraw", MenuAction::Withdraw),
        ("menu-admin-panel", MenuAction::AdminPanel),
        ("menu-main-menu", MenuAction::MainMenu),
        ("admin-ban-client", MenuAction::AdminBanClient),
        ("admin-unban-client", MenuAction::AdminUnbanClient),
        ("admin-delete-channel", MenuAction::AdminDeleteChannel),
        ("admin-withdrawals", MenuAction::AdminWithdrawals),
    ];

    LABELS
        .iter()
        .find(|(key, _)| matches_label(deps, text, key))
        .map(|&(_, action)| action)
}

/// Whether this input is the universal cancel (command or button)
fn is_cancel(deps: &Arc<HandlerDeps>, text: &str) -> bool {
    text == "/cancel" || matches_label(deps, text, "cancel-button")
}

/// Main message entry point wired into the dispatcher
pub async fn message_handler(
    bot: Bot,
    msg: Message,
    deps: Arc<HandlerDeps>,
    dialogue: BotDialogue,
) -> Result<()> {
    let user = match msg.from.as_ref() {
        Some(user) => user.clone(),
        None => return Ok(()),
    };
    let user_id = user.id.0 as i64;
    let language_code = user.language_code.as_deref();
    let text = msg.text().map(|t| t.to_string());

    // /start and the Start button stay reachable for banned users, matching
    // the rest of the access-revoked UX
    let is_start_input = matches!(text.as_deref(), Some("/start"))
        || text
            .as_deref()
            .map(|t| matches_label(&deps, t, "menu-start"))
            .unwrap_or(false);

    if !is_start_input {
        let banned = db::is_banned(&deps.pool, user_id).await.unwrap_or(false);
        if banned {
            bot.send_message(
                msg.chat.id,
                t_lang(&deps.localization, "access-revoked", language_code),
            )
            .await?;
            return Ok(());
        }
    }

    // Photos feed the verification pipeline
    if msg.photo().is_some() {
        return media_handlers::handle_photo_message(&bot, &msg, &deps, language_code).await;
    }

    // Shared contacts only mean something while registration waits for one
    if msg.contact().is_some() {
        let state = dialogue.get().await?.unwrap_or_default();
        if let BotDialogueState::AwaitingPhone { email } = state {
            return handle_phone_step(&bot, &msg, &deps, &dialogue, language_code, email).await;
        }
        return Ok(());
    }

    let text = match text {
        Some(text) => text,
        None => return Ok(()),
    };

    // Universal cancel resets any conversation
    if is_cancel(&deps, &text) {
        dialogue.update(BotDialogueState::Idle).await?;
        bot.send_message(
            msg.chat.id,
            t_lang(&deps.localization, "operation-cancelled", language_code),
        )
        .reply_markup(ui_builder::create_main_menu(
            &deps.localization,
            language_code,
            deps.config.is_admin(user_id),
        ))
        .await?;
        return Ok(());
    }

    // An active dialogue consumes the next text input
    let state = dialogue.get().await?.unwrap_or_default();
    if !matches!(state, BotDialogueState::Idle) {
        return handle_dialogue_step(&bot, &msg, &deps, &dialogue, language_code, state, &text)
            .await;
    }

    dispatch_command_or_menu(&bot, &msg, &deps, &dialogue, language_code, &text).await
}

/// Route slash commands and menu labels
async fn dispatch_command_or_menu(
    bot: &Bot,
    msg: &Message,
    deps: &Arc<HandlerDeps>,
    dialogue: &BotDialogue,
    language_code: Option<&str>,
    text: &str,
) -> Result<()> {
    if text == "/help" {
        bot.send_message(
            msg.chat.id,
            t_lang(&deps.localization, "help-text", language_code),
        )
        .await?;
        return Ok(());
    }

    let action = match text {
        "/start" => Some(MenuAction::Start),
        "/register" => Some(MenuAction::Register),
        "/profile" => Some(MenuAction::Profile),
        "/viewlinks" => Some(MenuAction::ViewLinks),
        "/mychannels" => Some(MenuAction::MyChannels),
        "/mychannels_paid" => Some(MenuAction::MyChannelsPaid),
        "/withdraw" => Some(MenuAction::Withdraw),
        "/banclient" => Some(MenuAction::AdminBanClient),
        "/unbanclient" => Some(MenuAction::AdminUnbanClient),
        other => resolve_menu_action(deps, other),
    };

    match action {
        Some(MenuAction::Start) => {
            command_handlers::handle_start_command(bot, msg, deps, language_code).await
        }
        Some(MenuAction::Register) => {
            command_handlers::handle_register_command(bot, msg, deps, dialogue, language_code)
                .await
        }
        Some(MenuAction::SubmitChannel) => {
            handle_submit_channel_entry(bot, msg, deps, dialogue, language_code).await
        }
        Some(MenuAction::ViewLinks) => {
            command_handlers::handle_view_links_command(bot, msg, deps, language_code).await
        }
        Some(MenuAction::Profile) => {
            command_handlers::handle_profile_command(bot, msg, deps, language_code).await
        }
        Some(MenuAction::MyChannels) => {
            command_handlers::handle_my_channels_command(bot, msg, deps, language_code).await
        }
        Some(MenuAction::MyChannelsPaid) => {
            command_handlers::handle_my_channels_paid_command(bot, msg, deps, language_code).await
        }
        Some(MenuAction::Withdraw) => {
            command_handlers::handle_withdraw_command(bot, msg, deps, dialogue, language_code)
                .await
        }
        Some(MenuAction::AdminPanel) => {
            command_handlers::handle_admin_panel_command(bot, msg, deps, language_code).await
        }
        Some(MenuAction::MainMenu) => {
            command_handlers::handle_main_menu_command(bot, msg, deps, language_code).await
        }
        Some(MenuAction::AdminBanClient) => {
            handle_admin_prompt(
                bot,
                msg,
                deps,
                dialogue,
                language_code,
                "ban-enter-id",
                BotDialogueState::AwaitingBanTarget,
            )
            .await
        }
        Some(MenuAction::AdminUnbanClient) => {
            handle_admin_prompt(
                bot,
                msg,
                deps,
                dialogue,
                language_code,
                "unban-enter-id",
                BotDialogueState::AwaitingUnbanTarget,
            )
            .await
        }
        Some(MenuAction::AdminDeleteChannel) => {
            handle_admin_prompt(
                bot,
                msg,
                deps,
                dialogue,
                language_code,
                "delete-enter-description",
                BotDialogueState::AwaitingChannelDeletion,
            )
            .await
        }
        Some(MenuAction::AdminWithdrawals) => {
            let user_id = msg.from.as_ref().map(|u| u.id.0 as i64).unwrap_or(0);
            if !deps.config.is_admin(user_id) {
                bot.send_message(
                    msg.chat.id,
                    t_lang(&deps.localization, "admin-denied", language_code),
                )
                .await?;
                return Ok(());
            }
            command_handlers::send_withdrawals_page(bot, deps, msg.chat.id, language_code, 0).await
        }
        None => {
            bot.send_message(
                msg.chat.id,
                t_lang(&deps.localization, "menu-unknown", language_code),
            )
            .await?;
            Ok(())
        }
    }
}

/// Entry point of the channel submission conversation
async fn handle_submit_channel_entry(
    bot: &Bot,
    msg: &Message,
    deps: &Arc<HandlerDeps>,
    dialogue: &BotDialogue,
    language_code: Option<&str>,
) -> Result<()> {
    let user_id = msg.from.as_ref().map(|u| u.id.0 as i64).unwrap_or(0);

    if !db::is_registered(&deps.pool, user_id).await? {
        bot.send_message(
            msg.chat.id,
            t_lang(&deps.localization, "register-first", language_code),
        )
        .await?;
        return Ok(());
    }

    bot.send_message(
        msg.chat.id,
        t_lang(&deps.localization, "channel-enter-url", language_code),
    )
    .await?;
    dialogue.update(BotDialogueState::AwaitingChannelUrl).await?;
    Ok(())
}

/// Prompt for an admin input and move to the given state (admins only)
async fn handle_admin_prompt(
    bot: &Bot,
    msg: &Message,
    deps: &Arc<HandlerDeps>,
    dialogue: &BotDialogue,
    language_code: Option<&str>,
    prompt_key: &str,
    state: BotDialogueState,
) -> Result<()> {
    let user_id = msg.from.as_ref().map(|u| u.id.0 as i64).unwrap_or(0);

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
        t_lang(&deps.localization, prompt_key, language_code),
    )
    .await?;
    dialogue.update(state).await?;
    Ok(())
}

/// Route a text input into the active dialogue state
async fn handle_dialogue_step(
    bot: &Bot,
    msg: &Message,
    deps: &Arc<HandlerDeps>,
    dialogue: &BotDialogue,
    language_code: Option<&str>,
    state: BotDialogueState,
    text: &str,
) -> Result<()> {
    match state {
        BotDialogueState::AwaitingEmail => {
            handle_email_step(bot, msg, deps, dialogue, language_code, text).await
        }
        BotDialogueState::AwaitingEmailCode { email, code } => {
            handle_email_code_step(bot, msg, deps, dialogue, language_code, email, code, text)
                .await
        }
        BotDialogueState::AwaitingPhone { .. } => {
            // Text instead of a shared contact: repeat the contact prompt
            bot.send_message(
                msg.chat.id,
                t_lang(&deps.localization, "register-share-phone-prompt", language_code),
            )
            .reply_markup(ui_builder::create_contact_keyboard(
                &deps.localization,
                language_code,
            ))
            .await?;
            Ok(())
        }
        BotDialogueState::AwaitingChannelUrl => {
            handle_channel_url_step(bot, msg, deps, dialogue, language_code, text).await
        }
        BotDialogueState::AwaitingSubscriptionChoice { draft } => {
            handle_subscription_choice_step(bot, msg, deps, dialogue, language_code, draft, text)
                .await
        }
        BotDialogueState::AwaitingPaymentId {
            channel_description,
        } => {
            handle_payment_id_step(
                bot,
                msg,
                deps,
                dialogue,
                language_code,
                channel_description,
                text,
            )
            .await
        }
        BotDialogueState::AwaitingWithdrawalAmount => {
            handle_withdrawal_amount_step(bot, msg, deps, dialogue, language_code, text).await
        }
        BotDialogueState::AwaitingWithdrawalCarrier { amount } => {
            handle_withdrawal_carrier_step(bot, msg, deps, dialogue, language_code, amount, text)
                .await
        }
        BotDialogueState::AwaitingChannelDeletion => {
            handle_channel_deletion_step(bot, msg, deps, dialogue, language_code, text).await
        }
        BotDialogueState::AwaitingBanTarget => {
            handle_ban_step(bot, msg, deps, dialogue, language_code, text, true).await
        }
        BotDialogueState::AwaitingUnbanTarget => {
            handle_ban_step(bot, msg, deps, dialogue, language_code, text, false).await
        }
        BotDialogueState::Idle => Ok(()),
    }
}

async fn handle_email_step(
    bot: &Bot,
    msg: &Message,
    deps: &Arc<HandlerDeps>,
    dialogue: &BotDialogue,
    language_code: Option<&str>,
    text: &str,
) -> Result<()> {
    let email = match validation::validate_email(text) {
        Ok(email) => email.to_string(),
        Err(_) => {
            bot.send_message(
                msg.chat.id,
                t_lang(&deps.localization, "register-invalid-email", language_code),
            )
            .await?;
            return Ok(());
        }
    };

    // With SMTP configured, a confirmation code gates the next step
    if let Some(mailer) = &deps.mailer {
        let code = mailer::generate_confirmation_code();
        match mailer.send_confirmation_code(&email, &code).await {
            Ok(()) => {
                bot.send_message(
                    msg.chat.id,
                    t_lang(&deps.localization, "register-code-sent", language_code),
                )
                .await?;
                dialogue
                    .update(BotDialogueState::AwaitingEmailCode { email, code })
                    .await?;
                return Ok(());
            }
            Err(e) => {
                // Mail delivery trouble must not dead-end registration
                error_logging::log_network_error(&e, "send_confirmation_code", None, None);
            }
        }
    }

    prompt_for_phone(bot, msg, deps, dialogue, language_code, email).await
}

#[allow(clippy::too_many_arguments)]
async fn handle_email_code_step(
    bot: &Bot,
    msg: &Message,
    deps: &Arc<HandlerDeps>,
    dialogue: &BotDialogue,
    language_code: Option<&str>,
    email: String,
    code: String,
    text: &str,
) -> Result<()> {
    if text.trim() != code {
        bot.send_message(
            msg.chat.id,
            t_lang(&deps.localization, "register-code-invalid", language_code),
        )
        .await?;
        return Ok(());
    }

    prompt_for_phone(bot, msg, deps, dialogue, language_code, email).await
}

async fn prompt_for_phone(
    bot: &Bot,
    msg: &Message,
    deps: &Arc<HandlerDeps>,
    dialogue: &BotDialogue,
    language_code: Option<&str>,
    email: String,
) -> Result<()> {
    bot.send_message(
        msg.chat.id,
        t_lang(&deps.localization, "register-share-phone-prompt", language_code),
    )
    .reply_markup(ui_builder::create_contact_keyboard(
        &deps.localization,
        language_code,
    ))
    .await?;
    dialogue
        .update(BotDialogueState::AwaitingPhone { email })
        .await?;
    Ok(())
}

/// Finish registration from a shared contact
async fn handle_phone_step(
    bot: &Bot,
    msg: &Message,
    deps: &Arc<HandlerDeps>,
    dialogue: &BotDialogue,
    language_code: Option<&str>,
    email: String,
) -> Result<()> {
    let user = match msg.from.as_ref() {
        Some(user) => user,
        None => return Ok(()),
    };
    let contact = match msg.contact() {
        Some(contact) => contact,
        None => return Ok(()),
    };

    // The shared contact must belong to the sender
    if contact.user_id != Some(user.id) {
        bot.send_message(
            msg.chat.id,
            t_lang(&deps.localization, "register-own-contact", language_code),
        )
        .await?;
        return Ok(());
    }

    let phone_number = if contact.phone_number.starts_with('+') {
        contact.phone_number.clone()
    } else {
        format!("+{}", contact.phone_number)
    };

    if validation::validate_phone(&phone_number).is_err() {
        bot.send_message(
            msg.chat.id,
            t_lang(&deps.localization, "register-invalid-phone", language_code),
        )
        .reply_markup(ui_builder::create_contact_keyboard(
            &deps.localization,
            language_code,
        ))
        .await?;
        return Ok(());
    }

    let country = validation::country_from_phone(&phone_number);
    let full_name = user.full_name();
    let user_id = user.id.0 as i64;

    match db::create_user(&deps.pool, user_id, &full_name, &email, &phone_number, country).await {
        Ok(_) => {
            debug!(user_id = %user_id, "Registration completed");
            bot.send_message(
                msg.chat.id,
                t_args_lang(
                    &deps.localization,
                    "register-complete",
                    &[
                        ("name", full_name.as_str()),
                        ("email", email.as_str()),
                        ("phone", phone_number.as_str()),
                        ("country", country),
                    ],
                    language_code,
                ),
            )
            .reply_markup(ui_builder::create_main_menu(
                &deps.localization,
                language_code,
                deps.config.is_admin(user_id),
            ))
            .await?;
        }
        Err(e) => {
            error_logging::log_database_error(&e, "create_user", Some(user_id));
            bot.send_message(
                msg.chat.id,
                t_lang(&deps.localization, "register-failed", language_code),
            )
            .await?;
        }
    }

    dialogue.update(BotDialogueState::Idle).await?;
    Ok(())
}

async fn handle_channel_url_step(
    bot: &Bot,
    msg: &Message,
    deps: &Arc<HandlerDeps>,
    dialogue: &BotDialogue,
    language_code: Option<&str>,
    text: &str,
) -> Result<()> {
    let user_id = msg.from.as_ref().map(|u| u.id.0 as i64).unwrap_or(0);
    let url = text.trim();

    if !youtube::is_youtube_url(url) {
        bot.send_message(
            msg.chat.id,
            t_lang(&deps.localization, "channel-invalid-url", language_code),
        )
        .await?;
        return Ok(());
    }

    let channel = match deps.youtube.resolve_channel(url).await {
        Ok(Some(channel)) => channel,
        Ok(None) => {
            bot.send_message(
                msg.chat.id,
                t_lang(&deps.localization, "channel-not-found", language_code),
            )
            .await?;
            dialogue.update(BotDialogueState::Idle).await?;
            return Ok(());
        }
        Err(e) => {
            error_logging::log_network_error(&e, "resolve_channel", Some("youtube"), None);
            bot.send_message(
                msg.chat.id,
                t_lang(&deps.localization, "channel-error", language_code),
            )
            .await?;
            dialogue.update(BotDialogueState::Idle).await?;
            return Ok(());
        }
    };

    if db::find_duplicate_link(&deps.pool, user_id, &channel.channel_id, &channel.title).await? {
        bot.send_message(
            msg.chat.id,
            t_lang(&deps.localization, "channel-duplicate", language_code),
        )
        .await?;
        dialogue.update(BotDialogueState::Idle).await?;
        return Ok(());
    }

    bot.send_message(
        msg.chat.id,
        t_lang(&deps.localization, "channel-choose-package", language_code),
    )
    .reply_markup(ui_builder::create_subscription_choice_keyboard(
        &deps.localization,
        language_code,
    ))
    .await?;

    dialogue
        .update(BotDialogueState::AwaitingSubscriptionChoice {
            draft: ChannelDraft {
                url: url.to_string(),
                channel_id: channel.channel_id,
                channel_name: channel.title,
            },
        })
        .await?;
    Ok(())
}

async fn handle_subscription_choice_step(
    bot: &Bot,
    msg: &Message,
    deps: &Arc<HandlerDeps>,
    dialogue: &BotDialogue,
    language_code: Option<&str>,
    draft: ChannelDraft,
    text: &str,
) -> Result<()> {
    let user_id = msg.from.as_ref().map(|u| u.id.0 as i64).unwrap_or(0);

    let subscription_count = match validation::parse_subscription_choice(text) {
        Some(count) => count,
        None => {
            bot.send_message(
                msg.chat.id,
                t_lang(&deps.localization, "channel-package-invalid", language_code),
            )
            .await?;
            return Ok(());
        }
    };

    let adder = db::get_user_by_telegram_id(&deps.pool, user_id)
        .await?
        .map(|user| user.full_name)
        .unwrap_or_default();

    match db::create_link(
        &deps.pool,
        user_id,
        &draft.url,
        &draft.channel_name,
        &draft.channel_id,
        &adder,
        subscription_count,
    )
    .await
    {
        Ok(_) => {
            bot.send_message(
                msg.chat.id,
                t_args_lang(
                    &deps.localization,
                    "channel-registered",
                    &[
                        ("name", draft.channel_name.as_str()),
                        ("id", draft.channel_id.as_str()),
                        ("url", draft.url.as_str()),
                        ("count", subscription_count.to_string().as_str()),
                    ],
                    language_code,
                ),
            )
            .reply_markup(ui_builder::create_main_menu(
                &deps.localization,
                language_code,
                deps.config.is_admin(user_id),
            ))
            .await?;
        }
        Err(e) => {
            error_logging::log_database_error(&e, "create_link", Some(user_id));
            bot.send_message(
                msg.chat.id,
                t_lang(&deps.localization, "channel-error", language_code),
            )
            .await?;
        }
    }

    dialogue.update(BotDialogueState::Idle).await?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn handle_payment_id_step(
    bot: &Bot,
    msg: &Message,
    deps: &Arc<HandlerDeps>,
    dialogue: &BotDialogue,
    language_code: Option<&str>,
    channel_description: String,
    text: &str,
) -> Result<()> {
    let user_id = msg.from.as_ref().map(|u| u.id.0 as i64).unwrap_or(0);

    let payment_id = match validation::validate_payment_id(text) {
        Ok(payment_id) => payment_id,
        Err(_) => {
            bot.send_message(
                msg.chat.id,
                t_lang(&deps.localization, "payment-invalid-id", language_code),
            )
            .await?;
            return Ok(()); // Stay in the same state to retry
        }
    };

    let updated =
        db::set_payment_id(&deps.pool, user_id, &channel_description, payment_id).await?;
    if updated {
        bot.send_message(
            msg.chat.id,
            t_args_lang(
                &deps.localization,
                "payment-updated",
                &[("id", payment_id)],
                language_code,
            ),
        )
        .await?;
    } else {
        bot.send_message(
            msg.chat.id,
            t_lang(&deps.localization, "payment-update-failed", language_code),
        )
        .await?;
    }

    dialogue.update(BotDialogueState::Idle).await?;
    Ok(())
}

async fn handle_withdrawal_amount_step(
    bot: &Bot,
    msg: &Message,
    deps: &Arc<HandlerDeps>,
    dialogue: &BotDialogue,
    language_code: Option<&str>,
    text: &str,
) -> Result<()> {
    let user_id = msg.from.as_ref().map(|u| u.id.0 as i64).unwrap_or(0);

    let balance = db::get_user_by_telegram_id(&deps.pool, user_id)
        .await?
        .map(|user| user.points)
        .unwrap_or(0);

    let amount = match validation::validate_withdrawal_amount(
        text,
        balance,
        deps.config.min_withdrawal_points,
    ) {
        Ok(amount) => amount,
        Err(_) => {
            bot.send_message(
                msg.chat.id,
                t_lang(&deps.localization, "withdraw-invalid-amount", language_code),
            )
            .await?;
            return Ok(());
        }
    };

    bot.send_message(
        msg.chat.id,
        t_lang(&deps.localization, "withdraw-enter-carrier", language_code),
    )
    .await?;
    dialogue
        .update(BotDialogueState::AwaitingWithdrawalCarrier { amount })
        .await?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn handle_withdrawal_carrier_step(
    bot: &Bot,
    msg: &Message,
    deps: &Arc<HandlerDeps>,
    dialogue: &BotDialogue,
    language_code: Option<&str>,
    amount: i64,
    text: &str,
) -> Result<()> {
    let user_id = msg.from.as_ref().map(|u| u.id.0 as i64).unwrap_or(0);
    let carrier = text.trim();

    match db::create_withdrawal(&deps.pool, user_id, carrier, amount).await? {
        Some(_) => {
            bot.send_message(
                msg.chat.id,
                t_args_lang(
                    &deps.localization,
                    "withdraw-submitted",
                    &[("amount", amount.to_string().as_str())],
                    language_code,
                ),
            )
            .await?;
        }
        None => {
            // Balance changed between the two steps
            warn!(user_id = %user_id, amount = amount, "Withdrawal rejected: insufficient balance");
            bot.send_message(
                msg.chat.id,
                t_lang(&deps.localization, "withdraw-invalid-amount", language_code),
            )
            .await?;
        }
    }

    dialogue.update(BotDialogueState::Idle).await?;
    Ok(())
}

async fn handle_channel_deletion_step(
    bot: &Bot,
    msg: &Message,
    deps: &Arc<HandlerDeps>,
    dialogue: &BotDialogue,
    language_code: Option<&str>,
    text: &str,
) -> Result<()> {
    let description = text.trim();
    let deleted = db::delete_link_by_description(&deps.pool, description).await?;

    let reply = if deleted {
        t_args_lang(
            &deps.localization,
            "delete-done",
            &[("description", description)],
            language_code,
        )
    } else {
        t_lang(&deps.localization, "delete-not-found", language_code)
    };
    bot.send_message(msg.chat.id, reply).await?;

    dialogue.update(BotDialogueState::Idle).await?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn handle_ban_step(
    bot: &Bot,
    msg: &Message,
    deps: &Arc<HandlerDeps>,
    dialogue: &BotDialogue,
    language_code: Option<&str>,
    text: &str,
    ban: bool,
) -> Result<()> {
    let target: i64 = match text.trim().parse() {
        Ok(target) => target,
        Err(_) => {
            bot.send_message(
                msg.chat.id,
                t_lang(&deps.localization, "ban-invalid-id", language_code),
            )
            .await?;
            return Ok(());
        }
    };

    let updated = db::set_banned(&deps.pool, target, ban).await?;
    let reply = if updated {
        let key = if ban { "ban-done" } else { "unban-done" };
        t_args_lang(
            &deps.localization,
            key,
            &[("id", target.to_string().as_str())],
            language_code,
        )
    } else {
        t_lang(&deps.localization, "user-not-found", language_code)
    };
    bot.send_message(msg.chat.id, reply).await?;

    dialogue.update(BotDialogueState::Idle).await?;
    Ok(())
}
