//! UI Builder module: reply keyboards, inline keyboards, and message
//! formatting for the bot surface. All labels come from the localization
//! bundles so the menus render in the user's language.

use std::sync::Arc;

use teloxide::types::{
    ButtonRequest, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup,
};

use crate::db::{Link, User, Withdrawal};
use crate::localization::{t_lang, LocalizationManager};

/// Number of task links shown per page
pub const LINKS_PER_PAGE: i64 = 5;

/// Number of withdrawals shown per admin page
pub const WITHDRAWALS_PER_PAGE: i64 = 5;

fn reply_keyboard(rows: Vec<Vec<KeyboardButton>>) -> KeyboardMarkup {
    let mut markup = KeyboardMarkup::new(rows);
    markup.resize_keyboard = true;
    markup
}

/// The main reply-keyboard menu; admins get the panel entry appended
pub fn create_main_menu(
    localization: &Arc<LocalizationManager>,
    language_code: Option<&str>,
    is_admin: bool,
) -> KeyboardMarkup {
    let t = |key: &str| KeyboardButton::new(t_lang(localization, key, language_code));

    let mut rows = vec![
        vec![t("menu-register"), t("menu-start")],
        vec![t("menu-submit-channel")],
        vec![t("menu-view-links")],
        vec![t("menu-profile")],
        vec![t("menu-my-channels"), t("menu-my-channels-paid")],
        vec![t("menu-withdraw")],
    ];

    if is_admin {
        rows.push(vec![t("menu-admin-panel")]);
    }

    reply_keyboard(rows)
}

/// The admin panel reply keyboard
pub fn create_admin_panel_menu(
    localization: &Arc<LocalizationManager>,
    language_code: Option<&str>,
) -> KeyboardMarkup {
    let t = |key: &str| KeyboardButton::new(t_lang(localization, key, language_code));

    reply_keyboard(vec![
        vec![t("admin-ban-client"), t("admin-unban-client")],
        vec![t("admin-delete-channel"), t("admin-withdrawals")],
        vec![t("menu-main-menu")],
    ])
}

/// Keyboard offering the subscriber packages plus cancel
pub fn create_subscription_choice_keyboard(
    localization: &Arc<LocalizationManager>,
    language_code: Option<&str>,
) -> KeyboardMarkup {
    let packages = match crate::localization::detect_language(localization, language_code).as_str()
    {
        "ar" => vec![
            KeyboardButton::new("100 مشترك"),
            KeyboardButton::new("1000 مشترك"),
        ],
        _ => vec![
            KeyboardButton::new("100 Subscribers"),
            KeyboardButton::new("1000 Subscribers"),
        ],
    };

    reply_keyboard(vec![
        packages,
        vec![KeyboardButton::new(t_lang(
            localization,
            "cancel-button",
            language_code,
        ))],
    ])
}

/// One-button keyboard requesting the user's contact
pub fn create_contact_keyboard(
    localization: &Arc<LocalizationManager>,
    language_code: Option<&str>,
) -> KeyboardMarkup {
    let button = KeyboardButton::new(t_lang(
        localization,
        "register-share-phone-button",
        language_code,
    ))
    .request(ButtonRequest::Contact);

    let mut markup = reply_keyboard(vec![vec![button]]);
    markup.one_time_keyboard = true;
    markup
}

/// Inline prev/next pagination row for the task list, when needed
pub fn create_links_pagination_keyboard(
    localization: &Arc<LocalizationManager>,
    language_code: Option<&str>,
    page: i64,
    total_pages: i64,
) -> Option<InlineKeyboardMarkup> {
    if total_pages <= 1 {
        return None;
    }

    let mut buttons = Vec::new();
    if page > 0 {
        buttons.push(InlineKeyboardButton::callback(
            t_lang(localization, "page-prev", language_code),
            format!("prev_{}", page - 1),
        ));
    }
    if page < total_pages - 1 {
        buttons.push(InlineKeyboardButton::callback(
            t_lang(localization, "page-next", language_code),
            format!("next_{}", page + 1),
        ));
    }

    if buttons.is_empty() {
        None
    } else {
        Some(InlineKeyboardMarkup::new(vec![buttons]))
    }
}

/// Inline keyboard listing the user's channels for payment-ID attachment.
/// Button text carries the description, ID, and current payment state.
pub fn create_channels_keyboard(
    localization: &Arc<LocalizationManager>,
    language_code: Option<&str>,
    links: &[Link],
) -> InlineKeyboardMarkup {
    let no_payment = t_lang(localization, "label-no-payment", language_code);

    let buttons: Vec<Vec<InlineKeyboardButton>> = links
        .iter()
        .map(|link| {
            let payment = link.payment_id.as_deref().unwrap_or(&no_payment);
            let text = format!("{}--{}--({})", link.description, link.channel_id, payment);
            vec![InlineKeyboardButton::callback(
                text,
                format!("channel_{}", link.description),
            )]
        })
        .collect();

    InlineKeyboardMarkup::new(buttons)
}

/// Inline keyboard for the admin withdrawal list: one row per request plus
/// pagination
pub fn create_withdrawals_keyboard(
    localization: &Arc<LocalizationManager>,
    language_code: Option<&str>,
    withdrawals: &[Withdrawal],
    page: i64,
    total_pages: i64,
) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = withdrawals
        .iter()
        .map(|wd| {
            let text = format!("#{} · {} · {} pts", wd.id, wd.full_name, wd.amount);
            vec![InlineKeyboardButton::callback(
                text,
                format!("approve_{}", wd.id),
            )]
        })
        .collect();

    let mut nav = Vec::new();
    if page > 0 {
        nav.push(InlineKeyboardButton::callback(
            t_lang(localization, "page-prev", language_code),
            format!("wpage_{}", page - 1),
        ));
    }
    if page < total_pages - 1 {
        nav.push(InlineKeyboardButton::callback(
            t_lang(localization, "page-next", language_code),
            format!("wpage_{}", page + 1),
        ));
    }
    if !nav.is_empty() {
        rows.push(nav);
    }

    InlineKeyboardMarkup::new(rows)
}

/// Format one task link as plain text for the paginated list
pub fn format_link_entry(
    localization: &Arc<LocalizationManager>,
    language_code: Option<&str>,
    link: &Link,
) -> String {
    format!(
        "📛 {}\n{}: {}\n🔗 {}",
        link.description,
        t_lang(localization, "label-by", language_code),
        link.adder,
        link.youtube_link
    )
}

/// Format a paid channel with its like counter
pub fn format_paid_channel_entry(
    localization: &Arc<LocalizationManager>,
    language_code: Option<&str>,
    index: usize,
    link: &Link,
    likes: i64,
) -> String {
    format!(
        "{}. {}\n🔗 {}\n{}: {}\n{}: {}\n{}: {}\n{}",
        index,
        link.description,
        link.youtube_link,
        t_lang(localization, "label-channel-id", language_code),
        link.channel_id,
        t_lang(localization, "label-submitted", language_code),
        link.submission_date.format("%Y-%m-%d %H:%M"),
        t_lang(localization, "label-likes", language_code),
        likes,
        "-".repeat(40)
    )
}

/// Format a user profile as plain text
pub fn format_profile(
    localization: &Arc<LocalizationManager>,
    language_code: Option<&str>,
    user: &User,
) -> String {
    format!(
        "{}\n\n{}: {}\n{}: {}\n{}: {}\n{}: {}\n{}: {}\n{}: {}",
        t_lang(localization, "profile-title", language_code),
        t_lang(localization, "label-name", language_code),
        user.full_name,
        t_lang(localization, "label-email", language_code),
        user.email,
        t_lang(localization, "label-phone", language_code),
        user.phone,
        t_lang(localization, "label-country", language_code),
        user.country,
        t_lang(localization, "label-points", language_code),
        user.points,
        t_lang(localization, "label-registered", language_code),
        user.registration_date.format("%Y-%m-%d %H:%M"),
    )
}

/// Format one withdrawal for the admin list
pub fn format_withdrawal_entry(wd: &Withdrawal) -> String {
    format!(
        "⚠️ Withdrawal #{}\n👤 {}\n📱 {}\n📡 {}\n💸 {} pts\n📅 {}",
        wd.id,
        wd.full_name,
        wd.phone,
        wd.carrier,
        wd.amount,
        wd.withdrawal_date.format("%Y-%m-%d %H:%M")
    )
}

/// Split a message into Telegram-sized chunks (4096 character limit)
pub fn split_message(message: &str) -> Vec<String> {
    const LIMIT: usize = 4096;

    if message.chars().count() <= LIMIT {
        return vec![message.to_string()];
    }

    let chars: Vec<char> = message.chars().collect();
    chars
        .chunks(LIMIT)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_message_short() {
        let chunks = split_message("hello");
        assert_eq!(chunks, vec!["hello".to_string()]);
    }

    #[test]
    fn test_split_message_long() {
        let long = "x".repeat(10_000);
        let chunks = split_message(&long);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 4096));
        assert_eq!(chunks.concat(), long);
    }
}
