use anyhow::Result;
use sqlx::postgres::PgPool;
use std::sync::Arc;
use std::time::Duration;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;
use tracing::info;
use tube_rewards::bot::{self, HandlerDeps};
use tube_rewards::config::AppConfig;
use tube_rewards::db;
use tube_rewards::dialogue::{BotDialogue, BotDialogueState};
use tube_rewards::localization;
use tube_rewards::mailer::{Mailer, MailerConfig};
use tube_rewards::observability;
use tube_rewards::ocr_config::OcrConfig;
use tube_rewards::pending::PendingSubmissions;
use tube_rewards::text_processing::MatchConfig;
use tube_rewards::verification::SubscriptionVerifier;
use tube_rewards::youtube::YoutubeClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file first
    dotenvy::dotenv().ok();

    observability::init_tracing()?;

    // Validate configuration early so a bad deployment fails at startup
    let config = Arc::new(AppConfig::from_env()?);
    let ocr_config = OcrConfig::from_env();
    ocr_config
        .validate()
        .map_err(|e| anyhow::anyhow!("OCR configuration validation failed: {}", e))?;

    observability::init_metrics()?;

    info!(database_url = %config.database_url, "Initializing database connection");

    // Create database connection pool and initialize the schema
    let pool = PgPool::connect(&config.database_url).await?;
    db::init_database_schema(&pool).await?;
    let shared_pool = Arc::new(pool);

    // Initialize localization manager
    let localization_manager = localization::create_localization_manager()?;

    // Assemble the verification pipeline
    let verifier = Arc::new(SubscriptionVerifier::new(ocr_config, MatchConfig::default())?);

    let youtube = Arc::new(YoutubeClient::new(config.youtube_api_key.clone())?);

    // SMTP is optional; without it registration skips email confirmation
    let mailer = match MailerConfig::from_env() {
        Some(mailer_config) => Some(Arc::new(Mailer::new(&mailer_config)?)),
        None => {
            info!("SMTP_HOST not set, email confirmation disabled");
            None
        }
    };

    let deps = Arc::new(HandlerDeps {
        pool: Arc::clone(&shared_pool),
        localization: Arc::clone(&localization_manager),
        config: Arc::clone(&config),
        verifier,
        pending: Arc::new(PendingSubmissions::new()),
        youtube,
        mailer,
    });

    // Initialize the bot with custom client configuration for reliability
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .expect("Failed to create HTTP client");

    let telegram_bot = Bot::with_client(config.bot_token.clone(), client);

    info!("Bot initialized with 30s timeout, starting dispatcher");

    // Create shared dialogue storage
    let dialogue_storage = InMemStorage::<BotDialogueState>::new();

    // Set up the dispatcher with shared dependencies and dialogue support
    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint({
            let deps = Arc::clone(&deps);
            let storage = dialogue_storage.clone();
            move |bot: Bot, msg: Message| {
                let deps = Arc::clone(&deps);
                let storage = storage.clone();
                let dialogue = BotDialogue::new(storage, msg.chat.id);
                async move { bot::message_handler(bot, msg, deps, dialogue).await }
            }
        }))
        .branch(Update::filter_callback_query().endpoint({
            let deps = Arc::clone(&deps);
            let storage = dialogue_storage.clone();
            move |bot: Bot, q: CallbackQuery| {
                let deps = Arc::clone(&deps);
                let storage = storage.clone();
                // Use the chat ID from the message carrying the keyboard
                let chat_id = match &q.message {
                    Some(msg) => match msg {
                        teloxide::types::MaybeInaccessibleMessage::Regular(msg) => msg.chat.id,
                        teloxide::types::MaybeInaccessibleMessage::Inaccessible(_) => {
                            ChatId::from(q.from.id)
                        }
                    },
                    None => ChatId::from(q.from.id),
                };
                let dialogue = BotDialogue::new(storage, chat_id);
                async move { bot::callback_handler(bot, q, deps, dialogue).await }
            }
        }));

    Dispatcher::builder(telegram_bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
