use std::env;
use std::sync::Arc;

use anyhow::Result;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tutorbot::bot::{self, Command};
use tutorbot::config::BotConfig;
use tutorbot::db;
use tutorbot::dialogue::BotDialogueState;
use tutorbot::localization::init_localization;
use tutorbot::reminders::spawn_reminders;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    init_tracing();

    info!("Starting tutoring Telegram bot");

    let config = BotConfig::from_env()?;
    init_localization()?;

    let pool = db::connect(&config.database_url).await?;
    db::init_database_schema(&pool).await?;

    let bot = Bot::new(config.bot_token.clone());
    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!(error = %e, "Failed to register bot commands");
    }

    let pool = Arc::new(pool);
    let config = Arc::new(config);

    let reminders = spawn_reminders(bot.clone(), Arc::clone(&pool), Arc::clone(&config));

    info!("Bot initialized, starting dispatcher");

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .enter_dialogue::<Message, InMemStorage<BotDialogueState>, BotDialogueState>()
                .endpoint(bot::message_handler),
        )
        .branch(
            Update::filter_callback_query()
                .enter_dialogue::<CallbackQuery, InMemStorage<BotDialogueState>, BotDialogueState>()
                .endpoint(bot::callback_handler),
        );

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![InMemStorage::<BotDialogueState>::new(), pool, config])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    reminders.abort();
    info!("Bot stopped");

    Ok(())
}
