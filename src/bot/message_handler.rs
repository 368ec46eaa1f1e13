//! Message Handler module for processing incoming Telegram messages

use std::sync::Arc;

use anyhow::Result;
use sqlx::SqlitePool;
use teloxide::prelude::*;
use teloxide::types::{KeyboardRemove, ParseMode};
use teloxide::utils::command::BotCommands;
use tracing::{debug, info};

use crate::access_code::normalize_access_code;
use crate::config::BotConfig;
use crate::db;
use crate::dialogue::{is_cancel_input, validate_full_name, BotDialogue, BotDialogueState};
use crate::errors::BotError;
use crate::localization::{t_args_lang, t_lang};
use crate::models::{User, UserRole};
use crate::schedule::now_local;

use super::dialogue_manager::{handle_dialogue_input, input_error_key, send_prompt};
use super::library::library_screen;
use super::messaging::report_error;
use super::parent_screens::parent_menu;
use super::student_screens::student_menu;
use super::tutor_screens::{
    dashboard, report_students, review_queue, students_screen, tutor_menu, tutor_menu_keyboard, TutorMenuItem,
};
use super::ui_builder::{esc, send_screen, send_text, Screen};

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "snake_case")]
pub enum Command {
    /// Log in or open the main menu
    Start,
    /// Show what this bot can do
    Help,
    /// Open the main menu
    Menu,
    /// Abort the current input
    Cancel,
    /// Register a tutor: `/add_tutor Full Name`
    AddTutor(String),
    /// Register a parent without linking: `/add_parent Full Name`
    AddParent(String),
}

/// The main menu of a user's role
pub async fn main_menu_screen(pool: &SqlitePool, user: &User, language_code: Option<&str>) -> Result<Screen> {
    match user.role {
        UserRole::Tutor => Ok(tutor_menu(user, language_code)),
        UserRole::Student => Ok(student_menu(user, language_code)),
        UserRole::Parent => parent_menu(pool, user, language_code).await,
    }
}

/// Tutors get the persistent reply keyboard, everyone else an inline menu
pub async fn send_main_menu(
    bot: &Bot,
    pool: &SqlitePool,
    chat_id: ChatId,
    user: &User,
    language_code: Option<&str>,
) -> Result<()> {
    if user.role == UserRole::Tutor {
        bot.send_message(
            chat_id,
            t_args_lang("tutor-menu-title", &[("name", &esc(&user.full_name))], language_code),
        )
        .parse_mode(ParseMode::Html)
        .reply_markup(tutor_menu_keyboard(language_code))
        .await?;
        return Ok(());
    }

    send_screen(bot, chat_id, main_menu_screen(pool, user, language_code).await?).await
}

/// Bind the Telegram account to the owner of an access code
async fn handle_login(
    bot: &Bot,
    msg: &Message,
    dialogue: &BotDialogue,
    pool: &SqlitePool,
    telegram_id: i64,
    text: &str,
    language_code: Option<&str>,
) -> Result<()> {
    let chat_id = msg.chat.id;

    let code = match normalize_access_code(text) {
        Ok(code) => code,
        Err(err) => {
            dialogue.update(BotDialogueState::AwaitingAccessCode).await?;
            return send_text(
                bot,
                chat_id,
                format!("❌ {}\n\n{}", t_lang(input_error_key(err), language_code), t_lang("login-prompt", language_code)),
            )
            .await;
        }
    };

    let username = msg.from.as_ref().and_then(|user| user.username.as_deref());
    match db::login_with_access_code(pool, &code, telegram_id, username).await {
        Ok(user) => {
            dialogue.exit().await?;
            info!(user_id = user.id, role = user.role.as_str(), "User logged in");
            send_text(
                bot,
                chat_id,
                format!(
                    "✅ {}",
                    t_args_lang(
                        "login-success",
                        &[
                            ("name", &esc(&user.full_name)),
                            ("role", &t_lang(user.role.message_key(), language_code))
                        ],
                        language_code
                    )
                ),
            )
            .await?;
            send_main_menu(bot, pool, chat_id, &user, language_code).await
        }
        Err(BotError::InvalidInput(key)) => {
            dialogue.update(BotDialogueState::AwaitingAccessCode).await?;
            send_text(bot, chat_id, format!("❌ {}", t_lang(key, language_code))).await
        }
        Err(e) => Err(e.into()),
    }
}

/// Admin commands create accounts and answer with the new access code
#[allow(clippy::too_many_arguments)]
async fn handle_account_command(
    bot: &Bot,
    chat_id: ChatId,
    pool: &SqlitePool,
    config: &BotConfig,
    user: Option<&User>,
    telegram_id: i64,
    role: UserRole,
    name: &str,
    language_code: Option<&str>,
) -> Result<()> {
    let is_tutor = user.is_some_and(|user| user.role == UserRole::Tutor);
    if !config.is_admin(telegram_id) && !is_tutor {
        return Err(BotError::AccessDenied.into());
    }

    let name = match validate_full_name(name) {
        Ok(name) => name,
        Err(_) => return send_text(bot, chat_id, t_lang("command-name-required", language_code)).await,
    };

    let created = match db::register_user(pool, &name, role).await? {
        db::Registration::Created(user) => user,
        db::Registration::AlreadyExists(existing) => {
            return send_text(
                bot,
                chat_id,
                t_args_lang(
                    "account-exists",
                    &[
                        ("name", &esc(&existing.full_name)),
                        ("role", &t_lang(role.message_key(), language_code)),
                    ],
                    language_code,
                ),
            )
            .await;
        }
    };
    info!(user_id = created.id, role = role.as_str(), by = telegram_id, "Account created by command");

    send_text(
        bot,
        chat_id,
        t_args_lang(
            "account-created",
            &[
                ("name", &esc(&created.full_name)),
                ("role", &t_lang(role.message_key(), language_code)),
                ("code", &esc(&created.access_code)),
            ],
            language_code,
        ),
    )
    .await
}

#[allow(clippy::too_many_arguments)]
async fn handle_command(
    bot: &Bot,
    msg: &Message,
    dialogue: &BotDialogue,
    pool: &SqlitePool,
    config: &BotConfig,
    user: Option<&User>,
    telegram_id: i64,
    command: Command,
    language_code: Option<&str>,
) -> Result<()> {
    let chat_id = msg.chat.id;
    debug!(telegram_id, command = ?command, "Handling command");

    match command {
        Command::Start | Command::Menu => {
            dialogue.exit().await?;
            match user {
                Some(user) => send_main_menu(bot, pool, chat_id, user, language_code).await,
                None => {
                    dialogue.update(BotDialogueState::AwaitingAccessCode).await?;
                    send_text(
                        bot,
                        chat_id,
                        format!(
                            "👋 <b>{}</b>\n\n{}",
                            t_lang("welcome-title", language_code),
                            t_lang("login-prompt", language_code)
                        ),
                    )
                    .await
                }
            }
        }
        Command::Help => {
            let key = match user.map(|user| user.role) {
                Some(UserRole::Tutor) => "help-tutor",
                Some(UserRole::Student) => "help-student",
                Some(UserRole::Parent) => "help-parent",
                None => "help-guest",
            };
            send_text(bot, chat_id, t_lang(key, language_code)).await
        }
        Command::Cancel => {
            dialogue.exit().await?;
            send_text(bot, chat_id, t_lang("cancelled", language_code)).await
        }
        Command::AddTutor(name) => {
            handle_account_command(bot, chat_id, pool, config, user, telegram_id, UserRole::Tutor, &name, language_code)
                .await
        }
        Command::AddParent(name) => {
            handle_account_command(bot, chat_id, pool, config, user, telegram_id, UserRole::Parent, &name, language_code)
                .await
        }
    }
}

async fn handle_tutor_menu(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: &BotDialogue,
    pool: &SqlitePool,
    config: &BotConfig,
    item: TutorMenuItem,
    language_code: Option<&str>,
) -> Result<()> {
    let today = now_local(config.timezone_offset_hours).date();

    match item {
        TutorMenuItem::Students => send_screen(bot, chat_id, students_screen(pool, language_code).await?).await,
        TutorMenuItem::AddStudent => {
            dialogue.update(BotDialogueState::AddStudentName).await?;
            send_prompt(bot, chat_id, t_lang("prompt-student-name", language_code), language_code).await
        }
        TutorMenuItem::ReviewQueue => send_screen(bot, chat_id, review_queue(pool, language_code).await?).await,
        TutorMenuItem::MonthlyReport => send_screen(bot, chat_id, report_students(pool, language_code).await?).await,
        TutorMenuItem::Library => {
            send_screen(bot, chat_id, library_screen(pool, None, true, language_code).await?).await
        }
        TutorMenuItem::Statistics => send_screen(bot, chat_id, dashboard(pool, today, language_code).await?).await,
        TutorMenuItem::Broadcast => {
            dialogue.update(BotDialogueState::BroadcastText).await?;
            send_prompt(bot, chat_id, t_lang("prompt-broadcast", language_code), language_code).await
        }
    }
}

async fn handle_message(
    bot: &Bot,
    msg: &Message,
    dialogue: BotDialogue,
    pool: &SqlitePool,
    config: &BotConfig,
    telegram_id: i64,
    language_code: Option<&str>,
) -> Result<()> {
    let chat_id = msg.chat.id;
    let text = msg.text().map(str::trim);
    let user = db::get_user_by_telegram_id(pool, telegram_id).await?;

    if let Some(command) = text.and_then(|text| Command::parse(text, "").ok()) {
        return handle_command(bot, msg, &dialogue, pool, config, user.as_ref(), telegram_id, command, language_code)
            .await;
    }

    let state = dialogue.get().await?.unwrap_or_default();
    debug!(telegram_id, state = ?state, "Retrieved dialogue state");

    if state != BotDialogueState::Start && text.is_some_and(is_cancel_input) {
        dialogue.exit().await?;
        return send_text(bot, chat_id, t_lang("cancelled", language_code)).await;
    }

    let Some(user) = user else {
        // Anything an unknown user types is treated as an access code
        return match text {
            Some(text) => handle_login(bot, msg, &dialogue, pool, telegram_id, text, language_code).await,
            None => {
                dialogue.update(BotDialogueState::AwaitingAccessCode).await?;
                send_text(bot, chat_id, t_lang("login-prompt", language_code)).await
            }
        };
    };

    match state {
        BotDialogueState::Start => {}
        BotDialogueState::AwaitingAccessCode => {
            return match text {
                Some(text) => handle_login(bot, msg, &dialogue, pool, telegram_id, text, language_code).await,
                None => send_text(bot, chat_id, t_lang("login-prompt", language_code)).await,
            };
        }
        state => {
            return handle_dialogue_input(bot, msg, dialogue, pool, config, &user, state, language_code).await;
        }
    }

    let Some(text) = text else {
        return send_text(bot, chat_id, t_lang("unsupported-message", language_code)).await;
    };

    if user.role == UserRole::Tutor {
        if let Some(item) = TutorMenuItem::from_text(text) {
            return handle_tutor_menu(bot, chat_id, &dialogue, pool, config, item, language_code).await;
        }
    }

    // A registered user may switch accounts by sending another access code
    if let Ok(code) = normalize_access_code(text) {
        if let Some(other) = db::get_user_by_access_code(pool, &code).await? {
            if other.id != user.id {
                return handle_login(bot, msg, &dialogue, pool, telegram_id, text, language_code).await;
            }
        }
    }

    if user.role != UserRole::Tutor {
        bot.send_message(chat_id, t_lang("use-menu", language_code))
            .reply_markup(KeyboardRemove::new())
            .await?;
    }
    send_main_menu(bot, pool, chat_id, &user, language_code).await
}

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    pool: Arc<SqlitePool>,
    config: Arc<BotConfig>,
    dialogue: BotDialogue,
) -> Result<()> {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let telegram_id = from.id.0 as i64;
    let language_code = from.language_code.as_deref();

    debug!(user_id = %msg.chat.id, "Received message from user");

    if let Err(e) = handle_message(&bot, &msg, dialogue, &pool, &config, telegram_id, language_code).await {
        let err = BotError::from(e);
        report_error(&bot, &config, msg.chat.id, &err, language_code).await;
    }

    Ok(())
}
