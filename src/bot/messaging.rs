//! Messages between users: chat relay, broadcasts and notifications

use anyhow::Result;
use sqlx::SqlitePool;
use teloxide::prelude::*;
use teloxide::types::{FileId, InlineKeyboardMarkup, InputFile, ParseMode};
use tracing::{debug, error, info, warn};

use crate::config::BotConfig;
use crate::db;
use crate::errors::BotError;
use crate::localization::{t_args_lang, t_lang};
use crate::models::User;

use super::callback_data::CallbackAction;
use super::ui_builder::{button, esc};

/// Delivery counts of a broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastOutcome {
    pub sent: usize,
    pub failed: usize,
}

/// Send HTML text to a user with a bound Telegram account.
/// Returns whether the message was delivered.
pub async fn notify_user(bot: &Bot, user: &User, text: &str) -> bool {
    let Some(telegram_id) = user.telegram_id else {
        debug!(user_id = user.id, "User has no Telegram account, notification skipped");
        return false;
    };

    match bot
        .send_message(ChatId(telegram_id), text)
        .parse_mode(ParseMode::Html)
        .await
    {
        Ok(_) => true,
        Err(e) => {
            warn!(user_id = user.id, error = %e, "Failed to deliver notification");
            false
        }
    }
}

/// Notify a student and every linked parent
pub async fn notify_family(bot: &Bot, pool: &SqlitePool, student: &User, text: &str) -> Result<usize> {
    let mut delivered = usize::from(notify_user(bot, student, text).await);
    for parent in db::list_parents(pool, student).await? {
        delivered += usize::from(notify_user(bot, &parent, text).await);
    }
    Ok(delivered)
}

/// Send HTML text to every tutor, optionally with an inline keyboard
pub async fn notify_tutors(
    bot: &Bot,
    pool: &SqlitePool,
    text: &str,
    keyboard: Option<InlineKeyboardMarkup>,
) -> Result<usize> {
    let mut delivered = 0;
    for tutor in db::list_tutors(pool).await? {
        let Some(telegram_id) = tutor.telegram_id else {
            continue;
        };
        let mut request = bot.send_message(ChatId(telegram_id), text).parse_mode(ParseMode::Html);
        if let Some(keyboard) = &keyboard {
            request = request.reply_markup(keyboard.clone());
        }
        match request.await {
            Ok(_) => delivered += 1,
            Err(e) => warn!(tutor_id = tutor.id, error = %e, "Failed to notify tutor"),
        }
    }
    Ok(delivered)
}

/// Send a stored Telegram file. Photos and documents have different
/// endpoints, so a failed photo is retried as a document.
pub async fn send_file(bot: &Bot, chat_id: ChatId, file_id: &str) -> Result<()> {
    let file = || InputFile::file_id(FileId(file_id.to_string()));
    if bot.send_photo(chat_id, file()).await.is_ok() {
        return Ok(());
    }
    bot.send_document(chat_id, file()).await?;
    Ok(())
}

/// Forward a student's or parent's message to every tutor. Each tutor gets a
/// header naming the sender with a reply button, then a copy of the message.
pub async fn relay_to_tutors(bot: &Bot, pool: &SqlitePool, sender: &User, msg: &Message) -> Result<usize> {
    let Some(sender_telegram_id) = sender.telegram_id else {
        return Ok(0);
    };

    let tutors = db::list_tutors(pool).await?;
    let mut delivered = 0;

    for tutor in tutors {
        let Some(tutor_telegram_id) = tutor.telegram_id else {
            continue;
        };
        let tutor_chat = ChatId(tutor_telegram_id);

        let header = t_args_lang(
            "chat-incoming",
            &[
                ("name", &esc(&sender.full_name)),
                ("role", &t_lang(sender.role.message_key(), None)),
            ],
            None,
        );
        let keyboard = InlineKeyboardMarkup::new(vec![vec![button(
            format!("↩️ {}", t_lang("button-reply", None)),
            CallbackAction::ReplyTo(sender_telegram_id),
        )]]);

        let result = async {
            bot.send_message(tutor_chat, header)
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboard)
                .await?;
            bot.copy_message(tutor_chat, msg.chat.id, msg.id).await?;
            Ok::<_, teloxide::RequestError>(())
        }
        .await;

        match result {
            Ok(()) => delivered += 1,
            Err(e) => warn!(tutor_id = tutor.id, error = %e, "Failed to relay message to tutor"),
        }
    }

    info!(sender_id = sender.id, delivered, "Message relayed to tutors");
    Ok(delivered)
}

/// Copy a tutor's answer to the user who wrote in
pub async fn send_tutor_reply(bot: &Bot, recipient_telegram_id: i64, msg: &Message) -> Result<()> {
    let chat = ChatId(recipient_telegram_id);
    bot.send_message(chat, format!("💬 {}", t_lang("chat-reply-header", None)))
        .parse_mode(ParseMode::Html)
        .await?;
    bot.copy_message(chat, msg.chat.id, msg.id).await?;
    info!(recipient_telegram_id, "Tutor reply delivered");
    Ok(())
}

/// Send a broadcast to every student and parent with a Telegram account.
/// Failed deliveries are counted and do not stop the broadcast.
pub async fn broadcast(bot: &Bot, pool: &SqlitePool, text: &str) -> Result<BroadcastOutcome> {
    let recipients = db::list_broadcast_recipients(pool).await?;
    let body = format!("📣 {}", esc(text));

    let mut outcome = BroadcastOutcome::default();
    for recipient in &recipients {
        if notify_user(bot, recipient, &body).await {
            outcome.sent += 1;
        } else {
            outcome.failed += 1;
        }
    }

    info!(sent = outcome.sent, failed = outcome.failed, "Broadcast finished");
    Ok(outcome)
}

/// Tell the user something went wrong. Internal errors are also reported
/// to the administrator.
pub async fn report_error(
    bot: &Bot,
    config: &BotConfig,
    chat_id: ChatId,
    err: &BotError,
    language_code: Option<&str>,
) {
    let text = t_lang(err.message_key(), language_code);
    if let Err(e) = bot.send_message(chat_id, format!("⚠️ {text}")).await {
        warn!(chat_id = %chat_id, error = %e, "Failed to send error message");
    }

    if let BotError::Internal(details) = err {
        error!(chat_id = %chat_id, error = %details, "Internal error while handling update");
        if let Some(admin_id) = config.admin_telegram_id {
            let report = format!("🚨 {}\nchat {}: {}", t_lang("error-admin-report", None), chat_id, esc(details));
            if let Err(e) = bot.send_message(ChatId(admin_id), report).parse_mode(ParseMode::Html).await {
                warn!(error = %e, "Failed to report error to administrator");
            }
        }
    }
}
