//! UI Builder module for creating keyboards and formatting messages

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, MaybeInaccessibleMessage, ParseMode};
use teloxide::utils::html;
use teloxide::{ApiError, RequestError};
use tracing::warn;

use crate::gamification::AchievementDef;
use crate::localization::{t_args_lang, t_lang};
use crate::models::{Lesson, Payment};
use crate::schedule::{format_date, format_datetime};

use super::callback_data::CallbackAction;

const MAX_BUTTON_LABEL: usize = 40;

/// Telegram rejects message texts longer than this
pub const MAX_MESSAGE_CHARS: usize = 4096;
/// Room for list lines, leaving space for a closing note
const LIST_BUDGET_CHARS: usize = 3800;

/// A message body with its inline keyboard
#[derive(Debug, Clone)]
pub struct Screen {
    pub text: String,
    pub keyboard: InlineKeyboardMarkup,
}

impl Screen {
    pub fn new(text: String, rows: Vec<Vec<InlineKeyboardButton>>) -> Self {
        Self {
            text,
            keyboard: InlineKeyboardMarkup::new(rows),
        }
    }
}

/// Send a screen as a new message
pub async fn send_screen(bot: &Bot, chat_id: ChatId, screen: Screen) -> Result<()> {
    bot.send_message(chat_id, screen.text)
        .parse_mode(ParseMode::Html)
        .reply_markup(screen.keyboard)
        .await?;
    Ok(())
}

/// Telegram refuses edits that would leave the message as it is
fn is_unchanged(err: &RequestError) -> bool {
    matches!(err, RequestError::Api(ApiError::MessageNotModified))
}

/// Replace the message a callback came from. Falls back to a new message
/// when the original can no longer be edited.
pub async fn edit_screen(bot: &Bot, message: &MaybeInaccessibleMessage, screen: Screen) -> Result<()> {
    let chat_id = message.chat().id;
    match bot
        .edit_message_text(chat_id, message.id(), screen.text.clone())
        .parse_mode(ParseMode::Html)
        .reply_markup(screen.keyboard.clone())
        .await
    {
        Ok(_) => Ok(()),
        Err(e) if is_unchanged(&e) => Ok(()),
        Err(e) => {
            warn!(chat_id = %chat_id, error = %e, "Failed to edit message, sending a new one");
            send_screen(bot, chat_id, screen).await
        }
    }
}

/// Send plain localized text
pub async fn send_text(bot: &Bot, chat_id: ChatId, text: String) -> Result<()> {
    bot.send_message(chat_id, text).parse_mode(ParseMode::Html).await?;
    Ok(())
}

/// Escape user-provided text for HTML messages
pub fn esc(text: &str) -> String {
    html::escape(text)
}

/// Shorten a label to fit on a button
pub fn truncate_label(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{head}…")
    } else {
        text.to_string()
    }
}

/// Append a list line unless the message would outgrow the list budget
pub fn push_list_line(text: &mut String, line: &str) -> bool {
    if text.chars().count() + line.chars().count() + 1 > LIST_BUDGET_CHARS {
        return false;
    }
    text.push_str(line);
    text.push('\n');
    true
}

/// Note for list entries that did not fit, empty when everything is shown
pub fn list_more_note(hidden: usize, language_code: Option<&str>) -> String {
    if hidden == 0 {
        return String::new();
    }
    format!(
        "\n{}\n",
        t_args_lang("list-more", &[("count", &hidden.to_string())], language_code)
    )
}

pub fn button(text: impl Into<String>, action: CallbackAction) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(truncate_label(&text.into(), MAX_BUTTON_LABEL), action.encode())
}

pub fn back_row(action: CallbackAction, language_code: Option<&str>) -> Vec<InlineKeyboardButton> {
    vec![button(format!("⬅️ {}", t_lang("button-back", language_code)), action)]
}

pub fn main_menu_row(language_code: Option<&str>) -> Vec<InlineKeyboardButton> {
    vec![button(
        format!("🏠 {}", t_lang("button-main-menu", language_code)),
        CallbackAction::MainMenu,
    )]
}

pub fn cancel_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button(
        format!("❌ {}", t_lang("button-cancel", language_code)),
        CallbackAction::Cancel,
    )]])
}

/// Date of a lesson, or a marker for makeup lessons without one
pub fn lesson_date_label(lesson: &Lesson, language_code: Option<&str>) -> String {
    match &lesson.date {
        Some(date) => format_datetime(date),
        None => t_lang("lesson-date-unset", language_code),
    }
}

/// One-line summary of a lesson
pub fn format_lesson_line(lesson: &Lesson, language_code: Option<&str>) -> String {
    let makeup = if lesson.is_makeup { " 🔁" } else { "" };
    format!(
        "{} {} · {}{}",
        lesson.attendance_status.icon(),
        lesson_date_label(lesson, language_code),
        esc(&lesson.topic),
        makeup
    )
}

/// Label for a lesson button
pub fn lesson_button_label(lesson: &Lesson, language_code: Option<&str>) -> String {
    let date = match &lesson.date {
        Some(date) => format_date(date),
        None => t_lang("lesson-date-unset-short", language_code),
    };
    format!("{} {} {}", lesson.attendance_status.icon(), date, lesson.topic)
}

/// Full description of a lesson shared by tutor, student and parent views
pub fn format_lesson_details(lesson: &Lesson, language_code: Option<&str>) -> String {
    let mut text = format!(
        "📖 <b>{}</b>\n\n🗓 {}\n",
        esc(&lesson.topic),
        lesson_date_label(lesson, language_code)
    );

    if let Some(original) = &lesson.original_date {
        text.push_str(&format!(
            "↪️ {}\n",
            t_args_lang(
                "lesson-original-date",
                &[("date", &format_datetime(original))],
                language_code
            )
        ));
    }
    if lesson.is_makeup {
        text.push_str(&format!("🔁 {}\n", t_lang("lesson-makeup", language_code)));
    }

    text.push_str(&format!(
        "{} {}\n📋 {}\n{} {}\n",
        lesson.attendance_status.icon(),
        t_lang(lesson.attendance_status.message_key(), language_code),
        t_lang(lesson.lesson_status.message_key(), language_code),
        lesson.mastery_level.icon(),
        t_lang(lesson.mastery_level.message_key(), language_code),
    ));

    if let Some(skills) = &lesson.skills_developed {
        text.push_str(&format!(
            "\n🛠 <b>{}</b>: {}\n",
            t_lang("lesson-skills", language_code),
            esc(skills)
        ));
    }
    if let Some(comment) = &lesson.mastery_comment {
        text.push_str(&format!(
            "💬 <b>{}</b>: {}\n",
            t_lang("lesson-comment", language_code),
            esc(comment)
        ));
    }

    text
}

pub fn format_payment_line(payment: &Payment, language_code: Option<&str>) -> String {
    format!(
        "💳 {} · {}",
        format_date(&payment.payment_date),
        t_args_lang(
            "payment-lessons",
            &[("count", &payment.lessons_paid.to_string())],
            language_code
        )
    )
}

pub fn format_achievement(achievement: &AchievementDef, language_code: Option<&str>) -> String {
    format!(
        "{} <b>{}</b> · {}",
        achievement.icon,
        t_lang(&achievement.title_key(), language_code),
        t_lang(&achievement.description_key(), language_code)
    )
}

/// Congratulation block for freshly earned achievements, empty when there are none
pub fn format_new_achievements(achievements: &[&AchievementDef], language_code: Option<&str>) -> String {
    if achievements.is_empty() {
        return String::new();
    }

    let mut text = format!("\n\n🏆 {}\n", t_lang("achievements-new", language_code));
    for achievement in achievements {
        text.push_str(&format_achievement(achievement, language_code));
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_label_respects_char_boundaries() {
        assert_eq!(truncate_label("Дроби", 10), "Дроби");
        assert_eq!(truncate_label("Квадратные уравнения", 10), "Квадратны…");
        assert_eq!(truncate_label("Квадратные уравнения", 10).chars().count(), 10);
    }

    #[test]
    fn test_list_lines_stop_at_budget() {
        let mut text = String::new();
        let line = "x".repeat(500);
        let pushed = (0..20).take_while(|_| push_list_line(&mut text, &line)).count();
        assert_eq!(pushed, 7);
        assert!(text.chars().count() <= MAX_MESSAGE_CHARS);
        assert!(list_more_note(0, None).is_empty());
    }

    #[test]
    fn test_unchanged_edit_is_recognized() {
        assert!(is_unchanged(&RequestError::Api(ApiError::MessageNotModified)));
        assert!(!is_unchanged(&RequestError::Api(ApiError::BotBlocked)));
    }

    #[test]
    fn test_escape() {
        assert_eq!(esc("a < b & c"), "a &lt; b &amp; c");
    }
}
