//! Dialogue Manager module for handling multi-step inputs

use anyhow::Result;
use chrono::NaiveDateTime;
use sqlx::SqlitePool;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::{debug, info, warn};

use crate::access_code::normalize_access_code;
use crate::config::{BotConfig, POINTS_FOR_MASTERY};
use crate::db::{self, ParentLink, Submission};
use crate::dialogue::{
    is_skip_input, parse_lessons_paid, validate_full_name, validate_link, validate_text, validate_topic, BotDialogue,
    BotDialogueState,
};
use crate::errors::BotError;
use crate::localization::{t_args_lang, t_lang};
use crate::models::{MasteryLevel, User, UserRole};
use crate::schedule::{
    format_datetime, now_local, parse_deadline, parse_lesson_datetime, parse_time, weekday_from_index,
    weekly_occurrences,
};

use super::access::{require_role, visible_homework};
use super::callback_data::CallbackAction;
use super::messaging::{broadcast, notify_family, notify_user, relay_to_tutors, send_file, send_tutor_reply};
use super::tutor_screens::{broadcast_preview, lesson_card, student_card};
use super::ui_builder::{button, cancel_keyboard, esc, format_new_achievements, send_screen, send_text};

/// Localization key explaining a validation failure
pub fn input_error_key(err: &str) -> &'static str {
    match err {
        "empty" => "input-empty",
        "too_long" => "input-too-long",
        "invalid_format" => "input-invalid-format",
        "invalid_link" => "input-invalid-link",
        "invalid_number" => "input-invalid-number",
        "out_of_range" => "input-out-of-range",
        _ => "input-invalid",
    }
}

/// Ask for the next input, with a cancel button
pub async fn send_prompt(bot: &Bot, chat_id: ChatId, text: String, language_code: Option<&str>) -> Result<()> {
    bot.send_message(chat_id, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(cancel_keyboard(language_code))
        .await?;
    Ok(())
}

/// Explain why the input was rejected. The dialogue stays where it is.
async fn reject_input(bot: &Bot, chat_id: ChatId, err: &str, language_code: Option<&str>) -> Result<()> {
    debug!(chat_id = %chat_id, reason = err, "Dialogue input rejected");
    send_prompt(bot, chat_id, format!("❌ {}", t_lang(input_error_key(err), language_code)), language_code).await
}

/// Telegram file id of a photo (largest size) or document in the message
pub fn message_file_id(msg: &Message) -> Option<String> {
    if let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) {
        return Some(photo.file.id.0.clone());
    }
    msg.document().map(|doc| doc.file.id.0.clone())
}

/// Route a message to the handler of the active dialogue state
#[allow(clippy::too_many_arguments)]
pub async fn handle_dialogue_input(
    bot: &Bot,
    msg: &Message,
    dialogue: BotDialogue,
    pool: &SqlitePool,
    config: &BotConfig,
    user: &User,
    state: BotDialogueState,
    language_code: Option<&str>,
) -> Result<()> {
    let chat_id = msg.chat.id;
    let text = msg.text().unwrap_or_default();
    let now = now_local(config.timezone_offset_hours);

    debug!(user_id = user.id, state = ?state, "Handling dialogue input");

    match state {
        BotDialogueState::SubmittingHomework { homework_id } => {
            return handle_homework_submission(bot, msg, pool, user, homework_id, language_code).await;
        }
        BotDialogueState::ChatWithTutor => {
            let delivered = relay_to_tutors(bot, pool, user, msg).await?;
            dialogue.exit().await?;
            let key = if delivered > 0 { "chat-sent" } else { "chat-no-tutors" };
            return send_text(bot, chat_id, t_lang(key, language_code)).await;
        }
        BotDialogueState::Start | BotDialogueState::AwaitingAccessCode => return Ok(()),
        _ => {}
    }

    // Everything below is a tutor workflow
    require_role(user, UserRole::Tutor)?;

    match state {
        BotDialogueState::TutorReplying {
            recipient_telegram_id,
            recipient_name,
        } => {
            send_tutor_reply(bot, recipient_telegram_id, msg).await?;
            dialogue.exit().await?;
            send_text(
                bot,
                chat_id,
                t_args_lang("chat-reply-sent", &[("name", &esc(&recipient_name))], language_code),
            )
            .await
        }
        BotDialogueState::AddHomeworkAttachments {
            lesson_id,
            description,
            deadline,
            file_link,
            photo_file_ids,
        } => {
            handle_homework_attachment(
                bot,
                msg,
                dialogue,
                pool,
                lesson_id,
                description,
                deadline,
                file_link,
                photo_file_ids,
                language_code,
            )
            .await
        }
        _ if msg.text().is_none() => {
            send_prompt(bot, chat_id, t_lang("input-text-expected", language_code), language_code).await
        }
        BotDialogueState::AddStudentName => match validate_full_name(text) {
            Ok(student_name) => {
                dialogue.update(BotDialogueState::AddStudentParent { student_name }).await?;
                send_prompt(bot, chat_id, t_lang("prompt-parent-name", language_code), language_code).await
            }
            Err(err) => reject_input(bot, chat_id, err, language_code).await,
        },
        BotDialogueState::AddStudentParent { student_name } => {
            let parent_name = if is_skip_input(text) {
                None
            } else {
                match validate_full_name(text) {
                    Ok(name) => Some(name),
                    Err(err) => return reject_input(bot, chat_id, err, language_code).await,
                }
            };

            let (student, parent) = db::create_student_with_parent(pool, &student_name, parent_name.as_deref()).await?;
            dialogue.exit().await?;
            info!(student_id = student.id, with_parent = parent.is_some(), "Student added by tutor");

            send_text(bot, chat_id, format!("✅ {}", t_lang("student-added", language_code))).await?;
            send_screen(bot, chat_id, student_card(pool, &student, language_code).await?).await
        }
        BotDialogueState::EditStudentName { student_id } => match validate_full_name(text) {
            Ok(name) => {
                if !db::update_full_name(pool, student_id, &name).await? {
                    return Err(BotError::NotFound("student", student_id).into());
                }
                dialogue.exit().await?;
                let student = db::get_user_by_id(pool, student_id)
                    .await?
                    .ok_or(BotError::NotFound("student", student_id))?;
                send_screen(bot, chat_id, student_card(pool, &student, language_code).await?).await
            }
            Err(err) => reject_input(bot, chat_id, err, language_code).await,
        },
        BotDialogueState::LinkParent { student_id } => {
            handle_link_parent(bot, chat_id, dialogue, pool, student_id, text, language_code).await
        }
        BotDialogueState::AddPayment { student_id } => match parse_lessons_paid(text) {
            Ok(lessons_paid) => {
                let student = db::get_user_by_id(pool, student_id)
                    .await?
                    .ok_or(BotError::NotFound("student", student_id))?;
                db::create_payment(pool, student_id, lessons_paid, now).await?;
                let balance = db::get_student_balance(pool, student_id).await?;
                dialogue.exit().await?;

                let args = [
                    ("count", lessons_paid.to_string()),
                    ("balance", balance.to_string()),
                ];
                let args: Vec<(&str, &str)> = args.iter().map(|(k, v)| (*k, v.as_str())).collect();

                let notice = t_args_lang("payment-recorded", &args, None);
                notify_family(bot, pool, &student, &format!("💳 {notice}")).await?;

                let confirmation = t_args_lang("payment-recorded", &args, language_code);
                send_text(bot, chat_id, format!("✅ {confirmation}")).await?;
                send_screen(bot, chat_id, student_card(pool, &student, language_code).await?).await
            }
            Err(err) => reject_input(bot, chat_id, err, language_code).await,
        },
        BotDialogueState::AddLessonTopic { student_id } => match validate_topic(text) {
            Ok(topic) => {
                dialogue.update(BotDialogueState::AddLessonDate { student_id, topic }).await?;
                send_prompt(bot, chat_id, t_lang("prompt-lesson-date", language_code), language_code).await
            }
            Err(err) => reject_input(bot, chat_id, err, language_code).await,
        },
        BotDialogueState::AddLessonDate { student_id, topic } => {
            let date = if is_skip_input(text) {
                None
            } else {
                match parse_lesson_datetime(text) {
                    Ok(date) => Some(date),
                    Err(err) => return reject_input(bot, chat_id, err, language_code).await,
                }
            };
            dialogue
                .update(BotDialogueState::AddLessonSkills { student_id, topic, date })
                .await?;
            send_prompt(bot, chat_id, t_lang("prompt-lesson-skills", language_code), language_code).await
        }
        BotDialogueState::AddLessonSkills { student_id, topic, date } => {
            let skills = if is_skip_input(text) {
                None
            } else {
                match validate_text(text) {
                    Ok(skills) => Some(skills),
                    Err(err) => return reject_input(bot, chat_id, err, language_code).await,
                }
            };

            let lesson = db::create_lesson(pool, student_id, &topic, date, skills.as_deref()).await?;
            dialogue.exit().await?;

            if let Some(date) = &lesson.date {
                if let Some(student) = db::get_user_by_id(pool, student_id).await? {
                    let notice = t_args_lang(
                        "lesson-scheduled-notice",
                        &[("topic", &esc(&lesson.topic)), ("date", &format_datetime(date))],
                        None,
                    );
                    notify_family(bot, pool, &student, &format!("🗓 {notice}")).await?;
                }
            }

            send_text(bot, chat_id, format!("✅ {}", t_lang("lesson-added", language_code))).await?;
            send_screen(bot, chat_id, lesson_card(pool, &lesson, language_code).await?).await
        }
        BotDialogueState::ScheduleTime { student_id, days } => match parse_time(text) {
            Ok(time) => {
                let weekdays: Vec<_> = days.iter().filter_map(|&day| weekday_from_index(day)).collect();
                let slots = weekly_occurrences(&weekdays, time, now, config.reminders.schedule_weeks);
                let created =
                    db::create_scheduled_lessons(pool, student_id, &slots, &t_lang("schedule-default-topic", None))
                        .await?;
                dialogue.exit().await?;

                info!(student_id, created, slots = slots.len(), "Weekly schedule generated");
                send_text(
                    bot,
                    chat_id,
                    format!(
                        "✅ {}",
                        t_args_lang(
                            "schedule-created",
                            &[
                                ("count", &created.to_string()),
                                ("weeks", &config.reminders.schedule_weeks.to_string())
                            ],
                            language_code
                        )
                    ),
                )
                .await
            }
            Err(err) => reject_input(bot, chat_id, err, language_code).await,
        },
        BotDialogueState::EditLessonTopic { lesson_id } => match validate_topic(text) {
            Ok(topic) => {
                if !db::update_lesson_topic(pool, lesson_id, &topic).await? {
                    return Err(BotError::NotFound("lesson", lesson_id).into());
                }
                dialogue.exit().await?;
                let lesson = db::get_lesson(pool, lesson_id)
                    .await?
                    .ok_or(BotError::NotFound("lesson", lesson_id))?;
                send_screen(bot, chat_id, lesson_card(pool, &lesson, language_code).await?).await
            }
            Err(err) => reject_input(bot, chat_id, err, language_code).await,
        },
        BotDialogueState::RescheduleLesson { lesson_id } => match parse_lesson_datetime(text) {
            Ok(new_date) => {
                if !db::reschedule_lesson(pool, lesson_id, new_date).await? {
                    return Err(BotError::NotFound("lesson", lesson_id).into());
                }
                dialogue.exit().await?;
                let lesson = db::get_lesson(pool, lesson_id)
                    .await?
                    .ok_or(BotError::NotFound("lesson", lesson_id))?;

                if let Some(student) = db::get_user_by_id(pool, lesson.student_id).await? {
                    let notice = t_args_lang(
                        "lesson-rescheduled-notice",
                        &[("topic", &esc(&lesson.topic)), ("date", &format_datetime(&new_date))],
                        None,
                    );
                    notify_family(bot, pool, &student, &format!("🕒 {notice}")).await?;
                }

                send_screen(bot, chat_id, lesson_card(pool, &lesson, language_code).await?).await
            }
            Err(err) => reject_input(bot, chat_id, err, language_code).await,
        },
        BotDialogueState::MasteryComment { lesson_id, level } => {
            let comment = if is_skip_input(text) {
                None
            } else {
                match validate_text(text) {
                    Ok(comment) => Some(comment),
                    Err(err) => return reject_input(bot, chat_id, err, language_code).await,
                }
            };
            dialogue.exit().await?;
            apply_mastery(bot, chat_id, pool, lesson_id, level, comment.as_deref(), language_code).await
        }
        BotDialogueState::AddHomeworkDescription { lesson_id } => match validate_text(text) {
            Ok(description) => {
                dialogue
                    .update(BotDialogueState::AddHomeworkDeadline { lesson_id, description })
                    .await?;
                send_prompt(bot, chat_id, t_lang("prompt-homework-deadline", language_code), language_code).await
            }
            Err(err) => reject_input(bot, chat_id, err, language_code).await,
        },
        BotDialogueState::AddHomeworkDeadline { lesson_id, description } => {
            let deadline = if is_skip_input(text) {
                None
            } else {
                match parse_deadline(text) {
                    Ok(deadline) => Some(deadline),
                    Err(err) => return reject_input(bot, chat_id, err, language_code).await,
                }
            };
            dialogue
                .update(BotDialogueState::AddHomeworkAttachments {
                    lesson_id,
                    description,
                    deadline,
                    file_link: None,
                    photo_file_ids: Vec::new(),
                })
                .await?;
            send_attachments_prompt(bot, chat_id, 0, language_code).await
        }
        BotDialogueState::AddMaterialTitle { grade } => match validate_topic(text) {
            Ok(title) => {
                dialogue.update(BotDialogueState::AddMaterialLink { grade, title }).await?;
                send_prompt(bot, chat_id, t_lang("prompt-material-link", language_code), language_code).await
            }
            Err(err) => reject_input(bot, chat_id, err, language_code).await,
        },
        BotDialogueState::AddMaterialLink { grade, title } => match validate_link(text) {
            Ok(link) => {
                dialogue
                    .update(BotDialogueState::AddMaterialDescription { grade, title, link })
                    .await?;
                send_prompt(bot, chat_id, t_lang("prompt-material-description", language_code), language_code).await
            }
            Err(err) => reject_input(bot, chat_id, err, language_code).await,
        },
        BotDialogueState::AddMaterialDescription { grade, title, link } => {
            let description = if is_skip_input(text) {
                None
            } else {
                match validate_text(text) {
                    Ok(description) => Some(description),
                    Err(err) => return reject_input(bot, chat_id, err, language_code).await,
                }
            };
            db::create_material(pool, &title, &link, description.as_deref(), grade).await?;
            dialogue.exit().await?;
            send_text(bot, chat_id, format!("✅ {}", t_lang("material-added", language_code))).await?;
            send_screen(
                bot,
                chat_id,
                super::library::library_screen(pool, grade, true, language_code).await?,
            )
            .await
        }
        BotDialogueState::BroadcastText => match validate_text(text) {
            Ok(text) => {
                let recipients = db::list_broadcast_recipients(pool).await?.len();
                dialogue
                    .update(BotDialogueState::BroadcastConfirm { text: text.clone() })
                    .await?;
                send_screen(bot, chat_id, broadcast_preview(&text, recipients, language_code)).await
            }
            Err(err) => reject_input(bot, chat_id, err, language_code).await,
        },
        BotDialogueState::BroadcastConfirm { .. } => {
            send_text(bot, chat_id, t_lang("broadcast-use-buttons", language_code)).await
        }
        // Day selection happens on the inline keyboard
        BotDialogueState::ScheduleDays { .. } => {
            send_text(bot, chat_id, t_lang("schedule-use-buttons", language_code)).await
        }
        BotDialogueState::Start
        | BotDialogueState::AwaitingAccessCode
        | BotDialogueState::SubmittingHomework { .. }
        | BotDialogueState::ChatWithTutor => Ok(()),
    }
}

/// Link an existing parent (by access code or name) or create a new one
async fn handle_link_parent(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: BotDialogue,
    pool: &SqlitePool,
    student_id: i64,
    text: &str,
    language_code: Option<&str>,
) -> Result<()> {
    let student = db::get_user_by_id(pool, student_id)
        .await?
        .ok_or(BotError::NotFound("student", student_id))?;

    if student.parent_id.is_some() && student.second_parent_id.is_some() {
        dialogue.exit().await?;
        return send_text(bot, chat_id, t_lang("parent-no-free-slot", language_code)).await;
    }

    let by_code = match normalize_access_code(text) {
        Ok(code) => db::get_user_by_access_code(pool, &code)
            .await?
            .filter(|user| user.role == UserRole::Parent),
        Err(_) => None,
    };

    let parent = match by_code {
        Some(parent) => parent,
        None => {
            let name = match validate_full_name(text) {
                Ok(name) => name,
                Err(err) => return reject_input(bot, chat_id, err, language_code).await,
            };
            match db::find_user_by_full_name(pool, UserRole::Parent, &name).await? {
                Some(parent) => parent,
                None => db::create_user(pool, &name, UserRole::Parent).await?,
            }
        }
    };

    let key = match db::link_parent(pool, student_id, parent.id).await? {
        ParentLink::First | ParentLink::Second => "parent-linked",
        ParentLink::AlreadyLinked => "parent-already-linked",
        ParentLink::NoFreeSlot => "parent-no-free-slot",
    };
    dialogue.exit().await?;

    send_text(
        bot,
        chat_id,
        t_args_lang(
            key,
            &[("name", &esc(&parent.full_name)), ("code", &esc(&parent.access_code))],
            language_code,
        ),
    )
    .await?;

    let student = db::get_user_by_id(pool, student_id)
        .await?
        .ok_or(BotError::NotFound("student", student_id))?;
    send_screen(bot, chat_id, student_card(pool, &student, language_code).await?).await
}

/// Save a mastery level and report points and achievements
pub async fn apply_mastery(
    bot: &Bot,
    chat_id: ChatId,
    pool: &SqlitePool,
    lesson_id: i64,
    level: MasteryLevel,
    comment: Option<&str>,
    language_code: Option<&str>,
) -> Result<()> {
    let change = db::set_mastery(pool, lesson_id, level, comment).await?;

    let mut text = format!(
        "✅ {} {}",
        level.icon(),
        t_lang(level.message_key(), language_code)
    );
    if change.points_awarded {
        text.push_str(&format!(
            "\n⭐ {}",
            t_args_lang(
                "points-awarded",
                &[("points", &POINTS_FOR_MASTERY.to_string())],
                language_code
            )
        ));
    }
    text.push_str(&format_new_achievements(&change.new_achievements, language_code));
    send_text(bot, chat_id, text).await?;

    if change.points_awarded || !change.new_achievements.is_empty() {
        if let Some(student) = db::get_user_by_id(pool, change.lesson.student_id).await? {
            let notice = format!(
                "🎓 {}{}",
                t_args_lang("mastery-notice", &[("topic", &esc(&change.lesson.topic))], None),
                format_new_achievements(&change.new_achievements, None)
            );
            notify_user(bot, &student, &notice).await;
        }
    }

    send_screen(bot, chat_id, lesson_card(pool, &change.lesson, language_code).await?).await
}

async fn send_attachments_prompt(bot: &Bot, chat_id: ChatId, attached: usize, language_code: Option<&str>) -> Result<()> {
    let text = t_args_lang(
        "prompt-homework-attachments",
        &[("count", &attached.to_string())],
        language_code,
    );
    let keyboard = teloxide::types::InlineKeyboardMarkup::new(vec![
        vec![button(
            format!("✅ {}", t_lang("button-done", language_code)),
            CallbackAction::FinishHomework,
        )],
        vec![button(
            format!("❌ {}", t_lang("button-cancel", language_code)),
            CallbackAction::Cancel,
        )],
    ]);
    bot.send_message(chat_id, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboard)
        .await?;
    Ok(())
}

/// Collect a link or photos for a new assignment. Skip finishes it.
#[allow(clippy::too_many_arguments)]
async fn handle_homework_attachment(
    bot: &Bot,
    msg: &Message,
    dialogue: BotDialogue,
    pool: &SqlitePool,
    lesson_id: i64,
    description: String,
    deadline: Option<NaiveDateTime>,
    mut file_link: Option<String>,
    mut photo_file_ids: Vec<String>,
    language_code: Option<&str>,
) -> Result<()> {
    let chat_id = msg.chat.id;

    if let Some(text) = msg.text() {
        if is_skip_input(text) {
            dialogue.exit().await?;
            return finish_homework(
                bot,
                chat_id,
                pool,
                lesson_id,
                &description,
                deadline,
                file_link.as_deref(),
                &photo_file_ids,
                language_code,
            )
            .await;
        }
        match validate_link(text) {
            Ok(link) => file_link = Some(link),
            Err(err) => return reject_input(bot, chat_id, err, language_code).await,
        }
    } else if let Some(file_id) = message_file_id(msg) {
        photo_file_ids.push(file_id);
    } else {
        return send_attachments_prompt(bot, chat_id, photo_file_ids.len(), language_code).await;
    }

    let attached = photo_file_ids.len() + usize::from(file_link.is_some());
    dialogue
        .update(BotDialogueState::AddHomeworkAttachments {
            lesson_id,
            description,
            deadline,
            file_link,
            photo_file_ids,
        })
        .await?;
    send_attachments_prompt(bot, chat_id, attached, language_code).await
}

/// Create the assignment and tell the student's family
#[allow(clippy::too_many_arguments)]
pub async fn finish_homework(
    bot: &Bot,
    chat_id: ChatId,
    pool: &SqlitePool,
    lesson_id: i64,
    description: &str,
    deadline: Option<NaiveDateTime>,
    file_link: Option<&str>,
    photo_file_ids: &[String],
    language_code: Option<&str>,
) -> Result<()> {
    let lesson = db::get_lesson(pool, lesson_id)
        .await?
        .ok_or(BotError::NotFound("lesson", lesson_id))?;
    db::create_homework(pool, lesson_id, description, deadline, file_link, photo_file_ids).await?;

    if let Some(student) = db::get_user_by_id(pool, lesson.student_id).await? {
        let mut notice = format!(
            "📝 {}\n\n{}",
            t_args_lang("homework-assigned-notice", &[("topic", &esc(&lesson.topic))], None),
            esc(description)
        );
        if let Some(deadline) = &deadline {
            notice.push_str(&format!(
                "\n⏰ {}",
                t_args_lang("homework-deadline", &[("date", &format_datetime(deadline))], None)
            ));
        }
        notify_family(bot, pool, &student, &notice).await?;
        if let Some(telegram_id) = student.telegram_id {
            for file_id in photo_file_ids {
                if let Err(e) = send_file(bot, ChatId(telegram_id), file_id).await {
                    warn!(student_id = student.id, error = %e, "Failed to send homework attachment");
                }
            }
        }
    }

    send_text(bot, chat_id, format!("✅ {}", t_lang("homework-added", language_code))).await?;
    send_screen(bot, chat_id, lesson_card(pool, &lesson, language_code).await?).await
}

/// Store part of a student's answer. The student stays in submission mode
/// until they press the finish button.
async fn handle_homework_submission(
    bot: &Bot,
    msg: &Message,
    pool: &SqlitePool,
    user: &User,
    homework_id: i64,
    language_code: Option<&str>,
) -> Result<()> {
    let chat_id = msg.chat.id;
    require_role(user, UserRole::Student)?;
    visible_homework(pool, user, homework_id).await?;

    let submission = if let Some(text) = msg.text() {
        match validate_text(text) {
            Ok(text) => Submission::Text(text),
            Err(err) => return reject_input(bot, chat_id, err, language_code).await,
        }
    } else if let Some(file_id) = message_file_id(msg) {
        Submission::File(file_id)
    } else {
        return send_text(bot, chat_id, t_lang("submission-unsupported", language_code)).await;
    };

    db::submit_homework(pool, homework_id, submission).await?;

    let keyboard = teloxide::types::InlineKeyboardMarkup::new(vec![vec![button(
        format!("📤 {}", t_lang("button-finish-submission", language_code)),
        CallbackAction::FinishSubmission(homework_id),
    )]]);
    bot.send_message(chat_id, t_lang("submission-saved", language_code))
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboard)
        .await?;
    Ok(())
}

/// Send the confirmed broadcast and report delivery
pub async fn send_broadcast(bot: &Bot, chat_id: ChatId, pool: &SqlitePool, text: &str, language_code: Option<&str>) -> Result<()> {
    let outcome = broadcast(bot, pool, text).await?;
    send_text(
        bot,
        chat_id,
        t_args_lang(
            "broadcast-done",
            &[
                ("sent", &outcome.sent.to_string()),
                ("failed", &outcome.failed.to_string())
            ],
            language_code,
        ),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_keys() {
        assert_eq!(input_error_key("empty"), "input-empty");
        assert_eq!(input_error_key("too_long"), "input-too-long");
        assert_eq!(input_error_key("invalid_link"), "input-invalid-link");
        assert_eq!(input_error_key("something else"), "input-invalid");
    }
}
