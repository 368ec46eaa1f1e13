//! Callback Handler module for processing inline keyboard callback queries

use std::sync::Arc;

use anyhow::Result;
use sqlx::SqlitePool;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, MaybeInaccessibleMessage};
use tracing::{debug, info, warn};

use crate::config::{BotConfig, POINTS_FOR_ATTENDANCE, POINTS_FOR_HOMEWORK};
use crate::db;
use crate::dialogue::{BotDialogue, BotDialogueState};
use crate::errors::BotError;
use crate::localization::{t_args_lang, t_lang};
use crate::models::{AttendanceStatus, HomeworkStatus, Lesson, User, UserRole};
use crate::schedule::now_local;

use super::access::{current_user, require_role, visible_homework, visible_lesson, visible_student};
use super::callback_data::CallbackAction;
use super::dialogue_manager::{finish_homework, send_broadcast, send_prompt};
use super::library::{library_screen, material_details};
use super::message_handler::main_menu_screen;
use super::messaging::{notify_family, notify_tutors, notify_user, report_error, send_file};
use super::parent_screens::child_menu;
use super::student_screens;
use super::tutor_screens::{
    attendance_menu, attendance_result_text, cancellation_confirm, delete_lesson_confirm, delete_student_confirm,
    homework_review, lesson_card, lesson_homework, mastery_menu, monthly_report_screen, report_months, review_queue,
    schedule_day_picker, student_card, student_lessons, students_screen,
};
use super::ui_builder::{button, edit_screen, esc, format_new_achievements, main_menu_row, send_text, Screen};

/// Where a student or parent returns from a read-only screen
fn family_back(user: &User, student_id: i64, student_action: CallbackAction) -> CallbackAction {
    match user.role {
        UserRole::Parent => CallbackAction::Child(student_id),
        _ => student_action,
    }
}

async fn load_student(pool: &SqlitePool, student_id: i64) -> Result<User> {
    let student = db::get_user_by_id(pool, student_id)
        .await?
        .filter(|user| user.role == UserRole::Student)
        .ok_or(BotError::NotFound("student", student_id))?;
    Ok(student)
}

async fn load_lesson(pool: &SqlitePool, lesson_id: i64) -> Result<Lesson> {
    let lesson = db::get_lesson(pool, lesson_id)
        .await?
        .ok_or(BotError::NotFound("lesson", lesson_id))?;
    Ok(lesson)
}

/// Handle callback queries from inline keyboards
pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    pool: Arc<SqlitePool>,
    config: Arc<BotConfig>,
    dialogue: BotDialogue,
) -> Result<()> {
    debug!(user_id = %q.from.id, data = ?q.data, "Received callback query from user");

    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        warn!(user_id = %q.from.id, error = %e, "Failed to answer callback query");
    }

    let Some(message) = q.message.as_ref() else {
        return Ok(());
    };
    let Some(action) = q.data.as_deref().and_then(CallbackAction::parse) else {
        warn!(user_id = %q.from.id, data = ?q.data, "Unknown callback data");
        return Ok(());
    };

    let language_code = q.from.language_code.as_deref();
    let telegram_id = q.from.id.0 as i64;

    if let Err(e) = handle_action(&bot, message, dialogue, &pool, &config, telegram_id, action, language_code).await {
        let err = BotError::from(e);
        report_error(&bot, &config, message.chat().id, &err, language_code).await;
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn handle_action(
    bot: &Bot,
    message: &MaybeInaccessibleMessage,
    dialogue: BotDialogue,
    pool: &SqlitePool,
    config: &BotConfig,
    telegram_id: i64,
    action: CallbackAction,
    language_code: Option<&str>,
) -> Result<()> {
    let chat_id = message.chat().id;
    let user = current_user(pool, telegram_id).await?;
    let now = now_local(config.timezone_offset_hours);

    debug!(user_id = user.id, action = ?action, "Dispatching callback action");

    use CallbackAction::*;
    match action {
        MainMenu => {
            dialogue.exit().await?;
            edit_screen(bot, message, main_menu_screen(pool, &user, language_code).await?).await
        }
        Cancel => {
            dialogue.exit().await?;
            let screen = Screen::new(t_lang("cancelled", language_code), vec![main_menu_row(language_code)]);
            edit_screen(bot, message, screen).await
        }
        Library(grade) => {
            let is_tutor = user.role == UserRole::Tutor;
            edit_screen(bot, message, library_screen(pool, grade, is_tutor, language_code).await?).await
        }

        // Student
        LessonHistory => {
            require_role(&user, UserRole::Student)?;
            let screen = student_screens::lesson_history(pool, &user, now, MainMenu, true, language_code).await?;
            edit_screen(bot, message, screen).await
        }
        Schedule => {
            require_role(&user, UserRole::Student)?;
            let screen = student_screens::schedule(pool, &user, now, MainMenu, language_code).await?;
            edit_screen(bot, message, screen).await
        }
        HomeworkList => {
            require_role(&user, UserRole::Student)?;
            let screen = student_screens::homework_list(pool, &user, MainMenu, true, language_code).await?;
            edit_screen(bot, message, screen).await
        }
        Payments => {
            require_role(&user, UserRole::Student)?;
            let screen = student_screens::payments(pool, &user, now, MainMenu, language_code).await?;
            edit_screen(bot, message, screen).await
        }
        Progress => {
            require_role(&user, UserRole::Student)?;
            let screen = student_screens::progress(pool, &user, MainMenu, language_code).await?;
            edit_screen(bot, message, screen).await
        }
        LessonInfo(lesson_id) => {
            let lesson = visible_lesson(pool, &user, lesson_id).await?;
            let back = family_back(&user, lesson.student_id, LessonHistory);
            let screen = student_screens::lesson_info(pool, &lesson, back, language_code).await?;
            edit_screen(bot, message, screen).await
        }
        ViewHomework(homework_id) => {
            let entry = visible_homework(pool, &user, homework_id).await?;
            let back = match user.role {
                UserRole::Tutor => ReviewHomework(homework_id),
                _ => family_back(&user, entry.student_id, HomeworkList),
            };
            let can_submit = user.role == UserRole::Student;
            edit_screen(bot, message, student_screens::homework_details(&entry, back, can_submit, language_code)).await?;

            for file_id in entry.homework.photo_file_ids.iter() {
                if let Err(e) = send_file(bot, chat_id, file_id).await {
                    warn!(homework_id, error = %e, "Failed to send homework attachment");
                }
            }
            Ok(())
        }
        SubmitHomework(homework_id) => {
            require_role(&user, UserRole::Student)?;
            let entry = visible_homework(pool, &user, homework_id).await?;
            if entry.homework.status == HomeworkStatus::Checked {
                return Err(BotError::InvalidState(format!("homework {homework_id} is already checked")).into());
            }
            dialogue.update(BotDialogueState::SubmittingHomework { homework_id }).await?;
            send_prompt(
                bot,
                chat_id,
                t_args_lang("prompt-submission", &[("description", &esc(&entry.homework.description))], language_code),
                language_code,
            )
            .await
        }
        FinishSubmission(homework_id) => {
            require_role(&user, UserRole::Student)?;
            let entry = visible_homework(pool, &user, homework_id).await?;
            dialogue.exit().await?;

            if entry.homework.status != HomeworkStatus::Submitted {
                return send_text(bot, chat_id, t_lang("submission-empty", language_code)).await;
            }

            let notice = t_args_lang(
                "homework-submitted-notice",
                &[("name", &esc(&user.full_name)), ("topic", &esc(&entry.lesson_topic))],
                None,
            );
            let keyboard = InlineKeyboardMarkup::new(vec![vec![button(
                format!("🔍 {}", t_lang("button-review", None)),
                ReviewHomework(homework_id),
            )]]);
            notify_tutors(bot, pool, &format!("📨 {notice}"), Some(keyboard)).await?;
            info!(homework_id, student_id = user.id, "Homework submitted for review");

            send_text(bot, chat_id, format!("✅ {}", t_lang("submission-sent", language_code))).await
        }
        ChatWithTutor => {
            if user.role == UserRole::Tutor {
                return Err(BotError::AccessDenied.into());
            }
            dialogue.update(BotDialogueState::ChatWithTutor).await?;
            send_prompt(bot, chat_id, t_lang("prompt-chat", language_code), language_code).await
        }

        // Parent
        SelectChild => {
            require_role(&user, UserRole::Parent)?;
            edit_screen(bot, message, main_menu_screen(pool, &user, language_code).await?).await
        }
        Child(student_id) => {
            require_role(&user, UserRole::Parent)?;
            let child = visible_student(pool, &user, student_id).await?;
            let has_siblings = db::list_children(pool, user.id).await?.len() > 1;
            edit_screen(bot, message, child_menu(&child, has_siblings, language_code)).await
        }
        ChildProgress(student_id) => {
            require_role(&user, UserRole::Parent)?;
            let child = visible_student(pool, &user, student_id).await?;
            let screen = student_screens::progress(pool, &child, Child(student_id), language_code).await?;
            edit_screen(bot, message, screen).await
        }
        ChildSchedule(student_id) => {
            require_role(&user, UserRole::Parent)?;
            let child = visible_student(pool, &user, student_id).await?;
            let screen = student_screens::schedule(pool, &child, now, Child(student_id), language_code).await?;
            edit_screen(bot, message, screen).await
        }
        ChildPayments(student_id) => {
            require_role(&user, UserRole::Parent)?;
            let child = visible_student(pool, &user, student_id).await?;
            let screen = student_screens::payments(pool, &child, now, Child(student_id), language_code).await?;
            edit_screen(bot, message, screen).await
        }
        ChildHomework(student_id) => {
            require_role(&user, UserRole::Parent)?;
            let child = visible_student(pool, &user, student_id).await?;
            let screen = student_screens::homework_list(pool, &child, Child(student_id), false, language_code).await?;
            edit_screen(bot, message, screen).await
        }

        // Everything else belongs to the tutor
        action => {
            require_role(&user, UserRole::Tutor)?;
            handle_tutor_action(bot, message, dialogue, pool, config, action, language_code).await
        }
    }
}

async fn handle_tutor_action(
    bot: &Bot,
    message: &MaybeInaccessibleMessage,
    dialogue: BotDialogue,
    pool: &SqlitePool,
    config: &BotConfig,
    action: CallbackAction,
    language_code: Option<&str>,
) -> Result<()> {
    let chat_id = message.chat().id;
    let now = now_local(config.timezone_offset_hours);
    let today = now.date();

    use CallbackAction::*;
    match action {
        Students => edit_screen(bot, message, students_screen(pool, language_code).await?).await,
        Student(id) => {
            let student = load_student(pool, id).await?;
            edit_screen(bot, message, student_card(pool, &student, language_code).await?).await
        }
        StudentLessons(id) => {
            let student = load_student(pool, id).await?;
            edit_screen(bot, message, student_lessons(pool, &student, language_code).await?).await
        }
        AddLesson(id) => {
            let student = load_student(pool, id).await?;
            dialogue.update(BotDialogueState::AddLessonTopic { student_id: student.id }).await?;
            send_prompt(
                bot,
                chat_id,
                t_args_lang("prompt-lesson-topic", &[("name", &esc(&student.full_name))], language_code),
                language_code,
            )
            .await
        }
        WeeklySchedule(id) => {
            let student = load_student(pool, id).await?;
            dialogue
                .update(BotDialogueState::ScheduleDays {
                    student_id: student.id,
                    days: Vec::new(),
                })
                .await?;
            edit_screen(bot, message, schedule_day_picker(&student, &[], language_code)).await
        }
        ToggleScheduleDay(day) => {
            let Some(BotDialogueState::ScheduleDays { student_id, mut days }) = dialogue.get().await? else {
                return Err(BotError::InvalidState("schedule day picker is not active".to_string()).into());
            };
            if let Some(pos) = days.iter().position(|&d| d == day) {
                days.remove(pos);
            } else {
                days.push(day);
                days.sort_unstable();
            }
            let student = load_student(pool, student_id).await?;
            let screen = schedule_day_picker(&student, &days, language_code);
            dialogue.update(BotDialogueState::ScheduleDays { student_id, days }).await?;
            edit_screen(bot, message, screen).await
        }
        ScheduleDaysDone => {
            let Some(BotDialogueState::ScheduleDays { student_id, days }) = dialogue.get().await? else {
                return Err(BotError::InvalidState("schedule day picker is not active".to_string()).into());
            };
            if days.is_empty() {
                return Err(BotError::InvalidInput("schedule-no-days").into());
            }
            dialogue.update(BotDialogueState::ScheduleTime { student_id, days }).await?;
            send_prompt(bot, chat_id, t_lang("prompt-schedule-time", language_code), language_code).await
        }
        AddPayment(id) => {
            let student = load_student(pool, id).await?;
            dialogue.update(BotDialogueState::AddPayment { student_id: student.id }).await?;
            send_prompt(
                bot,
                chat_id,
                t_args_lang("prompt-payment", &[("name", &esc(&student.full_name))], language_code),
                language_code,
            )
            .await
        }
        RenameStudent(id) => {
            let student = load_student(pool, id).await?;
            dialogue.update(BotDialogueState::EditStudentName { student_id: student.id }).await?;
            send_prompt(bot, chat_id, t_lang("prompt-student-name", language_code), language_code).await
        }
        LinkParent(id) => {
            let student = load_student(pool, id).await?;
            dialogue.update(BotDialogueState::LinkParent { student_id: student.id }).await?;
            send_prompt(bot, chat_id, t_lang("prompt-link-parent", language_code), language_code).await
        }
        UnlinkParent(id) => {
            db::unlink_second_parent(pool, id).await?;
            let student = load_student(pool, id).await?;
            edit_screen(bot, message, student_card(pool, &student, language_code).await?).await
        }
        DeleteStudent(id) => {
            let student = load_student(pool, id).await?;
            edit_screen(bot, message, delete_student_confirm(&student, language_code)).await
        }
        DeleteStudentConfirmed(id) => {
            if !db::delete_student(pool, id).await? {
                return Err(BotError::NotFound("student", id).into());
            }
            send_text(bot, chat_id, format!("🗑 {}", t_lang("student-deleted", language_code))).await?;
            edit_screen(bot, message, students_screen(pool, language_code).await?).await
        }

        CallbackAction::Lesson(id) => {
            let lesson = load_lesson(pool, id).await?;
            edit_screen(bot, message, lesson_card(pool, &lesson, language_code).await?).await
        }
        AttendanceMenu(id) => {
            let lesson = load_lesson(pool, id).await?;
            edit_screen(bot, message, attendance_menu(&lesson, language_code)).await
        }
        ConfirmCancellation(id, status) => {
            let lesson = load_lesson(pool, id).await?;
            edit_screen(bot, message, cancellation_confirm(pool, &lesson, status, language_code).await?).await
        }
        SetAttendance(id, status) => apply_attendance(bot, message, pool, id, status, now, language_code).await,
        ToggleConducted(id) => {
            let current = load_lesson(pool, id).await?;
            db::set_lesson_status(pool, id, current.lesson_status.toggled()).await?;
            let updated = load_lesson(pool, id).await?;
            edit_screen(bot, message, lesson_card(pool, &updated, language_code).await?).await
        }
        MasteryMenu(id) => {
            let lesson = load_lesson(pool, id).await?;
            edit_screen(bot, message, mastery_menu(&lesson, language_code)).await
        }
        SetMastery(id, level) => {
            let lesson = load_lesson(pool, id).await?;
            dialogue
                .update(BotDialogueState::MasteryComment { lesson_id: lesson.id, level })
                .await?;
            send_prompt(bot, chat_id, t_lang("prompt-mastery-comment", language_code), language_code).await
        }
        EditTopic(id) => {
            let lesson = load_lesson(pool, id).await?;
            dialogue.update(BotDialogueState::EditLessonTopic { lesson_id: lesson.id }).await?;
            send_prompt(bot, chat_id, t_lang("prompt-lesson-new-topic", language_code), language_code).await
        }
        RescheduleLesson(id) => {
            let lesson = load_lesson(pool, id).await?;
            dialogue.update(BotDialogueState::RescheduleLesson { lesson_id: lesson.id }).await?;
            send_prompt(bot, chat_id, t_lang("prompt-reschedule", language_code), language_code).await
        }
        DeleteLesson(id) => {
            let lesson = load_lesson(pool, id).await?;
            edit_screen(bot, message, delete_lesson_confirm(&lesson, language_code)).await
        }
        DeleteLessonConfirmed(id) => {
            let lesson = load_lesson(pool, id).await?;
            db::delete_lesson(pool, id).await?;
            let student = load_student(pool, lesson.student_id).await?;
            send_text(bot, chat_id, format!("🗑 {}", t_lang("lesson-deleted", language_code))).await?;
            edit_screen(bot, message, student_lessons(pool, &student, language_code).await?).await
        }

        AddHomework(id) => {
            let lesson = load_lesson(pool, id).await?;
            dialogue
                .update(BotDialogueState::AddHomeworkDescription { lesson_id: lesson.id })
                .await?;
            send_prompt(bot, chat_id, t_lang("prompt-homework-description", language_code), language_code).await
        }
        FinishHomework => {
            let Some(BotDialogueState::AddHomeworkAttachments {
                lesson_id,
                description,
                deadline,
                file_link,
                photo_file_ids,
            }) = dialogue.get().await?
            else {
                return Err(BotError::InvalidState("no homework is being created".to_string()).into());
            };
            dialogue.exit().await?;
            finish_homework(
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
            .await
        }
        LessonHomework(id) => {
            let lesson = load_lesson(pool, id).await?;
            edit_screen(bot, message, lesson_homework(pool, &lesson, language_code).await?).await
        }
        ReviewHomework(id) => {
            let entry = db::get_homework_entry(pool, id)
                .await?
                .ok_or(BotError::NotFound("homework", id))?;
            let student = load_student(pool, entry.student_id).await?;
            edit_screen(bot, message, homework_review(&entry, &student, language_code)).await?;

            for file_id in entry.homework.submission_file_ids.iter() {
                if let Err(e) = send_file(bot, chat_id, file_id).await {
                    warn!(homework_id = id, error = %e, "Failed to send submitted file");
                }
            }
            Ok(())
        }
        SetHomeworkStatus(id, status) => {
            let review = db::set_homework_status(pool, id, status, now).await?;
            let entry = db::get_homework_entry(pool, id)
                .await?
                .ok_or(BotError::NotFound("homework", id))?;
            let student = load_student(pool, entry.student_id).await?;

            let notice = match status {
                HomeworkStatus::Checked => {
                    let mut notice = format!(
                        "✅ {}",
                        t_args_lang("homework-checked-notice", &[("topic", &esc(&entry.lesson_topic))], None)
                    );
                    if review.points_awarded {
                        notice.push_str(&format!(
                            "\n⭐ {}",
                            t_args_lang("points-awarded", &[("points", &POINTS_FOR_HOMEWORK.to_string())], None)
                        ));
                    }
                    notice.push_str(&format_new_achievements(&review.new_achievements, None));
                    Some(notice)
                }
                HomeworkStatus::Pending => Some(format!(
                    "↩️ {}",
                    t_args_lang("homework-returned-notice", &[("topic", &esc(&entry.lesson_topic))], None)
                )),
                HomeworkStatus::Submitted => None,
            };
            if let Some(notice) = notice {
                notify_user(bot, &student, &notice).await;
            }

            edit_screen(bot, message, homework_review(&entry, &student, language_code)).await
        }
        DeleteHomework(id) => {
            let entry = db::get_homework_entry(pool, id)
                .await?
                .ok_or(BotError::NotFound("homework", id))?;
            db::delete_homework(pool, id).await?;
            let lesson = load_lesson(pool, entry.homework.lesson_id).await?;
            edit_screen(bot, message, lesson_homework(pool, &lesson, language_code).await?).await
        }
        ReviewQueue => edit_screen(bot, message, review_queue(pool, language_code).await?).await,

        ReportStudent(id) => {
            let student = load_student(pool, id).await?;
            edit_screen(bot, message, report_months(&student, today, language_code)).await
        }
        ReportMonth(id, months_back) => {
            let screen = monthly_report_screen(pool, id, today, months_back, language_code).await?;
            edit_screen(bot, message, screen).await
        }
        Material(id) => {
            let material = db::get_material(pool, id)
                .await?
                .ok_or(BotError::NotFound("material", id))?;
            edit_screen(bot, message, material_details(&material, language_code)).await
        }
        AddMaterial(grade) => {
            dialogue.update(BotDialogueState::AddMaterialTitle { grade }).await?;
            send_prompt(bot, chat_id, t_lang("prompt-material-title", language_code), language_code).await
        }
        DeleteMaterial(id) => {
            let material = db::get_material(pool, id)
                .await?
                .ok_or(BotError::NotFound("material", id))?;
            db::delete_material(pool, id).await?;
            edit_screen(bot, message, library_screen(pool, material.grade, true, language_code).await?).await
        }
        BroadcastSend => {
            let Some(BotDialogueState::BroadcastConfirm { text }) = dialogue.get().await? else {
                return Err(BotError::InvalidState("no broadcast is waiting for confirmation".to_string()).into());
            };
            dialogue.exit().await?;
            let screen = Screen::new(format!("📣 {}", t_lang("broadcast-sending", language_code)), Vec::new());
            edit_screen(bot, message, screen).await?;
            send_broadcast(bot, chat_id, pool, &text, language_code).await
        }
        BroadcastCancel => {
            dialogue.exit().await?;
            let screen = Screen::new(t_lang("broadcast-cancelled", language_code), vec![main_menu_row(language_code)]);
            edit_screen(bot, message, screen).await
        }
        ReplyTo(recipient_telegram_id) => {
            let recipient = db::get_user_by_telegram_id(pool, recipient_telegram_id)
                .await?
                .ok_or(BotError::NotFound("user", recipient_telegram_id))?;
            dialogue
                .update(BotDialogueState::TutorReplying {
                    recipient_telegram_id,
                    recipient_name: recipient.full_name.clone(),
                })
                .await?;
            send_prompt(
                bot,
                chat_id,
                t_args_lang("prompt-reply", &[("name", &esc(&recipient.full_name))], language_code),
                language_code,
            )
            .await
        }

        // Shared and family actions are dispatched before reaching here
        MainMenu | Cancel | Library(_) | LessonHistory | Schedule | HomeworkList | Payments | Progress
        | ChatWithTutor | LessonInfo(_) | ViewHomework(_) | SubmitHomework(_) | FinishSubmission(_) | SelectChild
        | Child(_) | ChildProgress(_) | ChildSchedule(_) | ChildPayments(_) | ChildHomework(_) => Ok(()),
    }
}

/// Change attendance, then report points, moved topics and achievements
async fn apply_attendance(
    bot: &Bot,
    message: &MaybeInaccessibleMessage,
    pool: &SqlitePool,
    lesson_id: i64,
    status: AttendanceStatus,
    now: chrono::NaiveDateTime,
    language_code: Option<&str>,
) -> Result<()> {
    let chat_id = message.chat().id;
    let change = db::set_attendance_status(pool, lesson_id, status, now).await?;

    if !change.changed() {
        return edit_screen(bot, message, lesson_card(pool, &change.lesson, language_code).await?).await;
    }

    let moved = change.shift.as_ref().map_or(0, |plan| plan.reassignments.len());
    let mut text = attendance_result_text(&change.lesson, moved, language_code);
    if change.points_delta != 0 {
        text.push_str(&format!(
            "\n⭐ {}",
            t_args_lang("points-changed", &[("points", &format!("{:+}", change.points_delta))], language_code)
        ));
    }
    text.push_str(&format_new_achievements(&change.new_achievements, language_code));
    send_text(bot, chat_id, text).await?;

    if let Some(student) = db::get_user_by_id(pool, change.lesson.student_id).await? {
        let topic = esc(&change.lesson.topic);
        if status == AttendanceStatus::Attended {
            let notice = format!(
                "✅ {}\n⭐ {}{}",
                t_args_lang("attendance-notice", &[("topic", &topic)], None),
                t_args_lang("points-awarded", &[("points", &POINTS_FOR_ATTENDANCE.to_string())], None),
                format_new_achievements(&change.new_achievements, None)
            );
            notify_user(bot, &student, &notice).await;
        } else if change.shift.is_some() {
            let notice = t_args_lang(
                "lesson-cancelled-notice",
                &[
                    ("topic", &topic),
                    ("status", &t_lang(status.message_key(), None))
                ],
                None,
            );
            notify_family(bot, pool, &student, &format!("🔁 {notice}")).await?;
        }
    }

    edit_screen(bot, message, lesson_card(pool, &change.lesson, language_code).await?).await
}
