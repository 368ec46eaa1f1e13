//! Screens showing a student's own data. Parents see the same screens for
//! their children, without the buttons that change anything.

use anyhow::Result;
use chrono::{Duration, NaiveDateTime};
use sqlx::SqlitePool;

use crate::config::{ATTENDANCE_WINDOW_DAYS, LESSON_HISTORY_LIMIT, RECENT_PAYMENTS_LIMIT, UPCOMING_LESSONS_LIMIT};
use crate::db;
use crate::gamification::achievement_def;
use crate::localization::{t_args_lang, t_lang};
use crate::models::{HomeworkEntry, HomeworkStatus, Lesson, User};
use crate::schedule::format_datetime;

use super::callback_data::CallbackAction;
use super::ui_builder::{
    back_row, button, esc, format_achievement, format_lesson_details, format_lesson_line, format_payment_line,
    lesson_button_label, list_more_note, push_list_line, truncate_label, Screen,
};

/// Checked homework listed after the open assignments
const CHECKED_HOMEWORK_SHOWN: usize = 10;
/// Upper bound of list entries, which keeps the keyboard small
const HOMEWORK_SHOWN: usize = 30;
const LIST_TOPIC_CHARS: usize = 40;
const LIST_DESCRIPTION_CHARS: usize = 80;

pub fn student_menu(student: &User, language_code: Option<&str>) -> Screen {
    let text = format!(
        "👋 {}\n\n⭐ {}",
        t_args_lang("student-menu-title", &[("name", &esc(&student.full_name))], language_code),
        t_args_lang(
            "student-menu-points",
            &[
                ("points", &student.points.to_string()),
                ("streak", &student.streak_days.to_string())
            ],
            language_code
        )
    );

    let rows = vec![
        vec![
            button(format!("📚 {}", t_lang("menu-lesson-history", language_code)), CallbackAction::LessonHistory),
            button(format!("🗓 {}", t_lang("menu-schedule", language_code)), CallbackAction::Schedule),
        ],
        vec![
            button(format!("📝 {}", t_lang("menu-homework", language_code)), CallbackAction::HomeworkList),
            button(format!("💳 {}", t_lang("menu-payments", language_code)), CallbackAction::Payments),
        ],
        vec![
            button(format!("🏆 {}", t_lang("menu-progress", language_code)), CallbackAction::Progress),
            button(format!("📖 {}", t_lang("menu-library", language_code)), CallbackAction::Library(None)),
        ],
        vec![button(
            format!("💬 {}", t_lang("menu-chat", language_code)),
            CallbackAction::ChatWithTutor,
        )],
    ];

    Screen::new(text, rows)
}

/// Past lessons, newest first. Students can open each lesson.
pub async fn lesson_history(
    pool: &SqlitePool,
    student: &User,
    now: NaiveDateTime,
    back: CallbackAction,
    interactive: bool,
    language_code: Option<&str>,
) -> Result<Screen> {
    let lessons = db::list_lesson_history(pool, student.id, now, LESSON_HISTORY_LIMIT).await?;

    let mut text = format!(
        "📚 <b>{}</b>\n\n",
        t_args_lang("history-title", &[("name", &esc(&student.full_name))], language_code)
    );
    let mut rows = Vec::new();

    if lessons.is_empty() {
        text.push_str(&t_lang("history-empty", language_code));
    }
    for lesson in &lessons {
        text.push_str(&format!(
            "{} {}\n",
            format_lesson_line(lesson, language_code),
            lesson.mastery_level.icon()
        ));
        if interactive {
            rows.push(vec![button(
                lesson_button_label(lesson, language_code),
                CallbackAction::LessonInfo(lesson.id),
            )]);
        }
    }

    rows.push(back_row(back, language_code));
    Ok(Screen::new(text, rows))
}

/// Lesson details with its homework
pub async fn lesson_info(
    pool: &SqlitePool,
    lesson: &Lesson,
    back: CallbackAction,
    language_code: Option<&str>,
) -> Result<Screen> {
    let homework = db::list_homework_for_lesson(pool, lesson.id).await?;

    let mut text = format_lesson_details(lesson, language_code);
    let mut rows = Vec::new();

    if !homework.is_empty() {
        text.push_str(&format!("\n📝 <b>{}</b>\n", t_lang("homework-title", language_code)));
    }
    for hw in &homework {
        text.push_str(&format!("{} {}\n", hw.status.icon(), esc(&hw.description)));
        rows.push(vec![button(
            format!("{} {}", hw.status.icon(), hw.description),
            CallbackAction::ViewHomework(hw.id),
        )]);
    }

    rows.push(back_row(back, language_code));
    Ok(Screen::new(text, rows))
}

/// Upcoming lessons plus makeup lessons waiting for a date
pub async fn schedule(
    pool: &SqlitePool,
    student: &User,
    now: NaiveDateTime,
    back: CallbackAction,
    language_code: Option<&str>,
) -> Result<Screen> {
    let upcoming = db::list_upcoming_lessons(pool, student.id, now, UPCOMING_LESSONS_LIMIT).await?;
    let makeup = db::list_makeup_lessons(pool, student.id).await?;

    let mut text = format!(
        "🗓 <b>{}</b>\n\n",
        t_args_lang("schedule-title", &[("name", &esc(&student.full_name))], language_code)
    );

    if upcoming.is_empty() && makeup.is_empty() {
        text.push_str(&t_lang("schedule-empty", language_code));
    }
    for lesson in &upcoming {
        text.push_str(&format_lesson_line(lesson, language_code));
        text.push('\n');
    }
    if !makeup.is_empty() {
        text.push_str(&format!("\n🔁 <b>{}</b>\n", t_lang("schedule-makeup", language_code)));
        for lesson in &makeup {
            text.push_str(&format!("• {}\n", esc(&lesson.topic)));
        }
    }

    Ok(Screen::new(text, vec![back_row(back, language_code)]))
}

pub async fn homework_list(
    pool: &SqlitePool,
    student: &User,
    back: CallbackAction,
    interactive: bool,
    language_code: Option<&str>,
) -> Result<Screen> {
    let entries = db::list_homework_for_student(pool, student.id).await?;
    let (open, checked): (Vec<&HomeworkEntry>, Vec<&HomeworkEntry>) = entries
        .iter()
        .partition(|entry| entry.homework.status != HomeworkStatus::Checked);

    let mut text = format!(
        "📝 <b>{}</b>\n\n",
        t_args_lang("homework-list-title", &[("name", &esc(&student.full_name))], language_code)
    );
    let mut rows = Vec::new();

    if entries.is_empty() {
        text.push_str(&t_lang("homework-list-empty", language_code));
    }

    let mut shown = 0;
    for entry in open.into_iter().chain(checked.into_iter().take(CHECKED_HOMEWORK_SHOWN)).take(HOMEWORK_SHOWN) {
        let hw = &entry.homework;
        let mut line = format!(
            "{} <b>{}</b>: {}",
            hw.status.icon(),
            esc(&truncate_label(&entry.lesson_topic, LIST_TOPIC_CHARS)),
            esc(&truncate_label(&hw.description, LIST_DESCRIPTION_CHARS))
        );
        if let Some(deadline) = &hw.deadline {
            line.push_str(&format!(
                "\n   ⏰ {}",
                t_args_lang("homework-deadline", &[("date", &format_datetime(deadline))], language_code)
            ));
        }
        if !push_list_line(&mut text, &line) {
            break;
        }
        shown += 1;
        if interactive {
            rows.push(vec![button(
                format!("{} {}", hw.status.icon(), hw.description),
                CallbackAction::ViewHomework(hw.id),
            )]);
        }
    }
    text.push_str(&list_more_note(entries.len() - shown, language_code));

    rows.push(back_row(back, language_code));
    Ok(Screen::new(text, rows))
}

/// One assignment with the student's answer so far
pub fn homework_details(
    entry: &HomeworkEntry,
    back: CallbackAction,
    can_submit: bool,
    language_code: Option<&str>,
) -> Screen {
    let hw = &entry.homework;
    let mut text = format!(
        "📝 <b>{}</b>\n{}\n\n{}\n\n{} {}\n",
        t_lang("homework-title", language_code),
        t_args_lang("homework-for-lesson", &[("topic", &esc(&entry.lesson_topic))], language_code),
        esc(&hw.description),
        hw.status.icon(),
        t_lang(hw.status.message_key(), language_code)
    );

    if let Some(deadline) = &hw.deadline {
        text.push_str(&format!(
            "⏰ {}\n",
            t_args_lang("homework-deadline", &[("date", &format_datetime(deadline))], language_code)
        ));
    }
    if let Some(link) = &hw.file_link {
        text.push_str(&format!("🔗 {}\n", esc(link)));
    }
    if !hw.photo_file_ids.is_empty() {
        text.push_str(&format!(
            "🖼 {}\n",
            t_args_lang(
                "homework-attachments",
                &[("count", &hw.photo_file_ids.len().to_string())],
                language_code
            )
        ));
    }
    if let Some(answer) = &hw.submission_text {
        text.push_str(&format!(
            "\n✍️ <b>{}</b>\n{}\n",
            t_lang("homework-answer", language_code),
            esc(answer)
        ));
    }
    if !hw.submission_file_ids.is_empty() {
        text.push_str(&format!(
            "📎 {}\n",
            t_args_lang(
                "homework-answer-files",
                &[("count", &hw.submission_file_ids.len().to_string())],
                language_code
            )
        ));
    }

    let mut rows = Vec::new();
    if can_submit && hw.status != HomeworkStatus::Checked {
        rows.push(vec![button(
            format!("📤 {}", t_lang("button-submit-homework", language_code)),
            CallbackAction::SubmitHomework(hw.id),
        )]);
    }
    rows.push(back_row(back, language_code));

    Screen::new(text, rows)
}

/// Balance, recent payments and attendance over the last weeks
pub async fn payments(
    pool: &SqlitePool,
    student: &User,
    now: NaiveDateTime,
    back: CallbackAction,
    language_code: Option<&str>,
) -> Result<Screen> {
    let balance = db::get_student_balance(pool, student.id).await?;
    let payments = db::list_payments(pool, student.id, RECENT_PAYMENTS_LIMIT).await?;
    let attendance = db::attendance_summary(pool, student.id, now - Duration::days(ATTENDANCE_WINDOW_DAYS), now).await?;

    let balance_icon = if balance <= 1 { "⚠️" } else { "💰" };
    let mut text = format!(
        "💳 <b>{}</b>\n\n{} {}\n",
        t_args_lang("payments-title", &[("name", &esc(&student.full_name))], language_code),
        balance_icon,
        t_args_lang("payments-balance", &[("balance", &balance.to_string())], language_code)
    );

    text.push_str(&match attendance.rate_percent() {
        Some(rate) => t_args_lang(
            "payments-attendance",
            &[
                ("rate", &rate.to_string()),
                ("attended", &attendance.attended.to_string()),
                ("missed", &attendance.missed.to_string()),
            ],
            language_code,
        ),
        None => t_lang("payments-attendance-empty", language_code),
    });
    text.push_str("\n\n");

    if payments.is_empty() {
        text.push_str(&t_lang("payments-empty", language_code));
    } else {
        text.push_str(&format!("<b>{}</b>\n", t_lang("payments-recent", language_code)));
        for payment in &payments {
            text.push_str(&format_payment_line(payment, language_code));
            text.push('\n');
        }
    }

    Ok(Screen::new(text, vec![back_row(back, language_code)]))
}

/// Points, streak, mastery and achievements
pub async fn progress(
    pool: &SqlitePool,
    student: &User,
    back: CallbackAction,
    language_code: Option<&str>,
) -> Result<Screen> {
    let progress = db::student_progress(pool, student.id).await?;

    let mut text = format!(
        "🏆 <b>{}</b>\n\n",
        t_args_lang("progress-title", &[("name", &esc(&student.full_name))], language_code)
    );
    text.push_str(&t_args_lang(
        "progress-summary",
        &[
            ("points", &progress.student.points.to_string()),
            ("streak", &progress.student.streak_days.to_string()),
            ("attended", &progress.lessons_attended.to_string()),
            ("learned", &progress.topics_learned.to_string()),
            ("mastered", &progress.topics_mastered.to_string()),
            ("homework", &progress.homework_checked.to_string()),
        ],
        language_code,
    ));
    text.push_str("\n\n");

    if progress.achievements.is_empty() {
        text.push_str(&t_lang("progress-no-achievements", language_code));
    } else {
        text.push_str(&format!("<b>{}</b>\n", t_lang("progress-achievements", language_code)));
        for earned in &progress.achievements {
            if let Some(achievement) = achievement_def(&earned.code) {
                text.push_str(&format_achievement(achievement, language_code));
                text.push('\n');
            }
        }
    }

    Ok(Screen::new(text, vec![back_row(back, language_code)]))
}
