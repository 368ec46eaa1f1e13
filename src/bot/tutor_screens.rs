//! Tutor menus: students, lessons, homework review, reports and statistics

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use sqlx::SqlitePool;
use teloxide::types::{KeyboardButton, KeyboardMarkup};

use crate::db;
use crate::localization::{get_localization_manager, t_args_lang, t_lang, SUPPORTED_LANGUAGES};
use crate::models::{AttendanceStatus, HomeworkEntry, HomeworkStatus, Lesson, MasteryLevel, User};
use crate::schedule::{format_date, weekday_from_index};

use super::callback_data::CallbackAction;
use super::student_screens::homework_details;
use super::ui_builder::{
    back_row, button, esc, format_lesson_details, format_lesson_line, format_payment_line, lesson_button_label,
    main_menu_row, Screen,
};

/// Lessons shown on a student's lesson list
const STUDENT_LESSONS_SHOWN: usize = 40;

/// Buttons of the tutor's persistent reply keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TutorMenuItem {
    Students,
    AddStudent,
    ReviewQueue,
    MonthlyReport,
    Library,
    Statistics,
    Broadcast,
}

impl TutorMenuItem {
    pub const ALL: [TutorMenuItem; 7] = [
        TutorMenuItem::Students,
        TutorMenuItem::AddStudent,
        TutorMenuItem::ReviewQueue,
        TutorMenuItem::MonthlyReport,
        TutorMenuItem::Library,
        TutorMenuItem::Statistics,
        TutorMenuItem::Broadcast,
    ];

    pub fn message_key(&self) -> &'static str {
        match self {
            TutorMenuItem::Students => "tutor-menu-students",
            TutorMenuItem::AddStudent => "tutor-menu-add-student",
            TutorMenuItem::ReviewQueue => "tutor-menu-review",
            TutorMenuItem::MonthlyReport => "tutor-menu-report",
            TutorMenuItem::Library => "tutor-menu-library",
            TutorMenuItem::Statistics => "tutor-menu-stats",
            TutorMenuItem::Broadcast => "tutor-menu-broadcast",
        }
    }

    /// Match a reply-keyboard press in any supported language
    pub fn from_text(text: &str) -> Option<Self> {
        let manager = get_localization_manager();
        let text = text.trim();
        Self::ALL.into_iter().find(|item| {
            SUPPORTED_LANGUAGES
                .iter()
                .any(|lang| manager.get_message_in_language(item.message_key(), lang, None) == text)
        })
    }
}

pub fn tutor_menu_keyboard(language_code: Option<&str>) -> KeyboardMarkup {
    let label = |item: TutorMenuItem| KeyboardButton::new(t_lang(item.message_key(), language_code));
    KeyboardMarkup::new(vec![
        vec![label(TutorMenuItem::Students), label(TutorMenuItem::AddStudent)],
        vec![label(TutorMenuItem::ReviewQueue), label(TutorMenuItem::MonthlyReport)],
        vec![label(TutorMenuItem::Library), label(TutorMenuItem::Statistics)],
        vec![label(TutorMenuItem::Broadcast)],
    ])
    .resize_keyboard()
}

/// Inline entry screen for tutors, next to the reply keyboard
pub fn tutor_menu(tutor: &User, language_code: Option<&str>) -> Screen {
    let text = t_args_lang("tutor-menu-title", &[("name", &esc(&tutor.full_name))], language_code);
    let rows = vec![
        vec![button(
            format!("👥 {}", t_lang("tutor-menu-students", language_code)),
            CallbackAction::Students,
        )],
        vec![button(
            format!("📥 {}", t_lang("tutor-menu-review", language_code)),
            CallbackAction::ReviewQueue,
        )],
    ];
    Screen::new(text, rows)
}

pub async fn students_screen(pool: &SqlitePool, language_code: Option<&str>) -> Result<Screen> {
    let students = db::list_students(pool).await?;

    let mut text = format!("👥 <b>{}</b>\n\n", t_lang("students-title", language_code));
    if students.is_empty() {
        text.push_str(&t_lang("students-empty", language_code));
    } else {
        text.push_str(&t_args_lang(
            "students-count",
            &[("count", &students.len().to_string())],
            language_code,
        ));
    }

    let mut rows: Vec<_> = students
        .iter()
        .map(|student| vec![button(format!("👤 {}", student.full_name), CallbackAction::Student(student.id))])
        .collect();
    rows.push(main_menu_row(language_code));

    Ok(Screen::new(text, rows))
}

/// Student card with access codes of the student and their parents
pub async fn student_card(pool: &SqlitePool, student: &User, language_code: Option<&str>) -> Result<Screen> {
    let parents = db::list_parents(pool, student).await?;
    let balance = db::get_student_balance(pool, student.id).await?;

    let login_state = |user: &User| {
        if user.telegram_id.is_some() {
            "✅"
        } else {
            "⏳"
        }
    };

    let mut text = format!(
        "👤 <b>{}</b> {}\n🔑 <code>{}</code>\n\n💰 {}\n⭐ {}\n",
        esc(&student.full_name),
        login_state(student),
        esc(&student.access_code),
        t_args_lang("payments-balance", &[("balance", &balance.to_string())], language_code),
        t_args_lang(
            "student-menu-points",
            &[
                ("points", &student.points.to_string()),
                ("streak", &student.streak_days.to_string())
            ],
            language_code
        )
    );

    if parents.is_empty() {
        text.push_str(&format!("\n{}\n", t_lang("student-no-parents", language_code)));
    } else {
        text.push_str(&format!("\n<b>{}</b>\n", t_lang("student-parents", language_code)));
        for parent in &parents {
            text.push_str(&format!(
                "• {} {} <code>{}</code>\n",
                esc(&parent.full_name),
                login_state(parent),
                esc(&parent.access_code)
            ));
        }
    }

    let id = student.id;
    let mut rows = vec![
        vec![
            button(format!("📚 {}", t_lang("button-lessons", language_code)), CallbackAction::StudentLessons(id)),
            button(format!("➕ {}", t_lang("button-add-lesson", language_code)), CallbackAction::AddLesson(id)),
        ],
        vec![
            button(format!("🗓 {}", t_lang("button-weekly-schedule", language_code)), CallbackAction::WeeklySchedule(id)),
            button(format!("💳 {}", t_lang("button-add-payment", language_code)), CallbackAction::AddPayment(id)),
        ],
        vec![
            button(format!("📊 {}", t_lang("button-report", language_code)), CallbackAction::ReportStudent(id)),
            button(format!("✏️ {}", t_lang("button-rename", language_code)), CallbackAction::RenameStudent(id)),
        ],
        vec![button(
            format!("👪 {}", t_lang("button-link-parent", language_code)),
            CallbackAction::LinkParent(id),
        )],
    ];
    if student.second_parent_id.is_some() {
        rows.push(vec![button(
            format!("➖ {}", t_lang("button-unlink-parent", language_code)),
            CallbackAction::UnlinkParent(id),
        )]);
    }
    rows.push(vec![button(
        format!("🗑 {}", t_lang("button-delete", language_code)),
        CallbackAction::DeleteStudent(id),
    )]);
    rows.push(back_row(CallbackAction::Students, language_code));

    Ok(Screen::new(text, rows))
}

/// The most recent lessons of a student as buttons, makeup lessons last
pub async fn student_lessons(pool: &SqlitePool, student: &User, language_code: Option<&str>) -> Result<Screen> {
    let lessons = db::list_lessons_for_student(pool, student.id).await?;
    let (dated, makeup): (Vec<&Lesson>, Vec<&Lesson>) = lessons.iter().partition(|lesson| lesson.date.is_some());

    let mut text = format!(
        "📚 <b>{}</b>\n\n",
        t_args_lang("history-title", &[("name", &esc(&student.full_name))], language_code)
    );
    if lessons.is_empty() {
        text.push_str(&t_lang("history-empty", language_code));
    }

    let skip = (dated.len() + makeup.len()).saturating_sub(STUDENT_LESSONS_SHOWN).min(dated.len());
    let mut rows: Vec<_> = dated
        .into_iter()
        .skip(skip)
        .chain(makeup)
        .map(|lesson| vec![button(lesson_button_label(lesson, language_code), CallbackAction::Lesson(lesson.id))])
        .collect();

    rows.push(vec![button(
        format!("➕ {}", t_lang("button-add-lesson", language_code)),
        CallbackAction::AddLesson(student.id),
    )]);
    rows.push(back_row(CallbackAction::Student(student.id), language_code));

    Ok(Screen::new(text, rows))
}

pub async fn lesson_card(pool: &SqlitePool, lesson: &Lesson, language_code: Option<&str>) -> Result<Screen> {
    let homework = db::list_homework_for_lesson(pool, lesson.id).await?;

    let mut text = format_lesson_details(lesson, language_code);
    if !homework.is_empty() {
        text.push_str(&format!(
            "\n📝 {}\n",
            t_args_lang("lesson-homework-count", &[("count", &homework.len().to_string())], language_code)
        ));
    }

    let id = lesson.id;
    let rows = vec![
        vec![
            button(format!("✅ {}", t_lang("button-attendance", language_code)), CallbackAction::AttendanceMenu(id)),
            button(format!("📋 {}", t_lang("button-toggle-conducted", language_code)), CallbackAction::ToggleConducted(id)),
        ],
        vec![
            button(format!("🎓 {}", t_lang("button-mastery", language_code)), CallbackAction::MasteryMenu(id)),
            button(format!("✏️ {}", t_lang("button-edit-topic", language_code)), CallbackAction::EditTopic(id)),
        ],
        vec![
            button(format!("📝 {}", t_lang("button-homework", language_code)), CallbackAction::LessonHomework(id)),
            button(format!("🕒 {}", t_lang("button-reschedule", language_code)), CallbackAction::RescheduleLesson(id)),
        ],
        vec![button(
            format!("🗑 {}", t_lang("button-delete", language_code)),
            CallbackAction::DeleteLesson(id),
        )],
        back_row(CallbackAction::StudentLessons(lesson.student_id), language_code),
    ];

    Ok(Screen::new(text, rows))
}

/// Attendance choices. Cancelling a lesson that is not cancelled yet goes
/// through a confirmation, since it moves later topics.
pub fn attendance_menu(lesson: &Lesson, language_code: Option<&str>) -> Screen {
    let text = format!(
        "{}\n\n{} {}",
        format_lesson_line(lesson, language_code),
        t_lang("attendance-choose", language_code),
        t_lang(lesson.attendance_status.message_key(), language_code)
    );

    let mut rows: Vec<_> = AttendanceStatus::SELECTABLE
        .iter()
        .map(|&status| {
            let action = if status.is_cancellation() && !lesson.attendance_status.is_cancellation() {
                CallbackAction::ConfirmCancellation(lesson.id, status)
            } else {
                CallbackAction::SetAttendance(lesson.id, status)
            };
            let marker = if status == lesson.attendance_status { " •" } else { "" };
            vec![button(
                format!("{} {}{}", status.icon(), t_lang(status.message_key(), language_code), marker),
                action,
            )]
        })
        .collect();
    rows.push(back_row(CallbackAction::Lesson(lesson.id), language_code));

    Screen::new(text, rows)
}

pub async fn cancellation_confirm(
    pool: &SqlitePool,
    lesson: &Lesson,
    status: AttendanceStatus,
    language_code: Option<&str>,
) -> Result<Screen> {
    let later = db::count_later_lessons(pool, lesson).await?;

    let text = format!(
        "⚠️ {}\n\n{}",
        t_args_lang(
            "cancel-confirm",
            &[
                ("status", &t_lang(status.message_key(), language_code)),
                ("topic", &esc(&lesson.topic))
            ],
            language_code
        ),
        t_args_lang("cancel-confirm-shift", &[("count", &later.to_string())], language_code)
    );
    let rows = vec![
        vec![button(
            format!("✅ {}", t_lang("button-confirm", language_code)),
            CallbackAction::SetAttendance(lesson.id, status),
        )],
        back_row(CallbackAction::AttendanceMenu(lesson.id), language_code),
    ];

    Ok(Screen::new(text, rows))
}

pub fn mastery_menu(lesson: &Lesson, language_code: Option<&str>) -> Screen {
    let text = format!(
        "🎓 <b>{}</b>\n\n{}",
        esc(&lesson.topic),
        t_lang("mastery-choose", language_code)
    );

    let mut rows: Vec<_> = MasteryLevel::ALL
        .iter()
        .map(|&level| {
            vec![button(
                format!("{} {}", level.icon(), t_lang(level.message_key(), language_code)),
                CallbackAction::SetMastery(lesson.id, level),
            )]
        })
        .collect();
    rows.push(back_row(CallbackAction::Lesson(lesson.id), language_code));

    Screen::new(text, rows)
}

pub async fn lesson_homework(pool: &SqlitePool, lesson: &Lesson, language_code: Option<&str>) -> Result<Screen> {
    let homework = db::list_homework_for_lesson(pool, lesson.id).await?;

    let mut text = format!(
        "📝 <b>{}</b>\n{}\n\n",
        t_lang("homework-title", language_code),
        t_args_lang("homework-for-lesson", &[("topic", &esc(&lesson.topic))], language_code)
    );
    if homework.is_empty() {
        text.push_str(&t_lang("homework-list-empty", language_code));
    }

    let mut rows: Vec<_> = homework
        .iter()
        .map(|hw| {
            vec![button(
                format!("{} {}", hw.status.icon(), hw.description),
                CallbackAction::ReviewHomework(hw.id),
            )]
        })
        .collect();
    rows.push(vec![button(
        format!("➕ {}", t_lang("button-add-homework", language_code)),
        CallbackAction::AddHomework(lesson.id),
    )]);
    rows.push(back_row(CallbackAction::Lesson(lesson.id), language_code));

    Ok(Screen::new(text, rows))
}

/// Homework with the review buttons of the tutor
pub fn homework_review(entry: &HomeworkEntry, student: &User, language_code: Option<&str>) -> Screen {
    let mut screen = homework_details(entry, CallbackAction::LessonHomework(entry.homework.lesson_id), false, language_code);
    screen.text = format!("👤 {}\n{}", esc(&student.full_name), screen.text);

    let id = entry.homework.id;
    let mut rows = Vec::new();
    if entry.homework.status != HomeworkStatus::Checked {
        rows.push(vec![button(
            format!("✅ {}", t_lang("button-mark-checked", language_code)),
            CallbackAction::SetHomeworkStatus(id, HomeworkStatus::Checked),
        )]);
    }
    if entry.homework.status != HomeworkStatus::Pending {
        rows.push(vec![button(
            format!("↩️ {}", t_lang("button-send-back", language_code)),
            CallbackAction::SetHomeworkStatus(id, HomeworkStatus::Pending),
        )]);
    }
    rows.push(vec![button(
        format!("🗑 {}", t_lang("button-delete", language_code)),
        CallbackAction::DeleteHomework(id),
    )]);
    rows.push(back_row(CallbackAction::LessonHomework(entry.homework.lesson_id), language_code));
    rows.push(vec![button(
        format!("📥 {}", t_lang("tutor-menu-review", language_code)),
        CallbackAction::ReviewQueue,
    )]);

    screen.keyboard = teloxide::types::InlineKeyboardMarkup::new(rows);
    screen
}

/// Submitted homework across all students
pub async fn review_queue(pool: &SqlitePool, language_code: Option<&str>) -> Result<Screen> {
    let entries = db::list_submitted_homework(pool).await?;

    let mut text = format!("📥 <b>{}</b>\n\n", t_lang("review-title", language_code));
    if entries.is_empty() {
        text.push_str(&t_lang("review-empty", language_code));
    } else {
        text.push_str(&t_args_lang(
            "review-count",
            &[("count", &entries.len().to_string())],
            language_code,
        ));
    }

    let mut rows: Vec<_> = entries
        .iter()
        .map(|entry| {
            vec![button(
                format!("📨 {}: {}", entry.lesson_topic, entry.homework.description),
                CallbackAction::ReviewHomework(entry.homework.id),
            )]
        })
        .collect();
    rows.push(main_menu_row(language_code));

    Ok(Screen::new(text, rows))
}

pub fn delete_student_confirm(student: &User, language_code: Option<&str>) -> Screen {
    let text = format!(
        "⚠️ {}",
        t_args_lang("delete-student-confirm", &[("name", &esc(&student.full_name))], language_code)
    );
    let rows = vec![
        vec![button(
            format!("🗑 {}", t_lang("button-confirm-delete", language_code)),
            CallbackAction::DeleteStudentConfirmed(student.id),
        )],
        back_row(CallbackAction::Student(student.id), language_code),
    ];
    Screen::new(text, rows)
}

pub fn delete_lesson_confirm(lesson: &Lesson, language_code: Option<&str>) -> Screen {
    let text = format!(
        "⚠️ {}",
        t_args_lang("delete-lesson-confirm", &[("topic", &esc(&lesson.topic))], language_code)
    );
    let rows = vec![
        vec![button(
            format!("🗑 {}", t_lang("button-confirm-delete", language_code)),
            CallbackAction::DeleteLessonConfirmed(lesson.id),
        )],
        back_row(CallbackAction::Lesson(lesson.id), language_code),
    ];
    Screen::new(text, rows)
}

/// Pick a student for the monthly report
pub async fn report_students(pool: &SqlitePool, language_code: Option<&str>) -> Result<Screen> {
    let students = db::list_students(pool).await?;

    let mut text = format!("📊 <b>{}</b>\n\n", t_lang("report-title", language_code));
    text.push_str(&if students.is_empty() {
        t_lang("students-empty", language_code)
    } else {
        t_lang("report-select-student", language_code)
    });

    let mut rows: Vec<_> = students
        .iter()
        .map(|student| vec![button(format!("👤 {}", student.full_name), CallbackAction::ReportStudent(student.id))])
        .collect();
    rows.push(main_menu_row(language_code));

    Ok(Screen::new(text, rows))
}

fn month_label(today: NaiveDate, months_back: u32, language_code: Option<&str>) -> String {
    let months = today.year() * 12 + today.month0() as i32 - months_back as i32;
    let (year, month) = (months.div_euclid(12), months.rem_euclid(12) + 1);
    format!("{} {year}", t_lang(&format!("month-{month}"), language_code))
}

/// Pick the month: the current one or one of the two before it
pub fn report_months(student: &User, today: NaiveDate, language_code: Option<&str>) -> Screen {
    let text = t_args_lang("report-select-month", &[("name", &esc(&student.full_name))], language_code);
    let mut rows: Vec<_> = (0..=2)
        .map(|offset| {
            vec![button(
                format!("🗓 {}", month_label(today, offset, language_code)),
                CallbackAction::ReportMonth(student.id, offset),
            )]
        })
        .collect();
    rows.push(back_row(CallbackAction::Student(student.id), language_code));
    Screen::new(text, rows)
}

pub async fn monthly_report_screen(
    pool: &SqlitePool,
    student_id: i64,
    today: NaiveDate,
    months_back: u32,
    language_code: Option<&str>,
) -> Result<Screen> {
    let report = db::monthly_report(pool, student_id, today, months_back).await?;

    let mut text = format!(
        "📊 <b>{}</b>\n{}\n\n",
        t_args_lang("report-header", &[("name", &esc(&report.student.full_name))], language_code),
        month_label(today, months_back, language_code)
    );

    text.push_str(&t_args_lang(
        "report-summary",
        &[
            ("attended", &report.lessons.len().to_string()),
            ("missed", &report.missed_lessons.to_string()),
            ("paid", &report.lessons_paid.to_string()),
            ("balance", &report.balance.to_string()),
        ],
        language_code,
    ));
    text.push_str("\n\n");

    if !report.lessons.is_empty() {
        text.push_str(&format!("<b>{}</b>\n", t_lang("report-lessons", language_code)));
        for lesson in &report.lessons {
            let date = lesson.date.as_ref().map(format_date).unwrap_or_default();
            text.push_str(&format!(
                "• {} {} {}\n",
                date,
                esc(&lesson.topic),
                lesson.mastery_level.icon()
            ));
        }
        text.push('\n');
    }
    if !report.payments.is_empty() {
        text.push_str(&format!("<b>{}</b>\n", t_lang("payments-recent", language_code)));
        for payment in &report.payments {
            text.push_str(&format_payment_line(payment, language_code));
            text.push('\n');
        }
    }

    let rows = vec![back_row(CallbackAction::ReportStudent(student_id), language_code)];
    Ok(Screen::new(text, rows))
}

pub async fn dashboard(pool: &SqlitePool, today: NaiveDate, language_code: Option<&str>) -> Result<Screen> {
    let stats = db::dashboard_stats(pool, today).await?;

    let text = format!(
        "📈 <b>{}</b>\n{}\n\n{}",
        t_lang("stats-title", language_code),
        month_label(today, 0, language_code),
        t_args_lang(
            "stats-summary",
            &[
                ("students", &stats.students.to_string()),
                ("attended", &stats.lessons_attended.to_string()),
                ("checked", &stats.homework_checked.to_string()),
                ("paid", &stats.lessons_paid.to_string()),
                ("waiting", &stats.homework_waiting.to_string()),
            ],
            language_code
        )
    );

    let mut rows = Vec::new();
    if stats.homework_waiting > 0 {
        rows.push(vec![button(
            format!("📥 {}", t_lang("tutor-menu-review", language_code)),
            CallbackAction::ReviewQueue,
        )]);
    }
    rows.push(main_menu_row(language_code));

    Ok(Screen::new(text, rows))
}

/// Weekday picker for a weekly schedule; selected days are marked
pub fn schedule_day_picker(student: &User, days: &[u8], language_code: Option<&str>) -> Screen {
    let text = t_args_lang("schedule-pick-days", &[("name", &esc(&student.full_name))], language_code);

    let day_button = |index: u8| {
        let marker = if days.contains(&index) { "✅ " } else { "" };
        button(
            format!("{marker}{}", t_lang(&format!("weekday-{index}"), language_code)),
            CallbackAction::ToggleScheduleDay(index),
        )
    };

    let indexes: Vec<u8> = (0..7).filter(|&i| weekday_from_index(i).is_some()).collect();
    let mut rows: Vec<_> = indexes.chunks(4).map(|chunk| chunk.iter().map(|&i| day_button(i)).collect::<Vec<_>>()).collect();

    if !days.is_empty() {
        rows.push(vec![button(
            format!("➡️ {}", t_lang("button-next", language_code)),
            CallbackAction::ScheduleDaysDone,
        )]);
    }
    rows.push(vec![button(
        format!("❌ {}", t_lang("button-cancel", language_code)),
        CallbackAction::Cancel,
    )]);

    Screen::new(text, rows)
}

pub fn broadcast_preview(text: &str, recipients: usize, language_code: Option<&str>) -> Screen {
    let body = format!(
        "📣 {}\n\n{}",
        t_args_lang("broadcast-preview", &[("count", &recipients.to_string())], language_code),
        esc(text)
    );
    let rows = vec![vec![
        button(format!("✅ {}", t_lang("button-send", language_code)), CallbackAction::BroadcastSend),
        button(format!("❌ {}", t_lang("button-cancel", language_code)), CallbackAction::BroadcastCancel),
    ]];
    Screen::new(body, rows)
}

/// Short lesson summary used in confirmations after an attendance change
pub fn attendance_result_text(lesson: &Lesson, moved: usize, language_code: Option<&str>) -> String {
    let mut text = format!(
        "✅ {}\n{}",
        t_lang("attendance-saved", language_code),
        format_lesson_line(lesson, language_code)
    );
    if moved > 0 {
        text.push_str(&format!(
            "\n🔁 {}",
            t_args_lang("attendance-shifted", &[("count", &moved.to_string())], language_code)
        ));
    }
    text
}
