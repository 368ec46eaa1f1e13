//! # Reminders
//!
//! Background task that periodically reminds families about tomorrow's
//! lessons and homework deadlines, and once a day warns about balances
//! that are about to run out.

use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use sqlx::SqlitePool;
use teloxide::Bot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::bot::ui_builder::esc;
use crate::bot::{notify_family, notify_user};
use crate::config::{BotConfig, ReminderConfig};
use crate::db;
use crate::localization::t_args_lang;
use crate::schedule::{format_datetime, now_local};

/// Reminder window for a pass at `now`: `(now + lead, now + lead + interval]`.
///
/// Consecutive passes produce adjacent windows, so each lesson or deadline
/// falls into exactly one of them.
pub fn reminder_window(now: NaiveDateTime, config: &ReminderConfig) -> (NaiveDateTime, NaiveDateTime) {
    let from = now + Duration::hours(config.lead_time_hours);
    let interval = i64::try_from(config.interval_secs).unwrap_or(i64::MAX / 2);
    (from, from + Duration::seconds(interval))
}

/// Whether the daily low balance pass should run at `now`
pub fn low_balance_due(now: NaiveDateTime, config: &ReminderConfig, last_run: Option<NaiveDate>) -> bool {
    now.hour() == config.low_balance_hour && last_run != Some(now.date())
}

/// Remind students and parents about lessons starting in the window
pub async fn send_lesson_reminders(
    bot: &Bot,
    pool: &SqlitePool,
    from: NaiveDateTime,
    to: NaiveDateTime,
) -> Result<usize> {
    let lessons = db::list_lessons_between(pool, from, to).await?;
    let mut delivered = 0;

    for lesson in &lessons {
        let Some(date) = &lesson.date else {
            continue;
        };
        let Some(student) = db::get_user_by_id(pool, lesson.student_id).await? else {
            continue;
        };
        let text = format!(
            "⏰ {}",
            t_args_lang(
                "reminder-lesson",
                &[
                    ("name", &esc(&student.full_name)),
                    ("topic", &esc(&lesson.topic)),
                    ("date", &format_datetime(date)),
                ],
                None,
            )
        );
        delivered += notify_family(bot, pool, &student, &text).await?;
    }

    debug!(lessons = lessons.len(), delivered, "Lesson reminders sent");
    Ok(delivered)
}

/// Remind students about pending homework due in the window
pub async fn send_homework_reminders(
    bot: &Bot,
    pool: &SqlitePool,
    from: NaiveDateTime,
    to: NaiveDateTime,
) -> Result<usize> {
    let entries = db::list_pending_homework_due_between(pool, from, to).await?;
    let mut delivered = 0;

    for entry in &entries {
        let Some(deadline) = &entry.homework.deadline else {
            continue;
        };
        let Some(student) = db::get_user_by_id(pool, entry.student_id).await? else {
            continue;
        };
        let text = format!(
            "📝 {}",
            t_args_lang(
                "reminder-homework",
                &[
                    ("topic", &esc(&entry.lesson_topic)),
                    ("description", &esc(&entry.homework.description)),
                    ("date", &format_datetime(deadline)),
                ],
                None,
            )
        );
        delivered += usize::from(notify_user(bot, &student, &text).await);
    }

    debug!(homework = entries.len(), delivered, "Homework reminders sent");
    Ok(delivered)
}

/// Warn families whose prepaid balance is down to the threshold
pub async fn send_low_balance_notices(bot: &Bot, pool: &SqlitePool, threshold: i64) -> Result<usize> {
    let students = db::list_students_with_balance(pool, threshold).await?;
    let mut delivered = 0;

    for student in &students {
        let text = format!(
            "⚠️ {}",
            t_args_lang(
                "reminder-low-balance",
                &[
                    ("name", &esc(&student.full_name)),
                    ("balance", &threshold.to_string()),
                ],
                None,
            )
        );
        delivered += notify_family(bot, pool, student, &text).await?;
    }

    info!(students = students.len(), delivered, "Low balance notices sent");
    Ok(delivered)
}

/// One pass of all reminders. Returns the updated date of the last low balance run.
pub async fn run_reminder_pass(
    bot: &Bot,
    pool: &SqlitePool,
    config: &ReminderConfig,
    now: NaiveDateTime,
    last_low_balance_run: Option<NaiveDate>,
) -> Result<Option<NaiveDate>> {
    let (from, to) = reminder_window(now, config);
    send_lesson_reminders(bot, pool, from, to).await?;
    send_homework_reminders(bot, pool, from, to).await?;

    if low_balance_due(now, config, last_low_balance_run) {
        send_low_balance_notices(bot, pool, config.low_balance_threshold).await?;
        return Ok(Some(now.date()));
    }

    Ok(last_low_balance_run)
}

/// Start the reminder loop on the runtime
pub fn spawn_reminders(bot: Bot, pool: Arc<SqlitePool>, config: Arc<BotConfig>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = std::time::Duration::from_secs(config.reminders.interval_secs.max(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_low_balance_run = None;

        info!(interval_secs = period.as_secs(), "Reminder task started");

        loop {
            ticker.tick().await;
            let now = now_local(config.timezone_offset_hours);

            match run_reminder_pass(&bot, &pool, &config.reminders, now, last_low_balance_run).await {
                Ok(last_run) => last_low_balance_run = last_run,
                Err(e) => error!(error = %e, "Reminder pass failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_reminder_window_is_one_interval_a_day_ahead() {
        let config = ReminderConfig::default();
        let (from, to) = reminder_window(dt(10, 9, 0), &config);
        assert_eq!(from, dt(11, 9, 0));
        assert_eq!(to, dt(11, 10, 0));
    }

    #[test]
    fn test_consecutive_windows_are_adjacent() {
        let config = ReminderConfig::default();
        let (_, first_end) = reminder_window(dt(10, 9, 0), &config);
        let (second_start, _) = reminder_window(dt(10, 10, 0), &config);
        assert_eq!(first_end, second_start);
    }

    #[test]
    fn test_low_balance_runs_once_at_configured_hour() {
        let config = ReminderConfig::default();
        assert!(low_balance_due(dt(10, 10, 5), &config, None));
        assert!(!low_balance_due(dt(10, 11, 5), &config, None));
        assert!(!low_balance_due(dt(10, 10, 30), &config, Some(dt(10, 10, 5).date())));
        assert!(low_balance_due(dt(11, 10, 5), &config, Some(dt(10, 10, 5).date())));
    }
}
