//! Dashboard numbers, monthly reports and student progress

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::SqlitePool;

use crate::errors::BotError;
use crate::models::{EarnedAchievement, Lesson, Payment, User};
use crate::schedule::month_bounds;

use super::achievements::list_achievements;
use super::payments::get_student_balance;
use super::users::get_user_by_id;

/// Tutor dashboard for one month
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DashboardStats {
    pub students: i64,
    pub lessons_attended: i64,
    pub homework_checked: i64,
    pub lessons_paid: i64,
    pub homework_waiting: i64,
}

#[derive(Debug, Clone)]
pub struct MonthlyReport {
    pub student: User,
    pub month_start: NaiveDateTime,
    /// Attended lessons of the month, by date
    pub lessons: Vec<Lesson>,
    pub missed_lessons: i64,
    pub payments: Vec<Payment>,
    pub lessons_paid: i64,
    pub balance: i64,
}

#[derive(Debug, Clone)]
pub struct StudentProgress {
    pub student: User,
    pub lessons_attended: i64,
    pub topics_learned: i64,
    pub topics_mastered: i64,
    pub homework_checked: i64,
    pub balance: i64,
    pub achievements: Vec<EarnedAchievement>,
}

pub async fn dashboard_stats(pool: &SqlitePool, today: NaiveDate) -> Result<DashboardStats> {
    let (start, end) = month_bounds(today, 0).context("Failed to compute month bounds")?;

    let (students, lessons_attended, homework_checked, lessons_paid, homework_waiting): (i64, i64, i64, i64, i64) =
        sqlx::query_as(
            "SELECT
                (SELECT COUNT(*) FROM users WHERE role = 'student'),
                (SELECT COUNT(*) FROM lessons
                  WHERE attendance_status = 'attended' AND date >= ?1 AND date < ?2),
                (SELECT COUNT(*) FROM homeworks
                  WHERE status = 'checked' AND checked_at >= ?1 AND checked_at < ?2),
                (SELECT COALESCE(SUM(lessons_paid), 0) FROM payments
                  WHERE payment_date >= ?1 AND payment_date < ?2),
                (SELECT COUNT(*) FROM homeworks WHERE status = 'submitted')",
        )
        .bind(start)
        .bind(end)
        .fetch_one(pool)
        .await
        .context("Failed to compute dashboard")?;

    Ok(DashboardStats {
        students,
        lessons_attended,
        homework_checked,
        lessons_paid,
        homework_waiting,
    })
}

/// Report for a student for the month `months_back` months before `today`
pub async fn monthly_report(
    pool: &SqlitePool,
    student_id: i64,
    today: NaiveDate,
    months_back: u32,
) -> Result<MonthlyReport> {
    let student = get_user_by_id(pool, student_id)
        .await?
        .ok_or(BotError::NotFound("student", student_id))?;
    let (start, end) = month_bounds(today, months_back).context("Failed to compute month bounds")?;

    let lessons = sqlx::query_as::<_, Lesson>(
        "SELECT * FROM lessons
         WHERE student_id = ? AND attendance_status = 'attended' AND date >= ? AND date < ?
         ORDER BY date, id",
    )
    .bind(student_id)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await
    .context("Failed to list lessons for report")?;

    let missed_lessons: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM lessons
         WHERE student_id = ? AND date >= ? AND date < ?
           AND attendance_status IN ('excused_absence', 'unexcused_absence', 'rescheduled')",
    )
    .bind(student_id)
    .bind(start)
    .bind(end)
    .fetch_one(pool)
    .await
    .context("Failed to count missed lessons")?;

    let payments = sqlx::query_as::<_, Payment>(
        "SELECT * FROM payments
         WHERE student_id = ? AND payment_date >= ? AND payment_date < ?
         ORDER BY payment_date, id",
    )
    .bind(student_id)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await
    .context("Failed to list payments for report")?;

    let lessons_paid = payments.iter().map(|p| p.lessons_paid).sum();
    let balance = get_student_balance(pool, student_id).await?;

    Ok(MonthlyReport {
        student,
        month_start: start,
        lessons,
        missed_lessons,
        payments,
        lessons_paid,
        balance,
    })
}

pub async fn student_progress(pool: &SqlitePool, student_id: i64) -> Result<StudentProgress> {
    let student = get_user_by_id(pool, student_id)
        .await?
        .ok_or(BotError::NotFound("student", student_id))?;

    let (lessons_attended, topics_learned, topics_mastered): (i64, i64, i64) = sqlx::query_as(
        "SELECT
            COALESCE(SUM(attendance_status = 'attended'), 0),
            COALESCE(SUM(mastery_level = 'learned'), 0),
            COALESCE(SUM(mastery_level = 'mastered'), 0)
         FROM lessons WHERE student_id = ?",
    )
    .bind(student_id)
    .fetch_one(pool)
    .await
    .context("Failed to compute lesson progress")?;

    let homework_checked: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM homeworks h JOIN lessons l ON l.id = h.lesson_id
         WHERE l.student_id = ? AND h.status = 'checked'",
    )
    .bind(student_id)
    .fetch_one(pool)
    .await
    .context("Failed to count checked homework")?;

    let balance = get_student_balance(pool, student_id).await?;
    let achievements = list_achievements(pool, student_id).await?;

    Ok(StudentProgress {
        student,
        lessons_attended,
        topics_learned,
        topics_mastered,
        homework_checked,
        balance,
        achievements,
    })
}
