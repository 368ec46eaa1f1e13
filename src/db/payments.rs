//! Lesson credit top-ups and the balance derived from them

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use sqlx::SqlitePool;
use tracing::info;

use crate::models::{Payment, User};

/// Attendance over a period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AttendanceSummary {
    pub attended: i64,
    pub missed: i64,
}

impl AttendanceSummary {
    /// Share of attended lessons in percent, `None` when nothing happened yet
    pub fn rate_percent(&self) -> Option<i64> {
        let total = self.attended + self.missed;
        if total == 0 {
            None
        } else {
            Some((self.attended * 100 + total / 2) / total)
        }
    }
}

pub async fn create_payment(
    pool: &SqlitePool,
    student_id: i64,
    lessons_paid: i64,
    payment_date: NaiveDateTime,
) -> Result<Payment> {
    let payment = sqlx::query_as::<_, Payment>(
        "INSERT INTO payments (student_id, lessons_paid, payment_date) VALUES (?, ?, ?) RETURNING *",
    )
    .bind(student_id)
    .bind(lessons_paid)
    .bind(payment_date)
    .fetch_one(pool)
    .await
    .context("Failed to insert payment")?;

    info!(payment_id = payment.id, student_id, lessons_paid, "Payment recorded");
    Ok(payment)
}

/// Most recent payments first
pub async fn list_payments(pool: &SqlitePool, student_id: i64, limit: i64) -> Result<Vec<Payment>> {
    sqlx::query_as::<_, Payment>(
        "SELECT * FROM payments WHERE student_id = ? ORDER BY payment_date DESC, id DESC LIMIT ?",
    )
    .bind(student_id)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to list payments")
}

/// Paid lessons minus attended lessons
pub async fn get_student_balance(pool: &SqlitePool, student_id: i64) -> Result<i64> {
    sqlx::query_scalar(
        "SELECT
            (SELECT COALESCE(SUM(lessons_paid), 0) FROM payments WHERE student_id = ?1)
          - (SELECT COUNT(*) FROM lessons WHERE student_id = ?1 AND attendance_status = 'attended')",
    )
    .bind(student_id)
    .fetch_one(pool)
    .await
    .context("Failed to compute balance")
}

/// Students whose balance equals `balance` exactly
pub async fn list_students_with_balance(pool: &SqlitePool, balance: i64) -> Result<Vec<User>> {
    sqlx::query_as::<_, User>(
        "SELECT u.* FROM users u
         WHERE u.role = 'student'
           AND (SELECT COALESCE(SUM(p.lessons_paid), 0) FROM payments p WHERE p.student_id = u.id)
             - (SELECT COUNT(*) FROM lessons l WHERE l.student_id = u.id AND l.attendance_status = 'attended')
             = ?
         ORDER BY u.id",
    )
    .bind(balance)
    .fetch_all(pool)
    .await
    .context("Failed to list students by balance")
}

/// Attended versus missed lessons dated in `[since, until]`
pub async fn attendance_summary(
    pool: &SqlitePool,
    student_id: i64,
    since: NaiveDateTime,
    until: NaiveDateTime,
) -> Result<AttendanceSummary> {
    let (attended, missed): (i64, i64) = sqlx::query_as(
        "SELECT
            COALESCE(SUM(attendance_status = 'attended'), 0),
            COALESCE(SUM(attendance_status IN ('excused_absence', 'unexcused_absence', 'rescheduled')), 0)
         FROM lessons
         WHERE student_id = ? AND date IS NOT NULL AND date >= ? AND date <= ?",
    )
    .bind(student_id)
    .bind(since)
    .bind(until)
    .fetch_one(pool)
    .await
    .context("Failed to compute attendance")?;

    Ok(AttendanceSummary { attended, missed })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attendance_rate() {
        assert_eq!(AttendanceSummary::default().rate_percent(), None);
        assert_eq!(AttendanceSummary { attended: 3, missed: 1 }.rate_percent(), Some(75));
        assert_eq!(AttendanceSummary { attended: 2, missed: 1 }.rate_percent(), Some(67));
        assert_eq!(AttendanceSummary { attended: 0, missed: 4 }.rate_percent(), Some(0));
    }
}
