//! Lessons and the attendance workflow

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::config::{POINTS_FOR_ATTENDANCE, POINTS_FOR_MASTERY};
use crate::errors::BotError;
use crate::gamification::{self, AchievementDef};
use crate::lesson_shift::{self, ShiftPlan};
use crate::models::{AttendanceStatus, Lesson, LessonStatus, MasteryLevel};

/// Outcome of an attendance status change
#[derive(Debug, Clone)]
pub struct AttendanceChange {
    pub lesson: Lesson,
    pub previous: AttendanceStatus,
    pub points_delta: i64,
    /// Present when the change cancelled the lesson and later topics moved
    pub shift: Option<ShiftPlan>,
    pub new_achievements: Vec<&'static AchievementDef>,
}

impl AttendanceChange {
    pub fn changed(&self) -> bool {
        self.previous != self.lesson.attendance_status
    }
}

/// Outcome of a mastery update
#[derive(Debug, Clone)]
pub struct MasteryChange {
    pub lesson: Lesson,
    pub points_awarded: bool,
    pub new_achievements: Vec<&'static AchievementDef>,
}

pub async fn create_lesson(
    pool: &SqlitePool,
    student_id: i64,
    topic: &str,
    date: Option<NaiveDateTime>,
    skills_developed: Option<&str>,
) -> Result<Lesson> {
    let lesson = sqlx::query_as::<_, Lesson>(
        "INSERT INTO lessons (student_id, topic, date, skills_developed, is_makeup)
         VALUES (?, ?, ?, ?, ?) RETURNING *",
    )
    .bind(student_id)
    .bind(topic)
    .bind(date)
    .bind(skills_developed)
    .bind(date.is_none())
    .fetch_one(pool)
    .await
    .context("Failed to insert lesson")?;

    info!(lesson_id = lesson.id, student_id, "Lesson created");
    Ok(lesson)
}

/// Create lessons on the given slots, skipping slots the student already has.
/// Returns the number of lessons created.
pub async fn create_scheduled_lessons(
    pool: &SqlitePool,
    student_id: i64,
    slots: &[NaiveDateTime],
    topic: &str,
) -> Result<usize> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    let mut created = 0;

    for slot in slots {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM lessons WHERE student_id = ? AND date = ?)")
                .bind(student_id)
                .bind(slot)
                .fetch_one(&mut *tx)
                .await
                .context("Failed to check existing lesson")?;
        if exists {
            debug!(student_id, slot = %slot, "Skipping occupied slot");
            continue;
        }

        sqlx::query("INSERT INTO lessons (student_id, topic, date) VALUES (?, ?, ?)")
            .bind(student_id)
            .bind(topic)
            .bind(slot)
            .execute(&mut *tx)
            .await
            .context("Failed to insert scheduled lesson")?;
        created += 1;
    }

    tx.commit().await.context("Failed to commit schedule")?;
    info!(student_id, created, requested = slots.len(), "Weekly schedule created");
    Ok(created)
}

pub async fn get_lesson(pool: &SqlitePool, lesson_id: i64) -> Result<Option<Lesson>> {
    sqlx::query_as::<_, Lesson>("SELECT * FROM lessons WHERE id = ?")
        .bind(lesson_id)
        .fetch_optional(pool)
        .await
        .context("Failed to read lesson")
}

/// All lessons of a student: dated lessons by date, then makeup lessons
pub async fn list_lessons_for_student(pool: &SqlitePool, student_id: i64) -> Result<Vec<Lesson>> {
    sqlx::query_as::<_, Lesson>(
        "SELECT * FROM lessons WHERE student_id = ?
         ORDER BY date IS NULL, date, id",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await
    .context("Failed to list lessons")
}

pub async fn list_upcoming_lessons(
    pool: &SqlitePool,
    student_id: i64,
    now: NaiveDateTime,
    limit: i64,
) -> Result<Vec<Lesson>> {
    sqlx::query_as::<_, Lesson>(
        "SELECT * FROM lessons
         WHERE student_id = ? AND date IS NOT NULL AND date > ?
         ORDER BY date, id LIMIT ?",
    )
    .bind(student_id)
    .bind(now)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to list upcoming lessons")
}

/// Makeup lessons still waiting for a date
pub async fn list_makeup_lessons(pool: &SqlitePool, student_id: i64) -> Result<Vec<Lesson>> {
    sqlx::query_as::<_, Lesson>(
        "SELECT * FROM lessons
         WHERE student_id = ? AND date IS NULL AND attendance_status = 'scheduled'
         ORDER BY id",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await
    .context("Failed to list makeup lessons")
}

pub async fn list_lesson_history(
    pool: &SqlitePool,
    student_id: i64,
    now: NaiveDateTime,
    limit: i64,
) -> Result<Vec<Lesson>> {
    sqlx::query_as::<_, Lesson>(
        "SELECT * FROM lessons
         WHERE student_id = ? AND date IS NOT NULL AND date <= ?
         ORDER BY date DESC, id DESC LIMIT ?",
    )
    .bind(student_id)
    .bind(now)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to list lesson history")
}

/// Lessons of every student starting in `(from, to]`
pub async fn list_lessons_between(pool: &SqlitePool, from: NaiveDateTime, to: NaiveDateTime) -> Result<Vec<Lesson>> {
    sqlx::query_as::<_, Lesson>(
        "SELECT * FROM lessons
         WHERE date IS NOT NULL AND date > ? AND date <= ? AND attendance_status = 'scheduled'
         ORDER BY date, id",
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await
    .context("Failed to list lessons in window")
}

pub async fn update_lesson_topic(pool: &SqlitePool, lesson_id: i64, topic: &str) -> Result<bool> {
    let result = sqlx::query("UPDATE lessons SET topic = ? WHERE id = ?")
        .bind(topic)
        .bind(lesson_id)
        .execute(pool)
        .await
        .context("Failed to update lesson topic")?;

    Ok(result.rows_affected() > 0)
}

/// Move a lesson to a new date. The first date it ever had is kept in `original_date`.
pub async fn reschedule_lesson(pool: &SqlitePool, lesson_id: i64, new_date: NaiveDateTime) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE lessons SET original_date = COALESCE(original_date, date), date = ? WHERE id = ?",
    )
    .bind(new_date)
    .bind(lesson_id)
    .execute(pool)
    .await
    .context("Failed to reschedule lesson")?;

    if result.rows_affected() > 0 {
        info!(lesson_id, new_date = %new_date, "Lesson rescheduled");
    }
    Ok(result.rows_affected() > 0)
}

pub async fn set_lesson_status(pool: &SqlitePool, lesson_id: i64, status: LessonStatus) -> Result<bool> {
    let result = sqlx::query("UPDATE lessons SET lesson_status = ? WHERE id = ?")
        .bind(status)
        .bind(lesson_id)
        .execute(pool)
        .await
        .context("Failed to update lesson status")?;

    Ok(result.rows_affected() > 0)
}

/// Set mastery and comment. The first time a lesson is mastered the student earns points;
/// later downgrades and upgrades pay nothing.
pub async fn set_mastery(
    pool: &SqlitePool,
    lesson_id: i64,
    level: MasteryLevel,
    comment: Option<&str>,
) -> Result<MasteryChange> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let lesson = sqlx::query_as::<_, Lesson>("SELECT * FROM lessons WHERE id = ?")
        .bind(lesson_id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to read lesson")?
        .ok_or(BotError::NotFound("lesson", lesson_id))?;

    let bonus_paid: bool = sqlx::query_scalar("SELECT mastery_bonus_awarded FROM lessons WHERE id = ?")
        .bind(lesson_id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to read mastery bonus flag")?;
    let points_awarded = level == MasteryLevel::Mastered && !bonus_paid;

    let lesson = sqlx::query_as::<_, Lesson>(
        "UPDATE lessons SET mastery_level = ?, mastery_comment = ?,
             mastery_bonus_awarded = mastery_bonus_awarded OR ?
         WHERE id = ? RETURNING *",
    )
    .bind(level)
    .bind(comment)
    .bind(points_awarded)
    .bind(lesson_id)
    .fetch_one(&mut *tx)
    .await
    .context("Failed to update mastery")?;

    let mut new_achievements = Vec::new();
    if points_awarded {
        gamification::add_points(&mut tx, lesson.student_id, POINTS_FOR_MASTERY).await?;
        new_achievements = gamification::check_points_achievements(&mut tx, lesson.student_id).await?;
    }

    tx.commit().await.context("Failed to commit mastery update")?;

    info!(lesson_id, level = level.as_str(), points_awarded, "Mastery updated");
    Ok(MasteryChange {
        lesson,
        points_awarded,
        new_achievements,
    })
}

/// Change the attendance status of a lesson.
///
/// Attending awards points, extends the streak and checks achievements.
/// Leaving `attended` takes the points back. Cancelling a lesson that was not
/// cancelled before shifts the topics of the student's later lessons.
pub async fn set_attendance_status(
    pool: &SqlitePool,
    lesson_id: i64,
    new_status: AttendanceStatus,
    now: NaiveDateTime,
) -> Result<AttendanceChange> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let lesson = sqlx::query_as::<_, Lesson>("SELECT * FROM lessons WHERE id = ?")
        .bind(lesson_id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to read lesson")?
        .ok_or(BotError::NotFound("lesson", lesson_id))?;

    let previous = lesson.attendance_status;
    if previous == new_status {
        debug!(lesson_id, status = new_status.as_str(), "Attendance status unchanged");
        return Ok(AttendanceChange {
            lesson,
            previous,
            points_delta: 0,
            shift: None,
            new_achievements: Vec::new(),
        });
    }

    let lesson_status = match new_status {
        AttendanceStatus::Attended => LessonStatus::Conducted,
        status if status.is_cancellation() => LessonStatus::NotConducted,
        _ => lesson.lesson_status,
    };

    let updated = sqlx::query_as::<_, Lesson>(
        "UPDATE lessons SET attendance_status = ?, lesson_status = ? WHERE id = ? RETURNING *",
    )
    .bind(new_status)
    .bind(lesson_status)
    .bind(lesson_id)
    .fetch_one(&mut *tx)
    .await
    .context("Failed to update attendance")?;

    let student_id = lesson.student_id;
    let mut points_delta = 0;
    let mut new_achievements = Vec::new();

    if new_status == AttendanceStatus::Attended {
        gamification::add_points(&mut tx, student_id, POINTS_FOR_ATTENDANCE).await?;
        points_delta = POINTS_FOR_ATTENDANCE;

        let attended_at = lesson.date.unwrap_or(now);
        new_achievements.extend(gamification::update_study_streak(&mut tx, student_id, attended_at).await?);
        new_achievements.extend(gamification::check_lesson_achievements(&mut tx, student_id).await?);
        new_achievements.extend(gamification::check_points_achievements(&mut tx, student_id).await?);
    } else if previous == AttendanceStatus::Attended
        && gamification::revoke_attendance_points(&mut tx, student_id).await?
    {
        points_delta = -POINTS_FOR_ATTENDANCE;
    }

    if new_status == AttendanceStatus::UnexcusedAbsence {
        gamification::reset_streak(&mut tx, student_id).await?;
    }

    let shift = if new_status.is_cancellation() && !previous.is_cancellation() {
        Some(lesson_shift::shift_after_cancellation(&mut tx, &updated).await?)
    } else {
        None
    };

    tx.commit().await.context("Failed to commit attendance change")?;

    info!(
        lesson_id,
        student_id,
        from = previous.as_str(),
        to = new_status.as_str(),
        points_delta,
        shifted = shift.is_some(),
        "Attendance status changed"
    );

    Ok(AttendanceChange {
        lesson: updated,
        previous,
        points_delta,
        shift,
        new_achievements,
    })
}

/// Number of lessons that would move if `lesson` were cancelled now
pub async fn count_later_lessons(pool: &SqlitePool, lesson: &Lesson) -> Result<i64> {
    let Some(date) = lesson.date else {
        return Ok(0);
    };

    sqlx::query_scalar(
        "SELECT COUNT(*) FROM lessons
         WHERE student_id = ? AND date IS NOT NULL AND date > ? AND id != ?",
    )
    .bind(lesson.student_id)
    .bind(date)
    .bind(lesson.id)
    .fetch_one(pool)
    .await
    .context("Failed to count later lessons")
}

/// Delete a lesson together with its homework
pub async fn delete_lesson(pool: &SqlitePool, lesson_id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM lessons WHERE id = ?")
        .bind(lesson_id)
        .execute(pool)
        .await
        .context("Failed to delete lesson")?;

    if result.rows_affected() > 0 {
        info!(lesson_id, "Lesson deleted");
        Ok(true)
    } else {
        info!(lesson_id, "No lesson found to delete");
        Ok(false)
    }
}
