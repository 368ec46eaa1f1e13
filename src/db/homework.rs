//! Homework assignments, submissions and review

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use sqlx::types::Json;
use sqlx::SqlitePool;
use tracing::info;

use crate::config::POINTS_FOR_HOMEWORK;
use crate::errors::BotError;
use crate::gamification::{self, AchievementDef};
use crate::models::{Homework, HomeworkEntry, HomeworkStatus};

const ENTRY_SELECT: &str = "SELECT h.*, l.topic AS lesson_topic, l.student_id AS student_id
     FROM homeworks h JOIN lessons l ON l.id = h.lesson_id";

/// A piece of a student's homework answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Text(String),
    /// Telegram file id of a photo or document
    File(String),
}

/// Outcome of a review by the tutor
#[derive(Debug, Clone)]
pub struct HomeworkReview {
    pub homework: Homework,
    pub points_awarded: bool,
    pub new_achievements: Vec<&'static AchievementDef>,
}

pub async fn create_homework(
    pool: &SqlitePool,
    lesson_id: i64,
    description: &str,
    deadline: Option<NaiveDateTime>,
    file_link: Option<&str>,
    photo_file_ids: &[String],
) -> Result<Homework> {
    let homework = sqlx::query_as::<_, Homework>(
        "INSERT INTO homeworks (lesson_id, description, deadline, file_link, photo_file_ids)
         VALUES (?, ?, ?, ?, ?) RETURNING *",
    )
    .bind(lesson_id)
    .bind(description)
    .bind(deadline)
    .bind(file_link)
    .bind(Json(photo_file_ids))
    .fetch_one(pool)
    .await
    .context("Failed to insert homework")?;

    info!(homework_id = homework.id, lesson_id, "Homework created");
    Ok(homework)
}

pub async fn get_homework(pool: &SqlitePool, homework_id: i64) -> Result<Option<Homework>> {
    sqlx::query_as::<_, Homework>("SELECT * FROM homeworks WHERE id = ?")
        .bind(homework_id)
        .fetch_optional(pool)
        .await
        .context("Failed to read homework")
}

/// Homework with its lesson topic and owning student
pub async fn get_homework_entry(pool: &SqlitePool, homework_id: i64) -> Result<Option<HomeworkEntry>> {
    sqlx::query_as::<_, HomeworkEntry>(&format!("{ENTRY_SELECT} WHERE h.id = ?"))
        .bind(homework_id)
        .fetch_optional(pool)
        .await
        .context("Failed to read homework entry")
}

pub async fn list_homework_for_lesson(pool: &SqlitePool, lesson_id: i64) -> Result<Vec<Homework>> {
    sqlx::query_as::<_, Homework>("SELECT * FROM homeworks WHERE lesson_id = ? ORDER BY id")
        .bind(lesson_id)
        .fetch_all(pool)
        .await
        .context("Failed to list homework for lesson")
}

/// Homework of a student, open assignments first
pub async fn list_homework_for_student(pool: &SqlitePool, student_id: i64) -> Result<Vec<HomeworkEntry>> {
    sqlx::query_as::<_, HomeworkEntry>(&format!(
        "{ENTRY_SELECT} WHERE l.student_id = ?
         ORDER BY CASE h.status WHEN 'pending' THEN 0 WHEN 'submitted' THEN 1 ELSE 2 END, h.id DESC"
    ))
    .bind(student_id)
    .fetch_all(pool)
    .await
    .context("Failed to list homework for student")
}

/// Submitted homework waiting for the tutor
pub async fn list_submitted_homework(pool: &SqlitePool) -> Result<Vec<HomeworkEntry>> {
    sqlx::query_as::<_, HomeworkEntry>(&format!("{ENTRY_SELECT} WHERE h.status = 'submitted' ORDER BY h.id"))
        .fetch_all(pool)
        .await
        .context("Failed to list submitted homework")
}

/// Pending homework with a deadline in `(from, to]`
pub async fn list_pending_homework_due_between(
    pool: &SqlitePool,
    from: NaiveDateTime,
    to: NaiveDateTime,
) -> Result<Vec<HomeworkEntry>> {
    sqlx::query_as::<_, HomeworkEntry>(&format!(
        "{ENTRY_SELECT} WHERE h.status = 'pending' AND h.deadline IS NOT NULL
         AND h.deadline > ? AND h.deadline <= ? ORDER BY h.deadline"
    ))
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await
    .context("Failed to list homework due soon")
}

/// Add part of an answer. Text replaces earlier text, files accumulate.
///
/// Allowed while the homework is pending or already submitted; checked
/// homework is closed.
pub async fn submit_homework(pool: &SqlitePool, homework_id: i64, submission: Submission) -> Result<Homework, BotError> {
    let homework = get_homework(pool, homework_id)
        .await?
        .ok_or(BotError::NotFound("homework", homework_id))?;

    if homework.status == HomeworkStatus::Checked {
        return Err(BotError::InvalidState(format!("homework {homework_id} is already checked")));
    }

    let updated = match submission {
        Submission::Text(text) => {
            sqlx::query_as::<_, Homework>(
                "UPDATE homeworks SET submission_text = ?, status = 'submitted' WHERE id = ? RETURNING *",
            )
            .bind(text)
            .bind(homework_id)
            .fetch_one(pool)
            .await?
        }
        Submission::File(file_id) => {
            let mut files = homework.submission_file_ids.0;
            files.push(file_id);
            sqlx::query_as::<_, Homework>(
                "UPDATE homeworks SET submission_file_ids = ?, status = 'submitted' WHERE id = ? RETURNING *",
            )
            .bind(Json(&files))
            .bind(homework_id)
            .fetch_one(pool)
            .await?
        }
    };

    info!(homework_id, "Homework submission received");
    Ok(updated)
}

/// Review homework. Checking it the first time pays the homework bonus;
/// sending it back to `pending` asks the student for rework.
pub async fn set_homework_status(
    pool: &SqlitePool,
    homework_id: i64,
    status: HomeworkStatus,
    now: NaiveDateTime,
) -> Result<HomeworkReview> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let entry = sqlx::query_as::<_, HomeworkEntry>(&format!("{ENTRY_SELECT} WHERE h.id = ?"))
        .bind(homework_id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to read homework")?
        .ok_or(BotError::NotFound("homework", homework_id))?;

    let checked_at = match status {
        HomeworkStatus::Checked => Some(entry.homework.checked_at.unwrap_or(now)),
        _ => None,
    };
    let points_awarded = status == HomeworkStatus::Checked && !entry.homework.bonus_awarded;

    let homework = sqlx::query_as::<_, Homework>(
        "UPDATE homeworks SET status = ?, checked_at = ?, bonus_awarded = bonus_awarded OR ?
         WHERE id = ? RETURNING *",
    )
    .bind(status)
    .bind(checked_at)
    .bind(points_awarded)
    .bind(homework_id)
    .fetch_one(&mut *tx)
    .await
    .context("Failed to update homework status")?;

    let mut new_achievements = Vec::new();
    if points_awarded {
        gamification::add_points(&mut tx, entry.student_id, POINTS_FOR_HOMEWORK).await?;
        new_achievements.extend(gamification::check_homework_achievements(&mut tx, entry.student_id).await?);
        new_achievements.extend(gamification::check_points_achievements(&mut tx, entry.student_id).await?);
    }

    tx.commit().await.context("Failed to commit homework review")?;

    info!(homework_id, status = status.as_str(), points_awarded, "Homework status changed");
    Ok(HomeworkReview {
        homework,
        points_awarded,
        new_achievements,
    })
}

pub async fn delete_homework(pool: &SqlitePool, homework_id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM homeworks WHERE id = ?")
        .bind(homework_id)
        .execute(pool)
        .await
        .context("Failed to delete homework")?;

    Ok(result.rows_affected() > 0)
}
