//! Who may see what

use anyhow::Result;
use sqlx::SqlitePool;

use crate::db;
use crate::errors::BotError;
use crate::models::{HomeworkEntry, Lesson, User, UserRole};

/// The registered user behind a Telegram account
pub async fn current_user(pool: &SqlitePool, telegram_id: i64) -> Result<User, BotError> {
    db::get_user_by_telegram_id(pool, telegram_id)
        .await?
        .ok_or(BotError::NotRegistered)
}

pub fn require_role(user: &User, role: UserRole) -> Result<(), BotError> {
    if user.role == role {
        Ok(())
    } else {
        Err(BotError::AccessDenied)
    }
}

/// A student the viewer may look at: the student themself, a linked parent, or a tutor
pub async fn visible_student(pool: &SqlitePool, viewer: &User, student_id: i64) -> Result<User, BotError> {
    let student = db::get_user_by_id(pool, student_id)
        .await?
        .filter(|user| user.role == UserRole::Student)
        .ok_or(BotError::NotFound("student", student_id))?;

    let allowed = match viewer.role {
        UserRole::Tutor => true,
        UserRole::Student => viewer.id == student.id,
        UserRole::Parent => viewer.is_parent_of(&student),
    };

    if allowed {
        Ok(student)
    } else {
        Err(BotError::AccessDenied)
    }
}

pub async fn visible_lesson(pool: &SqlitePool, viewer: &User, lesson_id: i64) -> Result<Lesson, BotError> {
    let lesson = db::get_lesson(pool, lesson_id)
        .await?
        .ok_or(BotError::NotFound("lesson", lesson_id))?;
    visible_student(pool, viewer, lesson.student_id).await?;
    Ok(lesson)
}

pub async fn visible_homework(pool: &SqlitePool, viewer: &User, homework_id: i64) -> Result<HomeworkEntry, BotError> {
    let entry = db::get_homework_entry(pool, homework_id)
        .await?
        .ok_or(BotError::NotFound("homework", homework_id))?;
    visible_student(pool, viewer, entry.student_id).await?;
    Ok(entry)
}
