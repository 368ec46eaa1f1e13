#![allow(dead_code)]

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::SqlitePool;
use tempfile::TempDir;

use tutorbot::db;
use tutorbot::models::{Lesson, User};

/// A fresh database in a temporary directory. Keep the `TempDir` alive for the test.
pub async fn setup_test_db() -> Result<(TempDir, SqlitePool)> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("test.db");
    let pool = db::connect(&format!("sqlite://{}", path.display())).await?;
    db::init_database_schema(&pool).await?;
    Ok((dir, pool))
}

/// March 2025 at 16:00
pub fn day(d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, d)
        .unwrap()
        .and_hms_opt(16, 0, 0)
        .unwrap()
}

pub async fn student(pool: &SqlitePool, name: &str) -> User {
    db::create_student_with_parent(pool, name, None).await.unwrap().0
}

/// One dated lesson per `(topic, day)`
pub async fn lessons(pool: &SqlitePool, student_id: i64, plan: &[(&str, u32)]) -> Vec<Lesson> {
    let mut created = Vec::new();
    for (topic, d) in plan {
        let skills = format!("{topic} skills");
        created.push(
            db::create_lesson(pool, student_id, topic, Some(day(*d)), Some(&skills))
                .await
                .unwrap(),
        );
    }
    created
}

pub async fn reload(pool: &SqlitePool, lesson_id: i64) -> Lesson {
    db::get_lesson(pool, lesson_id).await.unwrap().unwrap()
}

pub async fn reload_user(pool: &SqlitePool, user_id: i64) -> User {
    db::get_user_by_id(pool, user_id).await.unwrap().unwrap()
}
