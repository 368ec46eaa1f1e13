//! Database module: SQLite pool, schema and row accessors
//!
//! - `users`: accounts, access codes, parent links
//! - `lessons`: lesson CRUD and the attendance workflow
//! - `homework`: assignments, submissions and review
//! - `payments`: lesson credit top-ups and balance
//! - `materials`: the library
//! - `achievements`: earned badges
//! - `stats`: dashboard and monthly reports

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::info;

pub mod achievements;
pub mod homework;
pub mod lessons;
pub mod materials;
pub mod payments;
pub mod stats;
pub mod users;

pub use achievements::*;
pub use homework::*;
pub use lessons::*;
pub use materials::*;
pub use payments::*;
pub use stats::*;
pub use users::*;

const MAX_CONNECTIONS: u32 = 5;

/// Open (and create if missing) the SQLite database
pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    info!(database_url = %database_url, "Opening database");

    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("Invalid DATABASE_URL: {database_url}"))?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await
        .context("Failed to connect to database")
}

/// Initialize the database schema
pub async fn init_database_schema(pool: &SqlitePool) -> Result<()> {
    info!("Initializing database schema...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            telegram_id INTEGER UNIQUE,
            username TEXT,
            full_name TEXT NOT NULL,
            role TEXT NOT NULL CHECK (role IN ('tutor', 'student', 'parent')),
            access_code TEXT NOT NULL UNIQUE,
            points INTEGER NOT NULL DEFAULT 0 CHECK (points >= 0),
            streak_days INTEGER NOT NULL DEFAULT 0,
            last_lesson_date DATETIME,
            parent_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
            second_parent_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create users table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS lessons (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            topic TEXT NOT NULL,
            date DATETIME,
            skills_developed TEXT,
            mastery_level TEXT NOT NULL DEFAULT 'not_learned',
            mastery_comment TEXT,
            attendance_status TEXT NOT NULL DEFAULT 'scheduled',
            lesson_status TEXT NOT NULL DEFAULT 'not_conducted',
            original_date DATETIME,
            is_makeup BOOLEAN NOT NULL DEFAULT 0,
            mastery_bonus_awarded BOOLEAN NOT NULL DEFAULT 0,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create lessons table")?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_lessons_student_date ON lessons(student_id, date)")
        .execute(pool)
        .await
        .context("Failed to create lessons index")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS homeworks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            lesson_id INTEGER NOT NULL REFERENCES lessons(id) ON DELETE CASCADE,
            description TEXT NOT NULL,
            file_link TEXT,
            photo_file_ids TEXT NOT NULL DEFAULT '[]',
            status TEXT NOT NULL DEFAULT 'pending',
            deadline DATETIME,
            submission_text TEXT,
            submission_file_ids TEXT NOT NULL DEFAULT '[]',
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            checked_at DATETIME,
            bonus_awarded BOOLEAN NOT NULL DEFAULT 0
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create homeworks table")?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_homeworks_lesson ON homeworks(lesson_id)")
        .execute(pool)
        .await
        .context("Failed to create homeworks index")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS payments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            lessons_paid INTEGER NOT NULL CHECK (lessons_paid > 0),
            payment_date DATETIME NOT NULL
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create payments table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS materials (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            link TEXT NOT NULL,
            description TEXT,
            grade INTEGER CHECK (grade IS NULL OR grade BETWEEN 1 AND 11),
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create materials table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS achievements (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            code TEXT NOT NULL,
            earned_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (student_id, code)
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create achievements table")?;

    info!("Database schema initialized successfully");
    Ok(())
}
