//! User accounts, access codes and parent links

use anyhow::{Context, Result};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::access_code::generate_access_code;
use crate::errors::BotError;
use crate::models::{User, UserRole};

const ACCESS_CODE_ATTEMPTS: usize = 20;

/// Which parent slot of a student was filled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentLink {
    First,
    Second,
    AlreadyLinked,
    NoFreeSlot,
}

/// Outcome of registering an account by name
#[derive(Debug, Clone, PartialEq)]
pub enum Registration {
    Created(User),
    /// A user with this name and role already exists; nothing was created
    AlreadyExists(User),
}

pub async fn get_user_by_id(pool: &SqlitePool, user_id: i64) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("Failed to read user by id")
}

pub async fn get_user_by_telegram_id(pool: &SqlitePool, telegram_id: i64) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE telegram_id = ?")
        .bind(telegram_id)
        .fetch_optional(pool)
        .await
        .context("Failed to read user by telegram id")
}

pub async fn get_user_by_access_code(pool: &SqlitePool, access_code: &str) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE access_code = ?")
        .bind(access_code)
        .fetch_optional(pool)
        .await
        .context("Failed to read user by access code")
}

pub async fn find_user_by_full_name(pool: &SqlitePool, role: UserRole, full_name: &str) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE role = ? AND full_name = ? LIMIT 1")
        .bind(role)
        .bind(full_name)
        .fetch_optional(pool)
        .await
        .context("Failed to find user by name")
}

async fn unused_access_code(conn: &mut SqliteConnection) -> Result<String> {
    for _ in 0..ACCESS_CODE_ATTEMPTS {
        let code = generate_access_code(&mut rand::thread_rng());
        let taken: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE access_code = ?)")
            .bind(&code)
            .fetch_one(&mut *conn)
            .await
            .context("Failed to check access code")?;
        if !taken {
            return Ok(code);
        }
        warn!("Generated access code collided, retrying");
    }
    anyhow::bail!("Could not generate a unique access code")
}

async fn insert_user(conn: &mut SqliteConnection, full_name: &str, role: UserRole) -> Result<User> {
    let access_code = unused_access_code(conn).await?;

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (full_name, role, access_code) VALUES (?, ?, ?) RETURNING *",
    )
    .bind(full_name)
    .bind(role)
    .bind(&access_code)
    .fetch_one(&mut *conn)
    .await
    .context("Failed to insert user")?;

    info!(user_id = user.id, role = role.as_str(), "User created");
    Ok(user)
}

/// Create a user with a fresh access code
pub async fn create_user(pool: &SqlitePool, full_name: &str, role: UserRole) -> Result<User> {
    let mut conn = pool.acquire().await.context("Failed to acquire connection")?;
    insert_user(&mut *conn, full_name, role).await
}

/// Create a user unless one with the same full name already exists in the role
pub async fn register_user(pool: &SqlitePool, full_name: &str, role: UserRole) -> Result<Registration> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let existing = sqlx::query_as::<_, User>("SELECT * FROM users WHERE role = ? AND full_name = ? LIMIT 1")
        .bind(role)
        .bind(full_name)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to find user by name")?;
    if let Some(user) = existing {
        debug!(user_id = user.id, role = role.as_str(), "Account with this name already exists");
        return Ok(Registration::AlreadyExists(user));
    }

    let user = insert_user(&mut *tx, full_name, role).await?;
    tx.commit().await.context("Failed to commit registration")?;
    Ok(Registration::Created(user))
}

/// Create a student and, optionally, a new parent linked as the first parent
pub async fn create_student_with_parent(
    pool: &SqlitePool,
    student_name: &str,
    parent_name: Option<&str>,
) -> Result<(User, Option<User>)> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let parent = match parent_name {
        Some(name) => Some(insert_user(&mut *tx, name, UserRole::Parent).await?),
        None => None,
    };

    let mut student = insert_user(&mut *tx, student_name, UserRole::Student).await?;

    if let Some(parent) = &parent {
        sqlx::query("UPDATE users SET parent_id = ? WHERE id = ?")
            .bind(parent.id)
            .bind(student.id)
            .execute(&mut *tx)
            .await
            .context("Failed to link parent")?;
        student.parent_id = Some(parent.id);
    }

    tx.commit().await.context("Failed to commit student creation")?;
    Ok((student, parent))
}

/// Bind a Telegram account to the user owning `access_code`
pub async fn login_with_access_code(
    pool: &SqlitePool,
    access_code: &str,
    telegram_id: i64,
    username: Option<&str>,
) -> Result<User, BotError> {
    let user = get_user_by_access_code(pool, access_code)
        .await?
        .ok_or(BotError::InvalidInput("login-code-not-found"))?;

    if let Some(bound) = user.telegram_id {
        if bound != telegram_id {
            warn!(user_id = user.id, "Access code already bound to another account");
            return Err(BotError::InvalidInput("login-code-taken"));
        }
    }

    let mut tx = pool.begin().await?;

    // One Telegram account maps to one user
    sqlx::query("UPDATE users SET telegram_id = NULL WHERE telegram_id = ? AND id != ?")
        .bind(telegram_id)
        .bind(user.id)
        .execute(&mut *tx)
        .await?;

    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET telegram_id = ?, username = ? WHERE id = ? RETURNING *",
    )
    .bind(telegram_id)
    .bind(username)
    .bind(user.id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(user_id = user.id, telegram_id, role = user.role.as_str(), "Telegram account bound");
    Ok(user)
}

pub async fn list_students(pool: &SqlitePool) -> Result<Vec<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE role = 'student' ORDER BY full_name, id")
        .fetch_all(pool)
        .await
        .context("Failed to list students")
}

pub async fn list_children(pool: &SqlitePool, parent_id: i64) -> Result<Vec<User>> {
    sqlx::query_as::<_, User>(
        "SELECT * FROM users
         WHERE role = 'student' AND (parent_id = ? OR second_parent_id = ?)
         ORDER BY full_name, id",
    )
    .bind(parent_id)
    .bind(parent_id)
    .fetch_all(pool)
    .await
    .context("Failed to list children")
}

/// Parents linked to a student, first parent first
pub async fn list_parents(pool: &SqlitePool, student: &User) -> Result<Vec<User>> {
    let mut parents = Vec::new();
    for parent_id in [student.parent_id, student.second_parent_id].into_iter().flatten() {
        if let Some(parent) = get_user_by_id(pool, parent_id).await? {
            parents.push(parent);
        }
    }
    Ok(parents)
}

pub async fn list_tutors(pool: &SqlitePool) -> Result<Vec<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE role = 'tutor' ORDER BY id")
        .fetch_all(pool)
        .await
        .context("Failed to list tutors")
}

/// Students and parents with a bound Telegram account
pub async fn list_broadcast_recipients(pool: &SqlitePool) -> Result<Vec<User>> {
    sqlx::query_as::<_, User>(
        "SELECT * FROM users
         WHERE role IN ('student', 'parent') AND telegram_id IS NOT NULL
         ORDER BY id",
    )
    .fetch_all(pool)
    .await
    .context("Failed to list broadcast recipients")
}

pub async fn update_full_name(pool: &SqlitePool, user_id: i64, full_name: &str) -> Result<bool> {
    let result = sqlx::query("UPDATE users SET full_name = ? WHERE id = ?")
        .bind(full_name)
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to update name")?;

    Ok(result.rows_affected() > 0)
}

/// Link a parent to a student, filling the first free slot
pub async fn link_parent(pool: &SqlitePool, student_id: i64, parent_id: i64) -> Result<ParentLink> {
    let student = get_user_by_id(pool, student_id)
        .await?
        .ok_or(BotError::NotFound("student", student_id))?;

    if student.parent_id == Some(parent_id) || student.second_parent_id == Some(parent_id) {
        return Ok(ParentLink::AlreadyLinked);
    }

    let (column, link) = match (student.parent_id, student.second_parent_id) {
        (None, _) => ("parent_id", ParentLink::First),
        (Some(_), None) => ("second_parent_id", ParentLink::Second),
        (Some(_), Some(_)) => return Ok(ParentLink::NoFreeSlot),
    };

    sqlx::query(&format!("UPDATE users SET {column} = ? WHERE id = ?"))
        .bind(parent_id)
        .bind(student_id)
        .execute(pool)
        .await
        .context("Failed to link parent")?;

    info!(student_id, parent_id, slot = column, "Parent linked");
    Ok(link)
}

pub async fn unlink_second_parent(pool: &SqlitePool, student_id: i64) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE users SET second_parent_id = NULL WHERE id = ? AND second_parent_id IS NOT NULL",
    )
    .bind(student_id)
    .execute(pool)
    .await
    .context("Failed to unlink second parent")?;

    Ok(result.rows_affected() > 0)
}

/// Delete a student with lessons, homework, payments and achievements
pub async fn delete_student(pool: &SqlitePool, student_id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = ? AND role = 'student'")
        .bind(student_id)
        .execute(pool)
        .await
        .context("Failed to delete student")?;

    if result.rows_affected() > 0 {
        info!(student_id, "Student deleted");
        Ok(true)
    } else {
        info!(student_id, "No student found to delete");
        Ok(false)
    }
}
