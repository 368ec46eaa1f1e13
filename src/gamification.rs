//! Points, lesson streaks and achievements

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDateTime};
use sqlx::SqliteConnection;
use tracing::info;

use crate::config::{POINTS_FOR_ATTENDANCE, STREAK_MAX_GAP_DAYS};
use crate::models::AttendanceStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AchievementKind {
    Lessons,
    Homework,
    Points,
    Streak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AchievementDef {
    pub code: &'static str,
    pub icon: &'static str,
    pub kind: AchievementKind,
    pub threshold: i64,
}

impl AchievementDef {
    pub fn title_key(&self) -> String {
        format!("achievement-{}", self.code)
    }

    pub fn description_key(&self) -> String {
        format!("achievement-{}-description", self.code)
    }
}

const fn def(code: &'static str, icon: &'static str, kind: AchievementKind, threshold: i64) -> AchievementDef {
    AchievementDef {
        code,
        icon,
        kind,
        threshold,
    }
}

pub const ACHIEVEMENTS: &[AchievementDef] = &[
    def("first_lesson", "🎯", AchievementKind::Lessons, 1),
    def("lessons_10", "🔟", AchievementKind::Lessons, 10),
    def("lessons_25", "🎖️", AchievementKind::Lessons, 25),
    def("lessons_50", "🥉", AchievementKind::Lessons, 50),
    def("lessons_100", "🥈", AchievementKind::Lessons, 100),
    def("first_homework", "📝", AchievementKind::Homework, 1),
    def("homework_5", "📚", AchievementKind::Homework, 5),
    def("homework_10", "🎓", AchievementKind::Homework, 10),
    def("homework_25", "🏅", AchievementKind::Homework, 25),
    def("homework_50", "🥇", AchievementKind::Homework, 50),
    def("points_100", "⭐", AchievementKind::Points, 100),
    def("points_500", "🌟", AchievementKind::Points, 500),
    def("points_1000", "💎", AchievementKind::Points, 1000),
    def("streak_5", "🔥", AchievementKind::Streak, 5),
    def("streak_10", "⚡", AchievementKind::Streak, 10),
];

pub fn achievement_def(code: &str) -> Option<&'static AchievementDef> {
    ACHIEVEMENTS.iter().find(|a| a.code == code)
}

/// Achievements of `kind` whose threshold `value` has reached
pub fn reached_achievements(kind: AchievementKind, value: i64) -> impl Iterator<Item = &'static AchievementDef> {
    ACHIEVEMENTS
        .iter()
        .filter(move |a| a.kind == kind && value >= a.threshold)
}

/// Streak after attending a lesson on `attended_at`.
///
/// Returns the new streak and the new date of the last attended lesson.
pub fn next_streak(
    last_lesson_date: Option<NaiveDateTime>,
    current_streak: i64,
    attended_at: NaiveDateTime,
) -> (i64, NaiveDateTime) {
    match last_lesson_date {
        None => (1, attended_at),
        // An older lesson marked late does not move the streak
        Some(last) if attended_at <= last => (current_streak.max(1), last),
        Some(last) if attended_at - last <= Duration::days(STREAK_MAX_GAP_DAYS) => {
            (current_streak + 1, attended_at)
        }
        Some(_) => (1, attended_at),
    }
}

/// Add points to a student. Negative deltas never drop the total below zero.
pub async fn add_points(conn: &mut SqliteConnection, student_id: i64, delta: i64) -> Result<i64> {
    let points: i64 = sqlx::query_scalar(
        "UPDATE users SET points = MAX(points + ?, 0) WHERE id = ? RETURNING points",
    )
    .bind(delta)
    .bind(student_id)
    .fetch_one(&mut *conn)
    .await
    .context("Failed to update points")?;

    info!(student_id, delta, points, "Points updated");
    Ok(points)
}

/// Take back attendance points, only when the student still has them
pub async fn revoke_attendance_points(conn: &mut SqliteConnection, student_id: i64) -> Result<bool> {
    let result = sqlx::query("UPDATE users SET points = points - ? WHERE id = ? AND points >= ?")
        .bind(POINTS_FOR_ATTENDANCE)
        .bind(student_id)
        .bind(POINTS_FOR_ATTENDANCE)
        .execute(&mut *conn)
        .await
        .context("Failed to revoke attendance points")?;

    Ok(result.rows_affected() > 0)
}

/// Record an achievement. Returns `false` when it was already earned.
pub async fn award_achievement(conn: &mut SqliteConnection, student_id: i64, code: &str) -> Result<bool> {
    let result = sqlx::query("INSERT OR IGNORE INTO achievements (student_id, code) VALUES (?, ?)")
        .bind(student_id)
        .bind(code)
        .execute(&mut *conn)
        .await
        .context("Failed to award achievement")?;

    let awarded = result.rows_affected() > 0;
    if awarded {
        info!(student_id, code, "Achievement awarded");
    }
    Ok(awarded)
}

async fn award_reached(
    conn: &mut SqliteConnection,
    student_id: i64,
    kind: AchievementKind,
    value: i64,
) -> Result<Vec<&'static AchievementDef>> {
    let mut newly_earned = Vec::new();
    for achievement in reached_achievements(kind, value) {
        if award_achievement(conn, student_id, achievement.code).await? {
            newly_earned.push(achievement);
        }
    }
    Ok(newly_earned)
}

pub async fn check_lesson_achievements(conn: &mut SqliteConnection, student_id: i64) -> Result<Vec<&'static AchievementDef>> {
    let attended: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM lessons WHERE student_id = ? AND attendance_status = ?")
            .bind(student_id)
            .bind(AttendanceStatus::Attended)
            .fetch_one(&mut *conn)
            .await
            .context("Failed to count attended lessons")?;

    award_reached(conn, student_id, AchievementKind::Lessons, attended).await
}

pub async fn check_homework_achievements(conn: &mut SqliteConnection, student_id: i64) -> Result<Vec<&'static AchievementDef>> {
    let checked: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM homeworks h JOIN lessons l ON l.id = h.lesson_id
         WHERE l.student_id = ? AND h.status = 'checked'",
    )
    .bind(student_id)
    .fetch_one(&mut *conn)
    .await
    .context("Failed to count checked homework")?;

    award_reached(conn, student_id, AchievementKind::Homework, checked).await
}

pub async fn check_points_achievements(conn: &mut SqliteConnection, student_id: i64) -> Result<Vec<&'static AchievementDef>> {
    let points: i64 = sqlx::query_scalar("SELECT points FROM users WHERE id = ?")
        .bind(student_id)
        .fetch_one(&mut *conn)
        .await
        .context("Failed to read points")?;

    award_reached(conn, student_id, AchievementKind::Points, points).await
}

/// Extend the student's streak after an attended lesson
pub async fn update_study_streak(
    conn: &mut SqliteConnection,
    student_id: i64,
    attended_at: NaiveDateTime,
) -> Result<Vec<&'static AchievementDef>> {
    let (last_lesson_date, streak_days): (Option<NaiveDateTime>, i64) =
        sqlx::query_as("SELECT last_lesson_date, streak_days FROM users WHERE id = ?")
            .bind(student_id)
            .fetch_one(&mut *conn)
            .await
            .context("Failed to read streak")?;

    let (streak, last) = next_streak(last_lesson_date, streak_days, attended_at);

    sqlx::query("UPDATE users SET streak_days = ?, last_lesson_date = ? WHERE id = ?")
        .bind(streak)
        .bind(last)
        .bind(student_id)
        .execute(&mut *conn)
        .await
        .context("Failed to update streak")?;

    award_reached(conn, student_id, AchievementKind::Streak, streak).await
}

pub async fn reset_streak(conn: &mut SqliteConnection, student_id: i64) -> Result<()> {
    sqlx::query("UPDATE users SET streak_days = 0 WHERE id = ?")
        .bind(student_id)
        .execute(&mut *conn)
        .await
        .context("Failed to reset streak")?;
    Ok(())
}
