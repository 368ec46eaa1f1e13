use anyhow::{Context, Result};
use sqlx::SqlitePool;

use crate::models::EarnedAchievement;

/// Achievements of a student in the order they were earned
pub async fn list_achievements(pool: &SqlitePool, student_id: i64) -> Result<Vec<EarnedAchievement>> {
    sqlx::query_as::<_, EarnedAchievement>(
        "SELECT * FROM achievements WHERE student_id = ? ORDER BY earned_at, id",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await
    .context("Failed to list achievements")
}
