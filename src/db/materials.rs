//! Library materials

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::info;

use crate::models::Material;

pub const MIN_GRADE: i64 = 1;
pub const MAX_GRADE: i64 = 11;

pub async fn create_material(
    pool: &SqlitePool,
    title: &str,
    link: &str,
    description: Option<&str>,
    grade: Option<i64>,
) -> Result<Material> {
    let material = sqlx::query_as::<_, Material>(
        "INSERT INTO materials (title, link, description, grade) VALUES (?, ?, ?, ?) RETURNING *",
    )
    .bind(title)
    .bind(link)
    .bind(description)
    .bind(grade)
    .fetch_one(pool)
    .await
    .context("Failed to insert material")?;

    info!(material_id = material.id, grade = ?grade, "Material created");
    Ok(material)
}

pub async fn get_material(pool: &SqlitePool, material_id: i64) -> Result<Option<Material>> {
    sqlx::query_as::<_, Material>("SELECT * FROM materials WHERE id = ?")
        .bind(material_id)
        .fetch_optional(pool)
        .await
        .context("Failed to read material")
}

/// Materials for a grade (including all-grade ones), or every material when `grade` is `None`
pub async fn list_materials(pool: &SqlitePool, grade: Option<i64>) -> Result<Vec<Material>> {
    let query = match grade {
        Some(grade) => sqlx::query_as::<_, Material>(
            "SELECT * FROM materials WHERE grade = ? OR grade IS NULL ORDER BY grade IS NULL, title, id",
        )
        .bind(grade),
        None => sqlx::query_as::<_, Material>("SELECT * FROM materials ORDER BY grade IS NULL, grade, title, id"),
    };

    query.fetch_all(pool).await.context("Failed to list materials")
}

pub async fn delete_material(pool: &SqlitePool, material_id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM materials WHERE id = ?")
        .bind(material_id)
        .execute(pool)
        .await
        .context("Failed to delete material")?;

    if result.rows_affected() > 0 {
        info!(material_id, "Material deleted");
    }
    Ok(result.rows_affected() > 0)
}
