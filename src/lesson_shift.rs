//! Lesson shift after a cancellation.
//!
//! When a lesson is cancelled its material still has to be taught, so every
//! later lesson of the same student takes over the plan of the lesson before
//! it. The plan pushed off the end of the schedule becomes a makeup lesson
//! without a date, to be scheduled by the tutor.

use anyhow::{Context, Result};
use sqlx::SqliteConnection;
use tracing::{debug, info};

use crate::models::Lesson;

/// What is taught in a lesson
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonPlan {
    pub topic: String,
    pub skills_developed: Option<String>,
}

impl From<&Lesson> for LessonPlan {
    fn from(lesson: &Lesson) -> Self {
        Self {
            topic: lesson.topic.clone(),
            skills_developed: lesson.skills_developed.clone(),
        }
    }
}

/// Result of planning a shift
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftPlan {
    pub student_id: i64,
    /// New plan for each later lesson, in date order
    pub reassignments: Vec<(i64, LessonPlan)>,
    /// Plan for the dateless makeup lesson
    pub makeup: LessonPlan,
}

/// Plan the shift for `cancelled` given the student's later lessons.
///
/// `later` must hold only lessons of the same student dated strictly after
/// the cancelled one; it is sorted by `(date, id)` here.
pub fn plan_lesson_shift(cancelled: &Lesson, later: &[Lesson]) -> ShiftPlan {
    let mut ordered: Vec<&Lesson> = later.iter().collect();
    ordered.sort_by_key(|lesson| (lesson.date, lesson.id));

    let mut carried = LessonPlan::from(cancelled);
    let mut reassignments = Vec::with_capacity(ordered.len());

    for lesson in ordered {
        let own = LessonPlan::from(lesson);
        reassignments.push((lesson.id, carried));
        carried = own;
    }

    ShiftPlan {
        student_id: cancelled.student_id,
        reassignments,
        makeup: carried,
    }
}

/// Lessons of the same student dated strictly after `cancelled`
pub async fn fetch_later_lessons(conn: &mut SqliteConnection, cancelled: &Lesson) -> Result<Vec<Lesson>> {
    let Some(date) = cancelled.date else {
        return Ok(Vec::new());
    };

    sqlx::query_as::<_, Lesson>(
        "SELECT * FROM lessons
         WHERE student_id = ? AND date IS NOT NULL AND date > ? AND id != ?
         ORDER BY date, id",
    )
    .bind(cancelled.student_id)
    .bind(date)
    .bind(cancelled.id)
    .fetch_all(&mut *conn)
    .await
    .context("Failed to fetch later lessons")
}

/// Write a planned shift. Returns the id of the created makeup lesson.
pub async fn apply_lesson_shift(conn: &mut SqliteConnection, plan: &ShiftPlan) -> Result<i64> {
    for (lesson_id, lesson_plan) in &plan.reassignments {
        debug!(lesson_id, topic = %lesson_plan.topic, "Reassigning lesson topic");
        sqlx::query("UPDATE lessons SET topic = ?, skills_developed = ? WHERE id = ?")
            .bind(&lesson_plan.topic)
            .bind(&lesson_plan.skills_developed)
            .bind(lesson_id)
            .execute(&mut *conn)
            .await
            .context("Failed to reassign lesson topic")?;
    }

    let makeup_id = sqlx::query(
        "INSERT INTO lessons (student_id, topic, date, skills_developed, is_makeup)
         VALUES (?, ?, NULL, ?, 1)",
    )
    .bind(plan.student_id)
    .bind(&plan.makeup.topic)
    .bind(&plan.makeup.skills_developed)
    .execute(&mut *conn)
    .await
    .context("Failed to create makeup lesson")?
    .last_insert_rowid();

    info!(
        student_id = plan.student_id,
        shifted = plan.reassignments.len(),
        makeup_id,
        "Lesson shift applied"
    );

    Ok(makeup_id)
}

/// Plan and apply the shift for a cancelled lesson
pub async fn shift_after_cancellation(conn: &mut SqliteConnection, cancelled: &Lesson) -> Result<ShiftPlan> {
    let later = fetch_later_lessons(conn, cancelled).await?;
    let plan = plan_lesson_shift(cancelled, &later);
    apply_lesson_shift(conn, &plan).await?;
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttendanceStatus, LessonStatus, MasteryLevel};
    use chrono::{NaiveDate, NaiveDateTime};

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, d)
            .unwrap()
            .and_hms_opt(16, 0, 0)
            .unwrap()
    }

    fn lesson(id: i64, topic: &str, date: Option<NaiveDateTime>) -> Lesson {
        Lesson {
            id,
            student_id: 1,
            topic: topic.to_string(),
            date,
            skills_developed: Some(format!("skills of {topic}")),
            mastery_level: MasteryLevel::NotLearned,
            mastery_comment: None,
            attendance_status: AttendanceStatus::Scheduled,
            lesson_status: LessonStatus::NotConducted,
            original_date: None,
            is_makeup: false,
            created_at: day(1),
        }
    }

    #[test]
    fn test_topics_move_forward_by_one() {
        let cancelled = lesson(1, "Fractions", Some(day(3)));
        let later = vec![
            lesson(3, "Percent", Some(day(17))),
            lesson(2, "Decimals", Some(day(10))),
            lesson(4, "Ratios", Some(day(24))),
        ];

        let plan = plan_lesson_shift(&cancelled, &later);

        let topics: Vec<(i64, &str)> = plan
            .reassignments
            .iter()
            .map(|(id, p)| (*id, p.topic.as_str()))
            .collect();
        assert_eq!(topics, vec![(2, "Fractions"), (3, "Decimals"), (4, "Percent")]);
        assert_eq!(plan.makeup.topic, "Ratios");
        assert_eq!(plan.makeup.skills_developed.as_deref(), Some("skills of Ratios"));
    }

    #[test]
    fn test_no_later_lessons_makes_cancelled_topic_the_makeup() {
        let cancelled = lesson(1, "Fractions", Some(day(3)));
        let plan = plan_lesson_shift(&cancelled, &[]);

        assert!(plan.reassignments.is_empty());
        assert_eq!(plan.makeup.topic, "Fractions");
        assert_eq!(plan.student_id, 1);
    }

    #[test]
    fn test_equal_dates_ordered_by_id() {
        let cancelled = lesson(1, "A", Some(day(3)));
        let later = vec![lesson(6, "C", Some(day(10))), lesson(5, "B", Some(day(10)))];

        let plan = plan_lesson_shift(&cancelled, &later);
        let ids: Vec<i64> = plan.reassignments.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![5, 6]);
        assert_eq!(plan.makeup.topic, "C");
    }
}
