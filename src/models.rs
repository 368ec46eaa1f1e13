//! Domain types stored in the database

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Tutor,
    Student,
    Parent,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Tutor => "tutor",
            UserRole::Student => "student",
            UserRole::Parent => "parent",
        }
    }

    pub fn message_key(&self) -> &'static str {
        match self {
            UserRole::Tutor => "role-tutor",
            UserRole::Student => "role-student",
            UserRole::Parent => "role-parent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MasteryLevel {
    NotLearned,
    Learned,
    Mastered,
}

impl MasteryLevel {
    pub const ALL: [MasteryLevel; 3] = [
        MasteryLevel::NotLearned,
        MasteryLevel::Learned,
        MasteryLevel::Mastered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MasteryLevel::NotLearned => "not_learned",
            MasteryLevel::Learned => "learned",
            MasteryLevel::Mastered => "mastered",
        }
    }

    pub fn message_key(&self) -> &'static str {
        match self {
            MasteryLevel::NotLearned => "mastery-not-learned",
            MasteryLevel::Learned => "mastery-learned",
            MasteryLevel::Mastered => "mastery-mastered",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            MasteryLevel::NotLearned => "⚪",
            MasteryLevel::Learned => "🟡",
            MasteryLevel::Mastered => "🟢",
        }
    }
}

impl FromStr for MasteryLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_learned" => Ok(MasteryLevel::NotLearned),
            "learned" => Ok(MasteryLevel::Learned),
            "mastered" => Ok(MasteryLevel::Mastered),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Scheduled,
    Attended,
    ExcusedAbsence,
    UnexcusedAbsence,
    Rescheduled,
}

impl AttendanceStatus {
    /// Statuses a tutor can pick from the attendance menu
    pub const SELECTABLE: [AttendanceStatus; 4] = [
        AttendanceStatus::Attended,
        AttendanceStatus::ExcusedAbsence,
        AttendanceStatus::UnexcusedAbsence,
        AttendanceStatus::Rescheduled,
    ];

    /// A cancelled lesson triggers the lesson shift
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            AttendanceStatus::ExcusedAbsence
                | AttendanceStatus::UnexcusedAbsence
                | AttendanceStatus::Rescheduled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Scheduled => "scheduled",
            AttendanceStatus::Attended => "attended",
            AttendanceStatus::ExcusedAbsence => "excused_absence",
            AttendanceStatus::UnexcusedAbsence => "unexcused_absence",
            AttendanceStatus::Rescheduled => "rescheduled",
        }
    }

    pub fn message_key(&self) -> &'static str {
        match self {
            AttendanceStatus::Scheduled => "attendance-scheduled",
            AttendanceStatus::Attended => "attendance-attended",
            AttendanceStatus::ExcusedAbsence => "attendance-excused",
            AttendanceStatus::UnexcusedAbsence => "attendance-unexcused",
            AttendanceStatus::Rescheduled => "attendance-rescheduled",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            AttendanceStatus::Scheduled => "🗓",
            AttendanceStatus::Attended => "✅",
            AttendanceStatus::ExcusedAbsence => "🟡",
            AttendanceStatus::UnexcusedAbsence => "❌",
            AttendanceStatus::Rescheduled => "🔄",
        }
    }
}

impl FromStr for AttendanceStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(AttendanceStatus::Scheduled),
            "attended" => Ok(AttendanceStatus::Attended),
            "excused_absence" => Ok(AttendanceStatus::ExcusedAbsence),
            "unexcused_absence" => Ok(AttendanceStatus::UnexcusedAbsence),
            "rescheduled" => Ok(AttendanceStatus::Rescheduled),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LessonStatus {
    NotConducted,
    Conducted,
}

impl LessonStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LessonStatus::NotConducted => "not_conducted",
            LessonStatus::Conducted => "conducted",
        }
    }

    pub fn message_key(&self) -> &'static str {
        match self {
            LessonStatus::NotConducted => "lesson-status-not-conducted",
            LessonStatus::Conducted => "lesson-status-conducted",
        }
    }

    pub fn toggled(&self) -> LessonStatus {
        match self {
            LessonStatus::NotConducted => LessonStatus::Conducted,
            LessonStatus::Conducted => LessonStatus::NotConducted,
        }
    }
}

impl FromStr for LessonStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_conducted" => Ok(LessonStatus::NotConducted),
            "conducted" => Ok(LessonStatus::Conducted),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum HomeworkStatus {
    Pending,
    Submitted,
    Checked,
}

impl HomeworkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HomeworkStatus::Pending => "pending",
            HomeworkStatus::Submitted => "submitted",
            HomeworkStatus::Checked => "checked",
        }
    }

    pub fn message_key(&self) -> &'static str {
        match self {
            HomeworkStatus::Pending => "homework-status-pending",
            HomeworkStatus::Submitted => "homework-status-submitted",
            HomeworkStatus::Checked => "homework-status-checked",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            HomeworkStatus::Pending => "⏳",
            HomeworkStatus::Submitted => "📬",
            HomeworkStatus::Checked => "✅",
        }
    }
}

impl FromStr for HomeworkStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(HomeworkStatus::Pending),
            "submitted" => Ok(HomeworkStatus::Submitted),
            "checked" => Ok(HomeworkStatus::Checked),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub telegram_id: Option<i64>,
    pub username: Option<String>,
    pub full_name: String,
    pub role: UserRole,
    pub access_code: String,
    pub points: i64,
    pub streak_days: i64,
    pub last_lesson_date: Option<NaiveDateTime>,
    pub parent_id: Option<i64>,
    pub second_parent_id: Option<i64>,
    pub created_at: NaiveDateTime,
}

impl User {
    pub fn is_parent_of(&self, child: &User) -> bool {
        child.parent_id == Some(self.id) || child.second_parent_id == Some(self.id)
    }
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Lesson {
    pub id: i64,
    pub student_id: i64,
    pub topic: String,
    /// `None` for a makeup lesson that still needs a slot
    pub date: Option<NaiveDateTime>,
    pub skills_developed: Option<String>,
    pub mastery_level: MasteryLevel,
    pub mastery_comment: Option<String>,
    pub attendance_status: AttendanceStatus,
    pub lesson_status: LessonStatus,
    pub original_date: Option<NaiveDateTime>,
    pub is_makeup: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Homework {
    pub id: i64,
    pub lesson_id: i64,
    pub description: String,
    pub file_link: Option<String>,
    pub photo_file_ids: Json<Vec<String>>,
    pub status: HomeworkStatus,
    pub deadline: Option<NaiveDateTime>,
    pub submission_text: Option<String>,
    pub submission_file_ids: Json<Vec<String>>,
    pub created_at: NaiveDateTime,
    pub checked_at: Option<NaiveDateTime>,
    /// Set once the review bonus has been paid out
    pub bonus_awarded: bool,
}

/// Homework joined with the lesson it belongs to
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct HomeworkEntry {
    #[sqlx(flatten)]
    pub homework: Homework,
    pub lesson_topic: String,
    pub student_id: i64,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Payment {
    pub id: i64,
    pub student_id: i64,
    pub lessons_paid: i64,
    pub payment_date: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Material {
    pub id: i64,
    pub title: String,
    pub link: String,
    pub description: Option<String>,
    /// School grade 1..=11, `None` for every grade
    pub grade: Option<i64>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct EarnedAchievement {
    pub id: i64,
    pub student_id: i64,
    pub code: String,
    pub earned_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_statuses() {
        assert!(!AttendanceStatus::Scheduled.is_cancellation());
        assert!(!AttendanceStatus::Attended.is_cancellation());
        assert!(AttendanceStatus::ExcusedAbsence.is_cancellation());
        assert!(AttendanceStatus::UnexcusedAbsence.is_cancellation());
        assert!(AttendanceStatus::Rescheduled.is_cancellation());
    }

    #[test]
    fn test_status_string_mapping() {
        for status in AttendanceStatus::SELECTABLE {
            assert_eq!(status.as_str().parse::<AttendanceStatus>(), Ok(status));
        }
        for level in MasteryLevel::ALL {
            assert_eq!(level.as_str().parse::<MasteryLevel>(), Ok(level));
        }
        assert_eq!("checked".parse::<HomeworkStatus>(), Ok(HomeworkStatus::Checked));
        assert!("done".parse::<HomeworkStatus>().is_err());
        assert_eq!(LessonStatus::Conducted.toggled(), LessonStatus::NotConducted);
    }

    #[test]
    fn test_is_parent_of() {
        let created_at = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let user = |id, role, parent_id, second_parent_id| User {
            id,
            telegram_id: None,
            username: None,
            full_name: format!("User {id}"),
            role,
            access_code: format!("CODE{id:04}"),
            points: 0,
            streak_days: 0,
            last_lesson_date: None,
            parent_id,
            second_parent_id,
            created_at,
        };

        let mother = user(1, UserRole::Parent, None, None);
        let father = user(2, UserRole::Parent, None, None);
        let stranger = user(3, UserRole::Parent, None, None);
        let child = user(4, UserRole::Student, Some(1), Some(2));

        assert!(mother.is_parent_of(&child));
        assert!(father.is_parent_of(&child));
        assert!(!stranger.is_parent_of(&child));
    }
}
