//! Conversation state for multi-step inputs, plus input validation.

use chrono::NaiveDateTime;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};

use crate::config::{MAX_LESSONS_PER_PAYMENT, MAX_NAME_LENGTH, MAX_TEXT_LENGTH, MAX_TOPIC_LENGTH};
use crate::models::MasteryLevel;

lazy_static! {
    static ref LINK_PATTERN: Regex =
        Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("Link pattern should be valid");
}

/// What the bot expects from the user next
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum BotDialogueState {
    #[default]
    Start,
    AwaitingAccessCode,

    // Tutor: students
    AddStudentName,
    AddStudentParent {
        student_name: String,
    },
    EditStudentName {
        student_id: i64,
    },
    LinkParent {
        student_id: i64,
    },
    AddPayment {
        student_id: i64,
    },

    // Tutor: lessons
    AddLessonTopic {
        student_id: i64,
    },
    AddLessonDate {
        student_id: i64,
        topic: String,
    },
    AddLessonSkills {
        student_id: i64,
        topic: String,
        date: Option<NaiveDateTime>,
    },
    ScheduleDays {
        student_id: i64,
        days: Vec<u8>,
    },
    ScheduleTime {
        student_id: i64,
        days: Vec<u8>,
    },
    EditLessonTopic {
        lesson_id: i64,
    },
    RescheduleLesson {
        lesson_id: i64,
    },
    MasteryComment {
        lesson_id: i64,
        level: MasteryLevel,
    },

    // Tutor: homework
    AddHomeworkDescription {
        lesson_id: i64,
    },
    AddHomeworkDeadline {
        lesson_id: i64,
        description: String,
    },
    AddHomeworkAttachments {
        lesson_id: i64,
        description: String,
        deadline: Option<NaiveDateTime>,
        file_link: Option<String>,
        photo_file_ids: Vec<String>,
    },

    // Tutor: library
    AddMaterialTitle {
        grade: Option<i64>,
    },
    AddMaterialLink {
        grade: Option<i64>,
        title: String,
    },
    AddMaterialDescription {
        grade: Option<i64>,
        title: String,
        link: String,
    },

    // Tutor: messaging
    BroadcastText,
    BroadcastConfirm {
        text: String,
    },
    TutorReplying {
        recipient_telegram_id: i64,
        recipient_name: String,
    },

    // Student and parent
    SubmittingHomework {
        homework_id: i64,
    },
    ChatWithTutor,
}

/// Type alias for the bot dialogue
pub type BotDialogue = Dialogue<BotDialogueState, InMemStorage<BotDialogueState>>;

fn validate_length(input: &str, max: usize) -> Result<String, &'static str> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err("empty");
    }

    if trimmed.chars().count() > max {
        return Err("too_long");
    }

    Ok(trimmed.to_string())
}

/// Validates a person's full name
pub fn validate_full_name(name: &str) -> Result<String, &'static str> {
    validate_length(name, MAX_NAME_LENGTH)
}

/// Validates a lesson topic or a material title
pub fn validate_topic(topic: &str) -> Result<String, &'static str> {
    validate_length(topic, MAX_TOPIC_LENGTH)
}

/// Validates free text such as homework descriptions, comments and broadcasts
pub fn validate_text(text: &str) -> Result<String, &'static str> {
    validate_length(text, MAX_TEXT_LENGTH)
}

/// Validates an http(s) link
pub fn validate_link(link: &str) -> Result<String, &'static str> {
    let trimmed = link.trim();

    if trimmed.is_empty() {
        return Err("empty");
    }

    if !LINK_PATTERN.is_match(trimmed) {
        return Err("invalid_link");
    }

    Ok(trimmed.to_string())
}

/// Parses the number of lessons in a payment
pub fn parse_lessons_paid(input: &str) -> Result<i64, &'static str> {
    let count: i64 = input.trim().parse().map_err(|_| "invalid_number")?;

    if count <= 0 || count > MAX_LESSONS_PER_PAYMENT {
        return Err("out_of_range");
    }

    Ok(count)
}

/// Words that abort the current dialogue
pub fn is_cancel_input(input: &str) -> bool {
    matches!(
        input.trim().to_lowercase().as_str(),
        "/cancel" | "cancel" | "stop" | "back" | "отмена" | "стоп" | "назад"
    )
}

/// Words that skip an optional step
pub fn is_skip_input(input: &str) -> bool {
    matches!(
        input.trim().to_lowercase().as_str(),
        "/skip" | "skip" | "-" | "пропустить" | "нет"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name_validation() {
        assert_eq!(validate_full_name("  Иван Петров ").unwrap(), "Иван Петров");
        assert_eq!(validate_full_name("   "), Err("empty"));
        assert_eq!(validate_full_name(&"я".repeat(101)), Err("too_long"));
        // Length is counted in characters, not bytes
        assert!(validate_full_name(&"я".repeat(100)).is_ok());
    }

    #[test]
    fn test_link_validation() {
        assert!(validate_link("https://example.com/algebra.pdf").is_ok());
        assert!(validate_link("http://example.com").is_ok());
        assert_eq!(validate_link("example.com"), Err("invalid_link"));
        assert_eq!(validate_link("https://exa mple.com"), Err("invalid_link"));
        assert_eq!(validate_link(""), Err("empty"));
    }

    #[test]
    fn test_lessons_paid() {
        assert_eq!(parse_lessons_paid(" 8 "), Ok(8));
        assert_eq!(parse_lessons_paid("0"), Err("out_of_range"));
        assert_eq!(parse_lessons_paid("-2"), Err("out_of_range"));
        assert_eq!(parse_lessons_paid("101"), Err("out_of_range"));
        assert_eq!(parse_lessons_paid("eight"), Err("invalid_number"));
    }

    #[test]
    fn test_cancel_and_skip_words() {
        assert!(is_cancel_input("Отмена"));
        assert!(is_cancel_input("/cancel"));
        assert!(!is_cancel_input("cancelled lesson"));
        assert!(is_skip_input("Пропустить"));
        assert!(is_skip_input("/skip"));
        assert!(!is_skip_input("skipping"));
    }

    #[test]
    fn test_default_state() {
        assert_eq!(BotDialogueState::default(), BotDialogueState::Start);
    }
}
