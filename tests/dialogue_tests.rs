use anyhow::Result;
use chrono::{NaiveDate, NaiveTime, Weekday};

use tutorbot::access_code::normalize_access_code;
use tutorbot::dialogue::{
    is_cancel_input, is_skip_input, parse_lessons_paid, validate_full_name, validate_link, validate_text,
    validate_topic, BotDialogueState,
};
use tutorbot::schedule::{parse_deadline, parse_lesson_datetime, parse_time, weekly_occurrences};

/// Inputs collected while adding a student
#[tokio::test]
async fn test_student_dialogue_validation() -> Result<()> {
    assert_eq!(validate_full_name("  Анна Смирнова ").unwrap(), "Анна Смирнова");
    assert!(validate_full_name("").is_err());
    assert!(validate_full_name(&"a".repeat(101)).is_err());

    assert!(validate_topic("Квадратные уравнения").is_ok());
    assert_eq!(validate_topic(&"x".repeat(256)), Err("too_long"));
    assert!(validate_text(&"x".repeat(2000)).is_ok());
    assert_eq!(validate_text(&"x".repeat(2001)), Err("too_long"));

    Ok(())
}

#[tokio::test]
async fn test_payment_and_link_inputs() -> Result<()> {
    assert_eq!(parse_lessons_paid(" 8 "), Ok(8));
    assert_eq!(parse_lessons_paid("0"), Err("out_of_range"));
    assert_eq!(parse_lessons_paid("101"), Err("out_of_range"));
    assert_eq!(parse_lessons_paid("eight"), Err("invalid_number"));

    assert!(validate_link("https://example.com/worksheet.pdf").is_ok());
    assert_eq!(validate_link("ftp://example.com"), Err("invalid_link"));
    assert_eq!(validate_link(" "), Err("empty"));

    assert!(normalize_access_code("ab12cd34").is_ok());
    assert_eq!(normalize_access_code("hello world"), Err("invalid_format"));
    Ok(())
}

#[tokio::test]
async fn test_cancel_and_skip_words() -> Result<()> {
    assert!(is_cancel_input("Отмена"));
    assert!(is_cancel_input(" /cancel "));
    assert!(!is_cancel_input("cancellation"));
    assert!(is_skip_input("-"));
    assert!(is_skip_input("SKIP"));
    assert!(!is_skip_input("Fractions"));
    Ok(())
}

#[tokio::test]
async fn test_date_inputs() -> Result<()> {
    let lesson = parse_lesson_datetime("14.03.2025 16:30").unwrap();
    assert_eq!(
        lesson,
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap().and_hms_opt(16, 30, 0).unwrap()
    );
    assert_eq!(parse_lesson_datetime("2025-03-14 16:30"), Err("invalid_format"));
    assert_eq!(parse_lesson_datetime(""), Err("empty"));

    let deadline = parse_deadline("20.03.2025").unwrap();
    assert_eq!(
        deadline,
        NaiveDate::from_ymd_opt(2025, 3, 20).unwrap().and_hms_opt(23, 59, 0).unwrap()
    );
    assert!(parse_time("25:00").is_err());
    Ok(())
}

#[tokio::test]
async fn test_weekly_schedule_slots() -> Result<()> {
    // Monday 3 March 2025, 12:00
    let now = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap().and_hms_opt(12, 0, 0).unwrap();
    let time = NaiveTime::from_hms_opt(16, 0, 0).unwrap();

    let slots = weekly_occurrences(&[Weekday::Mon, Weekday::Thu], time, now, 2);
    let days: Vec<u32> = slots.iter().map(|slot| chrono::Datelike::day(&slot.date())).collect();
    assert_eq!(days, vec![3, 6, 10, 13]);

    // A slot earlier the same day is skipped
    let morning = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
    let slots = weekly_occurrences(&[Weekday::Mon], morning, now, 1);
    assert!(slots.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_dialogue_state_serialization() -> Result<()> {
    let state = BotDialogueState::AddHomeworkAttachments {
        lesson_id: 7,
        description: "Page 12".to_string(),
        deadline: None,
        file_link: Some("https://example.com".to_string()),
        photo_file_ids: vec!["photo-1".to_string()],
    };

    let json = serde_json::to_string(&state)?;
    let restored: BotDialogueState = serde_json::from_str(&json)?;
    assert_eq!(restored, state);

    assert_eq!(BotDialogueState::default(), BotDialogueState::Start);
    Ok(())
}
