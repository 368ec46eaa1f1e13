//! # Localization Tests
//!
//! Message lookup, argument substitution and completeness of the Russian
//! and English resources.

use std::collections::BTreeSet;

use tutorbot::bot::tutor_screens::TutorMenuItem;
use tutorbot::gamification::ACHIEVEMENTS;
use tutorbot::localization::{detect_language, LocalizationManager, SUPPORTED_LANGUAGES};
use tutorbot::models::{AttendanceStatus, HomeworkStatus, LessonStatus, MasteryLevel, UserRole};

const RU: &str = include_str!("../locales/ru/main.ftl");
const EN: &str = include_str!("../locales/en/main.ftl");

fn message_ids(source: &str) -> BTreeSet<&str> {
    source
        .lines()
        .filter(|line| !line.is_empty() && !line.starts_with(' ') && !line.starts_with('#'))
        .filter_map(|line| line.split_once('=').map(|(id, _)| id.trim()))
        .collect()
}

fn setup_localization() -> LocalizationManager {
    LocalizationManager::new().expect("Failed to create localization manager")
}

fn assert_translated(manager: &LocalizationManager, key: &str) {
    for lang in SUPPORTED_LANGUAGES {
        let message = manager.get_message_in_language(key, lang, None);
        assert!(!message.starts_with("Missing"), "{key} missing in {lang}");
    }
}

#[test]
fn test_languages_define_the_same_messages() {
    let ru = message_ids(RU);
    let en = message_ids(EN);
    assert!(!ru.is_empty());
    assert_eq!(
        ru.symmetric_difference(&en).collect::<Vec<_>>(),
        Vec::<&&str>::new()
    );
}

#[test]
fn test_enum_labels_are_translated() {
    let manager = setup_localization();

    for role in [UserRole::Tutor, UserRole::Student, UserRole::Parent] {
        assert_translated(&manager, role.message_key());
    }
    for level in [MasteryLevel::NotLearned, MasteryLevel::Learned, MasteryLevel::Mastered] {
        assert_translated(&manager, level.message_key());
    }
    for status in [
        AttendanceStatus::Scheduled,
        AttendanceStatus::Attended,
        AttendanceStatus::ExcusedAbsence,
        AttendanceStatus::UnexcusedAbsence,
        AttendanceStatus::Rescheduled,
    ] {
        assert_translated(&manager, status.message_key());
    }
    for status in [LessonStatus::NotConducted, LessonStatus::Conducted] {
        assert_translated(&manager, status.message_key());
    }
    for status in [HomeworkStatus::Pending, HomeworkStatus::Submitted, HomeworkStatus::Checked] {
        assert_translated(&manager, status.message_key());
    }
}

#[test]
fn test_achievements_months_and_weekdays_are_translated() {
    let manager = setup_localization();

    for achievement in ACHIEVEMENTS {
        assert_translated(&manager, &achievement.title_key());
        assert_translated(&manager, &achievement.description_key());
    }
    for month in 1..=12 {
        assert_translated(&manager, &format!("month-{month}"));
    }
    for day in 0..7 {
        assert_translated(&manager, &format!("weekday-{day}"));
    }
}

#[test]
fn test_tutor_menu_labels_differ_per_language() {
    let manager = setup_localization();

    for item in TutorMenuItem::ALL {
        let ru = manager.get_message_in_language(item.message_key(), "ru", None);
        let en = manager.get_message_in_language(item.message_key(), "en", None);
        assert_ne!(ru, en);
    }
}

#[test]
fn test_message_with_arguments() {
    let manager = setup_localization();

    let en = manager.get_message_with_args("payments-balance", "en", &[("balance", "3")]);
    assert_eq!(en, "Prepaid lessons left: <b>3</b>");

    let ru = manager.get_message_with_args("login-success", "ru", &[("name", "Анна"), ("role", "ученик")]);
    assert_eq!(ru, "Вы вошли как Анна (ученик).");
}

#[test]
fn test_missing_key_and_unknown_language() {
    let manager = setup_localization();

    assert_eq!(
        manager.get_message_in_language("no-such-key", "en", None),
        "Missing translation: no-such-key"
    );

    // Unknown languages fall back to Russian
    let fallback = manager.get_message_in_language("button-back", "de", None);
    assert_eq!(fallback, "Назад");
}

#[test]
fn test_detect_language() {
    assert_eq!(detect_language(Some("en-US")), "en");
    assert_eq!(detect_language(Some("ru")), "ru");
    assert_eq!(detect_language(Some("fr")), "ru");
    assert_eq!(detect_language(None), "ru");
}

#[test]
fn test_lessons_without_topic_have_a_default_name() {
    let manager = setup_localization();

    let ru = manager.get_message_in_language("schedule-default-topic", "ru", None);
    assert_eq!(ru, "Урок (тема не указана)");
    let en = manager.get_message_in_language("schedule-default-topic", "en", None);
    assert_eq!(en, "Lesson (topic not set)");
}
