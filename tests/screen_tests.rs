mod common;

use anyhow::Result;
use tutorbot::bot::library::library_screen;
use tutorbot::bot::student_screens::homework_list;
use tutorbot::bot::ui_builder::MAX_MESSAGE_CHARS;
use tutorbot::bot::CallbackAction;
use tutorbot::db;

use common::{day, lessons, setup_test_db, student};

#[tokio::test]
async fn test_long_homework_list_fits_one_message() -> Result<()> {
    let (_dir, pool) = setup_test_db().await?;
    let kid = student(&pool, "Petya").await;
    let planned = lessons(&pool, kid.id, &[("Fractions and decimals", 3)]).await;

    for n in 0..60 {
        let description = format!("Exercise {n:02} {}", "x".repeat(64));
        db::create_homework(&pool, planned[0].id, &description, Some(day(10)), None, &[]).await?;
    }
    for _ in 0..3 {
        db::create_homework(&pool, planned[0].id, &"long answer ".repeat(170), None, None, &[]).await?;
    }

    let screen = homework_list(&pool, &kid, CallbackAction::MainMenu, true, Some("en")).await?;

    assert!(screen.text.chars().count() <= MAX_MESSAGE_CHARS);
    assert!(screen.text.contains("…and "));
    // One button per shown entry plus the back row
    assert!(screen.keyboard.inline_keyboard.len() <= 31);
    Ok(())
}

#[tokio::test]
async fn test_short_homework_list_has_no_more_note() -> Result<()> {
    let (_dir, pool) = setup_test_db().await?;
    let kid = student(&pool, "Masha").await;
    let planned = lessons(&pool, kid.id, &[("Verbs", 3)]).await;
    db::create_homework(&pool, planned[0].id, "Page 12", None, None, &[]).await?;

    let screen = homework_list(&pool, &kid, CallbackAction::MainMenu, true, Some("en")).await?;

    assert!(screen.text.contains("Page 12"));
    assert!(!screen.text.contains("…and "));
    assert_eq!(screen.keyboard.inline_keyboard.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_large_library_fits_one_message() -> Result<()> {
    let (_dir, pool) = setup_test_db().await?;
    let description = "worked examples ".repeat(120);
    for n in 0..60 {
        db::create_material(
            &pool,
            &format!("Workbook {n:02} {}", "t".repeat(100)),
            &format!("https://example.org/workbook/{n}"),
            Some(&description),
            Some(7),
        )
        .await?;
    }

    let screen = library_screen(&pool, Some(7), true, Some("en")).await?;

    assert!(screen.text.chars().count() <= MAX_MESSAGE_CHARS);
    assert!(screen.text.contains("…and "));
    Ok(())
}
