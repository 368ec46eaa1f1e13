mod common;

use anyhow::Result;
use tutorbot::config::POINTS_FOR_HOMEWORK;
use tutorbot::db::{self, Submission};
use tutorbot::errors::BotError;
use tutorbot::models::HomeworkStatus;

use common::{day, lessons, reload_user, setup_test_db, student};

#[tokio::test]
async fn test_create_homework_with_attachments() -> Result<()> {
    let (_dir, pool) = setup_test_db().await?;
    let kid = student(&pool, "Petya").await;
    let planned = lessons(&pool, kid.id, &[("Fractions", 3)]).await;

    let photos = vec!["photo-1".to_string(), "photo-2".to_string()];
    let homework = db::create_homework(
        &pool,
        planned[0].id,
        "Exercises 1-5",
        Some(day(10)),
        Some("https://example.com/sheet"),
        &photos,
    )
    .await?;

    assert_eq!(homework.status, HomeworkStatus::Pending);
    assert_eq!(homework.photo_file_ids.0, photos);
    assert_eq!(homework.file_link.as_deref(), Some("https://example.com/sheet"));

    let entry = db::get_homework_entry(&pool, homework.id).await?.unwrap();
    assert_eq!(entry.lesson_topic, "Fractions");
    assert_eq!(entry.student_id, kid.id);
    assert_eq!(db::list_homework_for_lesson(&pool, planned[0].id).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_submission_text_replaces_and_files_accumulate() -> Result<()> {
    let (_dir, pool) = setup_test_db().await?;
    let kid = student(&pool, "Masha").await;
    let planned = lessons(&pool, kid.id, &[("Fractions", 3)]).await;
    let homework = db::create_homework(&pool, planned[0].id, "Page 12", None, None, &[]).await?;

    db::submit_homework(&pool, homework.id, Submission::Text("first try".into())).await?;
    db::submit_homework(&pool, homework.id, Submission::File("file-a".into())).await?;
    db::submit_homework(&pool, homework.id, Submission::File("file-b".into())).await?;
    let updated = db::submit_homework(&pool, homework.id, Submission::Text("final answer".into())).await?;

    assert_eq!(updated.status, HomeworkStatus::Submitted);
    assert_eq!(updated.submission_text.as_deref(), Some("final answer"));
    assert_eq!(updated.submission_file_ids.0, vec!["file-a".to_string(), "file-b".to_string()]);

    let queue = db::list_submitted_homework(&pool).await?;
    assert_eq!(queue.iter().map(|e| e.homework.id).collect::<Vec<_>>(), vec![homework.id]);
    Ok(())
}

#[tokio::test]
async fn test_checked_homework_rejects_submissions() -> Result<()> {
    let (_dir, pool) = setup_test_db().await?;
    let kid = student(&pool, "Kolya").await;
    let planned = lessons(&pool, kid.id, &[("Fractions", 3)]).await;
    let homework = db::create_homework(&pool, planned[0].id, "Page 12", None, None, &[]).await?;

    db::submit_homework(&pool, homework.id, Submission::Text("answer".into())).await?;
    db::set_homework_status(&pool, homework.id, HomeworkStatus::Checked, day(5)).await?;

    let err = db::submit_homework(&pool, homework.id, Submission::Text("late".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, BotError::InvalidState(_)));

    let missing = db::submit_homework(&pool, 9999, Submission::Text("x".into())).await.unwrap_err();
    assert_eq!(missing, BotError::NotFound("homework", 9999));
    Ok(())
}

#[tokio::test]
async fn test_review_bonus_is_paid_once() -> Result<()> {
    let (_dir, pool) = setup_test_db().await?;
    let kid = student(&pool, "Lena").await;
    let planned = lessons(&pool, kid.id, &[("Fractions", 3)]).await;
    let homework = db::create_homework(&pool, planned[0].id, "Page 12", None, None, &[]).await?;
    db::submit_homework(&pool, homework.id, Submission::Text("answer".into())).await?;

    let review = db::set_homework_status(&pool, homework.id, HomeworkStatus::Checked, day(5)).await?;
    assert!(review.points_awarded);
    assert_eq!(review.homework.checked_at, Some(day(5)));
    assert!(review.new_achievements.iter().any(|a| a.code == "first_homework"));

    // Sent back and checked again
    let returned = db::set_homework_status(&pool, homework.id, HomeworkStatus::Pending, day(6)).await?;
    assert_eq!(returned.homework.checked_at, None);
    db::submit_homework(&pool, homework.id, Submission::Text("fixed".into())).await?;
    let again = db::set_homework_status(&pool, homework.id, HomeworkStatus::Checked, day(7)).await?;

    assert!(!again.points_awarded);
    assert!(again.new_achievements.is_empty());
    assert_eq!(reload_user(&pool, kid.id).await.points, POINTS_FOR_HOMEWORK);
    Ok(())
}

#[tokio::test]
async fn test_student_list_puts_open_homework_first() -> Result<()> {
    let (_dir, pool) = setup_test_db().await?;
    let kid = student(&pool, "Oleg").await;
    let planned = lessons(&pool, kid.id, &[("A", 3), ("B", 10)]).await;

    let done = db::create_homework(&pool, planned[0].id, "Done", None, None, &[]).await?;
    let waiting = db::create_homework(&pool, planned[0].id, "Waiting", None, None, &[]).await?;
    let open = db::create_homework(&pool, planned[1].id, "Open", None, None, &[]).await?;

    db::set_homework_status(&pool, done.id, HomeworkStatus::Checked, day(4)).await?;
    db::submit_homework(&pool, waiting.id, Submission::Text("answer".into())).await?;

    let list = db::list_homework_for_student(&pool, kid.id).await?;
    assert_eq!(
        list.iter().map(|e| e.homework.id).collect::<Vec<_>>(),
        vec![open.id, waiting.id, done.id]
    );
    Ok(())
}

#[tokio::test]
async fn test_pending_homework_due_in_window() -> Result<()> {
    let (_dir, pool) = setup_test_db().await?;
    let kid = student(&pool, "Nina").await;
    let planned = lessons(&pool, kid.id, &[("A", 3)]).await;

    let due = db::create_homework(&pool, planned[0].id, "Due soon", Some(day(11)), None, &[]).await?;
    let submitted = db::create_homework(&pool, planned[0].id, "Already sent", Some(day(11)), None, &[]).await?;
    db::create_homework(&pool, planned[0].id, "No deadline", None, None, &[]).await?;
    db::create_homework(&pool, planned[0].id, "Far away", Some(day(20)), None, &[]).await?;
    db::submit_homework(&pool, submitted.id, Submission::Text("done".into())).await?;

    let window = db::list_pending_homework_due_between(&pool, day(10), day(11)).await?;
    assert_eq!(window.iter().map(|e| e.homework.id).collect::<Vec<_>>(), vec![due.id]);
    Ok(())
}

#[tokio::test]
async fn test_delete_homework() -> Result<()> {
    let (_dir, pool) = setup_test_db().await?;
    let kid = student(&pool, "Gosha").await;
    let planned = lessons(&pool, kid.id, &[("A", 3)]).await;
    let homework = db::create_homework(&pool, planned[0].id, "Page 12", None, None, &[]).await?;

    assert!(db::delete_homework(&pool, homework.id).await?);
    assert!(!db::delete_homework(&pool, homework.id).await?);
    assert!(db::get_homework(&pool, homework.id).await?.is_none());

    // Deleting a lesson takes its homework along
    let other = db::create_homework(&pool, planned[0].id, "Page 13", None, None, &[]).await?;
    assert!(db::delete_lesson(&pool, planned[0].id).await?);
    assert!(db::get_homework(&pool, other.id).await?.is_none());
    Ok(())
}
