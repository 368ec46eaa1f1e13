mod common;

use anyhow::Result;
use tutorbot::config::{POINTS_FOR_ATTENDANCE, POINTS_FOR_MASTERY};
use tutorbot::db;
use tutorbot::models::{AttendanceStatus, MasteryLevel};

use common::{day, lessons, reload_user, setup_test_db, student};

#[tokio::test]
async fn test_attendance_awards_and_revokes_points() -> Result<()> {
    let (_dir, pool) = setup_test_db().await?;
    let kid = student(&pool, "Petya").await;
    let planned = lessons(&pool, kid.id, &[("A", 3)]).await;

    let change = db::set_attendance_status(&pool, planned[0].id, AttendanceStatus::Attended, day(3)).await?;
    assert_eq!(change.points_delta, POINTS_FOR_ATTENDANCE);
    assert!(change.new_achievements.iter().any(|a| a.code == "first_lesson"));
    assert_eq!(reload_user(&pool, kid.id).await.points, POINTS_FOR_ATTENDANCE);

    let change = db::set_attendance_status(&pool, planned[0].id, AttendanceStatus::Scheduled, day(3)).await?;
    assert_eq!(change.points_delta, -POINTS_FOR_ATTENDANCE);
    assert!(change.shift.is_none());
    assert_eq!(reload_user(&pool, kid.id).await.points, 0);

    // Earned achievements stay
    let earned = db::list_achievements(&pool, kid.id).await?;
    assert_eq!(earned.iter().map(|a| a.code.as_str()).collect::<Vec<_>>(), vec!["first_lesson"]);
    Ok(())
}

#[tokio::test]
async fn test_achievements_are_awarded_once() -> Result<()> {
    let (_dir, pool) = setup_test_db().await?;
    let kid = student(&pool, "Masha").await;
    let planned = lessons(&pool, kid.id, &[("A", 3), ("B", 5)]).await;

    db::set_attendance_status(&pool, planned[0].id, AttendanceStatus::Attended, day(3)).await?;
    let second = db::set_attendance_status(&pool, planned[1].id, AttendanceStatus::Attended, day(5)).await?;

    assert!(second.new_achievements.iter().all(|a| a.code != "first_lesson"));
    assert_eq!(db::list_achievements(&pool, kid.id).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_streak_grows_within_gap_and_resets_on_unexcused_absence() -> Result<()> {
    let (_dir, pool) = setup_test_db().await?;
    let kid = student(&pool, "Kolya").await;
    let planned = lessons(&pool, kid.id, &[("A", 1), ("B", 8), ("C", 20), ("D", 25), ("E", 27)]).await;

    db::set_attendance_status(&pool, planned[0].id, AttendanceStatus::Attended, day(1)).await?;
    db::set_attendance_status(&pool, planned[1].id, AttendanceStatus::Attended, day(8)).await?;
    assert_eq!(reload_user(&pool, kid.id).await.streak_days, 2);

    // Twelve days later the streak starts over
    db::set_attendance_status(&pool, planned[2].id, AttendanceStatus::Attended, day(20)).await?;
    let user = reload_user(&pool, kid.id).await;
    assert_eq!(user.streak_days, 1);
    assert_eq!(user.last_lesson_date, Some(day(20)));

    db::set_attendance_status(&pool, planned[3].id, AttendanceStatus::UnexcusedAbsence, day(25)).await?;
    assert_eq!(reload_user(&pool, kid.id).await.streak_days, 0);

    // Counting starts over after the reset
    db::set_attendance_status(&pool, planned[4].id, AttendanceStatus::Attended, day(27)).await?;
    assert_eq!(reload_user(&pool, kid.id).await.streak_days, 1);
    Ok(())
}

#[tokio::test]
async fn test_excused_absence_keeps_streak() -> Result<()> {
    let (_dir, pool) = setup_test_db().await?;
    let kid = student(&pool, "Lena").await;
    let planned = lessons(&pool, kid.id, &[("A", 3), ("B", 5)]).await;

    db::set_attendance_status(&pool, planned[0].id, AttendanceStatus::Attended, day(3)).await?;
    db::set_attendance_status(&pool, planned[1].id, AttendanceStatus::ExcusedAbsence, day(5)).await?;

    assert_eq!(reload_user(&pool, kid.id).await.streak_days, 1);
    Ok(())
}

#[tokio::test]
async fn test_mastery_points_paid_once_and_unlock_point_badges() -> Result<()> {
    let (_dir, pool) = setup_test_db().await?;
    let kid = student(&pool, "Oleg").await;
    let planned = lessons(&pool, kid.id, &[("A", 3), ("B", 5), ("C", 7), ("D", 9)]).await;

    let first = db::set_mastery(&pool, planned[0].id, MasteryLevel::Mastered, Some("Great")).await?;
    assert!(first.points_awarded);
    assert_eq!(first.lesson.mastery_comment.as_deref(), Some("Great"));

    let again = db::set_mastery(&pool, planned[0].id, MasteryLevel::Mastered, None).await?;
    assert!(!again.points_awarded);

    // Downgrading and mastering again pays nothing
    db::set_mastery(&pool, planned[0].id, MasteryLevel::Learned, None).await?;
    let remastered = db::set_mastery(&pool, planned[0].id, MasteryLevel::Mastered, None).await?;
    assert!(!remastered.points_awarded);

    let learned = db::set_mastery(&pool, planned[1].id, MasteryLevel::Learned, None).await?;
    assert!(!learned.points_awarded);
    assert_eq!(reload_user(&pool, kid.id).await.points, POINTS_FOR_MASTERY);

    db::set_mastery(&pool, planned[1].id, MasteryLevel::Mastered, None).await?;
    db::set_mastery(&pool, planned[2].id, MasteryLevel::Mastered, None).await?;
    let fourth = db::set_mastery(&pool, planned[3].id, MasteryLevel::Mastered, None).await?;

    assert_eq!(reload_user(&pool, kid.id).await.points, 4 * POINTS_FOR_MASTERY);
    assert!(fourth.new_achievements.iter().any(|a| a.code == "points_100"));

    let progress = db::student_progress(&pool, kid.id).await?;
    assert_eq!(progress.topics_mastered, 4);
    assert_eq!(progress.topics_learned, 0);
    assert_eq!(progress.achievements.len(), 1);
    Ok(())
}
