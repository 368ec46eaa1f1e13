mod common;

use anyhow::Result;
use tutorbot::bot::access::visible_student;
use tutorbot::db::{self, ParentLink, Submission};
use tutorbot::errors::BotError;
use tutorbot::models::{AttendanceStatus, UserRole};

use common::{day, lessons, reload, setup_test_db, student};

#[tokio::test]
async fn test_created_users_get_distinct_access_codes() -> Result<()> {
    let (_dir, pool) = setup_test_db().await?;

    let tutor = db::create_user(&pool, "Anna Tutor", UserRole::Tutor).await?;
    let parent = db::create_user(&pool, "Olga Parent", UserRole::Parent).await?;

    assert_ne!(tutor.access_code, parent.access_code);
    assert_eq!(tutor.telegram_id, None);
    assert_eq!(tutor.points, 0);

    let found = db::get_user_by_access_code(&pool, &parent.access_code).await?;
    assert_eq!(found.map(|u| u.id), Some(parent.id));
    Ok(())
}

#[tokio::test]
async fn test_login_binds_telegram_account() -> Result<()> {
    let (_dir, pool) = setup_test_db().await?;
    let kid = student(&pool, "Petya").await;

    let user = db::login_with_access_code(&pool, &kid.access_code, 1001, Some("petya")).await?;
    assert_eq!(user.id, kid.id);
    assert_eq!(user.telegram_id, Some(1001));
    assert_eq!(user.username.as_deref(), Some("petya"));

    // Same account may log in again
    assert!(db::login_with_access_code(&pool, &kid.access_code, 1001, None).await.is_ok());

    let taken = db::login_with_access_code(&pool, &kid.access_code, 2002, None).await;
    assert_eq!(taken.unwrap_err(), BotError::InvalidInput("login-code-taken"));

    let unknown = db::login_with_access_code(&pool, "ZZZZZZZZ", 2002, None).await;
    assert_eq!(unknown.unwrap_err(), BotError::InvalidInput("login-code-not-found"));
    Ok(())
}

#[tokio::test]
async fn test_switching_account_releases_previous_binding() -> Result<()> {
    let (_dir, pool) = setup_test_db().await?;
    let (kid, parent) = db::create_student_with_parent(&pool, "Masha", Some("Irina")).await?;
    let parent = parent.unwrap();

    db::login_with_access_code(&pool, &kid.access_code, 1001, None).await?;
    db::login_with_access_code(&pool, &parent.access_code, 1001, None).await?;

    let current = db::get_user_by_telegram_id(&pool, 1001).await?.unwrap();
    assert_eq!(current.id, parent.id);
    assert_eq!(db::get_user_by_id(&pool, kid.id).await?.unwrap().telegram_id, None);
    Ok(())
}

#[tokio::test]
async fn test_parent_slots() -> Result<()> {
    let (_dir, pool) = setup_test_db().await?;
    let (kid, mother) = db::create_student_with_parent(&pool, "Kolya", Some("Mother")).await?;
    let mother = mother.unwrap();
    assert_eq!(kid.parent_id, Some(mother.id));

    let father = db::create_user(&pool, "Father", UserRole::Parent).await?;
    let grandma = db::create_user(&pool, "Grandma", UserRole::Parent).await?;

    assert_eq!(db::link_parent(&pool, kid.id, father.id).await?, ParentLink::Second);
    assert_eq!(db::link_parent(&pool, kid.id, father.id).await?, ParentLink::AlreadyLinked);
    assert_eq!(db::link_parent(&pool, kid.id, grandma.id).await?, ParentLink::NoFreeSlot);

    let kid = db::get_user_by_id(&pool, kid.id).await?.unwrap();
    let parents = db::list_parents(&pool, &kid).await?;
    assert_eq!(parents.iter().map(|p| p.id).collect::<Vec<_>>(), vec![mother.id, father.id]);
    assert!(father.is_parent_of(&kid));
    assert!(!grandma.is_parent_of(&kid));

    let children = db::list_children(&pool, father.id).await?;
    assert_eq!(children.len(), 1);

    assert!(db::unlink_second_parent(&pool, kid.id).await?);
    assert!(!db::unlink_second_parent(&pool, kid.id).await?);
    assert!(db::list_children(&pool, father.id).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_balance_is_paid_minus_attended() -> Result<()> {
    let (_dir, pool) = setup_test_db().await?;
    let kid = student(&pool, "Vanya").await;
    let planned = lessons(&pool, kid.id, &[("Fractions", 3), ("Decimals", 10)]).await;

    assert_eq!(db::get_student_balance(&pool, kid.id).await?, 0);

    db::create_payment(&pool, kid.id, 4, day(1)).await?;
    db::create_payment(&pool, kid.id, 2, day(2)).await?;
    db::set_attendance_status(&pool, planned[0].id, AttendanceStatus::Attended, day(3)).await?;
    db::set_attendance_status(&pool, planned[1].id, AttendanceStatus::Attended, day(10)).await?;

    assert_eq!(db::get_student_balance(&pool, kid.id).await?, 4);

    let payments = db::list_payments(&pool, kid.id, 5).await?;
    assert_eq!(payments.iter().map(|p| p.lessons_paid).collect::<Vec<_>>(), vec![2, 4]);

    let with_four = db::list_students_with_balance(&pool, 4).await?;
    assert_eq!(with_four.iter().map(|s| s.id).collect::<Vec<_>>(), vec![kid.id]);
    assert!(db::list_students_with_balance(&pool, 1).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_attendance_summary_counts_missed_lessons() -> Result<()> {
    let (_dir, pool) = setup_test_db().await?;
    let kid = student(&pool, "Lena").await;
    let planned = lessons(&pool, kid.id, &[("A", 3), ("B", 5), ("C", 7), ("D", 9)]).await;

    db::set_attendance_status(&pool, planned[0].id, AttendanceStatus::Attended, day(3)).await?;
    db::set_attendance_status(&pool, planned[1].id, AttendanceStatus::Attended, day(5)).await?;
    db::set_attendance_status(&pool, planned[2].id, AttendanceStatus::ExcusedAbsence, day(7)).await?;

    let summary = db::attendance_summary(&pool, kid.id, day(1), day(31)).await?;
    assert_eq!(summary.attended, 2);
    assert_eq!(summary.missed, 1);
    assert_eq!(summary.rate_percent(), Some(67));
    Ok(())
}

#[tokio::test]
async fn test_delete_student_removes_everything() -> Result<()> {
    let (_dir, pool) = setup_test_db().await?;
    let kid = student(&pool, "Gosha").await;
    let planned = lessons(&pool, kid.id, &[("Fractions", 3)]).await;
    let homework = db::create_homework(&pool, planned[0].id, "Page 12", None, None, &[]).await?;
    db::create_payment(&pool, kid.id, 4, day(1)).await?;

    assert!(db::delete_student(&pool, kid.id).await?);

    assert!(db::get_user_by_id(&pool, kid.id).await?.is_none());
    assert!(db::get_lesson(&pool, planned[0].id).await?.is_none());
    assert!(db::get_homework(&pool, homework.id).await?.is_none());
    assert!(db::list_payments(&pool, kid.id, 10).await?.is_empty());
    assert!(!db::delete_student(&pool, kid.id).await?);
    Ok(())
}

#[tokio::test]
async fn test_delete_student_refuses_other_roles() -> Result<()> {
    let (_dir, pool) = setup_test_db().await?;
    let tutor = db::create_user(&pool, "Anna", UserRole::Tutor).await?;

    assert!(!db::delete_student(&pool, tutor.id).await?);
    assert!(db::get_user_by_id(&pool, tutor.id).await?.is_some());
    Ok(())
}

#[tokio::test]
async fn test_weekly_schedule_skips_occupied_slots() -> Result<()> {
    let (_dir, pool) = setup_test_db().await?;
    let kid = student(&pool, "Dima").await;
    lessons(&pool, kid.id, &[("Existing", 10)]).await;

    let created = db::create_scheduled_lessons(&pool, kid.id, &[day(3), day(10), day(17)], "Topic").await?;
    assert_eq!(created, 2);

    let all = db::list_lessons_for_student(&pool, kid.id).await?;
    assert_eq!(all.len(), 3);
    assert!(all.iter().all(|l| !l.is_makeup));
    Ok(())
}

#[tokio::test]
async fn test_reschedule_keeps_first_original_date() -> Result<()> {
    let (_dir, pool) = setup_test_db().await?;
    let kid = student(&pool, "Sasha").await;
    let planned = lessons(&pool, kid.id, &[("Geometry", 3)]).await;

    assert!(db::reschedule_lesson(&pool, planned[0].id, day(4)).await?);
    assert!(db::reschedule_lesson(&pool, planned[0].id, day(5)).await?);

    let lesson = reload(&pool, planned[0].id).await;
    assert_eq!(lesson.date, Some(day(5)));
    assert_eq!(lesson.original_date, Some(day(3)));
    Ok(())
}

#[tokio::test]
async fn test_upcoming_history_and_window_queries() -> Result<()> {
    let (_dir, pool) = setup_test_db().await?;
    let kid = student(&pool, "Nina").await;
    let planned = lessons(&pool, kid.id, &[("Past", 3), ("Soon", 11), ("Later", 20)]).await;

    let upcoming = db::list_upcoming_lessons(&pool, kid.id, day(10), 10).await?;
    assert_eq!(upcoming.iter().map(|l| l.topic.as_str()).collect::<Vec<_>>(), vec!["Soon", "Later"]);

    let history = db::list_lesson_history(&pool, kid.id, day(10), 10).await?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, planned[0].id);

    // Window is open at the start and closed at the end
    let window = db::list_lessons_between(&pool, day(10), day(11)).await?;
    assert_eq!(window.iter().map(|l| l.id).collect::<Vec<_>>(), vec![planned[1].id]);
    assert!(db::list_lessons_between(&pool, day(11), day(12)).await?.is_empty());

    // Only scheduled lessons get reminders
    db::set_attendance_status(&pool, planned[1].id, AttendanceStatus::ExcusedAbsence, day(10)).await?;
    assert!(db::list_lessons_between(&pool, day(10), day(11)).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_materials_by_grade() -> Result<()> {
    let (_dir, pool) = setup_test_db().await?;

    let algebra = db::create_material(&pool, "Algebra", "https://example.com/a", None, Some(7)).await?;
    let tables = db::create_material(&pool, "Tables", "https://example.com/t", Some("Reference"), None).await?;
    db::create_material(&pool, "Reading", "https://example.com/r", None, Some(2)).await?;

    let seventh = db::list_materials(&pool, Some(7)).await?;
    assert_eq!(seventh.iter().map(|m| m.id).collect::<Vec<_>>(), vec![algebra.id, tables.id]);

    assert_eq!(db::list_materials(&pool, None).await?.len(), 3);

    assert!(db::delete_material(&pool, tables.id).await?);
    assert!(db::get_material(&pool, tables.id).await?.is_none());
    assert_eq!(db::list_materials(&pool, Some(7)).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_broadcast_recipients_are_bound_students_and_parents() -> Result<()> {
    let (_dir, pool) = setup_test_db().await?;
    let (kid, parent) = db::create_student_with_parent(&pool, "Tanya", Some("Vera")).await?;
    let tutor = db::create_user(&pool, "Anna", UserRole::Tutor).await?;
    student(&pool, "Offline").await;

    db::login_with_access_code(&pool, &kid.access_code, 1, None).await?;
    db::login_with_access_code(&pool, &parent.unwrap().access_code, 2, None).await?;
    db::login_with_access_code(&pool, &tutor.access_code, 3, None).await?;

    let recipients = db::list_broadcast_recipients(&pool).await?;
    assert_eq!(recipients.len(), 2);
    assert!(recipients.iter().all(|u| u.role != UserRole::Tutor));
    assert_eq!(db::list_tutors(&pool).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_dashboard_and_monthly_report() -> Result<()> {
    let (_dir, pool) = setup_test_db().await?;
    let kid = student(&pool, "Oleg").await;
    let planned = lessons(&pool, kid.id, &[("A", 3), ("B", 10), ("C", 17)]).await;

    db::create_payment(&pool, kid.id, 8, day(1)).await?;
    db::set_attendance_status(&pool, planned[0].id, AttendanceStatus::Attended, day(3)).await?;
    db::set_attendance_status(&pool, planned[1].id, AttendanceStatus::UnexcusedAbsence, day(10)).await?;

    let homework = db::create_homework(&pool, planned[0].id, "Exercises", None, None, &[]).await?;
    db::submit_homework(&pool, homework.id, Submission::Text("done".into())).await?;

    let today = day(20).date();
    let stats = db::dashboard_stats(&pool, today).await?;
    assert_eq!(stats.students, 1);
    assert_eq!(stats.lessons_attended, 1);
    assert_eq!(stats.lessons_paid, 8);
    assert_eq!(stats.homework_waiting, 1);
    assert_eq!(stats.homework_checked, 0);

    let report = db::monthly_report(&pool, kid.id, today, 0).await?;
    assert_eq!(report.lessons.len(), 1);
    assert_eq!(report.missed_lessons, 1);
    assert_eq!(report.lessons_paid, 8);
    assert_eq!(report.balance, 7);

    let previous = db::monthly_report(&pool, kid.id, today, 1).await?;
    assert!(previous.lessons.is_empty());
    assert_eq!(previous.lessons_paid, 0);
    Ok(())
}

#[tokio::test]
async fn test_register_user_refuses_duplicate_names() -> Result<()> {
    let (_dir, pool) = setup_test_db().await?;

    let first = match db::register_user(&pool, "Ivanov Ivan", UserRole::Tutor).await? {
        db::Registration::Created(user) => user,
        other => panic!("expected a new tutor, got {other:?}"),
    };

    match db::register_user(&pool, "Ivanov Ivan", UserRole::Tutor).await? {
        db::Registration::AlreadyExists(existing) => assert_eq!(existing.id, first.id),
        other => panic!("expected the existing tutor, got {other:?}"),
    }
    assert_eq!(db::list_tutors(&pool).await?.len(), 1);

    // The same name in another role is a different account
    let parent = db::register_user(&pool, "Ivanov Ivan", UserRole::Parent).await?;
    assert!(matches!(parent, db::Registration::Created(ref user) if user.role == UserRole::Parent));
    Ok(())
}

#[tokio::test]
async fn test_parents_see_only_linked_children() -> Result<()> {
    let (_dir, pool) = setup_test_db().await?;
    let (kid, parent) = db::create_student_with_parent(&pool, "Petya", Some("Anna")).await?;
    let parent = parent.expect("parent was created");
    let stranger = db::create_user(&pool, "Boris", UserRole::Parent).await?;

    let seen = visible_student(&pool, &parent, kid.id).await?;
    assert_eq!(seen.id, kid.id);

    let denied = visible_student(&pool, &stranger, kid.id).await;
    assert!(matches!(denied, Err(BotError::AccessDenied)));

    // Linking grants access
    db::link_parent(&pool, kid.id, stranger.id).await?;
    assert!(visible_student(&pool, &stranger, kid.id).await.is_ok());
    Ok(())
}
