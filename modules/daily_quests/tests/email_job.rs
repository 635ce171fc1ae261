mod common;

use chrono::Utc;
use daily_quests::contract::model::{AssignmentStatus, CompletionOutcome};
use daily_quests::domain::repo::{AssignmentRepository, CreateOutcome};
use uuid::Uuid;

use common::*;

#[tokio::test]
async fn sends_only_unmailed_assignments_for_today() {
    let db = setup_db().await;
    let quests = seed_catalog(&db, 3).await;
    let ana = insert_profile(&db, Some("ana@example.com"), "Ana").await;
    let ben = insert_profile(&db, Some("ben@example.com"), "Ben").await;
    let cy = insert_profile(&db, Some("cy@example.com"), "Cy").await;

    let today = date(2025, 3, 4);
    let repo = assignments_repo(&db);
    repo.create(ana, quests[0].id, today).await.unwrap();
    let CreateOutcome::Created(bens) = repo.create(ben, quests[1].id, today).await.unwrap() else {
        panic!("expected a fresh assignment");
    };
    repo.mark_emailed(bens.id, Utc::now()).await.unwrap();
    // Yesterday's row is not today's business.
    repo.create(cy, quests[2].id, date(2025, 3, 3)).await.unwrap();

    let transport = RecordingTransport::new();
    let svc = build_service(&db, transport.clone(), clock_on(today));
    let summary = svc.run_email_job().await.unwrap();

    assert_eq!(summary.date, today);
    assert_eq!(summary.attempted, 1);
    assert_eq!(summary.sent, 1);
    assert_eq!(transport.sent()[0].to, "ana@example.com");
    assert!(repo.get_for_user_on_date(ana, today).await.unwrap().unwrap().emailed_at.is_some());
}

#[tokio::test]
async fn never_creates_assignments() {
    let db = setup_db().await;
    seed_catalog(&db, 3).await;
    let ana = insert_profile(&db, Some("ana@example.com"), "Ana").await;

    let today = date(2025, 3, 4);
    let transport = RecordingTransport::new();
    let svc = build_service(&db, transport.clone(), clock_on(today));
    let summary = svc.run_email_job().await.unwrap();

    assert_eq!(summary.attempted, 0);
    assert!(transport.sent().is_empty());
    assert!(assignments_repo(&db)
        .get_for_user_on_date(ana, today)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn skips_rows_without_address_or_quest() {
    let db = setup_db().await;
    let quests = seed_catalog(&db, 1).await;
    let no_mail = insert_profile(&db, None, "Quiet").await;
    let ghost_quest_user = insert_profile(&db, Some("ana@example.com"), "Ana").await;
    let unknown_user = Uuid::new_v4();

    let today = date(2025, 3, 4);
    let repo = assignments_repo(&db);
    repo.create(no_mail, quests[0].id, today).await.unwrap();
    repo.create(unknown_user, quests[0].id, today).await.unwrap();
    repo.create(ghost_quest_user, Uuid::new_v4(), today).await.unwrap();

    let transport = RecordingTransport::new();
    let svc = build_service(&db, transport.clone(), clock_on(today));
    let summary = svc.run_email_job().await.unwrap();

    assert_eq!(summary.attempted, 3);
    assert_eq!(summary.sent, 0);
    assert_eq!(summary.skipped_missing_email, 2);
    assert_eq!(summary.skipped_missing_quest, 1);
    assert!(summary.failures.is_empty());
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn delivery_failures_are_listed_and_left_unmarked() {
    let db = setup_db().await;
    let quests = seed_catalog(&db, 1).await;
    let ana = insert_profile(&db, Some("ana@example.com"), "Ana").await;
    let ben = insert_profile(&db, Some("ben@example.com"), "Ben").await;

    let today = date(2025, 3, 4);
    let repo = assignments_repo(&db);
    repo.create(ana, quests[0].id, today).await.unwrap();
    repo.create(ben, quests[0].id, today).await.unwrap();

    let transport = RecordingTransport::new();
    transport.fail_for("ana@example.com");
    let svc = build_service(&db, transport.clone(), clock_on(today));
    let summary = svc.run_email_job().await.unwrap();

    assert_eq!(summary.sent, 1);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].user_id, ana);
    assert!(summary.failures[0].assignment_id.is_some());
    assert!(repo.get_for_user_on_date(ana, today).await.unwrap().unwrap().emailed_at.is_none());
}

#[tokio::test]
async fn completed_but_unmailed_assignment_is_still_sent() {
    let db = setup_db().await;
    let quests = seed_catalog(&db, 1).await;
    let ana = insert_profile(&db, Some("ana@example.com"), "Ana").await;
    let today = date(2025, 3, 4);
    let CreateOutcome::Created(a) = assignments_repo(&db).create(ana, quests[0].id, today).await.unwrap()
    else {
        panic!("expected a fresh assignment");
    };

    let transport = RecordingTransport::new();
    let svc = build_service(&db, transport.clone(), clock_on(today));
    assert!(matches!(
        svc.complete(ana, a.id, None).await.unwrap(),
        CompletionOutcome::Completed(_)
    ));

    let summary = svc.run_email_job().await.unwrap();
    assert_eq!(summary.sent, 1);
    assert_eq!(transport.sent()[0].to, "ana@example.com");
    let stored = assignments_repo(&db).find_by_id(a.id).await.unwrap().unwrap();
    assert_eq!(stored.status, AssignmentStatus::Completed);
    assert!(stored.emailed_at.is_some());
}

#[tokio::test]
async fn repeated_runs_send_each_assignment_once() {
    let (db, _dir) = setup_file_db().await;
    let quests = seed_catalog(&db, 2).await;
    let today = date(2025, 3, 4);
    let repo = assignments_repo(&db);
    for i in 0..3 {
        let user = insert_profile(&db, Some(&format!("u{i}@example.com")), "U").await;
        repo.create(user, quests[i % 2].id, today).await.unwrap();
    }

    let transport = RecordingTransport::new();
    let svc = build_service(&db, transport.clone(), clock_on(today));

    let first = svc.run_email_job().await.unwrap();
    let second = svc.run_email_job().await.unwrap();
    assert_eq!(first.sent, 3);
    assert_eq!(second.attempted, 0);
    assert!(transport.count_by_recipient().values().all(|c| *c == 1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn overlapping_runs_leave_every_assignment_mailed() {
    let (db, _dir) = setup_file_db().await;
    let quests = seed_catalog(&db, 2).await;
    let today = date(2025, 3, 4);
    let repo = assignments_repo(&db);
    let mut users = Vec::new();
    for i in 0..6 {
        let user = insert_profile(&db, Some(&format!("u{i}@example.com")), "U").await;
        repo.create(user, quests[i % 2].id, today).await.unwrap();
        users.push(user);
    }

    let transport = RecordingTransport::new();
    let svc = build_service(&db, transport.clone(), clock_on(today));
    let first = tokio::spawn({
        let svc = svc.clone();
        async move { svc.run_email_job().await }
    });
    let second = tokio::spawn({
        let svc = svc.clone();
        async move { svc.run_email_job().await }
    });
    let (a, b) = (first.await.unwrap().unwrap(), second.await.unwrap().unwrap());

    assert!(a.failures.is_empty() && b.failures.is_empty());
    assert!(a.sent + b.sent >= 6);
    for user in users {
        let row = repo.get_for_user_on_date(user, today).await.unwrap().unwrap();
        assert!(row.emailed_at.is_some());
    }
    assert_eq!(transport.count_by_recipient().len(), 6);
}
