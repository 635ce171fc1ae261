mod common;

use std::collections::HashSet;

use chrono::Days;
use daily_quests::contract::model::{AssignmentStatus, ProofType};
use daily_quests::domain::error::DomainError;
use daily_quests::domain::repo::{AssignmentRepository, CreateOutcome};

use common::*;

#[tokio::test]
async fn assigns_and_emails_every_notifiable_user() {
    let db = setup_db().await;
    seed_catalog(&db, 10).await;
    let users = [
        insert_profile(&db, Some("ana@example.com"), "Ana").await,
        insert_profile(&db, Some("ben@example.com"), "Ben").await,
        insert_profile(&db, Some("cy@example.com"), "Cy").await,
    ];
    insert_profile(&db, None, "No Mail").await;
    insert_profile(&db, Some(""), "Blank Mail").await;

    let today = date(2025, 3, 4);
    let transport = RecordingTransport::new();
    let svc = build_service(&db, transport.clone(), clock_on(today));

    let summary = svc.run_daily_job().await.unwrap();
    assert_eq!(summary.date, today);
    assert_eq!(summary.processed, 3);
    assert_eq!(summary.newly_assigned, 3);
    assert_eq!(summary.emailed, 3);
    assert_eq!(summary.already_emailed, 0);
    assert!(summary.errors.is_empty());
    assert_eq!(transport.sent().len(), 3);

    let repo = assignments_repo(&db);
    for user in users {
        let a = repo.get_for_user_on_date(user, today).await.unwrap().unwrap();
        assert_eq!(a.status, AssignmentStatus::Assigned);
        assert!(a.emailed_at.is_some());
    }
}

#[tokio::test]
async fn second_run_creates_nothing_and_sends_nothing() {
    let db = setup_db().await;
    seed_catalog(&db, 5).await;
    let user = insert_profile(&db, Some("ana@example.com"), "Ana").await;
    insert_profile(&db, Some("ben@example.com"), "Ben").await;

    let today = date(2025, 3, 4);
    let transport = RecordingTransport::new();
    let svc = build_service(&db, transport.clone(), clock_on(today));

    let first = svc.run_daily_job().await.unwrap();
    let quest_before = assignments_repo(&db)
        .get_for_user_on_date(user, today)
        .await
        .unwrap()
        .unwrap()
        .quest_id;

    let second = svc.run_daily_job().await.unwrap();
    let emails = svc.run_email_job().await.unwrap();

    assert_eq!(first.newly_assigned, 2);
    assert_eq!(second.newly_assigned, 0);
    assert_eq!(second.emailed, 0);
    assert_eq!(second.already_emailed, 2);
    assert_eq!(emails.attempted, 0);

    for (_, count) in transport.count_by_recipient() {
        assert_eq!(count, 1);
    }
    let quest_after = assignments_repo(&db)
        .get_for_user_on_date(user, today)
        .await
        .unwrap()
        .unwrap()
        .quest_id;
    assert_eq!(quest_before, quest_after);
}

#[tokio::test]
async fn failed_send_is_recorded_and_retried_by_email_job() {
    let db = setup_db().await;
    seed_catalog(&db, 5).await;
    let ana = insert_profile(&db, Some("ana@example.com"), "Ana").await;
    let ben = insert_profile(&db, Some("ben@example.com"), "Ben").await;
    insert_profile(&db, Some("cy@example.com"), "Cy").await;

    let today = date(2025, 3, 4);
    let transport = RecordingTransport::new();
    transport.fail_for("ben@example.com");
    let svc = build_service(&db, transport.clone(), clock_on(today));

    let summary = svc.run_daily_job().await.unwrap();
    assert_eq!(summary.processed, 3);
    assert_eq!(summary.newly_assigned, 3);
    assert_eq!(summary.emailed, 2);
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.errors[0].user_id, ben);
    assert_eq!(summary.errors[0].email.as_deref(), Some("ben@example.com"));
    assert!(summary.errors[0].error.contains("unavailable"));

    let repo = assignments_repo(&db);
    let bens = repo.get_for_user_on_date(ben, today).await.unwrap().unwrap();
    assert!(bens.emailed_at.is_none());
    let anas = repo.get_for_user_on_date(ana, today).await.unwrap().unwrap();
    assert!(anas.emailed_at.is_some());

    transport.recover("ben@example.com");
    let retry = svc.run_email_job().await.unwrap();
    assert_eq!(retry.attempted, 1);
    assert_eq!(retry.sent, 1);
    assert!(retry.failures.is_empty());
    assert_eq!(transport.count_by_recipient()["ben@example.com"], 1);
    assert_eq!(transport.count_by_recipient()["ana@example.com"], 1);
}

#[tokio::test]
async fn empty_catalog_records_error_per_user() {
    let db = setup_db().await;
    insert_profile(&db, Some("ana@example.com"), "Ana").await;
    insert_profile(&db, Some("ben@example.com"), "Ben").await;

    let transport = RecordingTransport::new();
    let svc = build_service(&db, transport.clone(), clock_on(date(2025, 3, 4)));

    let summary = svc.run_daily_job().await.unwrap();
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.newly_assigned, 0);
    assert_eq!(summary.emailed, 0);
    assert_eq!(summary.errors.len(), 2);
    assert!(summary.errors.iter().all(|e| e.error == "no active quests"));
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn inactive_and_non_daily_quests_are_never_assigned() {
    let db = setup_db().await;
    let mut retired = quest("Retired", ProofType::SelfReport, 10, 100);
    retired.active = false;
    let mut weekly = quest("Weekly", ProofType::SelfReport, 10, 100);
    weekly.is_daily = false;
    insert_quest(&db, retired).await;
    insert_quest(&db, weekly).await;
    let daily = insert_quest(&db, quest("Daily", ProofType::SelfReport, 10, 1)).await;

    let user = insert_profile(&db, Some("ana@example.com"), "Ana").await;
    let today = date(2025, 3, 4);
    let svc = build_service(&db, RecordingTransport::new(), clock_on(today));
    svc.run_daily_job().await.unwrap();

    let a = assignments_repo(&db)
        .get_for_user_on_date(user, today)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(a.quest_id, daily.id);
}

#[tokio::test]
async fn recently_assigned_quests_are_avoided() {
    let db = setup_db().await;
    let quests = seed_catalog(&db, 4).await;
    let user = insert_profile(&db, Some("ana@example.com"), "Ana").await;
    let today = date(2025, 3, 20);
    let repo = assignments_repo(&db);

    // Three of the four quests were handed out in the last two weeks.
    for (i, q) in quests.iter().take(3).enumerate() {
        let day = today.checked_sub_days(Days::new(i as u64 + 1)).unwrap();
        assert!(matches!(
            repo.create(user, q.id, day).await.unwrap(),
            CreateOutcome::Created(_)
        ));
    }

    let svc = build_service(&db, RecordingTransport::new(), clock_on(today));
    svc.run_daily_job().await.unwrap();

    let a = repo.get_for_user_on_date(user, today).await.unwrap().unwrap();
    assert_eq!(a.quest_id, quests[3].id);
}

#[tokio::test]
async fn exclusion_widens_when_everything_was_seen() {
    let db = setup_db().await;
    let quests = seed_catalog(&db, 2).await;
    let user = insert_profile(&db, Some("ana@example.com"), "Ana").await;
    let today = date(2025, 3, 20);
    let repo = assignments_repo(&db);

    // quest 0 ten days ago (outside the short window), quest 1 yesterday.
    repo.create(user, quests[0].id, today.checked_sub_days(Days::new(10)).unwrap())
        .await
        .unwrap();
    repo.create(user, quests[1].id, today.checked_sub_days(Days::new(1)).unwrap())
        .await
        .unwrap();

    let svc = build_service(&db, RecordingTransport::new(), clock_on(today));
    let summary = svc.run_daily_job().await.unwrap();
    assert!(summary.errors.is_empty());

    let a = repo.get_for_user_on_date(user, today).await.unwrap().unwrap();
    assert_eq!(a.quest_id, quests[0].id);
}

#[tokio::test]
async fn single_quest_catalog_still_assigns_after_full_widening() {
    let db = setup_db().await;
    let quests = seed_catalog(&db, 1).await;
    let user = insert_profile(&db, Some("ana@example.com"), "Ana").await;
    let today = date(2025, 3, 20);
    assignments_repo(&db)
        .create(user, quests[0].id, today.checked_sub_days(Days::new(1)).unwrap())
        .await
        .unwrap();

    let svc = build_service(&db, RecordingTransport::new(), clock_on(today));
    let summary = svc.run_daily_job().await.unwrap();
    assert_eq!(summary.newly_assigned, 1);
    assert!(summary.errors.is_empty());
}

#[tokio::test]
async fn stale_assignments_expire_on_next_run() {
    let db = setup_db().await;
    let quests = seed_catalog(&db, 3).await;
    let user = insert_profile(&db, Some("ana@example.com"), "Ana").await;
    let yesterday = date(2025, 3, 3);
    let repo = assignments_repo(&db);
    let CreateOutcome::Created(old) = repo.create(user, quests[0].id, yesterday).await.unwrap()
    else {
        panic!("expected a fresh assignment");
    };

    let svc = build_service(&db, RecordingTransport::new(), clock_on(date(2025, 3, 4)));
    svc.run_daily_job().await.unwrap();

    let old = repo.find_by_id(old.id).await.unwrap().unwrap();
    assert_eq!(old.status, AssignmentStatus::Expired);
}

#[tokio::test]
async fn missing_confirm_secret_aborts_the_run() {
    let db = setup_db().await;
    seed_catalog(&db, 2).await;
    insert_profile(&db, Some("ana@example.com"), "Ana").await;
    insert_profile(&db, Some("ben@example.com"), "Ben").await;

    let transport = RecordingTransport::new();
    let svc = daily_quests::domain::service::Service::new(
        deps(&db, transport.clone(), clock_on(date(2025, 3, 4))),
        service_config(None),
    );

    let err = svc.run_daily_job().await.unwrap_err();
    assert!(matches!(err, DomainError::Configuration { .. }));
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn unconfigured_transport_aborts_the_run() {
    let db = setup_db().await;
    seed_catalog(&db, 2).await;
    insert_profile(&db, Some("ana@example.com"), "Ana").await;

    let svc = build_service(&db, RecordingTransport::unconfigured(), clock_on(date(2025, 3, 4)));
    let err = svc.run_daily_job().await.unwrap_err();
    assert!(err.is_fatal());
}

#[tokio::test]
async fn photo_quests_are_mailed_without_a_token() {
    let db = setup_db().await;
    insert_quest(&db, quest("Snap a mural", ProofType::Photo, 30, 1)).await;
    insert_profile(&db, Some("ana@example.com"), "Ana").await;

    let transport = RecordingTransport::new();
    let svc = daily_quests::domain::service::Service::new(
        deps(&db, transport.clone(), clock_on(date(2025, 3, 4))),
        service_config(None),
    );
    let summary = svc.run_daily_job().await.unwrap();
    assert_eq!(summary.emailed, 1);

    let sent = transport.sent();
    assert!(sent[0].subject.contains("Snap a mural"));
    assert!(!sent[0].text.contains("token="));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn each_user_gets_exactly_one_assignment_per_day() {
    let (db, _dir) = setup_file_db().await;
    seed_catalog(&db, 6).await;
    let mut users = HashSet::new();
    for i in 0..4 {
        users.insert(insert_profile(&db, Some(&format!("u{i}@example.com")), "U").await);
    }
    let today = date(2025, 3, 4);
    let svc = build_service(&db, RecordingTransport::new(), clock_on(today));

    let first = tokio::spawn({
        let svc = svc.clone();
        async move { svc.run_daily_job().await }
    });
    let second = tokio::spawn({
        let svc = svc.clone();
        async move { svc.run_daily_job().await }
    });
    let (a, b) = (first.await.unwrap().unwrap(), second.await.unwrap().unwrap());
    assert_eq!(a.newly_assigned + b.newly_assigned, 4);
    assert!(a.errors.is_empty(), "{:?}", a.errors);
    assert!(b.errors.is_empty(), "{:?}", b.errors);

    let repo = assignments_repo(&db);
    for user in users {
        assert!(repo.get_for_user_on_date(user, today).await.unwrap().is_some());
    }
}
