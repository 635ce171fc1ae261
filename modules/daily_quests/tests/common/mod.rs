#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, TimeZone, Utc};
use parking_lot::Mutex;
use rand::{rngs::StdRng, SeedableRng};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use url::Url;
use uuid::Uuid;

use daily_quests::contract::model::{ProofType, Quest};
use daily_quests::domain::assignments::ExclusionWindows;
use daily_quests::domain::clock::FixedClock;
use daily_quests::domain::ports::{EmailTransport, OutboundEmail, TransportError};
use daily_quests::domain::repo::QuestRepository;
use daily_quests::domain::service::{Service, ServiceConfig, ServiceDeps};
use daily_quests::infra::storage::entity::profile;
use daily_quests::infra::storage::{
    SeaOrmAssignmentRepository, SeaOrmCompletionStore, SeaOrmQuestRepository,
    SeaOrmStatsRepository, SeaOrmUserDirectory,
};
use daily_quests::DailyQuests;

pub const SECRET: &str = "test-confirm-secret";
pub const APP_BASE: &str = "https://app.questline.test";

/// Fresh in-memory sqlite with the real schema. One connection, so every
/// handle sees the same database.
pub async fn setup_db() -> DatabaseConnection {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(opts).await.expect("connect sqlite");
    DailyQuests::migrate(&db).await.expect("migrate");
    db
}

/// File-backed sqlite with a real pool, for tests where calls must overlap.
/// Keep the returned directory alive for as long as the connection.
pub async fn setup_file_db() -> (DatabaseConnection, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("quests.db");
    let mut opts = ConnectOptions::new(format!("sqlite://{}?mode=rwc", path.display()));
    opts.max_connections(4)
        .min_connections(1)
        .sqlx_logging(false)
        .map_sqlx_sqlite_opts(|o| o.busy_timeout(Duration::from_secs(5)));
    let db = Database::connect(opts).await.expect("connect sqlite file");
    DailyQuests::migrate(&db).await.expect("migrate");
    (db, dir)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// 14:00 UTC, i.e. mid-morning in New York on the same date.
pub fn clock_on(day: NaiveDate) -> Arc<FixedClock> {
    let at = Utc
        .from_utc_datetime(&day.and_hms_opt(14, 0, 0).unwrap());
    Arc::new(FixedClock::new(at, chrono_tz::America::New_York))
}

pub fn set_day(clock: &FixedClock, day: NaiveDate) {
    clock.set(Utc.from_utc_datetime(&day.and_hms_opt(14, 0, 0).unwrap()));
}

pub async fn insert_profile(db: &DatabaseConnection, email: Option<&str>, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    profile::ActiveModel {
        id: Set(id),
        email: Set(email.map(str::to_string)),
        display_name: Set(name.to_string()),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("insert profile");
    id
}

pub fn quest(title: &str, proof_type: ProofType, xp: i32, weight: i32) -> Quest {
    Quest {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: format!("Do this: {title}"),
        category: "community".into(),
        xp_reward: xp,
        estimated_minutes: 10,
        proof_type,
        is_daily: true,
        weight,
        active: true,
        created_at: Utc::now(),
    }
}

pub async fn insert_quest(db: &DatabaseConnection, q: Quest) -> Quest {
    SeaOrmQuestRepository::new(db.clone())
        .upsert(q.clone())
        .await
        .expect("insert quest");
    q
}

/// `n` self-report quests worth 50 XP each.
pub async fn seed_catalog(db: &DatabaseConnection, n: usize) -> Vec<Quest> {
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        out.push(insert_quest(db, quest(&format!("Quest {i}"), ProofType::SelfReport, 50, 1)).await);
    }
    out
}

/// Records every message; can be told to fail for specific recipients.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<OutboundEmail>>,
    failing: Mutex<HashSet<String>>,
    not_configured: bool,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn unconfigured() -> Arc<Self> {
        Arc::new(Self {
            not_configured: true,
            ..Default::default()
        })
    }

    pub fn fail_for(&self, address: &str) {
        self.failing.lock().insert(address.to_string());
    }

    pub fn recover(&self, address: &str) {
        self.failing.lock().remove(address);
    }

    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().clone()
    }

    pub fn count_by_recipient(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for m in self.sent.lock().iter() {
            *counts.entry(m.to.clone()).or_insert(0) += 1;
        }
        counts
    }
}

#[async_trait::async_trait]
impl EmailTransport for RecordingTransport {
    async fn send(&self, email: &OutboundEmail) -> Result<String, TransportError> {
        if self.not_configured {
            return Err(TransportError::NotConfigured("no API key".into()));
        }
        if self.failing.lock().contains(&email.to) {
            return Err(TransportError::Rejected(format!(
                "mailbox {} unavailable",
                email.to
            )));
        }
        let mut sent = self.sent.lock();
        sent.push(email.clone());
        Ok(format!("msg_{}", sent.len()))
    }
}

pub fn service_config(secret: Option<&str>) -> ServiceConfig {
    ServiceConfig {
        app_base_url: Url::parse(APP_BASE).unwrap(),
        confirm_secret: secret.map(str::to_string),
        completion_path: "/api/quests/confirm".into(),
        result_path: "/quest-complete".into(),
        email_from: "Questline <quests@questline.test>".into(),
        send_interval: Duration::ZERO,
        windows: ExclusionWindows::default(),
    }
}

pub fn deps(
    db: &DatabaseConnection,
    transport: Arc<dyn EmailTransport>,
    clock: Arc<FixedClock>,
) -> ServiceDeps {
    ServiceDeps {
        quests: Arc::new(SeaOrmQuestRepository::new(db.clone())),
        assignments: Arc::new(SeaOrmAssignmentRepository::new(db.clone())),
        users: Arc::new(SeaOrmUserDirectory::new(db.clone())),
        stats: Arc::new(SeaOrmStatsRepository::new(db.clone())),
        completions: Arc::new(SeaOrmCompletionStore::new(db.clone())),
        transport,
        clock,
    }
}

/// Service over sqlite with a seeded picker and no send pacing.
pub fn build_service(
    db: &DatabaseConnection,
    transport: Arc<dyn EmailTransport>,
    clock: Arc<FixedClock>,
) -> Arc<Service> {
    build_service_with(db, transport, clock, service_config(Some(SECRET)))
}

pub fn build_service_with(
    db: &DatabaseConnection,
    transport: Arc<dyn EmailTransport>,
    clock: Arc<FixedClock>,
    config: ServiceConfig,
) -> Arc<Service> {
    Arc::new(Service::with_rng(
        deps(db, transport, clock),
        config,
        StdRng::seed_from_u64(11),
    ))
}

pub fn assignments_repo(db: &DatabaseConnection) -> SeaOrmAssignmentRepository<DatabaseConnection> {
    SeaOrmAssignmentRepository::new(db.clone())
}
