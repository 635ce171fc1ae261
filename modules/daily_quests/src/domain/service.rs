use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use tracing::{debug, info, instrument};
use url::Url;
use uuid::Uuid;

use crate::contract::model::{
    CompletionOutcome, DailyJobSummary, EmailJobSummary, NewQuest, Quest, SkipOutcome, TodayQuest,
    UserStats,
};
use crate::domain::assignments::{AssignmentService, ExclusionWindows};
use crate::domain::catalog::QuestCatalog;
use crate::domain::clock::Clock;
use crate::domain::completion::CompletionEngine;
use crate::domain::error::DomainError;
use crate::domain::jobs::{DailyAssignmentJob, EmailOnlyJob};
use crate::domain::notification::NotificationComposer;
use crate::domain::ports::EmailTransport;
use crate::domain::repo::{
    AssignmentRepository, CompletionStore, QuestRepository, StatsRepository, UserDirectory,
};
use crate::domain::sender::NotificationSender;
use crate::domain::token::TokenSigner;

/// Configuration for the domain service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub app_base_url: Url,
    pub confirm_secret: Option<String>,
    pub completion_path: String,
    pub result_path: String,
    pub email_from: String,
    pub send_interval: Duration,
    pub windows: ExclusionWindows,
}

/// Ports the service is wired with.
#[derive(Clone)]
pub struct ServiceDeps {
    pub quests: Arc<dyn QuestRepository>,
    pub assignments: Arc<dyn AssignmentRepository>,
    pub users: Arc<dyn UserDirectory>,
    pub stats: Arc<dyn StatsRepository>,
    pub completions: Arc<dyn CompletionStore>,
    pub transport: Arc<dyn EmailTransport>,
    pub clock: Arc<dyn Clock>,
}

/// Entry point for everything the daily quest pipeline does.
/// Depends only on ports, not on infra types.
pub struct Service {
    quests: Arc<dyn QuestRepository>,
    users: Arc<dyn UserDirectory>,
    stats: Arc<dyn StatsRepository>,
    clock: Arc<dyn Clock>,
    signer: Arc<TokenSigner>,
    assignments: Arc<AssignmentService>,
    completion: CompletionEngine,
    daily_job: DailyAssignmentJob,
    email_job: EmailOnlyJob,
    config: ServiceConfig,
}

impl Service {
    pub fn new(deps: ServiceDeps, config: ServiceConfig) -> Self {
        let catalog = QuestCatalog::new(deps.quests.clone());
        Self::with_catalog(deps, config, catalog)
    }

    /// Same as `new` but with a seeded quest picker.
    pub fn with_rng(deps: ServiceDeps, config: ServiceConfig, rng: StdRng) -> Self {
        let catalog = QuestCatalog::with_rng(deps.quests.clone(), rng);
        Self::with_catalog(deps, config, catalog)
    }

    fn with_catalog(deps: ServiceDeps, config: ServiceConfig, catalog: QuestCatalog) -> Self {
        let signer = Arc::new(TokenSigner::new(
            config.confirm_secret.as_deref(),
            config.app_base_url.clone(),
            config.completion_path.clone(),
        ));
        let composer = Arc::new(NotificationComposer::new(
            signer.clone(),
            config.app_base_url.clone(),
        ));
        let sender = Arc::new(NotificationSender::new(
            deps.transport.clone(),
            config.email_from.clone(),
        ));
        let assignments = Arc::new(AssignmentService::new(
            deps.assignments.clone(),
            Arc::new(catalog),
            config.windows,
        ));

        let daily_job = DailyAssignmentJob::new(
            deps.users.clone(),
            assignments.clone(),
            deps.assignments.clone(),
            deps.quests.clone(),
            composer.clone(),
            sender.clone(),
            deps.clock.clone(),
            config.send_interval,
        );
        let email_job = EmailOnlyJob::new(
            deps.assignments.clone(),
            composer,
            sender,
            deps.clock.clone(),
            config.send_interval,
        );

        Self {
            quests: deps.quests,
            users: deps.users,
            stats: deps.stats,
            completion: CompletionEngine::new(deps.completions, deps.clock.clone()),
            clock: deps.clock,
            signer,
            assignments,
            daily_job,
            email_job,
            config,
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Path the one-click links point at.
    pub fn completion_path(&self) -> &str {
        &self.config.completion_path
    }

    pub async fn run_daily_job(&self) -> Result<DailyJobSummary, DomainError> {
        self.daily_job.run().await
    }

    pub async fn run_email_job(&self) -> Result<EmailJobSummary, DomainError> {
        self.email_job.run().await
    }

    #[instrument(name = "daily_quests.service.today_quest", skip(self), fields(user_id = %user_id))]
    pub async fn today_quest(&self, user_id: Uuid) -> Result<TodayQuest, DomainError> {
        self.users
            .get_by_id(user_id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| DomainError::user_not_found(user_id))?;

        let today = self.clock.today();
        self.assignments.expire_before(user_id, today).await?;
        let ensured = self.assignments.ensure(user_id, today).await?;
        let quest = self
            .quests
            .find_by_id(ensured.assignment.quest_id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| DomainError::quest_not_found(ensured.assignment.quest_id))?;

        Ok(TodayQuest {
            assignment: ensured.assignment,
            quest,
        })
    }

    pub async fn complete(
        &self,
        user_id: Uuid,
        assignment_id: Uuid,
        proof: Option<serde_json::Value>,
    ) -> Result<CompletionOutcome, DomainError> {
        self.completion.complete(user_id, assignment_id, proof).await
    }

    pub async fn skip(&self, user_id: Uuid, assignment_id: Uuid) -> Result<SkipOutcome, DomainError> {
        self.completion.skip(user_id, assignment_id).await
    }

    #[instrument(name = "daily_quests.service.user_stats", skip(self), fields(user_id = %user_id))]
    pub async fn user_stats(&self, user_id: Uuid) -> Result<UserStats, DomainError> {
        debug!("Loading user stats");
        let stats = self
            .stats
            .get(user_id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        Ok(stats.unwrap_or_else(|| UserStats::empty(user_id)))
    }

    /// Check a one-click link's token against the raw query values.
    pub fn verify_link(&self, assignment_id: &str, user_id: &str, token: &str) -> bool {
        self.signer.verify(assignment_id, user_id, token)
    }

    /// Page the completion link redirects to, with `params` appended.
    pub fn result_url(&self, params: &[(&str, String)]) -> Result<Url, DomainError> {
        let mut url = self
            .config
            .app_base_url
            .join(&self.config.result_path)
            .map_err(|e| DomainError::configuration(format!("invalid result path: {e}")))?;
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }

    #[instrument(name = "daily_quests.service.seed_quests", skip(self, quests), fields(count = quests.len()))]
    pub async fn seed_quests(&self, quests: Vec<NewQuest>) -> Result<usize, DomainError> {
        for q in &quests {
            Self::validate_new_quest(q)?;
        }

        let now = self.clock.now();
        let mut written = 0;
        for q in quests {
            let quest = Quest {
                id: q.id.unwrap_or_else(Uuid::new_v4),
                title: q.title.trim().to_string(),
                description: q.description,
                category: q.category,
                xp_reward: q.xp_reward,
                estimated_minutes: q.estimated_minutes,
                proof_type: q.proof_type,
                is_daily: q.is_daily,
                weight: q.weight,
                active: q.active,
                created_at: now,
            };
            self.quests
                .upsert(quest)
                .await
                .map_err(|e| DomainError::database(e.to_string()))?;
            written += 1;
        }
        info!(written, "Seeded quest catalog");
        Ok(written)
    }

    fn validate_new_quest(q: &NewQuest) -> Result<(), DomainError> {
        if q.title.trim().is_empty() {
            return Err(DomainError::validation("title", "cannot be empty"));
        }
        if q.xp_reward <= 0 {
            return Err(DomainError::validation("xp_reward", "must be positive"));
        }
        if q.estimated_minutes < 0 {
            return Err(DomainError::validation(
                "estimated_minutes",
                "cannot be negative",
            ));
        }
        Ok(())
    }
}
