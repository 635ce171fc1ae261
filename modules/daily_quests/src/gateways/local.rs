use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::contract::{
    client::DailyQuestsApi,
    error::DailyQuestsError,
    model::{
        CompletionOutcome, DailyJobSummary, EmailJobSummary, NewQuest, SkipOutcome, TodayQuest,
        UserStats,
    },
};
use crate::domain::service::Service;

/// Local implementation of the DailyQuestsApi trait that delegates to the domain service
pub struct DailyQuestsLocalClient {
    service: Arc<Service>,
}

impl DailyQuestsLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl DailyQuestsApi for DailyQuestsLocalClient {
    async fn run_daily_job(&self) -> Result<DailyJobSummary, DailyQuestsError> {
        self.service.run_daily_job().await.map_err(Into::into)
    }

    async fn run_email_job(&self) -> Result<EmailJobSummary, DailyQuestsError> {
        self.service.run_email_job().await.map_err(Into::into)
    }

    async fn today_quest(&self, user_id: Uuid) -> Result<TodayQuest, DailyQuestsError> {
        self.service.today_quest(user_id).await.map_err(Into::into)
    }

    async fn complete(
        &self,
        user_id: Uuid,
        assignment_id: Uuid,
        proof: Option<serde_json::Value>,
    ) -> Result<CompletionOutcome, DailyQuestsError> {
        self.service
            .complete(user_id, assignment_id, proof)
            .await
            .map_err(Into::into)
    }

    async fn skip(
        &self,
        user_id: Uuid,
        assignment_id: Uuid,
    ) -> Result<SkipOutcome, DailyQuestsError> {
        self.service
            .skip(user_id, assignment_id)
            .await
            .map_err(Into::into)
    }

    async fn user_stats(&self, user_id: Uuid) -> Result<UserStats, DailyQuestsError> {
        self.service.user_stats(user_id).await.map_err(Into::into)
    }

    async fn seed_quests(&self, quests: Vec<NewQuest>) -> Result<usize, DailyQuestsError> {
        self.service.seed_quests(quests).await.map_err(Into::into)
    }
}
