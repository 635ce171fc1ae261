use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::{
    error::DailyQuestsError,
    model::{
        CompletionOutcome, DailyJobSummary, EmailJobSummary, NewQuest, SkipOutcome, TodayQuest,
        UserStats,
    },
};

/// Public API of the daily quest pipeline for binaries and other modules.
#[async_trait]
pub trait DailyQuestsApi: Send + Sync {
    /// Assign today's quest to every notifiable user and mail it.
    async fn run_daily_job(&self) -> Result<DailyJobSummary, DailyQuestsError>;

    /// Mail today's assignments that have not been mailed yet.
    async fn run_email_job(&self) -> Result<EmailJobSummary, DailyQuestsError>;

    /// Today's quest for a user, assigning one if needed.
    async fn today_quest(&self, user_id: Uuid) -> Result<TodayQuest, DailyQuestsError>;

    async fn complete(
        &self,
        user_id: Uuid,
        assignment_id: Uuid,
        proof: Option<serde_json::Value>,
    ) -> Result<CompletionOutcome, DailyQuestsError>;

    async fn skip(&self, user_id: Uuid, assignment_id: Uuid)
        -> Result<SkipOutcome, DailyQuestsError>;

    /// Gamification counters; a user that never completed anything gets zeros.
    async fn user_stats(&self, user_id: Uuid) -> Result<UserStats, DailyQuestsError>;

    /// Insert or update catalog entries. Returns how many were written.
    async fn seed_quests(&self, quests: Vec<NewQuest>) -> Result<usize, DailyQuestsError>;
}
