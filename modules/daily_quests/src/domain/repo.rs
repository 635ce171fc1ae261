use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::contract::model::{
    Assignment, AssignmentStatus, NotifiableUser, Quest, UserProfile, UserStats,
};

/// Read access to the quest catalog plus seeding.
#[async_trait]
pub trait QuestRepository: Send + Sync {
    /// Quests that are both `active` and `is_daily`.
    async fn list_daily_active(&self) -> anyhow::Result<Vec<Quest>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Quest>>;
    /// Insert, or overwrite the row with the same id.
    async fn upsert(&self, quest: Quest) -> anyhow::Result<()>;
}

/// Result of trying to create the (user, date) assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    Created(Assignment),
    /// Another writer got there first; the caller should re-read.
    AlreadyExists,
}

/// Assignment due for its notification mail, with whatever could be joined.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingNotification {
    pub assignment: Assignment,
    pub user: Option<UserProfile>,
    pub quest: Option<Quest>,
}

#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    async fn get_for_user_on_date(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> anyhow::Result<Option<Assignment>>;

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Assignment>>;

    /// Insert a new `assigned` row. A uniqueness clash on (user, date) is
    /// reported as `AlreadyExists`, never as an error.
    async fn create(
        &self,
        user_id: Uuid,
        quest_id: Uuid,
        date: NaiveDate,
    ) -> anyhow::Result<CreateOutcome>;

    /// Stamp `emailed_at` if still unset. Returns false if it was already set.
    async fn mark_emailed(&self, id: Uuid, at: DateTime<Utc>) -> anyhow::Result<bool>;

    /// Move the user's `assigned` rows dated before `before` to `expired`.
    async fn expire_past(&self, user_id: Uuid, before: NaiveDate) -> anyhow::Result<u64>;

    /// Rows for `date` with no `emailed_at`, whatever their status.
    async fn get_needing_email(&self, date: NaiveDate)
        -> anyhow::Result<Vec<PendingNotification>>;

    /// Quest ids assigned to the user on or after `since`.
    async fn quest_ids_assigned_since(
        &self,
        user_id: Uuid,
        since: NaiveDate,
    ) -> anyhow::Result<HashSet<Uuid>>;
}

/// Read-only view of the externally owned user profiles.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Users with a non-empty email address.
    async fn list_notifiable(&self) -> anyhow::Result<Vec<NotifiableUser>>;
    async fn get_by_id(&self, id: Uuid) -> anyhow::Result<Option<UserProfile>>;
}

#[async_trait]
pub trait StatsRepository: Send + Sync {
    async fn get(&self, user_id: Uuid) -> anyhow::Result<Option<UserStats>>;
}

/// Opens the unit of work used by completion and skip.
#[async_trait]
pub trait CompletionStore: Send + Sync {
    async fn begin(&self) -> anyhow::Result<Box<dyn CompletionTx>>;
}

/// A single transaction. Dropping it without `commit` rolls everything back.
#[async_trait]
pub trait CompletionTx: Send {
    async fn find_assignment(&mut self, id: Uuid) -> anyhow::Result<Option<Assignment>>;
    async fn find_quest(&mut self, id: Uuid) -> anyhow::Result<Option<Quest>>;

    /// Move the user's assignment out of `assigned`. Only succeeds while the
    /// row is still `assigned` and owned by `user_id`; returns false otherwise.
    /// Must be the first statement of the transaction so it takes the write
    /// lock before any snapshot is read.
    async fn transition(
        &mut self,
        id: Uuid,
        user_id: Uuid,
        to: AssignmentStatus,
        completed_at: Option<DateTime<Utc>>,
        proof: Option<serde_json::Value>,
    ) -> anyhow::Result<bool>;

    /// Read the user's stats row for update, creating a zeroed one first if
    /// missing. Concurrent completions for the same user queue on this row.
    async fn lock_stats(&mut self, user_id: Uuid) -> anyhow::Result<UserStats>;
    async fn save_stats(&mut self, stats: &UserStats) -> anyhow::Result<()>;
    async fn commit(self: Box<Self>) -> anyhow::Result<()>;
}
