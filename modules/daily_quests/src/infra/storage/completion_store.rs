//! Transactional storage for completion and skip.

use anyhow::{anyhow, Context};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::contract::model::{Assignment, AssignmentStatus, Quest, UserStats};
use crate::domain::repo::{CompletionStore, CompletionTx, StatsRepository};
use crate::infra::storage::entity::{assignment, quest, user_stats};

pub struct SeaOrmCompletionStore {
    conn: DatabaseConnection,
}

impl SeaOrmCompletionStore {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl CompletionStore for SeaOrmCompletionStore {
    async fn begin(&self) -> anyhow::Result<Box<dyn CompletionTx>> {
        let txn = self.conn.begin().await.context("begin transaction failed")?;
        Ok(Box::new(SeaOrmCompletionTx { txn }))
    }
}

/// Rolls back on drop unless committed.
struct SeaOrmCompletionTx {
    txn: DatabaseTransaction,
}

#[async_trait::async_trait]
impl CompletionTx for SeaOrmCompletionTx {
    async fn find_assignment(&mut self, id: Uuid) -> anyhow::Result<Option<Assignment>> {
        let found = assignment::Entity::find_by_id(id)
            .one(&self.txn)
            .await
            .context("find assignment failed")?;
        found.map(Assignment::try_from).transpose()
    }

    async fn find_quest(&mut self, id: Uuid) -> anyhow::Result<Option<Quest>> {
        let found = quest::Entity::find_by_id(id)
            .one(&self.txn)
            .await
            .context("find quest failed")?;
        found.map(Quest::try_from).transpose()
    }

    async fn transition(
        &mut self,
        id: Uuid,
        user_id: Uuid,
        to: AssignmentStatus,
        completed_at: Option<DateTime<Utc>>,
        proof: Option<serde_json::Value>,
    ) -> anyhow::Result<bool> {
        let res = assignment::Entity::update_many()
            .col_expr(assignment::Column::Status, Expr::value(to.as_str()))
            .col_expr(assignment::Column::CompletedAt, Expr::value(completed_at))
            .col_expr(assignment::Column::ProofPayload, Expr::value(proof))
            .filter(assignment::Column::Id.eq(id))
            .filter(assignment::Column::UserId.eq(user_id))
            .filter(assignment::Column::Status.eq(AssignmentStatus::Assigned.as_str()))
            .exec(&self.txn)
            .await
            .context("assignment transition failed")?;
        Ok(res.rows_affected == 1)
    }

    async fn lock_stats(&mut self, user_id: Uuid) -> anyhow::Result<UserStats> {
        user_stats::Entity::insert(stats_row(&UserStats::empty(user_id)))
            .on_conflict(
                OnConflict::column(user_stats::Column::UserId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.txn)
            .await
            .context("create stats row failed")?;

        // FOR UPDATE on Postgres. SQLite already holds the write lock here.
        let found = user_stats::Entity::find_by_id(user_id)
            .lock_exclusive()
            .one(&self.txn)
            .await
            .context("lock stats failed")?;
        found
            .map(Into::into)
            .ok_or_else(|| anyhow!("stats row for user {user_id} is missing"))
    }

    async fn save_stats(&mut self, s: &UserStats) -> anyhow::Result<()> {
        user_stats::Entity::update(stats_row(s))
            .exec(&self.txn)
            .await
            .context("save stats failed")?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> anyhow::Result<()> {
        self.txn.commit().await.context("commit failed")
    }
}

fn stats_row(s: &UserStats) -> user_stats::ActiveModel {
    user_stats::ActiveModel {
        user_id: Set(s.user_id),
        xp_total: Set(s.xp_total),
        level: Set(s.level),
        streak_current: Set(s.streak_current),
        streak_best: Set(s.streak_best),
        quests_completed_total: Set(s.quests_completed_total),
        last_quest_completed_at: Set(s.last_quest_completed_at),
        updated_at: Set(Utc::now()),
    }
}

pub struct SeaOrmStatsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmStatsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> StatsRepository for SeaOrmStatsRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn get(&self, user_id: Uuid) -> anyhow::Result<Option<UserStats>> {
        let found = user_stats::Entity::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("get stats failed")?;
        Ok(found.map(Into::into))
    }
}
