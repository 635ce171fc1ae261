use std::collections::{HashMap, HashSet};

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, SqlErr,
};
use tracing::debug;
use uuid::Uuid;

use crate::contract::model::{Assignment, AssignmentStatus, Quest, UserProfile};
use crate::domain::repo::{AssignmentRepository, CreateOutcome, PendingNotification};
use crate::infra::storage::entity::assignment::{
    ActiveModel as AssignmentAM, Column, Entity as AssignmentEntity,
};
use crate::infra::storage::entity::{profile, quest};
use crate::infra::storage::mapper::try_map_all;

pub struct SeaOrmAssignmentRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmAssignmentRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> AssignmentRepository for SeaOrmAssignmentRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn get_for_user_on_date(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> anyhow::Result<Option<Assignment>> {
        let found = AssignmentEntity::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::AssignedDate.eq(date))
            .one(&self.conn)
            .await
            .context("get_for_user_on_date failed")?;
        found.map(Assignment::try_from).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Assignment>> {
        let found = AssignmentEntity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find assignment failed")?;
        found.map(Assignment::try_from).transpose()
    }

    async fn create(
        &self,
        user_id: Uuid,
        quest_id: Uuid,
        date: NaiveDate,
    ) -> anyhow::Result<CreateOutcome> {
        let m = AssignmentAM {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            quest_id: Set(quest_id),
            assigned_date: Set(date),
            status: Set(AssignmentStatus::Assigned.as_str().to_string()),
            proof_payload: Set(None),
            completed_at: Set(None),
            emailed_at: Set(None),
            created_at: Set(Utc::now()),
        };

        match m.insert(&self.conn).await {
            Ok(row) => Ok(CreateOutcome::Created(row.try_into()?)),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                debug!(%user_id, %date, "Assignment insert hit the (user, date) unique index");
                Ok(CreateOutcome::AlreadyExists)
            }
            Err(e) => Err(anyhow::Error::new(e).context("create assignment failed")),
        }
    }

    async fn mark_emailed(&self, id: Uuid, at: DateTime<Utc>) -> anyhow::Result<bool> {
        let res = AssignmentEntity::update_many()
            .col_expr(Column::EmailedAt, Expr::value(Some(at)))
            .filter(Column::Id.eq(id))
            .filter(Column::EmailedAt.is_null())
            .exec(&self.conn)
            .await
            .context("mark_emailed failed")?;
        Ok(res.rows_affected == 1)
    }

    async fn expire_past(&self, user_id: Uuid, before: NaiveDate) -> anyhow::Result<u64> {
        let res = AssignmentEntity::update_many()
            .col_expr(
                Column::Status,
                Expr::value(AssignmentStatus::Expired.as_str()),
            )
            .filter(Column::UserId.eq(user_id))
            .filter(Column::Status.eq(AssignmentStatus::Assigned.as_str()))
            .filter(Column::AssignedDate.lt(before))
            .exec(&self.conn)
            .await
            .context("expire_past failed")?;
        Ok(res.rows_affected)
    }

    async fn get_needing_email(
        &self,
        date: NaiveDate,
    ) -> anyhow::Result<Vec<PendingNotification>> {
        let rows = AssignmentEntity::find()
            .filter(Column::AssignedDate.eq(date))
            .filter(Column::EmailedAt.is_null())
            .order_by_asc(Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("get_needing_email failed")?;
        let assignments: Vec<Assignment> = try_map_all(rows)?;
        if assignments.is_empty() {
            return Ok(Vec::new());
        }

        let user_ids: HashSet<Uuid> = assignments.iter().map(|a| a.user_id).collect();
        let quest_ids: HashSet<Uuid> = assignments.iter().map(|a| a.quest_id).collect();

        let users: HashMap<Uuid, UserProfile> = profile::Entity::find()
            .filter(profile::Column::Id.is_in(user_ids))
            .all(&self.conn)
            .await
            .context("load profiles for email failed")?
            .into_iter()
            .map(|p| (p.id, UserProfile::from(p)))
            .collect();

        let quests: HashMap<Uuid, Quest> = try_map_all::<_, Quest>(
            quest::Entity::find()
                .filter(quest::Column::Id.is_in(quest_ids))
                .all(&self.conn)
                .await
                .context("load quests for email failed")?,
        )?
        .into_iter()
        .map(|q| (q.id, q))
        .collect();

        Ok(assignments
            .into_iter()
            .map(|a| PendingNotification {
                user: users.get(&a.user_id).cloned(),
                quest: quests.get(&a.quest_id).cloned(),
                assignment: a,
            })
            .collect())
    }

    async fn quest_ids_assigned_since(
        &self,
        user_id: Uuid,
        since: NaiveDate,
    ) -> anyhow::Result<HashSet<Uuid>> {
        let ids: Vec<Uuid> = AssignmentEntity::find()
            .select_only()
            .column(Column::QuestId)
            .filter(Column::UserId.eq(user_id))
            .filter(Column::AssignedDate.gte(since))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("quest_ids_assigned_since failed")?;
        Ok(ids.into_iter().collect())
    }
}
