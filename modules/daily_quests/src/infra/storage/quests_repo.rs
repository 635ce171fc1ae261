use anyhow::Context;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::contract::model::Quest;
use crate::domain::repo::QuestRepository;
use crate::infra::storage::entity::quest::{ActiveModel as QuestAM, Column, Entity as QuestEntity};
use crate::infra::storage::mapper::try_map_all;

/// SeaORM-backed quest catalog.
/// Generic over the connection so it can run inside a transaction too.
pub struct SeaOrmQuestRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmQuestRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> QuestRepository for SeaOrmQuestRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn list_daily_active(&self) -> anyhow::Result<Vec<Quest>> {
        let rows = QuestEntity::find()
            .filter(Column::Active.eq(true))
            .filter(Column::IsDaily.eq(true))
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Id)
            .all(&self.conn)
            .await
            .context("list_daily_active failed")?;
        try_map_all(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Quest>> {
        let found = QuestEntity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find quest failed")?;
        found.map(Quest::try_from).transpose()
    }

    async fn upsert(&self, q: Quest) -> anyhow::Result<()> {
        let m = QuestAM {
            id: Set(q.id),
            title: Set(q.title),
            description: Set(q.description),
            category: Set(q.category),
            xp_reward: Set(q.xp_reward),
            estimated_minutes: Set(q.estimated_minutes),
            proof_type: Set(q.proof_type.as_str().to_string()),
            is_daily: Set(q.is_daily),
            weight: Set(q.weight),
            active: Set(q.active),
            created_at: Set(q.created_at),
        };
        QuestEntity::insert(m)
            .on_conflict(
                OnConflict::column(Column::Id)
                    .update_columns([
                        Column::Title,
                        Column::Description,
                        Column::Category,
                        Column::XpReward,
                        Column::EstimatedMinutes,
                        Column::ProofType,
                        Column::IsDaily,
                        Column::Weight,
                        Column::Active,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await
            .context("upsert quest failed")?;
        Ok(())
    }
}
