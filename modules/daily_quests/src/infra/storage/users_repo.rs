use anyhow::Context;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::contract::model::{NotifiableUser, UserProfile};
use crate::domain::repo::UserDirectory;
use crate::infra::storage::entity::profile::{Column, Entity as ProfileEntity};
use crate::infra::storage::mapper::notifiable;

/// Reads the shared `profiles` table.
pub struct SeaOrmUserDirectory<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmUserDirectory<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> UserDirectory for SeaOrmUserDirectory<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn list_notifiable(&self) -> anyhow::Result<Vec<NotifiableUser>> {
        let rows = ProfileEntity::find()
            .filter(Column::Email.is_not_null())
            .filter(Column::Email.ne(""))
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Id)
            .all(&self.conn)
            .await
            .context("list_notifiable failed")?;
        Ok(rows
            .into_iter()
            .filter_map(|m| notifiable(UserProfile::from(m)))
            .collect())
    }

    async fn get_by_id(&self, id: Uuid) -> anyhow::Result<Option<UserProfile>> {
        let found = ProfileEntity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("get profile failed")?;
        Ok(found.map(Into::into))
    }
}
