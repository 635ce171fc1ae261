use sea_orm_migration::prelude::*;

use super::m20250301_000001_initial::{Assignments, Quests};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Email sweep: today's assigned rows without emailed_at.
        manager
            .create_index(
                Index::create()
                    .name("ix_assignments_date_status")
                    .table(Assignments::Table)
                    .col(Assignments::AssignedDate)
                    .col(Assignments::Status)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_quests_active_daily")
                    .table(Quests::Table)
                    .col(Quests::Active)
                    .col(Quests::IsDaily)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("ix_quests_active_daily")
                    .table(Quests::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("ix_assignments_date_status")
                    .table(Assignments::Table)
                    .to_owned(),
            )
            .await
    }
}
