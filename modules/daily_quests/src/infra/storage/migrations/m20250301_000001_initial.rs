use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
pub(super) enum Quests {
    Table,
    Id,
    Title,
    Description,
    Category,
    XpReward,
    EstimatedMinutes,
    ProofType,
    IsDaily,
    Weight,
    Active,
    CreatedAt,
}

#[derive(DeriveIden)]
pub(super) enum Assignments {
    Table,
    Id,
    UserId,
    QuestId,
    AssignedDate,
    Status,
    ProofPayload,
    CompletedAt,
    EmailedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Profiles {
    Table,
    Id,
    Email,
    DisplayName,
    CreatedAt,
}

#[derive(DeriveIden)]
enum UserStats {
    Table,
    UserId,
    XpTotal,
    Level,
    StreakCurrent,
    StreakBest,
    QuestsCompletedTotal,
    LastQuestCompletedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Quests::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Quests::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Quests::Title).string().not_null())
                    .col(ColumnDef::new(Quests::Description).text().not_null().default(""))
                    .col(ColumnDef::new(Quests::Category).string().not_null())
                    .col(ColumnDef::new(Quests::XpReward).integer().not_null().default(0))
                    .col(ColumnDef::new(Quests::EstimatedMinutes).integer().not_null().default(0))
                    .col(ColumnDef::new(Quests::ProofType).string().not_null().default("self_report"))
                    .col(ColumnDef::new(Quests::IsDaily).boolean().not_null().default(true))
                    .col(ColumnDef::new(Quests::Weight).integer().not_null().default(1))
                    .col(ColumnDef::new(Quests::Active).boolean().not_null().default(true))
                    .col(ColumnDef::new(Quests::CreatedAt).timestamp_with_time_zone().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Assignments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Assignments::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Assignments::UserId).uuid().not_null())
                    .col(ColumnDef::new(Assignments::QuestId).uuid().not_null())
                    .col(ColumnDef::new(Assignments::AssignedDate).date().not_null())
                    .col(ColumnDef::new(Assignments::Status).string().not_null().default("assigned"))
                    .col(ColumnDef::new(Assignments::ProofPayload).json().null())
                    .col(ColumnDef::new(Assignments::CompletedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Assignments::EmailedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Assignments::CreatedAt).timestamp_with_time_zone().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_assignments_user_date")
                    .table(Assignments::Table)
                    .col(Assignments::UserId)
                    .col(Assignments::AssignedDate)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Profiles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Profiles::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Profiles::Email).string().null())
                    .col(ColumnDef::new(Profiles::DisplayName).string().not_null().default(""))
                    .col(ColumnDef::new(Profiles::CreatedAt).timestamp_with_time_zone().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserStats::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UserStats::UserId).uuid().not_null().primary_key())
                    .col(ColumnDef::new(UserStats::XpTotal).big_integer().not_null().default(0))
                    .col(ColumnDef::new(UserStats::Level).integer().not_null().default(1))
                    .col(ColumnDef::new(UserStats::StreakCurrent).integer().not_null().default(0))
                    .col(ColumnDef::new(UserStats::StreakBest).integer().not_null().default(0))
                    .col(ColumnDef::new(UserStats::QuestsCompletedTotal).integer().not_null().default(0))
                    .col(ColumnDef::new(UserStats::LastQuestCompletedAt).date().null())
                    .col(ColumnDef::new(UserStats::UpdatedAt).timestamp_with_time_zone().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserStats::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Profiles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Assignments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Quests::Table).to_owned())
            .await
    }
}
