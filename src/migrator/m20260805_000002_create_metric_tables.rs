use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WeightEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WeightEntries::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WeightEntries::PatientId).integer().not_null())
                    .col(ColumnDef::new(WeightEntries::RecordedOn).date().not_null())
                    .col(ColumnDef::new(WeightEntries::WeightKg).double().not_null())
                    .col(ColumnDef::new(WeightEntries::CreatedAt).date_time().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_weight_entries_patient_date")
                    .table(WeightEntries::Table)
                    .col(WeightEntries::PatientId)
                    .col(WeightEntries::RecordedOn)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(NutritionLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(NutritionLogs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(NutritionLogs::PatientId).integer().not_null())
                    .col(ColumnDef::new(NutritionLogs::ConsumedOn).date().not_null())
                    .col(ColumnDef::new(NutritionLogs::TotalCalories).double().not_null())
                    .col(ColumnDef::new(NutritionLogs::MealType).string().not_null())
                    .col(ColumnDef::new(NutritionLogs::CreatedAt).date_time().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_nutrition_logs_patient_date")
                    .table(NutritionLogs::Table)
                    .col(NutritionLogs::PatientId)
                    .col(NutritionLogs::ConsumedOn)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ActivityLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ActivityLogs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ActivityLogs::PatientId).integer().not_null())
                    .col(ColumnDef::new(ActivityLogs::PerformedOn).date().not_null())
                    .col(
                        ColumnDef::new(ActivityLogs::DurationMinutes)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ActivityLogs::ActivityType).string().not_null())
                    .col(ColumnDef::new(ActivityLogs::CreatedAt).date_time().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_activity_logs_patient_date")
                    .table(ActivityLogs::Table)
                    .col(ActivityLogs::PatientId)
                    .col(ActivityLogs::PerformedOn)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ActivityLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(NutritionLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WeightEntries::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum WeightEntries {
    Table,
    Id,
    PatientId,
    RecordedOn,
    WeightKg,
    CreatedAt,
}

#[derive(DeriveIden)]
enum NutritionLogs {
    Table,
    Id,
    PatientId,
    ConsumedOn,
    TotalCalories,
    MealType,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ActivityLogs {
    Table,
    Id,
    PatientId,
    PerformedOn,
    DurationMinutes,
    ActivityType,
    CreatedAt,
}
