use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AlertConfigurations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AlertConfigurations::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AlertConfigurations::PatientId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AlertConfigurations::AlertTypeId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AlertConfigurations::DoctorId).integer())
                    .col(
                        ColumnDef::new(AlertConfigurations::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(AlertConfigurations::ThresholdConfig)
                            .json()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AlertConfigurations::VerificationFrequencyHours)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AlertConfigurations::LastEvaluatedAt).date_time())
                    .col(
                        ColumnDef::new(AlertConfigurations::CreatedAt)
                            .date_time()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AlertConfigurations::UpdatedAt)
                            .date_time()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(
                                AlertConfigurations::Table,
                                AlertConfigurations::AlertTypeId,
                            )
                            .to(AlertTypes::Table, AlertTypes::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // One configuration per (patient, alert type); callers use the
        // explicit update path, never upsert-via-create.
        manager
            .create_index(
                Index::create()
                    .name("uq_alert_configurations_pair")
                    .table(AlertConfigurations::Table)
                    .col(AlertConfigurations::PatientId)
                    .col(AlertConfigurations::AlertTypeId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AlertConfigurations::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AlertConfigurations {
    Table,
    Id,
    PatientId,
    AlertTypeId,
    DoctorId,
    Active,
    ThresholdConfig,
    VerificationFrequencyHours,
    LastEvaluatedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum AlertTypes {
    Table,
    Id,
}
