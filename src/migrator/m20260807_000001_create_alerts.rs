use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alerts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Alerts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Alerts::PatientId).integer().not_null())
                    .col(ColumnDef::new(Alerts::DoctorId).integer())
                    .col(ColumnDef::new(Alerts::AlertTypeId).integer().not_null())
                    .col(ColumnDef::new(Alerts::PriorityLevelId).integer().not_null())
                    .col(ColumnDef::new(Alerts::AlertStateId).integer().not_null())
                    .col(ColumnDef::new(Alerts::IsOpen).boolean().not_null().default(true))
                    .col(ColumnDef::new(Alerts::Title).string().not_null())
                    .col(ColumnDef::new(Alerts::Message).text().not_null())
                    .col(ColumnDef::new(Alerts::RecommendationId).uuid())
                    .col(ColumnDef::new(Alerts::DetectedAt).date_time().not_null())
                    .col(ColumnDef::new(Alerts::ResolvedAt).date_time())
                    .col(ColumnDef::new(Alerts::ResolvedBy).integer())
                    .col(ColumnDef::new(Alerts::ResolutionNotes).text())
                    .col(ColumnDef::new(Alerts::CreatedAt).date_time().not_null())
                    .col(ColumnDef::new(Alerts::UpdatedAt).date_time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Alerts::Table, Alerts::AlertTypeId)
                            .to(AlertTypes::Table, AlertTypes::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Alerts::Table, Alerts::PriorityLevelId)
                            .to(PriorityLevels::Table, PriorityLevels::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Alerts::Table, Alerts::AlertStateId)
                            .to(AlertStates::Table, AlertStates::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Storage-level dedup: at most one open alert per (patient, alert
        // type). Partial indexes are not expressible through the schema
        // builder, so raw SQL it is.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX uq_alerts_open_pair \
                 ON alerts (patient_id, alert_type_id) WHERE is_open",
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AlertActions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AlertActions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AlertActions::AlertId).uuid().not_null())
                    .col(ColumnDef::new(AlertActions::DoctorId).integer())
                    .col(ColumnDef::new(AlertActions::ActionTaken).string().not_null())
                    .col(ColumnDef::new(AlertActions::Description).text())
                    .col(ColumnDef::new(AlertActions::CreatedAt).date_time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(AlertActions::Table, AlertActions::AlertId)
                            .to(Alerts::Table, Alerts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_alert_actions_alert")
                    .table(AlertActions::Table)
                    .col(AlertActions::AlertId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AlertActions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Alerts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Alerts {
    Table,
    Id,
    PatientId,
    DoctorId,
    AlertTypeId,
    PriorityLevelId,
    AlertStateId,
    IsOpen,
    Title,
    Message,
    RecommendationId,
    DetectedAt,
    ResolvedAt,
    ResolvedBy,
    ResolutionNotes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum AlertActions {
    Table,
    Id,
    AlertId,
    DoctorId,
    ActionTaken,
    Description,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AlertTypes {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum PriorityLevels {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum AlertStates {
    Table,
    Id,
}
