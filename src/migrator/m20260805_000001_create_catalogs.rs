use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PriorityLevels::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PriorityLevels::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PriorityLevels::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(PriorityLevels::Rank).small_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AlertStates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AlertStates::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AlertStates::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(AlertStates::IsFinal).boolean().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AlertTypes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AlertTypes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AlertTypes::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(AlertTypes::Category).string().not_null())
                    .col(ColumnDef::new(AlertTypes::IsAutomatic).boolean().not_null())
                    .col(ColumnDef::new(AlertTypes::ValidationConfig).json().not_null())
                    .col(
                        ColumnDef::new(AlertTypes::DefaultPriorityId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AlertTypes::CreatedAt).date_time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(AlertTypes::Table, AlertTypes::DefaultPriorityId)
                            .to(PriorityLevels::Table, PriorityLevels::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Seed the immutable catalogs. Priorities are ordering-only (rank 1-10).
        let conn = manager.get_connection();
        conn.execute_unprepared(
            "INSERT INTO priority_levels (name, rank) VALUES \
             ('low', 2), ('medium', 5), ('high', 8), ('critical', 10)",
        )
        .await?;

        conn.execute_unprepared(
            "INSERT INTO alert_states (name, is_final) VALUES \
             ('detected', FALSE), ('acknowledged', FALSE), \
             ('resolved', TRUE), ('dismissed', TRUE)",
        )
        .await?;

        conn.execute_unprepared(
            "INSERT INTO alert_types (name, category, is_automatic, validation_config, default_priority_id, created_at) VALUES \
             ('rapid_weight_change', 'weight', TRUE, \
              '{\"rule\": \"weight_change\", \"threshold_percentage\": 5.0, \"period_days\": 30, \"min_samples\": 2}', \
              (SELECT id FROM priority_levels WHERE name = 'high'), NOW()), \
             ('calorie_budget_exceeded', 'nutrition', TRUE, \
              '{\"rule\": \"calorie_budget\", \"daily_limit\": 2500.0, \"period_days\": 7, \"min_samples\": 3}', \
              (SELECT id FROM priority_levels WHERE name = 'medium'), NOW()), \
             ('inactivity', 'activity', TRUE, \
              '{\"rule\": \"inactivity\", \"weekly_minutes\": 150.0, \"period_days\": 7}', \
              (SELECT id FROM priority_levels WHERE name = 'medium'), NOW())",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AlertTypes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AlertStates::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PriorityLevels::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PriorityLevels {
    Table,
    Id,
    Name,
    Rank,
}

#[derive(DeriveIden)]
enum AlertStates {
    Table,
    Id,
    Name,
    IsFinal,
}

#[derive(DeriveIden)]
enum AlertTypes {
    Table,
    Id,
    Name,
    Category,
    IsAutomatic,
    ValidationConfig,
    DefaultPriorityId,
    CreatedAt,
}
