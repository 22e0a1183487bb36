use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ContextSnapshots::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ContextSnapshots::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ContextSnapshots::AlertId).uuid().not_null())
                    .col(ColumnDef::new(ContextSnapshots::Version).integer().not_null())
                    .col(ColumnDef::new(ContextSnapshots::Document).json().not_null())
                    .col(
                        ColumnDef::new(ContextSnapshots::CreatedAt)
                            .date_time()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ContextSnapshots::Table, ContextSnapshots::AlertId)
                            .to(Alerts::Table, Alerts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_context_snapshots_version")
                    .table(ContextSnapshots::Table)
                    .col(ContextSnapshots::AlertId)
                    .col(ContextSnapshots::Version)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ContextSnapshots::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ContextSnapshots {
    Table,
    Id,
    AlertId,
    Version,
    Document,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Alerts {
    Table,
    Id,
}
