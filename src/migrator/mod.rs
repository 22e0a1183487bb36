use sea_orm_migration::prelude::*;

mod m20260805_000001_create_catalogs;
mod m20260805_000002_create_metric_tables;
mod m20260806_000001_create_alert_configurations;
mod m20260807_000001_create_alerts;
mod m20260808_000001_create_context_snapshots;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260805_000001_create_catalogs::Migration),
            Box::new(m20260805_000002_create_metric_tables::Migration),
            Box::new(m20260806_000001_create_alert_configurations::Migration),
            Box::new(m20260807_000001_create_alerts::Migration),
            Box::new(m20260808_000001_create_context_snapshots::Migration),
        ]
    }
}
