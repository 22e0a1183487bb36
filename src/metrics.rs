use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};

use crate::entities::{alert, alert_configuration, alert_type};

/// Seed the dashboard gauges from current table counts at startup. Counters
/// (raised, resolved, evaluations) are incremented at the call sites.
pub async fn init_metrics(db: &DatabaseConnection) {
    let active_configs = alert_configuration::Entity::find()
        .filter(alert_configuration::Column::Active.eq(true))
        .count(db)
        .await
        .unwrap_or(0);
    metrics::gauge!("healthwatch_active_configurations_total").set(active_configs as f64);

    let open_alerts = alert::Entity::find()
        .filter(alert::Column::IsOpen.eq(true))
        .count(db)
        .await
        .unwrap_or(0);
    metrics::gauge!("healthwatch_open_alerts_total").set(open_alerts as f64);

    // Per-type breakdown for the triage dashboard.
    let types = alert_type::Entity::find().all(db).await.unwrap_or_default();
    for t in types {
        let count = alert::Entity::find()
            .filter(alert::Column::AlertTypeId.eq(t.id))
            .filter(alert::Column::IsOpen.eq(true))
            .count(db)
            .await
            .unwrap_or(0);
        metrics::gauge!("healthwatch_open_alerts_by_type", "alert_type" => t.name)
            .set(count as f64);
    }

    tracing::info!(
        "Initialized metrics: active configurations={}, open alerts={}",
        active_configs,
        open_alerts
    );
}
