use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Immutable catalog of monitored conditions. `validation_config` holds the
/// default rule parameters the evaluator overlays with per-patient thresholds.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "alert_types")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub category: String,
    pub is_automatic: bool,
    pub validation_config: Json,
    pub default_priority_id: i32,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::priority_level::Entity",
        from = "Column::DefaultPriorityId",
        to = "super::priority_level::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    DefaultPriority,
}

impl Related<super::priority_level::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DefaultPriority.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
