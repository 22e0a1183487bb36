use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The lifecycle record. `is_open` mirrors "state is non-final" and is
/// updated in the same write as every state transition; a partial unique
/// index on (patient_id, alert_type_id) WHERE is_open guarantees at most one
/// open alert per pair at the storage level.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "alerts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub patient_id: i32,
    pub doctor_id: Option<i32>,
    pub alert_type_id: i32,
    pub priority_level_id: i32,
    pub alert_state_id: i32,
    pub is_open: bool,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    pub recommendation_id: Option<Uuid>,
    pub detected_at: DateTime,
    pub resolved_at: Option<DateTime>,
    pub resolved_by: Option<i32>,
    #[sea_orm(column_type = "Text", nullable)]
    pub resolution_notes: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::alert_type::Entity",
        from = "Column::AlertTypeId",
        to = "super::alert_type::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    AlertType,
    #[sea_orm(
        belongs_to = "super::priority_level::Entity",
        from = "Column::PriorityLevelId",
        to = "super::priority_level::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    PriorityLevel,
    #[sea_orm(
        belongs_to = "super::alert_state::Entity",
        from = "Column::AlertStateId",
        to = "super::alert_state::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    AlertState,
    #[sea_orm(has_many = "super::alert_action::Entity")]
    Actions,
    #[sea_orm(has_many = "super::context_snapshot::Entity")]
    Snapshots,
}

impl Related<super::alert_action::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Actions.def()
    }
}

impl Related<super::context_snapshot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Snapshots.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
