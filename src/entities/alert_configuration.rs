use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-(patient, alert type) monitoring configuration. Unique on the pair;
/// disabled by flipping `active`, never deleted while history references it.
/// `last_evaluated_at` is stamped by the scheduler after every attempt.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "alert_configurations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub patient_id: i32,
    pub alert_type_id: i32,
    pub doctor_id: Option<i32>,
    pub active: bool,
    pub threshold_config: Json,
    pub verification_frequency_hours: i32,
    pub last_evaluated_at: Option<DateTime>,
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
}

impl Related<super::alert_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AlertType.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
