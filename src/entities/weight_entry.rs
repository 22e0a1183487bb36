use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Weight history fact, owned by the patient-records surface. The engine
/// only reads these through the metric source adapter.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "weight_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub patient_id: i32,
    pub recorded_on: Date,
    #[sea_orm(column_type = "Double")]
    pub weight_kg: f64,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
