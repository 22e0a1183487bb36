use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Daily nutrition total, owned by the nutrition surface. Read-only here.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "nutrition_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub patient_id: i32,
    pub consumed_on: Date,
    #[sea_orm(column_type = "Double")]
    pub total_calories: f64,
    pub meal_type: String,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
