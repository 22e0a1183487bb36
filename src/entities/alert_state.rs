use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle state catalog. `is_final` marks terminal states (resolved,
/// dismissed) after which re-evaluation creates a fresh alert.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "alert_states")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub is_final: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
