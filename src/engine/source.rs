use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};

use crate::entities::{activity_log, nutrition_log, weight_entry};
use crate::error::{AlertError, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeightPoint {
    pub date: NaiveDate,
    pub weight_kg: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NutritionPoint {
    pub date: NaiveDate,
    pub total_calories: f64,
    pub meal_type: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActivityPoint {
    pub date: NaiveDate,
    pub duration_minutes: i32,
    pub activity_type: String,
}

/// The exact slice of time-series facts one evaluation ran against. Embedded
/// verbatim in the context snapshot so the decision stays reproducible after
/// the live data moves on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub weights: Vec<WeightPoint>,
    pub nutrition: Vec<NutritionPoint>,
    pub activity: Vec<ActivityPoint>,
}

impl MetricWindow {
    pub fn empty(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            weights: Vec::new(),
            nutrition: Vec::new(),
            activity: Vec::new(),
        }
    }
}

/// Read-only access to health time-series for one patient over a date range.
/// Failures surface as `SourceUnavailable` so the scheduler can skip the
/// configuration for the cycle instead of aborting it.
#[async_trait]
pub trait MetricSource: Send + Sync {
    async fn fetch_window(
        &self,
        patient_id: i32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<MetricWindow>;
}

#[derive(Clone)]
pub struct SeaOrmMetricSource {
    db: DatabaseConnection,
}

impl SeaOrmMetricSource {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn unavailable(e: sea_orm::DbErr) -> AlertError {
    AlertError::SourceUnavailable(e.to_string())
}

#[async_trait]
impl MetricSource for SeaOrmMetricSource {
    async fn fetch_window(
        &self,
        patient_id: i32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<MetricWindow> {
        let weights = weight_entry::Entity::find()
            .filter(weight_entry::Column::PatientId.eq(patient_id))
            .filter(weight_entry::Column::RecordedOn.gte(start))
            .filter(weight_entry::Column::RecordedOn.lte(end))
            .order_by_asc(weight_entry::Column::RecordedOn)
            .all(&self.db)
            .await
            .map_err(unavailable)?
            .into_iter()
            .map(|w| WeightPoint {
                date: w.recorded_on,
                weight_kg: w.weight_kg,
            })
            .collect();

        let nutrition = nutrition_log::Entity::find()
            .filter(nutrition_log::Column::PatientId.eq(patient_id))
            .filter(nutrition_log::Column::ConsumedOn.gte(start))
            .filter(nutrition_log::Column::ConsumedOn.lte(end))
            .order_by_asc(nutrition_log::Column::ConsumedOn)
            .all(&self.db)
            .await
            .map_err(unavailable)?
            .into_iter()
            .map(|n| NutritionPoint {
                date: n.consumed_on,
                total_calories: n.total_calories,
                meal_type: n.meal_type,
            })
            .collect();

        let activity = activity_log::Entity::find()
            .filter(activity_log::Column::PatientId.eq(patient_id))
            .filter(activity_log::Column::PerformedOn.gte(start))
            .filter(activity_log::Column::PerformedOn.lte(end))
            .order_by_asc(activity_log::Column::PerformedOn)
            .all(&self.db)
            .await
            .map_err(unavailable)?
            .into_iter()
            .map(|a| ActivityPoint {
                date: a.performed_on,
                duration_minutes: a.duration_minutes,
                activity_type: a.activity_type,
            })
            .collect();

        Ok(MetricWindow {
            start,
            end,
            weights,
            nutrition,
            activity,
        })
    }
}
