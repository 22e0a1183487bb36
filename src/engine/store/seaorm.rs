use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, SqlErr, TransactionTrait,
};
use serde_json::Value;
use uuid::Uuid;

use super::{
    AlertRefresh, AlertStore, ConfigurationUpdate, NewAction, NewAlert, NewConfiguration,
};
use crate::entities::{
    alert, alert_action, alert_configuration, alert_state, alert_type, context_snapshot,
    priority_level,
};
use crate::error::{AlertError, Result};

/// Production store over postgres. All invariant-bearing writes (alert
/// insert, close, snapshot append) lean on database constraints and
/// transactions rather than in-process locking.
#[derive(Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

fn is_unique_violation(e: &sea_orm::DbErr) -> bool {
    matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

#[async_trait]
impl AlertStore for SeaOrmStore {
    async fn alert_type_by_id(&self, id: i32) -> Result<alert_type::Model> {
        alert_type::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AlertError::not_found(format!("alert type {}", id)))
    }

    async fn alert_type_by_name(&self, name: &str) -> Result<alert_type::Model> {
        alert_type::Entity::find()
            .filter(alert_type::Column::Name.eq(name))
            .one(&self.db)
            .await?
            .ok_or_else(|| AlertError::not_found(format!("alert type '{}'", name)))
    }

    async fn state_by_name(&self, name: &str) -> Result<alert_state::Model> {
        alert_state::Entity::find()
            .filter(alert_state::Column::Name.eq(name))
            .one(&self.db)
            .await?
            .ok_or_else(|| AlertError::not_found(format!("alert state '{}'", name)))
    }

    async fn priority_by_name(&self, name: &str) -> Result<priority_level::Model> {
        priority_level::Entity::find()
            .filter(priority_level::Column::Name.eq(name))
            .one(&self.db)
            .await?
            .ok_or_else(|| AlertError::not_found(format!("priority level '{}'", name)))
    }

    async fn create_configuration(
        &self,
        cfg: NewConfiguration,
    ) -> Result<alert_configuration::Model> {
        let now = Utc::now().naive_utc();
        let model = alert_configuration::ActiveModel {
            id: Set(Uuid::new_v4()),
            patient_id: Set(cfg.patient_id),
            alert_type_id: Set(cfg.alert_type_id),
            doctor_id: Set(cfg.doctor_id),
            active: Set(cfg.active),
            threshold_config: Set(cfg.threshold_config),
            verification_frequency_hours: Set(cfg.verification_frequency_hours),
            last_evaluated_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        model.insert(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                AlertError::conflict(format!(
                    "configuration already exists for patient {} and alert type {}",
                    cfg.patient_id, cfg.alert_type_id
                ))
            } else {
                e.into()
            }
        })
    }

    async fn get_configuration(&self, id: Uuid) -> Result<alert_configuration::Model> {
        alert_configuration::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AlertError::not_found(format!("configuration {}", id)))
    }

    async fn update_configuration(
        &self,
        id: Uuid,
        update: ConfigurationUpdate,
    ) -> Result<alert_configuration::Model> {
        let existing = self.get_configuration(id).await?;
        let mut active: alert_configuration::ActiveModel = existing.into();
        if let Some(doctor_id) = update.doctor_id {
            active.doctor_id = Set(Some(doctor_id));
        }
        if let Some(config) = update.threshold_config {
            active.threshold_config = Set(config);
        }
        if let Some(hours) = update.verification_frequency_hours {
            active.verification_frequency_hours = Set(hours);
        }
        active.updated_at = Set(Utc::now().naive_utc());
        Ok(active.update(&self.db).await?)
    }

    async fn toggle_active(&self, id: Uuid) -> Result<alert_configuration::Model> {
        let existing = self.get_configuration(id).await?;
        let flipped = !existing.active;
        let mut active: alert_configuration::ActiveModel = existing.into();
        active.active = Set(flipped);
        active.updated_at = Set(Utc::now().naive_utc());
        Ok(active.update(&self.db).await?)
    }

    async fn list_due(&self, now: NaiveDateTime) -> Result<Vec<alert_configuration::Model>> {
        let active = alert_configuration::Entity::find()
            .filter(alert_configuration::Column::Active.eq(true))
            .all(&self.db)
            .await?;

        // Due predicate applied in process; keeps the interval arithmetic in
        // one place instead of dialect-specific SQL.
        Ok(active
            .into_iter()
            .filter(|cfg| match cfg.last_evaluated_at {
                None => true,
                Some(last) => {
                    last + chrono::Duration::hours(cfg.verification_frequency_hours as i64) <= now
                }
            })
            .collect())
    }

    async fn stamp_evaluated(&self, id: Uuid, at: NaiveDateTime) -> Result<()> {
        let model = alert_configuration::ActiveModel {
            id: Set(id),
            last_evaluated_at: Set(Some(at)),
            ..Default::default()
        };
        alert_configuration::Entity::update(model)
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn get_alert(&self, id: Uuid) -> Result<alert::Model> {
        alert::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AlertError::not_found(format!("alert {}", id)))
    }

    async fn find_open_alert(
        &self,
        patient_id: i32,
        alert_type_id: i32,
    ) -> Result<Option<alert::Model>> {
        Ok(alert::Entity::find()
            .filter(alert::Column::PatientId.eq(patient_id))
            .filter(alert::Column::AlertTypeId.eq(alert_type_id))
            .filter(alert::Column::IsOpen.eq(true))
            .one(&self.db)
            .await?)
    }

    async fn insert_alert(&self, new: NewAlert) -> Result<alert::Model> {
        let now = Utc::now().naive_utc();
        let model = alert::ActiveModel {
            id: Set(Uuid::new_v4()),
            patient_id: Set(new.patient_id),
            doctor_id: Set(new.doctor_id),
            alert_type_id: Set(new.alert_type_id),
            priority_level_id: Set(new.priority_level_id),
            alert_state_id: Set(new.alert_state_id),
            is_open: Set(true),
            title: Set(new.title),
            message: Set(new.message),
            recommendation_id: Set(new.recommendation_id),
            detected_at: Set(new.detected_at),
            resolved_at: Set(None),
            resolved_by: Set(None),
            resolution_notes: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        model.insert(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                AlertError::conflict(format!(
                    "open alert already exists for patient {} and alert type {}",
                    new.patient_id, new.alert_type_id
                ))
            } else {
                e.into()
            }
        })
    }

    async fn refresh_alert(&self, id: Uuid, refresh: AlertRefresh) -> Result<alert::Model> {
        let txn = self.db.begin().await?;

        // Locked check so a resolve committing after the caller's lookup
        // cannot have its final alert rewritten here.
        let existing = alert::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AlertError::not_found(format!("alert {}", id)))?;

        if !existing.is_open {
            txn.rollback().await?;
            return Err(AlertError::InvalidTransition(format!(
                "alert {} is already in a final state",
                id
            )));
        }

        let mut active: alert::ActiveModel = existing.into();
        active.title = Set(refresh.title);
        active.message = Set(refresh.message);
        active.priority_level_id = Set(refresh.priority_level_id);
        active.updated_at = Set(Utc::now().naive_utc());
        let updated = active.update(&txn).await?;

        txn.commit().await?;
        Ok(updated)
    }

    async fn update_state(&self, id: Uuid, state_id: i32) -> Result<alert::Model> {
        let existing = self.get_alert(id).await?;
        if !existing.is_open {
            return Err(AlertError::InvalidTransition(format!(
                "alert {} is already in a final state",
                id
            )));
        }
        let mut active: alert::ActiveModel = existing.into();
        active.alert_state_id = Set(state_id);
        active.updated_at = Set(Utc::now().naive_utc());
        Ok(active.update(&self.db).await?)
    }

    async fn list_alerts_for_patient(&self, patient_id: i32) -> Result<Vec<alert::Model>> {
        Ok(alert::Entity::find()
            .filter(alert::Column::PatientId.eq(patient_id))
            .order_by_desc(alert::Column::DetectedAt)
            .all(&self.db)
            .await?)
    }

    async fn list_alerts_for_doctor(&self, doctor_id: i32) -> Result<Vec<alert::Model>> {
        Ok(alert::Entity::find()
            .filter(alert::Column::DoctorId.eq(doctor_id))
            .order_by_desc(alert::Column::DetectedAt)
            .all(&self.db)
            .await?)
    }

    async fn purge_alert(&self, id: Uuid) -> Result<()> {
        let res = alert::Entity::delete_by_id(id).exec(&self.db).await?;
        if res.rows_affected == 0 {
            return Err(AlertError::not_found(format!("alert {}", id)));
        }
        Ok(())
    }

    async fn close_alert(
        &self,
        id: Uuid,
        final_state_id: i32,
        doctor_id: i32,
        notes: Option<String>,
        action_taken: &str,
        at: NaiveDateTime,
    ) -> Result<(alert::Model, alert_action::Model)> {
        let txn = self.db.begin().await?;

        let existing = alert::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AlertError::not_found(format!("alert {}", id)))?;

        if !existing.is_open {
            txn.rollback().await?;
            return Err(AlertError::InvalidTransition(format!(
                "alert {} is already in a final state",
                id
            )));
        }

        let mut active: alert::ActiveModel = existing.into();
        active.alert_state_id = Set(final_state_id);
        active.is_open = Set(false);
        active.resolved_at = Set(Some(at));
        active.resolved_by = Set(Some(doctor_id));
        active.resolution_notes = Set(notes.clone());
        active.updated_at = Set(at);
        let updated = active.update(&txn).await?;

        let action = alert_action::ActiveModel {
            id: Set(Uuid::new_v4()),
            alert_id: Set(id),
            doctor_id: Set(Some(doctor_id)),
            action_taken: Set(action_taken.to_string()),
            description: Set(notes),
            created_at: Set(at),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok((updated, action))
    }

    async fn append_action(&self, action: NewAction) -> Result<alert_action::Model> {
        let model = alert_action::ActiveModel {
            id: Set(Uuid::new_v4()),
            alert_id: Set(action.alert_id),
            doctor_id: Set(action.doctor_id),
            action_taken: Set(action.action_taken),
            description: Set(action.description),
            created_at: Set(Utc::now().naive_utc()),
        };
        Ok(model.insert(&self.db).await?)
    }

    async fn list_actions(&self, alert_id: Uuid) -> Result<Vec<alert_action::Model>> {
        Ok(alert_action::Entity::find()
            .filter(alert_action::Column::AlertId.eq(alert_id))
            .order_by_asc(alert_action::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    async fn append_snapshot(
        &self,
        alert_id: Uuid,
        document: Value,
    ) -> Result<context_snapshot::Model> {
        let txn = self.db.begin().await?;

        // Serialize version assignment per alert by locking the alert row.
        alert::Entity::find_by_id(alert_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AlertError::not_found(format!("alert {}", alert_id)))?;

        let latest = context_snapshot::Entity::find()
            .filter(context_snapshot::Column::AlertId.eq(alert_id))
            .order_by_desc(context_snapshot::Column::Version)
            .one(&txn)
            .await?;
        let version = latest.map(|s| s.version + 1).unwrap_or(1);

        let model = context_snapshot::ActiveModel {
            id: Set(Uuid::new_v4()),
            alert_id: Set(alert_id),
            version: Set(version),
            document: Set(document),
            created_at: Set(Utc::now().naive_utc()),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(model)
    }

    async fn latest_snapshot(&self, alert_id: Uuid) -> Result<Option<context_snapshot::Model>> {
        Ok(context_snapshot::Entity::find()
            .filter(context_snapshot::Column::AlertId.eq(alert_id))
            .order_by_desc(context_snapshot::Column::Version)
            .one(&self.db)
            .await?)
    }

    async fn snapshot_versions(&self, alert_id: Uuid) -> Result<Vec<context_snapshot::Model>> {
        Ok(context_snapshot::Entity::find()
            .filter(context_snapshot::Column::AlertId.eq(alert_id))
            .order_by_asc(context_snapshot::Column::Version)
            .all(&self.db)
            .await?)
    }
}
