use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde_json::Value;
use uuid::Uuid;

use crate::entities::{
    alert, alert_action, alert_configuration, alert_state, alert_type, context_snapshot,
    priority_level,
};
use crate::error::Result;

pub mod seaorm;

#[cfg(test)]
pub mod memory;

#[derive(Clone, Debug)]
pub struct NewConfiguration {
    pub patient_id: i32,
    pub alert_type_id: i32,
    pub doctor_id: Option<i32>,
    pub active: bool,
    pub threshold_config: Value,
    pub verification_frequency_hours: i32,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigurationUpdate {
    pub doctor_id: Option<i32>,
    pub threshold_config: Option<Value>,
    pub verification_frequency_hours: Option<i32>,
}

#[derive(Clone, Debug)]
pub struct NewAlert {
    pub patient_id: i32,
    pub doctor_id: Option<i32>,
    pub alert_type_id: i32,
    pub priority_level_id: i32,
    pub alert_state_id: i32,
    pub title: String,
    pub message: String,
    pub recommendation_id: Option<Uuid>,
    pub detected_at: NaiveDateTime,
}

#[derive(Clone, Debug)]
pub struct AlertRefresh {
    pub title: String,
    pub message: String,
    pub priority_level_id: i32,
}

#[derive(Clone, Debug)]
pub struct NewAction {
    pub alert_id: Uuid,
    pub doctor_id: Option<i32>,
    pub action_taken: String,
    pub description: Option<String>,
}

/// Repository seam for everything the engine persists. One production
/// implementation over sea-orm; tests run against an in-memory one. No
/// implicit caching anywhere: dedup and atomic resolve matter more than
/// shaving a read.
#[async_trait]
pub trait AlertStore: Send + Sync {
    // Catalogs (read-mostly).
    async fn alert_type_by_id(&self, id: i32) -> Result<alert_type::Model>;
    async fn alert_type_by_name(&self, name: &str) -> Result<alert_type::Model>;
    async fn state_by_name(&self, name: &str) -> Result<alert_state::Model>;
    async fn priority_by_name(&self, name: &str) -> Result<priority_level::Model>;

    // Configurations.
    async fn create_configuration(
        &self,
        cfg: NewConfiguration,
    ) -> Result<alert_configuration::Model>;
    async fn get_configuration(&self, id: Uuid) -> Result<alert_configuration::Model>;
    async fn update_configuration(
        &self,
        id: Uuid,
        update: ConfigurationUpdate,
    ) -> Result<alert_configuration::Model>;
    async fn toggle_active(&self, id: Uuid) -> Result<alert_configuration::Model>;
    /// Active configurations due for evaluation at `now`.
    async fn list_due(&self, now: NaiveDateTime) -> Result<Vec<alert_configuration::Model>>;
    /// Stamped after every evaluation attempt, success or failure.
    async fn stamp_evaluated(&self, id: Uuid, at: NaiveDateTime) -> Result<()>;

    // Alerts.
    async fn get_alert(&self, id: Uuid) -> Result<alert::Model>;
    async fn find_open_alert(
        &self,
        patient_id: i32,
        alert_type_id: i32,
    ) -> Result<Option<alert::Model>>;
    /// Fails with `Conflict` when an open alert already exists for the pair
    /// (the partial unique index closes the concurrent-raise race).
    async fn insert_alert(&self, alert: NewAlert) -> Result<alert::Model>;
    /// Rewrite title/message/priority of an open alert. `InvalidTransition`
    /// if the alert is already final, so a raise that lost a race against a
    /// resolution can fall back to inserting a fresh alert.
    async fn refresh_alert(&self, id: Uuid, refresh: AlertRefresh) -> Result<alert::Model>;
    /// Move an open alert to another open state. `InvalidTransition` if the
    /// alert is already final.
    async fn update_state(&self, id: Uuid, state_id: i32) -> Result<alert::Model>;
    async fn list_alerts_for_patient(&self, patient_id: i32) -> Result<Vec<alert::Model>>;
    async fn list_alerts_for_doctor(&self, doctor_id: i32) -> Result<Vec<alert::Model>>;
    /// Administrative purge; cascades to actions and snapshots.
    async fn purge_alert(&self, id: Uuid) -> Result<()>;

    /// State transition to a final state plus the audit action, committed
    /// atomically. `InvalidTransition` if the alert is already final.
    async fn close_alert(
        &self,
        id: Uuid,
        final_state_id: i32,
        doctor_id: i32,
        notes: Option<String>,
        action_taken: &str,
        at: NaiveDateTime,
    ) -> Result<(alert::Model, alert_action::Model)>;

    // Actions (append-only).
    async fn append_action(&self, action: NewAction) -> Result<alert_action::Model>;
    async fn list_actions(&self, alert_id: Uuid) -> Result<Vec<alert_action::Model>>;

    // Context snapshots (versioned, immutable).
    async fn append_snapshot(
        &self,
        alert_id: Uuid,
        document: Value,
    ) -> Result<context_snapshot::Model>;
    async fn latest_snapshot(&self, alert_id: Uuid) -> Result<Option<context_snapshot::Model>>;
    async fn snapshot_versions(&self, alert_id: Uuid) -> Result<Vec<context_snapshot::Model>>;
}
