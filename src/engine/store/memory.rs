//! In-memory `AlertStore`/`MetricSource` used by lifecycle and scheduler
//! tests. Mirrors the seeded catalogs from the migrations and enforces the
//! same uniqueness rules the database constraints do.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde_json::{json, Value};
use std::sync::Mutex;
use uuid::Uuid;

use super::{
    AlertRefresh, AlertStore, ConfigurationUpdate, NewAction, NewAlert, NewConfiguration,
};
use crate::engine::source::{MetricSource, MetricWindow};
use crate::entities::{
    alert, alert_action, alert_configuration, alert_state, alert_type, context_snapshot,
    priority_level,
};
use crate::error::{AlertError, Result};

#[derive(Default)]
struct Inner {
    types: Vec<alert_type::Model>,
    states: Vec<alert_state::Model>,
    priorities: Vec<priority_level::Model>,
    configurations: Vec<alert_configuration::Model>,
    alerts: Vec<alert::Model>,
    actions: Vec<alert_action::Model>,
    snapshots: Vec<context_snapshot::Model>,
}

pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let now = Utc::now().naive_utc();
        let priorities = vec![
            priority("low", 1, 2),
            priority("medium", 2, 5),
            priority("high", 3, 8),
            priority("critical", 4, 10),
        ];
        let states = vec![
            state("detected", 1, false),
            state("acknowledged", 2, false),
            state("resolved", 3, true),
            state("dismissed", 4, true),
        ];
        let types = vec![
            alert_type::Model {
                id: 1,
                name: "rapid_weight_change".to_string(),
                category: "weight".to_string(),
                is_automatic: true,
                validation_config: json!({
                    "rule": "weight_change",
                    "threshold_percentage": 5.0,
                    "period_days": 30,
                    "min_samples": 2
                }),
                default_priority_id: 3,
                created_at: now,
            },
            alert_type::Model {
                id: 2,
                name: "calorie_budget_exceeded".to_string(),
                category: "nutrition".to_string(),
                is_automatic: true,
                validation_config: json!({
                    "rule": "calorie_budget",
                    "daily_limit": 2500.0,
                    "period_days": 7,
                    "min_samples": 3
                }),
                default_priority_id: 2,
                created_at: now,
            },
            alert_type::Model {
                id: 3,
                name: "inactivity".to_string(),
                category: "activity".to_string(),
                is_automatic: true,
                validation_config: json!({
                    "rule": "inactivity",
                    "weekly_minutes": 150.0,
                    "period_days": 7
                }),
                default_priority_id: 2,
                created_at: now,
            },
        ];

        Self {
            inner: Mutex::new(Inner {
                types,
                states,
                priorities,
                ..Default::default()
            }),
        }
    }

    /// Test convenience: insert a configuration directly.
    pub fn seed_configuration(
        &self,
        patient_id: i32,
        alert_type_id: i32,
        threshold_config: Value,
        verification_frequency_hours: i32,
        last_evaluated_at: Option<NaiveDateTime>,
    ) -> alert_configuration::Model {
        let now = Utc::now().naive_utc();
        let model = alert_configuration::Model {
            id: Uuid::new_v4(),
            patient_id,
            alert_type_id,
            doctor_id: Some(1),
            active: true,
            threshold_config,
            verification_frequency_hours,
            last_evaluated_at,
            created_at: now,
            updated_at: now,
        };
        let mut inner = self.inner.lock().unwrap();
        inner.configurations.push(model.clone());
        model
    }

    pub fn action_count(&self, alert_id: Uuid, action_taken: &str) -> usize {
        let inner = self.inner.lock().unwrap();
        inner
            .actions
            .iter()
            .filter(|a| a.alert_id == alert_id && a.action_taken == action_taken)
            .count()
    }

    pub fn open_alert_count(&self, patient_id: i32, alert_type_id: i32) -> usize {
        let inner = self.inner.lock().unwrap();
        inner
            .alerts
            .iter()
            .filter(|a| a.patient_id == patient_id && a.alert_type_id == alert_type_id && a.is_open)
            .count()
    }
}

fn priority(name: &str, id: i32, rank: i16) -> priority_level::Model {
    priority_level::Model {
        id,
        name: name.to_string(),
        rank,
    }
}

fn state(name: &str, id: i32, is_final: bool) -> alert_state::Model {
    alert_state::Model {
        id,
        name: name.to_string(),
        is_final,
    }
}

#[async_trait]
impl AlertStore for MemoryStore {
    async fn alert_type_by_id(&self, id: i32) -> Result<alert_type::Model> {
        let inner = self.inner.lock().unwrap();
        inner
            .types
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| AlertError::not_found(format!("alert type {}", id)))
    }

    async fn alert_type_by_name(&self, name: &str) -> Result<alert_type::Model> {
        let inner = self.inner.lock().unwrap();
        inner
            .types
            .iter()
            .find(|t| t.name == name)
            .cloned()
            .ok_or_else(|| AlertError::not_found(format!("alert type '{}'", name)))
    }

    async fn state_by_name(&self, name: &str) -> Result<alert_state::Model> {
        let inner = self.inner.lock().unwrap();
        inner
            .states
            .iter()
            .find(|s| s.name == name)
            .cloned()
            .ok_or_else(|| AlertError::not_found(format!("alert state '{}'", name)))
    }

    async fn priority_by_name(&self, name: &str) -> Result<priority_level::Model> {
        let inner = self.inner.lock().unwrap();
        inner
            .priorities
            .iter()
            .find(|p| p.name == name)
            .cloned()
            .ok_or_else(|| AlertError::not_found(format!("priority level '{}'", name)))
    }

    async fn create_configuration(
        &self,
        cfg: NewConfiguration,
    ) -> Result<alert_configuration::Model> {
        let now = Utc::now().naive_utc();
        let mut inner = self.inner.lock().unwrap();
        if inner
            .configurations
            .iter()
            .any(|c| c.patient_id == cfg.patient_id && c.alert_type_id == cfg.alert_type_id)
        {
            return Err(AlertError::conflict(format!(
                "configuration already exists for patient {} and alert type {}",
                cfg.patient_id, cfg.alert_type_id
            )));
        }
        let model = alert_configuration::Model {
            id: Uuid::new_v4(),
            patient_id: cfg.patient_id,
            alert_type_id: cfg.alert_type_id,
            doctor_id: cfg.doctor_id,
            active: cfg.active,
            threshold_config: cfg.threshold_config,
            verification_frequency_hours: cfg.verification_frequency_hours,
            last_evaluated_at: None,
            created_at: now,
            updated_at: now,
        };
        inner.configurations.push(model.clone());
        Ok(model)
    }

    async fn get_configuration(&self, id: Uuid) -> Result<alert_configuration::Model> {
        let inner = self.inner.lock().unwrap();
        inner
            .configurations
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| AlertError::not_found(format!("configuration {}", id)))
    }

    async fn update_configuration(
        &self,
        id: Uuid,
        update: ConfigurationUpdate,
    ) -> Result<alert_configuration::Model> {
        let mut inner = self.inner.lock().unwrap();
        let cfg = inner
            .configurations
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| AlertError::not_found(format!("configuration {}", id)))?;
        if let Some(doctor_id) = update.doctor_id {
            cfg.doctor_id = Some(doctor_id);
        }
        if let Some(config) = update.threshold_config {
            cfg.threshold_config = config;
        }
        if let Some(hours) = update.verification_frequency_hours {
            cfg.verification_frequency_hours = hours;
        }
        cfg.updated_at = Utc::now().naive_utc();
        Ok(cfg.clone())
    }

    async fn toggle_active(&self, id: Uuid) -> Result<alert_configuration::Model> {
        let mut inner = self.inner.lock().unwrap();
        let cfg = inner
            .configurations
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| AlertError::not_found(format!("configuration {}", id)))?;
        cfg.active = !cfg.active;
        cfg.updated_at = Utc::now().naive_utc();
        Ok(cfg.clone())
    }

    async fn list_due(&self, now: NaiveDateTime) -> Result<Vec<alert_configuration::Model>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .configurations
            .iter()
            .filter(|cfg| {
                cfg.active
                    && match cfg.last_evaluated_at {
                        None => true,
                        Some(last) => {
                            last + chrono::Duration::hours(
                                cfg.verification_frequency_hours as i64,
                            ) <= now
                        }
                    }
            })
            .cloned()
            .collect())
    }

    async fn stamp_evaluated(&self, id: Uuid, at: NaiveDateTime) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let cfg = inner
            .configurations
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| AlertError::not_found(format!("configuration {}", id)))?;
        cfg.last_evaluated_at = Some(at);
        Ok(())
    }

    async fn get_alert(&self, id: Uuid) -> Result<alert::Model> {
        let inner = self.inner.lock().unwrap();
        inner
            .alerts
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| AlertError::not_found(format!("alert {}", id)))
    }

    async fn find_open_alert(
        &self,
        patient_id: i32,
        alert_type_id: i32,
    ) -> Result<Option<alert::Model>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .alerts
            .iter()
            .find(|a| a.patient_id == patient_id && a.alert_type_id == alert_type_id && a.is_open)
            .cloned())
    }

    async fn insert_alert(&self, new: NewAlert) -> Result<alert::Model> {
        let now = Utc::now().naive_utc();
        let mut inner = self.inner.lock().unwrap();
        if inner
            .alerts
            .iter()
            .any(|a| a.patient_id == new.patient_id && a.alert_type_id == new.alert_type_id && a.is_open)
        {
            return Err(AlertError::conflict(format!(
                "open alert already exists for patient {} and alert type {}",
                new.patient_id, new.alert_type_id
            )));
        }
        let model = alert::Model {
            id: Uuid::new_v4(),
            patient_id: new.patient_id,
            doctor_id: new.doctor_id,
            alert_type_id: new.alert_type_id,
            priority_level_id: new.priority_level_id,
            alert_state_id: new.alert_state_id,
            is_open: true,
            title: new.title,
            message: new.message,
            recommendation_id: new.recommendation_id,
            detected_at: new.detected_at,
            resolved_at: None,
            resolved_by: None,
            resolution_notes: None,
            created_at: now,
            updated_at: now,
        };
        inner.alerts.push(model.clone());
        Ok(model)
    }

    async fn refresh_alert(&self, id: Uuid, refresh: AlertRefresh) -> Result<alert::Model> {
        let mut inner = self.inner.lock().unwrap();
        let alert = inner
            .alerts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| AlertError::not_found(format!("alert {}", id)))?;
        if !alert.is_open {
            return Err(AlertError::InvalidTransition(format!(
                "alert {} is already in a final state",
                id
            )));
        }
        alert.title = refresh.title;
        alert.message = refresh.message;
        alert.priority_level_id = refresh.priority_level_id;
        alert.updated_at = Utc::now().naive_utc();
        Ok(alert.clone())
    }

    async fn update_state(&self, id: Uuid, state_id: i32) -> Result<alert::Model> {
        let mut inner = self.inner.lock().unwrap();
        let alert = inner
            .alerts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| AlertError::not_found(format!("alert {}", id)))?;
        if !alert.is_open {
            return Err(AlertError::InvalidTransition(format!(
                "alert {} is already in a final state",
                id
            )));
        }
        alert.alert_state_id = state_id;
        alert.updated_at = Utc::now().naive_utc();
        Ok(alert.clone())
    }

    async fn list_alerts_for_patient(&self, patient_id: i32) -> Result<Vec<alert::Model>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .alerts
            .iter()
            .filter(|a| a.patient_id == patient_id)
            .cloned()
            .collect())
    }

    async fn list_alerts_for_doctor(&self, doctor_id: i32) -> Result<Vec<alert::Model>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .alerts
            .iter()
            .filter(|a| a.doctor_id == Some(doctor_id))
            .cloned()
            .collect())
    }

    async fn purge_alert(&self, id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.alerts.len();
        inner.alerts.retain(|a| a.id != id);
        if inner.alerts.len() == before {
            return Err(AlertError::not_found(format!("alert {}", id)));
        }
        inner.actions.retain(|a| a.alert_id != id);
        inner.snapshots.retain(|s| s.alert_id != id);
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
        // Both writes happen under the same lock, mirroring the transactional
        // path in the sea-orm store.
        let mut inner = self.inner.lock().unwrap();
        let alert = inner
            .alerts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| AlertError::not_found(format!("alert {}", id)))?;
        if !alert.is_open {
            return Err(AlertError::InvalidTransition(format!(
                "alert {} is already in a final state",
                id
            )));
        }
        alert.alert_state_id = final_state_id;
        alert.is_open = false;
        alert.resolved_at = Some(at);
        alert.resolved_by = Some(doctor_id);
        alert.resolution_notes = notes.clone();
        alert.updated_at = at;
        let updated = alert.clone();

        let action = alert_action::Model {
            id: Uuid::new_v4(),
            alert_id: id,
            doctor_id: Some(doctor_id),
            action_taken: action_taken.to_string(),
            description: notes,
            created_at: at,
        };
        inner.actions.push(action.clone());
        Ok((updated, action))
    }

    async fn append_action(&self, action: NewAction) -> Result<alert_action::Model> {
        let mut inner = self.inner.lock().unwrap();
        let model = alert_action::Model {
            id: Uuid::new_v4(),
            alert_id: action.alert_id,
            doctor_id: action.doctor_id,
            action_taken: action.action_taken,
            description: action.description,
            created_at: Utc::now().naive_utc(),
        };
        inner.actions.push(model.clone());
        Ok(model)
    }

    async fn list_actions(&self, alert_id: Uuid) -> Result<Vec<alert_action::Model>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .actions
            .iter()
            .filter(|a| a.alert_id == alert_id)
            .cloned()
            .collect())
    }

    async fn append_snapshot(
        &self,
        alert_id: Uuid,
        document: Value,
    ) -> Result<context_snapshot::Model> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.alerts.iter().any(|a| a.id == alert_id) {
            return Err(AlertError::not_found(format!("alert {}", alert_id)));
        }
        let version = inner
            .snapshots
            .iter()
            .filter(|s| s.alert_id == alert_id)
            .map(|s| s.version)
            .max()
            .unwrap_or(0)
            + 1;
        let model = context_snapshot::Model {
            id: Uuid::new_v4(),
            alert_id,
            version,
            document,
            created_at: Utc::now().naive_utc(),
        };
        inner.snapshots.push(model.clone());
        Ok(model)
    }

    async fn latest_snapshot(&self, alert_id: Uuid) -> Result<Option<context_snapshot::Model>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .snapshots
            .iter()
            .filter(|s| s.alert_id == alert_id)
            .max_by_key(|s| s.version)
            .cloned())
    }

    async fn snapshot_versions(&self, alert_id: Uuid) -> Result<Vec<context_snapshot::Model>> {
        let inner = self.inner.lock().unwrap();
        let mut versions: Vec<_> = inner
            .snapshots
            .iter()
            .filter(|s| s.alert_id == alert_id)
            .cloned()
            .collect();
        versions.sort_by_key(|s| s.version);
        Ok(versions)
    }
}

/// Metric source returning a fixed window for every patient.
pub struct FixedMetricSource {
    window: MetricWindow,
}

impl FixedMetricSource {
    pub fn new(window: MetricWindow) -> Self {
        Self { window }
    }
}

#[async_trait]
impl MetricSource for FixedMetricSource {
    async fn fetch_window(
        &self,
        _patient_id: i32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<MetricWindow> {
        let mut window = self.window.clone();
        window.start = start;
        window.end = end;
        Ok(window)
    }
}

/// Metric source that always fails, for skip-on-unavailable tests.
pub struct FailingMetricSource;

#[async_trait]
impl MetricSource for FailingMetricSource {
    async fn fetch_window(
        &self,
        _patient_id: i32,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<MetricWindow> {
        Err(AlertError::SourceUnavailable(
            "metric source offline".to_string(),
        ))
    }
}
