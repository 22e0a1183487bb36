use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::archive::SnapshotDocument;
use super::evaluator::Evaluation;
use super::store::{AlertRefresh, AlertStore, NewAction, NewAlert};
use crate::entities::{alert, alert_action, alert_configuration, alert_type};
use crate::error::{AlertError, Result};

pub const STATE_DETECTED: &str = "detected";
pub const STATE_ACKNOWLEDGED: &str = "acknowledged";
pub const STATE_RESOLVED: &str = "resolved";
pub const STATE_DISMISSED: &str = "dismissed";

/// Reserved action strings. Recording `RESOLUTION_ACTION` through
/// `add_action` is equivalent to calling `resolve`.
pub const RESOLUTION_ACTION: &str = "Alerta resuelta";
pub const DISMISSAL_ACTION: &str = "Alerta descartada";
pub const REEVALUATION_ACTION: &str = "Re-evaluated, condition persists";

#[derive(Clone, Debug)]
pub enum RaiseOutcome {
    /// A fresh alert was created for the pair.
    Created(alert::Model),
    /// An open alert already existed; its audit trail was extended instead.
    Refreshed(alert::Model),
}

impl RaiseOutcome {
    pub fn alert(&self) -> &alert::Model {
        match self {
            RaiseOutcome::Created(a) | RaiseOutcome::Refreshed(a) => a,
        }
    }
}

/// Owns the alert state machine: dedup on raise, doctor actions, atomic
/// resolution, administrative purge.
pub struct AlertLifecycle<S> {
    store: Arc<S>,
}

impl<S> Clone for AlertLifecycle<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: AlertStore> AlertLifecycle<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Raise the evaluation result for the configuration's pair. At most one
    /// open alert may exist per (patient, alert type); losing the insert race
    /// falls back to refreshing the winner, and a winner that was resolved
    /// mid-flight sends us back to inserting a fresh alert.
    pub async fn raise(
        &self,
        config: &alert_configuration::Model,
        evaluation: Evaluation,
    ) -> Result<RaiseOutcome> {
        let alert_type = self.store.alert_type_by_id(config.alert_type_id).await?;
        let priority_id = self
            .priority_for(&alert_type, &config.threshold_config)
            .await?;
        let now = Utc::now().naive_utc();

        loop {
            if let Some(existing) = self
                .store
                .find_open_alert(config.patient_id, config.alert_type_id)
                .await?
            {
                match self
                    .refresh_existing(existing, &alert_type, priority_id, evaluation.clone(), now)
                    .await
                {
                    Ok(outcome) => return Ok(outcome),
                    // Resolved between lookup and refresh; the pair has no
                    // open alert anymore, so raise a fresh one.
                    Err(AlertError::InvalidTransition(_)) => continue,
                    Err(e) => return Err(e),
                }
            }

            let detected = self.store.state_by_name(STATE_DETECTED).await?;
            let new = NewAlert {
                patient_id: config.patient_id,
                doctor_id: config.doctor_id,
                alert_type_id: config.alert_type_id,
                priority_level_id: priority_id,
                alert_state_id: detected.id,
                title: evaluation.title.clone(),
                message: evaluation.message.clone(),
                recommendation_id: None,
                detected_at: now,
            };

            match self.store.insert_alert(new).await {
                Ok(alert) => {
                    let doc = SnapshotDocument::from_evaluation(&alert_type.name, &evaluation, now);
                    self.store.append_snapshot(alert.id, doc.to_json()).await?;
                    metrics::counter!("healthwatch_alerts_raised_total", "alert_type" => alert_type.name.clone())
                        .increment(1);
                    info!(
                        alert_id = %alert.id,
                        patient_id = alert.patient_id,
                        alert_type = %alert_type.name,
                        confidence = evaluation.confidence,
                        "alert created"
                    );
                    return Ok(RaiseOutcome::Created(alert));
                }
                // Another evaluation won the insert; loop back to re-find
                // the winner and refresh it.
                Err(AlertError::Conflict(_)) => continue,
                Err(e) => return Err(e),
            }
        }
    }

    async fn refresh_existing(
        &self,
        existing: alert::Model,
        alert_type: &alert_type::Model,
        priority_id: i32,
        evaluation: Evaluation,
        now: chrono::NaiveDateTime,
    ) -> Result<RaiseOutcome> {
        let previous_confidence = match self.store.latest_snapshot(existing.id).await? {
            Some(snapshot) => SnapshotDocument::confidence_of(&snapshot.document).unwrap_or(0.0),
            None => 0.0,
        };

        // Message/priority only move forward when the new evaluation is at
        // least as confident as the archived one. The write always goes
        // through refresh_alert, so a resolution that slipped in after the
        // lookup surfaces as InvalidTransition instead of this path mutating
        // a final alert.
        let refresh = if evaluation.confidence >= previous_confidence {
            AlertRefresh {
                title: evaluation.title.clone(),
                message: evaluation.message.clone(),
                priority_level_id: priority_id,
            }
        } else {
            AlertRefresh {
                title: existing.title.clone(),
                message: existing.message.clone(),
                priority_level_id: existing.priority_level_id,
            }
        };
        let alert = self.store.refresh_alert(existing.id, refresh).await?;

        self.store
            .append_action(NewAction {
                alert_id: alert.id,
                doctor_id: None,
                action_taken: REEVALUATION_ACTION.to_string(),
                description: Some(format!("confidence {:.2}", evaluation.confidence)),
            })
            .await?;

        let doc = SnapshotDocument::from_evaluation(&alert_type.name, &evaluation, now);
        self.store.append_snapshot(alert.id, doc.to_json()).await?;

        info!(
            alert_id = %alert.id,
            confidence = evaluation.confidence,
            "open alert re-evaluated, condition persists"
        );
        Ok(RaiseOutcome::Refreshed(alert))
    }

    async fn priority_for(
        &self,
        alert_type: &alert_type::Model,
        threshold_config: &Value,
    ) -> Result<i32> {
        match threshold_config.get("priority").and_then(|v| v.as_str()) {
            Some(name) => match self.store.priority_by_name(name).await {
                Ok(priority) => Ok(priority.id),
                Err(AlertError::NotFound(_)) => Err(AlertError::Validation(format!(
                    "unknown priority level '{}' in threshold config",
                    name
                ))),
                Err(e) => Err(e),
            },
            None => Ok(alert_type.default_priority_id),
        }
    }

    /// Append a doctor action. Always permitted; the reserved resolution
    /// action delegates to `resolve` so state and audit stay consistent.
    pub async fn add_action(
        &self,
        alert_id: Uuid,
        doctor_id: i32,
        action_taken: String,
        description: Option<String>,
    ) -> Result<alert_action::Model> {
        if action_taken == RESOLUTION_ACTION {
            let resolved = self.store.state_by_name(STATE_RESOLVED).await?;
            let (_, action) = self
                .store
                .close_alert(
                    alert_id,
                    resolved.id,
                    doctor_id,
                    description,
                    RESOLUTION_ACTION,
                    Utc::now().naive_utc(),
                )
                .await?;
            return Ok(action);
        }

        // Existence check so a bad id is NotFound, not a dangling audit row.
        self.store.get_alert(alert_id).await?;
        self.store
            .append_action(NewAction {
                alert_id,
                doctor_id: Some(doctor_id),
                action_taken,
                description,
            })
            .await
    }

    /// Doctor review: detected -> acknowledged. Intermediate states carry no
    /// special engine behavior.
    pub async fn acknowledge(&self, alert_id: Uuid, doctor_id: i32) -> Result<alert::Model> {
        let acknowledged = self.store.state_by_name(STATE_ACKNOWLEDGED).await?;
        let alert = self.store.update_state(alert_id, acknowledged.id).await?;
        self.store
            .append_action(NewAction {
                alert_id,
                doctor_id: Some(doctor_id),
                action_taken: "acknowledged".to_string(),
                description: None,
            })
            .await?;
        Ok(alert)
    }

    /// Transition to the final resolved state and append the audit action in
    /// one atomic write. Already-final alerts fail with `InvalidTransition`.
    pub async fn resolve(
        &self,
        alert_id: Uuid,
        doctor_id: i32,
        notes: Option<String>,
    ) -> Result<alert::Model> {
        let resolved = self.store.state_by_name(STATE_RESOLVED).await?;
        let (alert, _) = self
            .store
            .close_alert(
                alert_id,
                resolved.id,
                doctor_id,
                notes,
                RESOLUTION_ACTION,
                Utc::now().naive_utc(),
            )
            .await?;
        metrics::counter!("healthwatch_alerts_resolved_total").increment(1);
        info!(alert_id = %alert.id, resolved_by = doctor_id, "alert resolved");
        Ok(alert)
    }

    /// Dismiss from any open state.
    pub async fn dismiss(
        &self,
        alert_id: Uuid,
        doctor_id: i32,
        notes: Option<String>,
    ) -> Result<alert::Model> {
        let dismissed = self.store.state_by_name(STATE_DISMISSED).await?;
        let (alert, _) = self
            .store
            .close_alert(
                alert_id,
                dismissed.id,
                doctor_id,
                notes,
                DISMISSAL_ACTION,
                Utc::now().naive_utc(),
            )
            .await?;
        info!(alert_id = %alert.id, dismissed_by = doctor_id, "alert dismissed");
        Ok(alert)
    }

    /// Administrative purge; cascades to actions and context snapshots.
    pub async fn purge(&self, alert_id: Uuid) -> Result<()> {
        self.store.purge_alert(alert_id).await
    }
}
