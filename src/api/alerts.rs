use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::engine::lifecycle::AlertLifecycle;
use crate::engine::store::seaorm::SeaOrmStore;
use crate::engine::store::AlertStore;
use crate::entities::{alert, context_snapshot};
use crate::error::{AlertError, Result};

#[derive(Serialize)]
pub struct AlertResponse {
    pub id: Uuid,
    pub patient_id: i32,
    pub doctor_id: Option<i32>,
    pub alert_type_id: i32,
    pub priority_level_id: i32,
    pub alert_state_id: i32,
    pub is_open: bool,
    pub title: String,
    pub message: String,
    pub detected_at: chrono::NaiveDateTime,
    pub resolved_at: Option<chrono::NaiveDateTime>,
    pub resolved_by: Option<i32>,
    pub resolution_notes: Option<String>,
    pub created_at: chrono::NaiveDateTime,
}

impl From<alert::Model> for AlertResponse {
    fn from(alert: alert::Model) -> Self {
        Self {
            id: alert.id,
            patient_id: alert.patient_id,
            doctor_id: alert.doctor_id,
            alert_type_id: alert.alert_type_id,
            priority_level_id: alert.priority_level_id,
            alert_state_id: alert.alert_state_id,
            is_open: alert.is_open,
            title: alert.title,
            message: alert.message,
            detected_at: alert.detected_at,
            resolved_at: alert.resolved_at,
            resolved_by: alert.resolved_by,
            resolution_notes: alert.resolution_notes,
            created_at: alert.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct SnapshotResponse {
    pub version: i32,
    pub created_at: chrono::NaiveDateTime,
    pub document: serde_json::Value,
}

impl From<context_snapshot::Model> for SnapshotResponse {
    fn from(snapshot: context_snapshot::Model) -> Self {
        Self {
            version: snapshot.version,
            created_at: snapshot.created_at,
            document: snapshot.document,
        }
    }
}

#[derive(Deserialize)]
pub struct DoctorRequest {
    pub doctor_id: i32,
}

#[derive(Deserialize)]
pub struct ActionRequest {
    pub doctor_id: i32,
    pub action_taken: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct CloseRequest {
    pub doctor_id: i32,
    pub notes: Option<String>,
}

// GET /patients/:id/alerts
pub async fn list_patient_alerts(
    Extension(store): Extension<Arc<SeaOrmStore>>,
    Path(patient_id): Path<i32>,
) -> Result<impl IntoResponse> {
    let alerts = store.list_alerts_for_patient(patient_id).await?;
    let response: Vec<AlertResponse> = alerts.into_iter().map(Into::into).collect();
    Ok(Json(response))
}

// GET /doctors/:id/alerts
pub async fn list_doctor_alerts(
    Extension(store): Extension<Arc<SeaOrmStore>>,
    Path(doctor_id): Path<i32>,
) -> Result<impl IntoResponse> {
    let alerts = store.list_alerts_for_doctor(doctor_id).await?;
    let response: Vec<AlertResponse> = alerts.into_iter().map(Into::into).collect();
    Ok(Json(response))
}

// GET /alerts/:id
pub async fn get_alert(
    Extension(store): Extension<Arc<SeaOrmStore>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let alert = store.get_alert(id).await?;
    Ok(Json(AlertResponse::from(alert)))
}

// POST /alerts/:id/acknowledge
pub async fn acknowledge_alert(
    Extension(lifecycle): Extension<AlertLifecycle<SeaOrmStore>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DoctorRequest>,
) -> Result<impl IntoResponse> {
    let alert = lifecycle.acknowledge(id, payload.doctor_id).await?;
    Ok(Json(AlertResponse::from(alert)))
}

// POST /alerts/:id/actions
pub async fn create_action(
    Extension(lifecycle): Extension<AlertLifecycle<SeaOrmStore>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ActionRequest>,
) -> Result<impl IntoResponse> {
    if payload.action_taken.trim().is_empty() {
        return Err(AlertError::validation("action_taken must not be empty"));
    }
    let action = lifecycle
        .add_action(id, payload.doctor_id, payload.action_taken, payload.description)
        .await?;
    Ok((StatusCode::CREATED, Json(action)))
}

// GET /alerts/:id/actions
pub async fn list_actions(
    Extension(store): Extension<Arc<SeaOrmStore>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    store.get_alert(id).await?;
    let actions = store.list_actions(id).await?;
    Ok(Json(actions))
}

// POST /alerts/:id/resolve
pub async fn resolve_alert(
    Extension(lifecycle): Extension<AlertLifecycle<SeaOrmStore>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CloseRequest>,
) -> Result<impl IntoResponse> {
    let alert = lifecycle
        .resolve(id, payload.doctor_id, payload.notes)
        .await?;
    Ok(Json(AlertResponse::from(alert)))
}

// POST /alerts/:id/dismiss
pub async fn dismiss_alert(
    Extension(lifecycle): Extension<AlertLifecycle<SeaOrmStore>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CloseRequest>,
) -> Result<impl IntoResponse> {
    let alert = lifecycle
        .dismiss(id, payload.doctor_id, payload.notes)
        .await?;
    Ok(Json(AlertResponse::from(alert)))
}

// GET /alerts/:id/context
pub async fn get_context(
    Extension(store): Extension<Arc<SeaOrmStore>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    store.get_alert(id).await?;
    let snapshot = store
        .latest_snapshot(id)
        .await?
        .ok_or_else(|| AlertError::not_found(format!("no context snapshot for alert {}", id)))?;
    Ok(Json(SnapshotResponse::from(snapshot)))
}

// GET /alerts/:id/context/versions
pub async fn list_context_versions(
    Extension(store): Extension<Arc<SeaOrmStore>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    store.get_alert(id).await?;
    let versions = store.snapshot_versions(id).await?;
    let response: Vec<SnapshotResponse> = versions.into_iter().map(Into::into).collect();
    Ok(Json(response))
}

// DELETE /alerts/:id
pub async fn purge_alert(
    Extension(lifecycle): Extension<AlertLifecycle<SeaOrmStore>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    lifecycle.purge(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
