use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::engine::rules;
use crate::engine::store::seaorm::SeaOrmStore;
use crate::engine::store::{AlertStore, ConfigurationUpdate, NewConfiguration};
use crate::error::{AlertError, Result};

fn default_active() -> bool {
    true
}

fn empty_object() -> serde_json::Value {
    serde_json::json!({})
}

#[derive(Deserialize)]
pub struct CreateConfigurationRequest {
    pub patient_id: i32,
    pub alert_type_id: i32,
    pub doctor_id: Option<i32>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default = "empty_object")]
    pub threshold_config: serde_json::Value,
    pub verification_frequency_hours: i32,
}

#[derive(Deserialize, Default)]
pub struct UpdateConfigurationRequest {
    pub doctor_id: Option<i32>,
    pub threshold_config: Option<serde_json::Value>,
    pub verification_frequency_hours: Option<i32>,
}

// POST /configurations
pub async fn create_configuration(
    Extension(store): Extension<Arc<SeaOrmStore>>,
    Json(payload): Json<CreateConfigurationRequest>,
) -> Result<impl IntoResponse> {
    if payload.patient_id < 1 {
        return Err(AlertError::validation("patient_id must be positive"));
    }
    if payload.verification_frequency_hours < 1 {
        return Err(AlertError::validation(
            "verification_frequency_hours must be at least 1",
        ));
    }

    // An unknown alert type is a caller mistake, not a missing resource.
    let alert_type = match store.alert_type_by_id(payload.alert_type_id).await {
        Ok(t) => t,
        Err(AlertError::NotFound(_)) => {
            return Err(AlertError::Validation(format!(
                "unknown alert type {}",
                payload.alert_type_id
            )))
        }
        Err(e) => return Err(e),
    };

    // Reject malformed thresholds up front; rules the engine does not code
    // yet are accepted and skipped at evaluation time.
    rules::parse_rule(&alert_type.validation_config, &payload.threshold_config)?;

    let config = store
        .create_configuration(NewConfiguration {
            patient_id: payload.patient_id,
            alert_type_id: payload.alert_type_id,
            doctor_id: payload.doctor_id,
            active: payload.active,
            threshold_config: payload.threshold_config,
            verification_frequency_hours: payload.verification_frequency_hours,
        })
        .await?;

    info!(
        configuration_id = %config.id,
        patient_id = config.patient_id,
        alert_type = %alert_type.name,
        "alert configuration created"
    );
    Ok((StatusCode::CREATED, Json(config)))
}

// GET /configurations/:id
pub async fn get_configuration(
    Extension(store): Extension<Arc<SeaOrmStore>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let config = store.get_configuration(id).await?;
    Ok(Json(config))
}

// PATCH /configurations/:id
pub async fn update_configuration(
    Extension(store): Extension<Arc<SeaOrmStore>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateConfigurationRequest>,
) -> Result<impl IntoResponse> {
    if let Some(hours) = payload.verification_frequency_hours {
        if hours < 1 {
            return Err(AlertError::validation(
                "verification_frequency_hours must be at least 1",
            ));
        }
    }

    if let Some(threshold_config) = &payload.threshold_config {
        let existing = store.get_configuration(id).await?;
        let alert_type = store.alert_type_by_id(existing.alert_type_id).await?;
        rules::parse_rule(&alert_type.validation_config, threshold_config)?;
    }

    let config = store
        .update_configuration(
            id,
            ConfigurationUpdate {
                doctor_id: payload.doctor_id,
                threshold_config: payload.threshold_config,
                verification_frequency_hours: payload.verification_frequency_hours,
            },
        )
        .await?;

    info!(configuration_id = %config.id, "alert configuration updated");
    Ok(Json(config))
}

// POST /configurations/:id/toggle
pub async fn toggle_configuration(
    Extension(store): Extension<Arc<SeaOrmStore>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let config = store.toggle_active(id).await?;
    info!(
        configuration_id = %config.id,
        active = config.active,
        "alert configuration toggled"
    );
    Ok(Json(config))
}
