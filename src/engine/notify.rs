use serde::Serialize;

use crate::entities::alert;

#[derive(Serialize)]
struct AlertNotification {
    alert_id: String,
    patient_id: i32,
    doctor_id: Option<i32>,
    alert_type: String,
    title: String,
    message: String,
    detected_at: String,
}

/// Fire-and-forget webhook to the doctor-facing surface whenever a new alert
/// is created. Failures are logged, never propagated into the cycle.
pub struct Notifier {
    client: reqwest::Client,
    webhook_url: String,
}

impl Notifier {
    pub fn new(webhook_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url,
        }
    }

    pub fn from_env() -> Option<Self> {
        std::env::var("DOCTOR_WEBHOOK_URL").ok().map(Self::new)
    }

    pub async fn alert_created(&self, alert: &alert::Model, alert_type_name: &str) {
        let payload = AlertNotification {
            alert_id: alert.id.to_string(),
            patient_id: alert.patient_id,
            doctor_id: alert.doctor_id,
            alert_type: alert_type_name.to_string(),
            title: alert.title.clone(),
            message: alert.message.clone(),
            detected_at: alert.detected_at.to_string(),
        };

        match self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => {
                tracing::info!(alert_id = %alert.id, "alert webhook delivered");
                metrics::counter!("healthwatch_notifications_sent_total").increment(1);
            }
            Ok(resp) => {
                tracing::error!(
                    alert_id = %alert.id,
                    status = %resp.status(),
                    "alert webhook rejected"
                );
                metrics::counter!("healthwatch_notifications_failed_total").increment(1);
            }
            Err(e) => {
                tracing::error!(alert_id = %alert.id, "failed to deliver alert webhook: {}", e);
                metrics::counter!("healthwatch_notifications_failed_total").increment(1);
            }
        }
    }
}
