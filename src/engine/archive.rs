use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::evaluator::Evaluation;
use super::rules::Algorithm;
use super::source::MetricWindow;

/// The archived evidence behind one detection event: the exact input window,
/// the algorithm identity and parameters, and the computed confidence.
/// Written once per version and never rewritten; re-evaluations append the
/// next version instead of overwriting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    pub alert_type: String,
    pub algorithm: Algorithm,
    pub parameters: Value,
    pub confidence: f64,
    pub window: MetricWindow,
    pub evaluated_at: NaiveDateTime,
}

impl SnapshotDocument {
    pub fn from_evaluation(
        alert_type: &str,
        evaluation: &Evaluation,
        evaluated_at: NaiveDateTime,
    ) -> Self {
        Self {
            alert_type: alert_type.to_string(),
            algorithm: evaluation.algorithm.clone(),
            parameters: evaluation.parameters.clone(),
            confidence: evaluation.confidence,
            window: evaluation.window.clone(),
            evaluated_at,
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Confidence recorded in an archived document, tolerating documents
    /// written by newer algorithm versions with extra fields.
    pub fn confidence_of(document: &Value) -> Option<f64> {
        document.get("confidence").and_then(|v| v.as_f64())
    }
}
