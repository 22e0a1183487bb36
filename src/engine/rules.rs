use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AlertError, Result};

/// Identity of the detection algorithm that produced an evaluation, recorded
/// in every context snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Algorithm {
    pub name: String,
    pub version: String,
}

impl Algorithm {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
        }
    }
}

fn default_weight_min_samples() -> usize {
    2
}

fn default_calorie_min_samples() -> usize {
    3
}

fn default_inactivity_period() -> i64 {
    7
}

/// Typed threshold rule, pattern-matched by the evaluator instead of poking
/// at untyped JSON at evaluation time. The `rule` tag selects the variant;
/// parameters come from the alert type's `validation_config` defaults
/// overlaid with the configuration's `threshold_config`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ThresholdRule {
    /// Latest value vs the value `period_days` earlier (earliest in the
    /// window when sparse); fires on |percent change| >= threshold.
    WeightChange {
        threshold_percentage: f64,
        period_days: i64,
        #[serde(default = "default_weight_min_samples")]
        min_samples: usize,
    },
    /// Mean daily calories over the window above the limit.
    CalorieBudget {
        daily_limit: f64,
        period_days: i64,
        #[serde(default = "default_calorie_min_samples")]
        min_samples: usize,
    },
    /// Summed activity minutes below the floor; no entries counts as zero.
    Inactivity {
        weekly_minutes: f64,
        #[serde(default = "default_inactivity_period")]
        period_days: i64,
    },
}

const KNOWN_RULES: &[&str] = &["weight_change", "calorie_budget", "inactivity"];

impl ThresholdRule {
    /// Days of history the evaluation window must cover.
    pub fn period_days(&self) -> i64 {
        match self {
            ThresholdRule::WeightChange { period_days, .. } => *period_days,
            ThresholdRule::CalorieBudget { period_days, .. } => *period_days,
            ThresholdRule::Inactivity { period_days, .. } => *period_days,
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            ThresholdRule::WeightChange { .. } => Algorithm::new("percent_weight_change", "1.0"),
            ThresholdRule::CalorieBudget { .. } => Algorithm::new("mean_calorie_budget", "1.0"),
            ThresholdRule::Inactivity { .. } => Algorithm::new("activity_floor", "1.0"),
        }
    }

    fn validate(&self) -> Result<()> {
        let ok = match self {
            ThresholdRule::WeightChange {
                threshold_percentage,
                period_days,
                ..
            } => *threshold_percentage > 0.0 && *period_days >= 1,
            ThresholdRule::CalorieBudget {
                daily_limit,
                period_days,
                ..
            } => *daily_limit > 0.0 && *period_days >= 1,
            ThresholdRule::Inactivity {
                weekly_minutes,
                period_days,
            } => *weekly_minutes > 0.0 && *period_days >= 1,
        };
        if ok {
            Ok(())
        } else {
            Err(AlertError::validation(
                "threshold parameters must be positive",
            ))
        }
    }
}

/// A rule whose tag is not coded yet. Kept as raw JSON for forward
/// compatibility: the scheduler logs and skips it, nothing errors.
#[derive(Clone, Debug, PartialEq)]
pub enum RuleKind {
    Known(ThresholdRule),
    Unsupported(Value),
}

#[derive(Clone, Debug, PartialEq)]
pub struct RuleSpec {
    pub rule: RuleKind,
    /// The merged parameters the evaluation effectively ran with.
    pub effective: Value,
}

/// Overlay the per-patient threshold config on top of the alert type's
/// defaults (shallow object merge, patient values win) and parse the result.
pub fn parse_rule(validation_config: &Value, threshold_config: &Value) -> Result<RuleSpec> {
    let mut merged = match validation_config {
        Value::Object(map) => Value::Object(map.clone()),
        Value::Null => Value::Object(serde_json::Map::new()),
        _ => {
            return Err(AlertError::validation(
                "alert type validation_config is not an object",
            ))
        }
    };

    match threshold_config {
        Value::Object(overrides) => {
            if let Value::Object(target) = &mut merged {
                for (k, v) in overrides {
                    target.insert(k.clone(), v.clone());
                }
            }
        }
        Value::Null => {}
        _ => {
            return Err(AlertError::validation(
                "threshold_config is not an object",
            ))
        }
    }

    let tag = merged
        .get("rule")
        .and_then(|v| v.as_str())
        .ok_or_else(|| AlertError::validation("threshold config has no 'rule' tag"))?
        .to_string();

    if !KNOWN_RULES.contains(&tag.as_str()) {
        return Ok(RuleSpec {
            rule: RuleKind::Unsupported(merged.clone()),
            effective: merged,
        });
    }

    let rule: ThresholdRule = serde_json::from_value(merged.clone())
        .map_err(|e| AlertError::Validation(format!("malformed '{}' rule: {}", tag, e)))?;
    rule.validate()?;

    Ok(RuleSpec {
        rule: RuleKind::Known(rule),
        effective: merged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn overlay_prefers_patient_thresholds() {
        let defaults = json!({"rule": "weight_change", "threshold_percentage": 5.0, "period_days": 30});
        let overrides = json!({"threshold_percentage": 3.0});

        let spec = parse_rule(&defaults, &overrides).unwrap();
        match spec.rule {
            RuleKind::Known(ThresholdRule::WeightChange {
                threshold_percentage,
                period_days,
                min_samples,
            }) => {
                assert_eq!(threshold_percentage, 3.0);
                assert_eq!(period_days, 30);
                assert_eq!(min_samples, 2);
            }
            other => panic!("unexpected rule: {:?}", other),
        }
    }

    #[test]
    fn priority_key_does_not_disturb_rule_parsing() {
        // Priority overrides are read from the threshold config at raise
        // time; here they must simply pass through as an extra key.
        let defaults = json!({"rule": "inactivity", "weekly_minutes": 150.0});
        let overrides = json!({"priority": "critical"});

        let spec = parse_rule(&defaults, &overrides).unwrap();
        assert!(matches!(
            spec.rule,
            RuleKind::Known(ThresholdRule::Inactivity { .. })
        ));
        assert_eq!(spec.effective.get("priority"), Some(&json!("critical")));
    }

    #[test]
    fn unknown_rule_tag_falls_through_as_unsupported() {
        let defaults = json!({"rule": "blood_pressure_spike", "systolic_limit": 140});
        let spec = parse_rule(&defaults, &json!({})).unwrap();
        assert!(matches!(spec.rule, RuleKind::Unsupported(_)));
    }

    #[test]
    fn malformed_known_rule_is_a_validation_error() {
        let defaults = json!({"rule": "weight_change", "threshold_percentage": "five"});
        let err = parse_rule(&defaults, &json!({})).unwrap_err();
        assert!(matches!(err, AlertError::Validation(_)));
    }

    #[test]
    fn missing_rule_tag_is_a_validation_error() {
        let err = parse_rule(&json!({}), &json!({})).unwrap_err();
        assert!(matches!(err, AlertError::Validation(_)));
    }

    #[test]
    fn non_positive_threshold_is_rejected() {
        let defaults = json!({"rule": "weight_change", "threshold_percentage": 5.0, "period_days": 30});
        let err = parse_rule(&defaults, &json!({"threshold_percentage": -1.0})).unwrap_err();
        assert!(matches!(err, AlertError::Validation(_)));
    }
}
