use serde_json::Value;
use std::collections::BTreeMap;

use super::rules::{Algorithm, ThresholdRule};
use super::source::MetricWindow;

/// A positive detection: the condition held, with this much confidence, on
/// exactly this input window. Everything needed to archive and audit the
/// decision travels with the result.
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    pub confidence: f64,
    pub title: String,
    pub message: String,
    pub algorithm: Algorithm,
    pub parameters: Value,
    pub window: MetricWindow,
}

/// Stateless, deterministic detection. Returns `None` ("no condition") when
/// the rule does not fire or the window is below the minimum sample size;
/// never a low-confidence positive in the under-sampled case.
pub fn evaluate(rule: &ThresholdRule, window: &MetricWindow) -> Option<Evaluation> {
    let (confidence, title, message) = match rule {
        ThresholdRule::WeightChange {
            threshold_percentage,
            period_days,
            min_samples,
        } => evaluate_weight_change(window, *threshold_percentage, *period_days, *min_samples)?,
        ThresholdRule::CalorieBudget {
            daily_limit,
            period_days,
            min_samples,
        } => evaluate_calorie_budget(window, *daily_limit, *period_days, *min_samples)?,
        ThresholdRule::Inactivity {
            weekly_minutes,
            period_days,
        } => evaluate_inactivity(window, *weekly_minutes, *period_days)?,
    };

    Some(Evaluation {
        confidence: confidence.clamp(0.0, 1.0),
        title,
        message,
        algorithm: rule.algorithm(),
        parameters: serde_json::to_value(rule).unwrap_or(Value::Null),
        window: window.clone(),
    })
}

fn evaluate_weight_change(
    window: &MetricWindow,
    threshold_percentage: f64,
    period_days: i64,
    min_samples: usize,
) -> Option<(f64, String, String)> {
    let mut weights = window.weights.clone();
    weights.sort_by_key(|w| w.date);
    if weights.len() < min_samples {
        return None;
    }

    let latest = weights.last()?;
    let target_date = latest.date - chrono::Duration::days(period_days);

    // Baseline: the entry closest to `period_days` before the latest one,
    // or the earliest entry when the window is sparse.
    let baseline = weights
        .iter()
        .rev()
        .find(|w| w.date <= target_date)
        .or_else(|| weights.first())?;

    if baseline.date >= latest.date || baseline.weight_kg <= 0.0 {
        return None;
    }

    let change_pct = (latest.weight_kg - baseline.weight_kg) / baseline.weight_kg * 100.0;
    if change_pct.abs() < threshold_percentage {
        return None;
    }

    let covered_days = (latest.date - baseline.date).num_days();
    let confidence = if baseline.date <= target_date {
        1.0
    } else {
        covered_days as f64 / period_days as f64
    };

    let direction = if change_pct > 0.0 { "gained" } else { "lost" };
    let message = format!(
        "Weight {} {:.1}% over {} days ({:.1} kg on {} to {:.1} kg on {})",
        direction,
        change_pct.abs(),
        covered_days,
        baseline.weight_kg,
        baseline.date,
        latest.weight_kg,
        latest.date,
    );

    Some((confidence, "Rapid weight change".to_string(), message))
}

fn evaluate_calorie_budget(
    window: &MetricWindow,
    daily_limit: f64,
    period_days: i64,
    min_samples: usize,
) -> Option<(f64, String, String)> {
    // Entries are per meal; fold them into daily totals first.
    let mut daily: BTreeMap<chrono::NaiveDate, f64> = BTreeMap::new();
    for entry in &window.nutrition {
        *daily.entry(entry.date).or_insert(0.0) += entry.total_calories;
    }

    if daily.len() < min_samples {
        return None;
    }

    let mean = daily.values().sum::<f64>() / daily.len() as f64;
    if mean <= daily_limit {
        return None;
    }

    let confidence = daily.len() as f64 / period_days as f64;
    let message = format!(
        "Mean intake {:.0} kcal/day over {} logged days exceeds the {:.0} kcal budget",
        mean,
        daily.len(),
        daily_limit,
    );

    Some((confidence, "Calorie budget exceeded".to_string(), message))
}

fn evaluate_inactivity(
    window: &MetricWindow,
    weekly_minutes: f64,
    period_days: i64,
) -> Option<(f64, String, String)> {
    // Absence of entries is the signal here, so there is no sample-size
    // gate: zero logged minutes is a deterministic hit.
    let total: i64 = window
        .activity
        .iter()
        .map(|a| a.duration_minutes as i64)
        .sum();
    let floor = weekly_minutes * period_days as f64 / 7.0;

    if (total as f64) >= floor {
        return None;
    }

    let message = format!(
        "{} active minutes over {} days, below the {:.0} minute floor",
        total, period_days, floor,
    );

    Some((1.0, "Activity below target".to_string(), message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::source::{ActivityPoint, NutritionPoint, WeightPoint};
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn weight_window(points: &[(&str, f64)]) -> MetricWindow {
        let mut w = MetricWindow::empty(d("2026-07-01"), d("2026-07-31"));
        w.weights = points
            .iter()
            .map(|(date, kg)| WeightPoint {
                date: d(date),
                weight_kg: *kg,
            })
            .collect();
        w
    }

    #[test]
    fn weight_gain_over_threshold_fires_with_full_confidence() {
        // 70 kg -> 75 kg over 30 days is +7.1%, past a 5% threshold.
        let rule = ThresholdRule::WeightChange {
            threshold_percentage: 5.0,
            period_days: 30,
            min_samples: 2,
        };
        let window = weight_window(&[("2026-07-01", 70.0), ("2026-07-31", 75.0)]);

        let eval = evaluate(&rule, &window).expect("condition should fire");
        assert_eq!(eval.confidence, 1.0);
        assert!(eval.message.contains("gained 7.1%"));
        assert_eq!(eval.algorithm.name, "percent_weight_change");
    }

    #[test]
    fn change_below_threshold_is_no_condition() {
        let rule = ThresholdRule::WeightChange {
            threshold_percentage: 5.0,
            period_days: 30,
            min_samples: 2,
        };
        let window = weight_window(&[("2026-07-01", 70.0), ("2026-07-31", 72.0)]);
        assert!(evaluate(&rule, &window).is_none());
    }

    #[test]
    fn under_sampled_window_is_no_condition_not_low_confidence() {
        let rule = ThresholdRule::WeightChange {
            threshold_percentage: 5.0,
            period_days: 30,
            min_samples: 2,
        };
        let window = weight_window(&[("2026-07-31", 80.0)]);
        assert!(evaluate(&rule, &window).is_none());
    }

    #[test]
    fn sparse_window_lowers_confidence() {
        // Earliest entry is only 15 days back on a 30-day rule.
        let rule = ThresholdRule::WeightChange {
            threshold_percentage: 5.0,
            period_days: 30,
            min_samples: 2,
        };
        let window = weight_window(&[("2026-07-16", 70.0), ("2026-07-31", 76.0)]);

        let eval = evaluate(&rule, &window).expect("condition should fire");
        assert!(eval.confidence < 1.0);
        assert_eq!(eval.confidence, 15.0 / 30.0);
    }

    #[test]
    fn confidence_stays_within_bounds() {
        let rule = ThresholdRule::CalorieBudget {
            daily_limit: 2000.0,
            period_days: 3,
            min_samples: 3,
        };
        let mut window = MetricWindow::empty(d("2026-07-25"), d("2026-07-31"));
        // More logged days than the period; raw ratio would exceed 1.0.
        for day in 25..=31 {
            window.nutrition.push(NutritionPoint {
                date: d(&format!("2026-07-{day}")),
                total_calories: 2600.0,
                meal_type: "dinner".to_string(),
            });
        }

        let eval = evaluate(&rule, &window).expect("condition should fire");
        assert!((0.0..=1.0).contains(&eval.confidence));
        assert_eq!(eval.confidence, 1.0);
    }

    #[test]
    fn calorie_budget_sums_meals_per_day() {
        let rule = ThresholdRule::CalorieBudget {
            daily_limit: 2500.0,
            period_days: 7,
            min_samples: 3,
        };
        let mut window = MetricWindow::empty(d("2026-07-25"), d("2026-07-31"));
        for day in ["2026-07-25", "2026-07-26", "2026-07-27"] {
            for meal in ["breakfast", "lunch", "dinner"] {
                window.nutrition.push(NutritionPoint {
                    date: d(day),
                    total_calories: 900.0,
                    meal_type: meal.to_string(),
                });
            }
        }

        // 2700 kcal/day across 3 days.
        let eval = evaluate(&rule, &window).expect("condition should fire");
        assert!(eval.message.contains("2700"));
    }

    #[test]
    fn inactivity_fires_on_empty_window() {
        let rule = ThresholdRule::Inactivity {
            weekly_minutes: 150.0,
            period_days: 7,
        };
        let window = MetricWindow::empty(d("2026-07-25"), d("2026-07-31"));

        let eval = evaluate(&rule, &window).expect("condition should fire");
        assert_eq!(eval.confidence, 1.0);
    }

    #[test]
    fn sufficient_activity_is_no_condition() {
        let rule = ThresholdRule::Inactivity {
            weekly_minutes: 150.0,
            period_days: 7,
        };
        let mut window = MetricWindow::empty(d("2026-07-25"), d("2026-07-31"));
        window.activity.push(ActivityPoint {
            date: d("2026-07-26"),
            duration_minutes: 200,
            activity_type: "walking".to_string(),
        });
        assert!(evaluate(&rule, &window).is_none());
    }

    #[test]
    fn evaluation_is_deterministic_for_identical_inputs() {
        let rule = ThresholdRule::WeightChange {
            threshold_percentage: 5.0,
            period_days: 30,
            min_samples: 2,
        };
        let window = weight_window(&[("2026-07-01", 70.0), ("2026-07-31", 75.0)]);

        let a = evaluate(&rule, &window).unwrap();
        let b = evaluate(&rule, &window).unwrap();
        assert_eq!(a, b);
    }
}
