use chrono::{NaiveDateTime, Utc};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{watch, Semaphore};
use uuid::Uuid;

use super::evaluator;
use super::lifecycle::{AlertLifecycle, RaiseOutcome};
use super::notify::Notifier;
use super::rules::{self, RuleKind};
use super::source::MetricSource;
use super::store::AlertStore;
use crate::entities::alert_configuration;
use crate::error::{AlertError, Result};

#[derive(Clone, Debug)]
pub struct SchedulerSettings {
    /// Operational cycle period, independent of each configuration's own
    /// verification frequency.
    pub cycle: Duration,
    /// Worker pool bound so a wide cycle cannot overload the metric source.
    pub concurrency: usize,
    /// TTL of the cross-instance redis evaluation lease.
    pub lease_secs: u64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            cycle: Duration::from_secs(900),
            concurrency: 4,
            lease_secs: 1800,
        }
    }
}

impl SchedulerSettings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let cycle_secs = std::env::var("SCHEDULER_CYCLE_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.cycle.as_secs());
        let concurrency = std::env::var("SCHEDULER_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.concurrency);
        let lease_secs = std::env::var("SCHEDULER_LEASE_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(cycle_secs * 2);
        Self {
            cycle: Duration::from_secs(cycle_secs),
            concurrency,
            lease_secs,
        }
    }
}

/// Drives list-due -> evaluate -> raise, once per due configuration per
/// cycle. The in-process in-flight guard and the redis lease are both
/// optimizations; dedup correctness comes from the storage-level unique
/// index behind `AlertLifecycle::raise`.
pub struct Scheduler<S, M> {
    store: Arc<S>,
    source: Arc<M>,
    lifecycle: AlertLifecycle<S>,
    notifier: Option<Arc<Notifier>>,
    redis: Option<redis::Client>,
    settings: SchedulerSettings,
    in_flight: Mutex<HashSet<Uuid>>,
}

impl<S: AlertStore, M: MetricSource> Scheduler<S, M> {
    pub fn new(store: Arc<S>, source: Arc<M>, settings: SchedulerSettings) -> Self {
        let lifecycle = AlertLifecycle::new(store.clone());
        Self {
            store,
            source,
            lifecycle,
            notifier: None,
            redis: None,
            settings,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = Some(Arc::new(notifier));
        self
    }

    pub fn with_redis(mut self, client: redis::Client) -> Self {
        self.redis = Some(client);
        self
    }

    /// Cycle loop with graceful shutdown: a cycle in progress runs to
    /// completion, no new cycle starts once the flag flips.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            cycle_secs = self.settings.cycle.as_secs(),
            concurrency = self.settings.concurrency,
            "scheduler started"
        );
        let mut ticker = tokio::time::interval(self.settings.cycle);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }
            self.run_cycle().await;
            if *shutdown.borrow() {
                break;
            }
        }
        tracing::info!("scheduler stopped");
    }

    pub async fn run_cycle(&self) {
        let now = Utc::now().naive_utc();
        let due = match self.store.list_due(now).await {
            Ok(due) => due,
            Err(e) => {
                tracing::error!("failed to list due configurations: {}", e);
                return;
            }
        };

        metrics::gauge!("healthwatch_due_configurations").set(due.len() as f64);
        if due.is_empty() {
            return;
        }
        tracing::info!(due = due.len(), "evaluation cycle started");

        let semaphore = Arc::new(Semaphore::new(self.settings.concurrency));
        let mut tasks = Vec::new();
        for config in due {
            if !self.mark_in_flight(config.id) {
                tracing::warn!(
                    configuration_id = %config.id,
                    "still in flight from a previous cycle, skipping"
                );
                metrics::counter!("healthwatch_evaluations_skipped_total", "reason" => "in_flight")
                    .increment(1);
                continue;
            }
            tasks.push(self.evaluate_due(config, semaphore.clone(), now));
        }
        futures::future::join_all(tasks).await;
    }

    async fn evaluate_due(
        &self,
        config: alert_configuration::Model,
        semaphore: Arc<Semaphore>,
        now: NaiveDateTime,
    ) {
        let config_id = config.id;

        if let Ok(_permit) = semaphore.acquire().await {
            if self.acquire_lease(config_id).await {
                let result = self.evaluate_configuration(&config).await;
                self.release_lease(config_id).await;

                match result {
                    Ok(Some((RaiseOutcome::Created(alert), alert_type_name))) => {
                        metrics::counter!("healthwatch_evaluations_total", "outcome" => "condition_met")
                            .increment(1);
                        if let Some(notifier) = &self.notifier {
                            let notifier = notifier.clone();
                            tokio::spawn(async move {
                                notifier.alert_created(&alert, &alert_type_name).await;
                            });
                        }
                    }
                    Ok(Some((RaiseOutcome::Refreshed(_), _))) => {
                        metrics::counter!("healthwatch_evaluations_total", "outcome" => "condition_persists")
                            .increment(1);
                    }
                    Ok(None) => {
                        metrics::counter!("healthwatch_evaluations_total", "outcome" => "no_condition")
                            .increment(1);
                    }
                    Err(AlertError::SourceUnavailable(e)) => {
                        // Skip for this cycle; surfaces to doctors as "no new
                        // data", not as an alert.
                        tracing::warn!(
                            configuration_id = %config_id,
                            "metric source unavailable, skipping: {}", e
                        );
                        metrics::counter!("healthwatch_evaluations_failed_total", "reason" => "source_unavailable")
                            .increment(1);
                    }
                    Err(AlertError::Validation(e)) => {
                        tracing::warn!(
                            configuration_id = %config_id,
                            "threshold config rejected, skipping: {}", e
                        );
                        metrics::counter!("healthwatch_evaluations_failed_total", "reason" => "validation")
                            .increment(1);
                    }
                    Err(e) => {
                        tracing::error!(
                            configuration_id = %config_id,
                            "evaluation failed: {}", e
                        );
                        metrics::counter!("healthwatch_evaluations_failed_total", "reason" => "storage")
                            .increment(1);
                    }
                }

                // Stamped in every outcome so a failing configuration cannot
                // hot-loop on the next cycle.
                if let Err(e) = self.store.stamp_evaluated(config_id, now).await {
                    tracing::error!(
                        configuration_id = %config_id,
                        "failed to stamp evaluation time: {}", e
                    );
                }
            } else {
                tracing::info!(
                    configuration_id = %config_id,
                    "lease held by another scheduler instance, skipping"
                );
                metrics::counter!("healthwatch_evaluations_skipped_total", "reason" => "lease")
                    .increment(1);
            }
        }

        self.unmark_in_flight(config_id);
    }

    async fn evaluate_configuration(
        &self,
        config: &alert_configuration::Model,
    ) -> Result<Option<(RaiseOutcome, String)>> {
        let alert_type = self.store.alert_type_by_id(config.alert_type_id).await?;
        let spec = rules::parse_rule(&alert_type.validation_config, &config.threshold_config)?;

        let rule = match spec.rule {
            RuleKind::Known(rule) => rule,
            RuleKind::Unsupported(raw) => {
                let tag = raw.get("rule").and_then(|v| v.as_str()).unwrap_or("?");
                tracing::warn!(
                    configuration_id = %config.id,
                    rule = tag,
                    "rule not coded yet, skipping"
                );
                return Ok(None);
            }
        };

        let end = Utc::now().date_naive();
        let start = end - chrono::Duration::days(rule.period_days());
        let window = self
            .source
            .fetch_window(config.patient_id, start, end)
            .await?;

        let started = std::time::Instant::now();
        let evaluation = evaluator::evaluate(&rule, &window);
        metrics::histogram!("healthwatch_evaluation_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        let Some(evaluation) = evaluation else {
            return Ok(None);
        };
        let outcome = self.lifecycle.raise(config, evaluation).await?;
        Ok(Some((outcome, alert_type.name)))
    }

    fn mark_in_flight(&self, id: Uuid) -> bool {
        self.in_flight.lock().unwrap().insert(id)
    }

    fn unmark_in_flight(&self, id: Uuid) {
        self.in_flight.lock().unwrap().remove(&id);
    }

    async fn acquire_lease(&self, id: Uuid) -> bool {
        let Some(client) = &self.redis else {
            return true;
        };
        match client.get_multiplexed_async_connection().await {
            Ok(mut conn) => {
                let key = format!("healthwatch:eval_lease:{}", id);
                let res: redis::RedisResult<Option<String>> = redis::cmd("SET")
                    .arg(&key)
                    .arg("1")
                    .arg("NX")
                    .arg("EX")
                    .arg(self.settings.lease_secs)
                    .query_async(&mut conn)
                    .await;
                match res {
                    Ok(Some(_)) => true,
                    Ok(None) => false,
                    Err(e) => {
                        // Lease is an optimization; the unique index keeps
                        // dedup correct without it.
                        tracing::warn!("lease acquire failed, proceeding: {}", e);
                        true
                    }
                }
            }
            Err(e) => {
                tracing::warn!("redis unavailable for lease, proceeding: {}", e);
                true
            }
        }
    }

    async fn release_lease(&self, id: Uuid) {
        let Some(client) = &self.redis else {
            return;
        };
        if let Ok(mut conn) = client.get_multiplexed_async_connection().await {
            let key = format!("healthwatch:eval_lease:{}", id);
            let res: redis::RedisResult<()> =
                redis::cmd("DEL").arg(&key).query_async(&mut conn).await;
            if let Err(e) = res {
                tracing::warn!("lease release failed, will expire by TTL: {}", e);
            }
        }
    }
}
