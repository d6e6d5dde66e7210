use crate::state::AppState;
use chrono::Utc;
use rqmon_alert::engine::{
    self, classify_trend, queue_health, Condition, QueueHealth, SystemThresholds,
};
use rqmon_alert::tracker::{FireOutcome, ResolvedAlert};
use rqmon_common::types::{
    AlertKey, AlertKind, AlertMessage, Category, QueueSnapshot, Severity, ThresholdSet,
};
use rqmon_config::discovery::Discovery;
use rqmon_notify::NotificationChannel;
use rqmon_storage::SnapshotWriter;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Fans one alert out to every configured channel. Delivery is best
/// effort: failures are logged and the alert is dropped.
pub struct Notifier {
    channels: Vec<Box<dyn NotificationChannel>>,
}

impl Notifier {
    pub fn new(channels: Vec<Box<dyn NotificationChannel>>) -> Self {
        Self { channels }
    }

    pub async fn dispatch(&self, alert: &AlertMessage) {
        for channel in &self.channels {
            if let Err(e) = channel.send(alert).await {
                tracing::error!(
                    channel = channel.channel_name(),
                    kind = %alert.kind,
                    error = %e,
                    "Notification delivery failed"
                );
            }
        }
    }
}

/// The periodic collection loop: fetch, discover, recover, evaluate,
/// aggregate, persist.
pub struct Monitor {
    state: AppState,
    notifier: Arc<Notifier>,
    writer: Option<Arc<dyn SnapshotWriter>>,
    discovery: Discovery,
    system_thresholds: SystemThresholds,
    interval: Duration,
    shutdown_notified: bool,
}

impl Monitor {
    pub fn new(
        state: AppState,
        notifier: Arc<Notifier>,
        writer: Option<Arc<dyn SnapshotWriter>>,
        discovery: Discovery,
        system_thresholds: SystemThresholds,
    ) -> Self {
        let interval = Duration::from_secs(state.collection_interval_secs);
        Self {
            state,
            notifier,
            writer,
            discovery,
            system_thresholds,
            interval,
            shutdown_notified: false,
        }
    }

    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        self.send_startup().await;

        loop {
            let cycle_start = Instant::now();
            self.run_cycle().await;
            let elapsed = cycle_start.elapsed();

            // Late cycles start the next one immediately rather than
            // queueing ticks.
            let remaining = self.interval.saturating_sub(elapsed);
            if remaining.is_zero() {
                tracing::warn!(
                    elapsed_secs = elapsed.as_secs_f64(),
                    interval_secs = self.interval.as_secs(),
                    "Collection cycle overran its interval"
                );
                if *shutdown.borrow() {
                    break;
                }
                continue;
            }

            tokio::select! {
                _ = tokio::time::sleep(remaining) => {}
                _ = shutdown.changed() => break,
            }
        }

        self.send_shutdown().await;
    }

    pub(crate) async fn run_cycle(&mut self) {
        let snapshots = match self.state.provider.fetch_all().await {
            Ok(snapshots) => snapshots,
            Err(e) => {
                // Degraded cycle: no evaluation against stale data, no
                // recovery, no persistence.
                tracing::error!(error = %e, "Statistics fetch failed, skipping cycle");
                return;
            }
        };

        let config = self.state.config.load_full();
        let outcome = self.discovery.discover(
            &config,
            snapshots.keys().map(String::as_str),
            &self.state.classifier,
        );

        for name in &outcome.newly_seen {
            if !config.queues.contains_key(name) {
                self.announce_discovery(name).await;
            }
        }

        let mut batch: Vec<(QueueSnapshot, Category)> = Vec::new();
        let mut total_backlog: u64 = 0;
        let mut core_total = 0usize;
        let mut core_healthy = 0usize;

        for name in &outcome.monitored {
            let Some(snapshot) = snapshots.get(name) else {
                tracing::warn!(queue = %name, "Monitored queue absent from statistics");
                continue;
            };

            let (category, thresholds) = self.policy_for(name, &config);
            self.process_queue(snapshot, category, &thresholds).await;

            let health = queue_health(snapshot, &thresholds);
            if category == Category::Core {
                core_total += 1;
                if health == QueueHealth::Healthy {
                    core_healthy += 1;
                }
            }
            total_backlog += snapshot.messages_ready;
            batch.push((snapshot.clone(), category));
        }

        self.check_system(total_backlog, core_total, core_healthy)
            .await;

        tracing::info!(
            monitored = outcome.monitored.len(),
            total_backlog,
            core_healthy,
            core_total,
            "Collection cycle complete"
        );

        // Snapshots are persisted whether or not anything alerted.
        if let Some(writer) = &self.writer {
            if let Err(e) = writer.write(&batch).await {
                tracing::error!(error = %e, "Snapshot persistence failed");
            }
        }
    }

    /// Effective category and thresholds for a monitored queue. A name
    /// that is neither configured nor registered should not happen; it
    /// falls back to SUPPORT with default thresholds rather than
    /// aborting the cycle.
    fn policy_for(
        &self,
        name: &str,
        config: &rqmon_config::model::MonitorConfig,
    ) -> (Category, ThresholdSet) {
        match self.discovery.entry(name, config) {
            Some(entry) => (entry.category, entry.thresholds.clone()),
            None => {
                tracing::warn!(queue = %name, "No policy for monitored queue, assuming SUPPORT");
                let category = self.state.classifier.classify(name, config);
                (category, ThresholdSet::default_for(category))
            }
        }
    }

    async fn process_queue(
        &self,
        snapshot: &QueueSnapshot,
        category: Category,
        thresholds: &ThresholdSet,
    ) {
        // Recovery runs before evaluation so a resolution and a fresh
        // firing of the same key land in a consistent order.
        let resolved = {
            let mut tracker = self
                .state
                .tracker
                .lock()
                .unwrap_or_else(|p| p.into_inner());
            tracker.check_recovery(snapshot, thresholds)
        };
        for resolution in resolved {
            self.announce_recovery(&resolution, category).await;
        }

        let trend = classify_trend(snapshot);
        let health = queue_health(snapshot, thresholds);
        tracing::info!(
            queue = %snapshot.name,
            category = %category,
            status = %health,
            ready = snapshot.messages_ready,
            consumers = snapshot.consumer_count,
            publish_rate = snapshot.publish_rate,
            trend = %trend.describe(),
            "Queue checked"
        );

        for condition in engine::evaluate(snapshot, thresholds, category) {
            let key = AlertKey::queue(condition.kind, &snapshot.name);
            let outcome = {
                let mut tracker = self
                    .state
                    .tracker
                    .lock()
                    .unwrap_or_else(|p| p.into_inner());
                tracker.try_fire(&key, Utc::now())
            };
            match outcome {
                FireOutcome::Sent => {
                    let alert =
                        condition_to_alert(condition, Some(snapshot.name.clone()), Some(category));
                    self.notifier.dispatch(&alert).await;
                }
                FireOutcome::Suppressed => {
                    tracing::debug!(key = %key, "Alert suppressed by cooldown");
                }
            }
        }
    }

    async fn check_system(&self, total_backlog: u64, core_total: usize, core_healthy: usize) {
        for condition in
            engine::evaluate_system(total_backlog, core_total, core_healthy, &self.system_thresholds)
        {
            let key = AlertKey::system(condition.kind);
            let outcome = {
                let mut tracker = self
                    .state
                    .tracker
                    .lock()
                    .unwrap_or_else(|p| p.into_inner());
                tracker.try_fire(&key, Utc::now())
            };
            if outcome == FireOutcome::Sent {
                let alert = condition_to_alert(condition, None, None);
                self.notifier.dispatch(&alert).await;
            }
        }
    }

    async fn announce_discovery(&self, name: &str) {
        let alert = AlertMessage {
            kind: AlertKind::QueueDiscovery,
            severity: Severity::Info,
            title: "New Queue Discovered".to_string(),
            description: format!(
                "Queue **{name}** matched a discovery pattern and is now monitored with default thresholds."
            ),
            queue: Some(name.to_string()),
            category: None,
            value: None,
            threshold: None,
            resolved: false,
        };
        self.notifier.dispatch(&alert).await;
    }

    async fn announce_recovery(&self, resolution: &ResolvedAlert, category: Category) {
        let minutes = resolution.active_for.num_seconds() as f64 / 60.0;
        let alert = AlertMessage {
            kind: AlertKind::Recovery,
            severity: Severity::Info,
            title: format!("Queue Recovered: {}", resolution.queue),
            description: format!(
                "Alert **{}** on queue **{}** resolved after {minutes:.1} minutes.",
                resolution.kind, resolution.queue,
            ),
            queue: Some(resolution.queue.clone()),
            category: Some(category),
            value: None,
            threshold: None,
            resolved: true,
        };
        self.notifier.dispatch(&alert).await;
    }

    async fn send_startup(&self) {
        let config = self.state.config.load_full();
        let alert = AlertMessage {
            kind: AlertKind::SystemStartup,
            severity: Severity::Info,
            title: "Queue Monitoring Started".to_string(),
            description: format!(
                "Monitoring **{}** queues ({} CORE, {} SUPPORT) on {}.",
                config.queue_count(),
                config.count_by_category(Category::Core),
                config.count_by_category(Category::Support),
                self.state.target,
            ),
            queue: None,
            category: None,
            value: None,
            threshold: None,
            resolved: false,
        };
        tracing::info!(target = %self.state.target, queues = config.queue_count(), "Monitor started");
        self.notifier.dispatch(&alert).await;
    }

    pub(crate) async fn send_shutdown(&mut self) {
        // Guard keeps the notification single even if shutdown paths
        // overlap.
        if self.shutdown_notified {
            return;
        }
        self.shutdown_notified = true;

        let alert = AlertMessage {
            kind: AlertKind::SystemShutdown,
            severity: Severity::Warning,
            title: "Queue Monitoring Stopped".to_string(),
            description: format!("Monitoring of {} is shutting down.", self.state.target),
            queue: None,
            category: None,
            value: None,
            threshold: None,
            resolved: false,
        };
        tracing::info!(target = %self.state.target, "Monitor stopping");
        self.notifier.dispatch(&alert).await;
    }
}

pub fn condition_to_alert(
    condition: Condition,
    queue: Option<String>,
    category: Option<Category>,
) -> AlertMessage {
    AlertMessage {
        kind: condition.kind,
        severity: condition.severity,
        title: condition.title,
        description: condition.description,
        queue,
        category,
        value: Some(condition.value),
        threshold: condition.threshold,
        resolved: false,
    }
}
