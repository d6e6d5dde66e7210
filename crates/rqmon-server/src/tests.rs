use crate::monitor::{Monitor, Notifier};
use crate::reload;
use crate::state::AppState;
use arc_swap::ArcSwap;
use async_trait::async_trait;
use chrono::Utc;
use rqmon_alert::engine::SystemThresholds;
use rqmon_alert::tracker::AlertTracker;
use rqmon_common::types::{AlertKind, AlertMessage, Category, QueueSnapshot, Severity};
use rqmon_config::classify::Classifier;
use rqmon_config::discovery::Discovery;
use rqmon_config::model::MonitorConfig;
use rqmon_rabbit::error::FetchError;
use rqmon_rabbit::SnapshotProvider;
use rqmon_storage::{SnapshotWriter, StorageError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

struct FakeProvider {
    snapshots: Arc<Mutex<HashMap<String, QueueSnapshot>>>,
    fail: Arc<Mutex<bool>>,
}

#[async_trait]
impl SnapshotProvider for FakeProvider {
    async fn fetch_all(&self) -> Result<HashMap<String, QueueSnapshot>, FetchError> {
        if *self.fail.lock().unwrap() {
            return Err(FetchError::Api {
                status: 502,
                body: "bad gateway".to_string(),
            });
        }
        Ok(self.snapshots.lock().unwrap().clone())
    }

    async fn check_connectivity(&self) -> Result<(), FetchError> {
        Ok(())
    }
}

struct RecordingChannel {
    sent: Arc<Mutex<Vec<AlertMessage>>>,
}

#[async_trait]
impl rqmon_notify::NotificationChannel for RecordingChannel {
    async fn send(&self, alert: &AlertMessage) -> Result<(), rqmon_notify::NotifyError> {
        self.sent.lock().unwrap().push(alert.clone());
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "recording"
    }
}

struct RecordingWriter {
    batch_sizes: Arc<Mutex<Vec<usize>>>,
}

#[async_trait]
impl SnapshotWriter for RecordingWriter {
    async fn write(&self, batch: &[(QueueSnapshot, Category)]) -> Result<(), StorageError> {
        self.batch_sizes.lock().unwrap().push(batch.len());
        Ok(())
    }
}

fn snapshot(name: &str, ready: u64, consumers: u64) -> QueueSnapshot {
    QueueSnapshot {
        name: name.to_string(),
        messages_ready: ready,
        messages_unacked: 0,
        consumer_count: consumers,
        publish_rate: 1.0,
        deliver_rate: 1.0,
        ack_rate: 1.0,
        observed_at: Utc::now(),
    }
}

const QUEUES_JSON: &str = r#"{
  "queue_monitoring": {
    "queues": {
      "orders": {
        "category": "CORE",
        "thresholds": { "high_backlog": 100, "critical_lag_seconds": 60, "no_consumers_alert": true }
      },
      "payments": {
        "category": "CORE",
        "thresholds": { "high_backlog": 100, "critical_lag_seconds": 60, "no_consumers_alert": true }
      },
      "audit_log": {
        "category": "SUPPORT",
        "thresholds": { "high_backlog": 50000, "critical_lag_seconds": 300, "no_consumers_alert": false }
      }
    },
    "discovery_patterns": [
      { "pattern": "^orders_", "category": "CORE" }
    ]
  }
}"#;

struct Harness {
    monitor: Monitor,
    sent: Arc<Mutex<Vec<AlertMessage>>>,
    snapshots: Arc<Mutex<HashMap<String, QueueSnapshot>>>,
    fail: Arc<Mutex<bool>>,
    batch_sizes: Arc<Mutex<Vec<usize>>>,
}

fn harness(initial: Vec<QueueSnapshot>, discovery_enabled: bool) -> Harness {
    let snapshots = Arc::new(Mutex::new(
        initial
            .into_iter()
            .map(|s| (s.name.clone(), s))
            .collect::<HashMap<_, _>>(),
    ));
    let fail = Arc::new(Mutex::new(false));
    let provider = Arc::new(FakeProvider {
        snapshots: snapshots.clone(),
        fail: fail.clone(),
    });

    let sent = Arc::new(Mutex::new(Vec::new()));
    let notifier = Arc::new(Notifier::new(vec![Box::new(RecordingChannel {
        sent: sent.clone(),
    })]));

    let batch_sizes = Arc::new(Mutex::new(Vec::new()));
    let writer = Arc::new(RecordingWriter {
        batch_sizes: batch_sizes.clone(),
    });

    let config = MonitorConfig::parse(QUEUES_JSON).unwrap();
    let state = AppState {
        config: Arc::new(ArcSwap::from_pointee(config)),
        classifier: Arc::new(Classifier::new()),
        tracker: Arc::new(Mutex::new(AlertTracker::new(chrono::Duration::minutes(5)))),
        provider,
        started_at: Utc::now(),
        target: "mq.test:15672".to_string(),
        collection_interval_secs: 15,
    };

    let monitor = Monitor::new(
        state,
        notifier,
        Some(writer),
        Discovery::new(discovery_enabled),
        SystemThresholds::default(),
    );

    Harness {
        monitor,
        sent,
        snapshots,
        fail,
        batch_sizes,
    }
}

fn sent_kinds(sent: &Arc<Mutex<Vec<AlertMessage>>>) -> Vec<AlertKind> {
    sent.lock().unwrap().iter().map(|a| a.kind).collect()
}

#[tokio::test]
async fn cycle_fires_high_backlog_for_core_queue() {
    // payments stays healthy so the CORE ratio (1/2) does not also trip
    // the system failure condition.
    let mut h = harness(
        vec![
            snapshot("orders", 500, 2),
            snapshot("payments", 10, 2),
            snapshot("audit_log", 10, 1),
        ],
        false,
    );
    h.monitor.run_cycle().await;

    let sent = h.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, AlertKind::HighBacklog);
    assert_eq!(sent[0].severity, Severity::Critical);
    assert_eq!(sent[0].queue.as_deref(), Some("orders"));
    assert_eq!(sent[0].category, Some(Category::Core));
}

#[tokio::test]
async fn second_cycle_within_cooldown_is_suppressed() {
    let mut h = harness(
        vec![
            snapshot("orders", 500, 2),
            snapshot("payments", 10, 2),
            snapshot("audit_log", 10, 1),
        ],
        false,
    );
    h.monitor.run_cycle().await;
    h.monitor.run_cycle().await;

    assert_eq!(sent_kinds(&h.sent), vec![AlertKind::HighBacklog]);
}

#[tokio::test]
async fn fetch_failure_degrades_cycle_to_noop() {
    let mut h = harness(
        vec![
            snapshot("orders", 500, 2),
            snapshot("payments", 10, 2),
            snapshot("audit_log", 10, 1),
        ],
        false,
    );
    *h.fail.lock().unwrap() = true;
    h.monitor.run_cycle().await;

    assert!(h.sent.lock().unwrap().is_empty());
    assert!(h.batch_sizes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn recovery_sends_single_resolution() {
    let mut h = harness(
        vec![
            snapshot("orders", 500, 2),
            snapshot("payments", 10, 2),
            snapshot("audit_log", 10, 1),
        ],
        false,
    );
    h.monitor.run_cycle().await;

    // Backlog cleared: below 30% of threshold, consumers active, under
    // the absolute ceiling.
    h.snapshots
        .lock()
        .unwrap()
        .insert("orders".to_string(), snapshot("orders", 5, 2));
    h.monitor.run_cycle().await;
    h.monitor.run_cycle().await;

    let kinds = sent_kinds(&h.sent);
    assert_eq!(kinds, vec![AlertKind::HighBacklog, AlertKind::Recovery]);
    let sent = h.sent.lock().unwrap();
    assert!(sent[1].resolved);
    assert_eq!(sent[1].queue.as_deref(), Some("orders"));
}

#[tokio::test]
async fn snapshots_persisted_even_when_nothing_alerts() {
    let mut h = harness(
        vec![
            snapshot("orders", 10, 2),
            snapshot("payments", 10, 2),
            snapshot("audit_log", 10, 1),
        ],
        false,
    );
    h.monitor.run_cycle().await;

    assert!(h.sent.lock().unwrap().is_empty());
    assert_eq!(*h.batch_sizes.lock().unwrap(), vec![3]);
}

#[tokio::test]
async fn missing_monitored_queue_is_skipped() {
    // audit_log never shows up in broker statistics.
    let mut h = harness(
        vec![snapshot("orders", 10, 2), snapshot("payments", 10, 2)],
        false,
    );
    h.monitor.run_cycle().await;

    assert!(h.sent.lock().unwrap().is_empty());
    assert_eq!(*h.batch_sizes.lock().unwrap(), vec![2]);
}

#[tokio::test]
async fn discovery_announces_unconfigured_queue_once() {
    let mut h = harness(
        vec![
            snapshot("orders", 10, 2),
            snapshot("payments", 10, 2),
            snapshot("audit_log", 10, 1),
            snapshot("orders_eu", 10, 2),
        ],
        true,
    );
    h.monitor.run_cycle().await;
    h.monitor.run_cycle().await;

    let kinds = sent_kinds(&h.sent);
    assert_eq!(kinds, vec![AlertKind::QueueDiscovery]);
    assert_eq!(
        h.sent.lock().unwrap()[0].queue.as_deref(),
        Some("orders_eu")
    );
    // Discovered queue joins the persisted batch.
    assert_eq!(*h.batch_sizes.lock().unwrap(), vec![4, 4]);
}

#[tokio::test]
async fn system_backlog_fires_on_aggregate_total() {
    // Every queue is under its own threshold; only the aggregate trips.
    let mut h = harness(
        vec![
            snapshot("orders", 90, 2),
            snapshot("payments", 10, 2),
            snapshot("audit_log", 11_000, 1),
        ],
        false,
    );
    h.monitor.run_cycle().await;

    let kinds = sent_kinds(&h.sent);
    assert_eq!(kinds, vec![AlertKind::SystemBacklog]);
    assert!(h.sent.lock().unwrap()[0].queue.is_none());
}

#[tokio::test]
async fn core_failure_fires_when_healthy_ratio_drops() {
    // Both CORE queues are backlogged: 0/2 healthy.
    let mut h = harness(
        vec![
            snapshot("orders", 500, 2),
            snapshot("payments", 500, 2),
            snapshot("audit_log", 10, 1),
        ],
        false,
    );
    h.monitor.run_cycle().await;

    let kinds = sent_kinds(&h.sent);
    assert!(kinds.contains(&AlertKind::HighBacklog));
    assert!(kinds.contains(&AlertKind::SystemFailure));
}

#[tokio::test]
async fn shutdown_notification_is_idempotent() {
    let mut h = harness(vec![], false);
    h.monitor.send_shutdown().await;
    h.monitor.send_shutdown().await;

    assert_eq!(sent_kinds(&h.sent), vec![AlertKind::SystemShutdown]);
    assert_eq!(h.sent.lock().unwrap()[0].severity, Severity::Warning);
}

#[tokio::test]
async fn reload_swaps_config_and_announces_changes() {
    let config = Arc::new(ArcSwap::from_pointee(
        MonitorConfig::parse(QUEUES_JSON).unwrap(),
    ));
    let classifier = Arc::new(Classifier::new());
    let sent = Arc::new(Mutex::new(Vec::new()));
    let notifier = Arc::new(Notifier::new(vec![Box::new(RecordingChannel {
        sent: sent.clone(),
    })]));

    let (tx, rx) = mpsc::channel(4);
    let handle = tokio::spawn(reload::run(
        rx,
        config.clone(),
        classifier.clone(),
        notifier,
    ));

    // Same content: swap happens but nothing is announced.
    tx.send(MonitorConfig::parse(QUEUES_JSON).unwrap())
        .await
        .unwrap();

    // Structural change: audit_log removed.
    let changed = MonitorConfig::parse(
        r#"{"queue_monitoring": {"queues": {
            "orders": {"category": "CORE", "thresholds": {"high_backlog": 100, "critical_lag_seconds": 60, "no_consumers_alert": true}}
        }}}"#,
    )
    .unwrap();
    tx.send(changed).await.unwrap();
    drop(tx);
    handle.await.unwrap();

    assert_eq!(config.load().queue_count(), 1);
    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, AlertKind::ConfigurationChange);
    assert!(sent[0].description.contains("audit_log"));
}
