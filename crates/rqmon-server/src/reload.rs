use crate::monitor::Notifier;
use arc_swap::ArcSwap;
use rqmon_common::types::{AlertKind, AlertMessage, Severity};
use rqmon_config::classify::Classifier;
use rqmon_config::diff::ConfigDiff;
use rqmon_config::model::MonitorConfig;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Applies validated configurations emitted by the file watcher.
///
/// Swap order matters: the new generation becomes active before the
/// classifier cache is dropped, so a concurrent classify either sees
/// the old config with the old cache or the new config with a cold one.
pub async fn run(
    mut rx: mpsc::Receiver<MonitorConfig>,
    config: Arc<ArcSwap<MonitorConfig>>,
    classifier: Arc<Classifier>,
    notifier: Arc<Notifier>,
) {
    while let Some(new_config) = rx.recv().await {
        let old = config.load_full();
        let diff = ConfigDiff::between(&old, &new_config);

        config.store(Arc::new(new_config));
        classifier.invalidate();

        if diff.is_empty() {
            tracing::info!("Configuration reloaded, no structural changes");
            continue;
        }

        let summary = diff.summary();
        tracing::info!(changes = %summary, "Configuration reloaded");

        // Reload announcements are one-shot per change and bypass the
        // cooldown tracker.
        let alert = AlertMessage {
            kind: AlertKind::ConfigurationChange,
            severity: Severity::Info,
            title: "Queue Configuration Changed".to_string(),
            description: summary,
            queue: None,
            category: None,
            value: None,
            threshold: None,
            resolved: false,
        };
        notifier.dispatch(&alert).await;
    }

    tracing::debug!("Reload channel closed, applier exiting");
}
