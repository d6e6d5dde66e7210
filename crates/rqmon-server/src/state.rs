use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use rqmon_alert::tracker::AlertTracker;
use rqmon_config::classify::Classifier;
use rqmon_config::model::MonitorConfig;
use rqmon_rabbit::SnapshotProvider;
use std::sync::{Arc, Mutex};

/// Shared state handed to the health responder and the background tasks.
///
/// The active queue configuration is behind an [`ArcSwap`] so the
/// collection loop and the health handlers read it lock-free while the
/// reload task swaps in new generations atomically.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ArcSwap<MonitorConfig>>,
    pub classifier: Arc<Classifier>,
    pub tracker: Arc<Mutex<AlertTracker>>,
    pub provider: Arc<dyn SnapshotProvider>,
    pub started_at: DateTime<Utc>,
    /// Broker description for logs and the health payload, e.g. `mq:15672`.
    pub target: String,
    pub collection_interval_secs: u64,
}
