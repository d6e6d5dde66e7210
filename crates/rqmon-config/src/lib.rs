//! Queue monitoring configuration: the hot-reloadable queue map model,
//! old-vs-new diffing, name classification, auto-discovery, and the
//! debounced file watcher that feeds reload events to the monitor.

pub mod classify;
pub mod diff;
pub mod discovery;
pub mod error;
pub mod model;
pub mod watcher;


pub use classify::Classifier;
pub use diff::ConfigDiff;
pub use discovery::{Discovery, DiscoveryOutcome};
pub use error::ConfigError;
pub use model::{DiscoveryPattern, MonitorConfig, QueueEntry};
pub use watcher::ConfigWatcher;
