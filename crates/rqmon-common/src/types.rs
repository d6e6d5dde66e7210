use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Alert severity level, ordered from lowest to highest.
///
/// # Examples
///
/// ```
/// use rqmon_common::types::Severity;
///
/// let sev: Severity = "warning".parse().unwrap();
/// assert_eq!(sev, Severity::Warning);
/// assert_eq!(sev.to_string(), "warning");
/// assert!(Severity::Critical > Severity::Info);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "warning" => Ok(Severity::Warning),
            "critical" => Ok(Severity::Critical),
            _ => Err(format!("unknown severity: {s}")),
        }
    }
}

/// Operational priority of a monitored queue.
///
/// CORE queues carry stricter alerting defaults and are weighted in
/// the system-wide health ratio; SUPPORT queues are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    Core,
    Support,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Core => write!(f, "CORE"),
            Category::Support => write!(f, "SUPPORT"),
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CORE" => Ok(Category::Core),
            "SUPPORT" => Ok(Category::Support),
            _ => Err(format!("unknown category: {s}")),
        }
    }
}

/// Per-queue alerting policy. Replaced wholesale on configuration reload,
/// never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSet {
    pub high_backlog: u64,
    pub critical_lag_seconds: u64,
    pub no_consumers_alert: bool,
}

impl ThresholdSet {
    /// Defaults assigned to queues enrolled via auto-discovery.
    pub fn default_for(category: Category) -> Self {
        Self {
            high_backlog: 1000,
            critical_lag_seconds: 60,
            no_consumers_alert: category == Category::Core,
        }
    }
}

/// One queue's stats as observed in a single collection cycle.
/// Created fresh each cycle and treated as read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub name: String,
    pub messages_ready: u64,
    pub messages_unacked: u64,
    pub consumer_count: u64,
    pub publish_rate: f64,
    pub deliver_rate: f64,
    pub ack_rate: f64,
    pub observed_at: DateTime<Utc>,
}

/// The kind of condition an alert reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    HighBacklog,
    NoConsumers,
    StalledQueue,
    SystemBacklog,
    SystemFailure,
    QueueDiscovery,
    ConfigurationChange,
    SystemStartup,
    SystemShutdown,
    Recovery,
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AlertKind::HighBacklog => "high_backlog",
            AlertKind::NoConsumers => "no_consumers",
            AlertKind::StalledQueue => "stalled_queue",
            AlertKind::SystemBacklog => "system_backlog",
            AlertKind::SystemFailure => "system_failure",
            AlertKind::QueueDiscovery => "queue_discovery",
            AlertKind::ConfigurationChange => "configuration_change",
            AlertKind::SystemStartup => "system_startup",
            AlertKind::SystemShutdown => "system_shutdown",
            AlertKind::Recovery => "recovery",
        };
        write!(f, "{s}")
    }
}

/// Identifies one condition instance for cooldown and recovery tracking.
///
/// Rendered as `"high_backlog:queue_a"` for per-queue conditions and as the
/// bare kind (e.g. `"system_backlog"`) for system-wide ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlertKey {
    pub kind: AlertKind,
    pub queue: Option<String>,
}

impl AlertKey {
    pub fn queue(kind: AlertKind, name: &str) -> Self {
        Self {
            kind,
            queue: Some(name.to_string()),
        }
    }

    pub fn system(kind: AlertKind) -> Self {
        Self { kind, queue: None }
    }
}

impl std::fmt::Display for AlertKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.queue {
            Some(q) => write!(f, "{}:{}", self.kind, q),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// Payload handed to a notification channel. Delivery is best-effort;
/// channels report failure back for logging only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertMessage {
    pub kind: AlertKind,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub queue: Option<String>,
    pub category: Option<Category>,
    pub value: Option<String>,
    pub threshold: Option<String>,
    pub resolved: bool,
}
