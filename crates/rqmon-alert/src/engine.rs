use rqmon_common::types::{AlertKind, Category, QueueSnapshot, Severity, ThresholdSet};

/// Net-rate band inside which a queue is considered neither draining
/// nor growing, in messages per second.
const STABLE_BAND: f64 = 0.1;

/// An alert condition produced by threshold evaluation. Whether it is
/// actually emitted is decided by the [`crate::tracker::AlertTracker`].
#[derive(Debug, Clone)]
pub struct Condition {
    pub kind: AlertKind,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub value: String,
    pub threshold: Option<String>,
}

/// Processing trend of a queue, derived from publish vs. deliver rates.
/// Descriptive context only; never a triggering condition.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueTrend {
    /// Deliveries outpace publishes; carries the estimated seconds to clear.
    Draining { clear_secs: f64 },
    /// Rates roughly balanced; carries the current processing lag in seconds.
    Stable { lag_secs: f64 },
    /// Rates balanced but nothing is being delivered at all.
    Stalled,
    /// Publishes outpace deliveries; carries the growth rate in msg/sec.
    Growing { rate: f64 },
}

impl QueueTrend {
    pub fn describe(&self) -> String {
        match self {
            QueueTrend::Draining { clear_secs } => format!("Queue clearing in {clear_secs:.1}s"),
            QueueTrend::Stable { lag_secs } => format!("Stable {lag_secs:.1}s lag"),
            QueueTrend::Stalled => "No processing activity".to_string(),
            QueueTrend::Growing { rate } => format!("Growing at {rate:.1} msg/sec"),
        }
    }

    fn backlog_annotation(&self) -> &'static str {
        match self {
            QueueTrend::Growing { .. } => " (GROWING - getting worse)",
            QueueTrend::Stable { .. } | QueueTrend::Stalled => " (stable backlog)",
            QueueTrend::Draining { .. } => " (draining - improving)",
        }
    }
}

/// Classify a queue's processing trend from its snapshot.
pub fn classify_trend(snapshot: &QueueSnapshot) -> QueueTrend {
    let net_rate = snapshot.deliver_rate - snapshot.publish_rate;

    if net_rate > STABLE_BAND {
        QueueTrend::Draining {
            clear_secs: snapshot.messages_ready as f64 / net_rate,
        }
    } else if net_rate.abs() <= STABLE_BAND {
        if snapshot.deliver_rate > 0.0 {
            QueueTrend::Stable {
                lag_secs: snapshot.messages_ready as f64 / snapshot.deliver_rate,
            }
        } else {
            QueueTrend::Stalled
        }
    } else {
        QueueTrend::Growing {
            rate: net_rate.abs(),
        }
    }
}

/// Instantaneous health bucket for one queue, used in the per-cycle log
/// line and the system-wide CORE health ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueHealth {
    Healthy,
    Warning,
    Critical,
}

impl std::fmt::Display for QueueHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueHealth::Healthy => write!(f, "HEALTHY"),
            QueueHealth::Warning => write!(f, "WARNING"),
            QueueHealth::Critical => write!(f, "CRITICAL"),
        }
    }
}

pub fn queue_health(snapshot: &QueueSnapshot, thresholds: &ThresholdSet) -> QueueHealth {
    // Healthy requires active consumers; an empty queue with nobody
    // consuming is the stalled state, not a healthy one.
    if snapshot.consumer_count == 0 {
        QueueHealth::Critical
    } else if snapshot.messages_ready > thresholds.high_backlog {
        QueueHealth::Warning
    } else {
        QueueHealth::Healthy
    }
}

/// Evaluate one queue snapshot against its thresholds.
///
/// Pure and deterministic: identical inputs always yield identical
/// condition lists. A single snapshot may produce several conditions,
/// except that `stalled_queue` and `no_consumers` are mutually exclusive
/// by construction (`no_consumers` requires ready messages, `stalled_queue`
/// requires none).
pub fn evaluate(
    snapshot: &QueueSnapshot,
    thresholds: &ThresholdSet,
    category: Category,
) -> Vec<Condition> {
    let mut conditions = Vec::new();

    if snapshot.messages_ready > thresholds.high_backlog {
        let severity = match category {
            Category::Core => Severity::Critical,
            Category::Support => Severity::Warning,
        };
        let trend = classify_trend(snapshot);
        conditions.push(Condition {
            kind: AlertKind::HighBacklog,
            severity,
            title: format!("{category} Queue Backlog"),
            description: format!(
                "CRITICAL BACKLOG{}\n\n{category} queue **{}** has **{}** messages pending!\n\nThreshold: {} messages\nStatus: {}",
                trend.backlog_annotation(),
                snapshot.name,
                snapshot.messages_ready,
                thresholds.high_backlog,
                trend.describe(),
            ),
            value: format!("{} messages", snapshot.messages_ready),
            threshold: Some(thresholds.high_backlog.to_string()),
        });
    }

    if thresholds.no_consumers_alert
        && snapshot.consumer_count == 0
        && snapshot.messages_ready > 0
    {
        conditions.push(Condition {
            kind: AlertKind::NoConsumers,
            severity: Severity::Critical,
            title: format!("{category} No Consumers"),
            description: format!(
                "NO CONSUMERS\n\n{category} queue **{}** has **{}** messages but **NO CONSUMERS**!\n\nProcessing completely stopped.",
                snapshot.name, snapshot.messages_ready,
            ),
            value: format!("0 consumers, {} messages", snapshot.messages_ready),
            threshold: None,
        });
    }

    if snapshot.messages_ready == 0 && snapshot.consumer_count == 0 {
        conditions.push(Condition {
            kind: AlertKind::StalledQueue,
            severity: Severity::Critical,
            title: format!("{category} Queue Stalled"),
            description: format!(
                "QUEUE STALLED\n\nQueue **{}** has **NO MESSAGES** and **NO CONSUMERS**!\n\nNo activity detected - system may be down.",
                snapshot.name,
            ),
            value: "0 messages, 0 consumers".to_string(),
            threshold: None,
        });
    }

    conditions
}

/// System-wide thresholds, configurable rather than hardcoded.
#[derive(Debug, Clone)]
pub struct SystemThresholds {
    /// Total ready messages across all monitored queues that triggers
    /// a `system_backlog` alert.
    pub backlog: u64,
    /// Minimum fraction of healthy CORE queues; below this a
    /// `system_failure` alert fires.
    pub core_health_ratio: f64,
}

impl Default for SystemThresholds {
    fn default() -> Self {
        Self {
            backlog: 10_000,
            core_health_ratio: 0.5,
        }
    }
}

/// Evaluate system-wide conditions over one cycle's aggregate totals.
/// Runs once per cycle, after all per-queue processing.
pub fn evaluate_system(
    total_backlog: u64,
    core_total: usize,
    core_healthy: usize,
    thresholds: &SystemThresholds,
) -> Vec<Condition> {
    let mut conditions = Vec::new();

    if total_backlog > thresholds.backlog {
        conditions.push(Condition {
            kind: AlertKind::SystemBacklog,
            severity: Severity::Warning,
            title: "System-Wide High Backlog".to_string(),
            description: format!(
                "SYSTEM BACKLOG HIGH\n\nQueue system has **{total_backlog}** messages pending!\n\nMultiple queues experiencing backlogs.\n\nSuggestion: Scale consumers or optimize processing.",
            ),
            value: format!("{total_backlog} messages"),
            threshold: Some(thresholds.backlog.to_string()),
        });
    }

    if core_total > 0 {
        let ratio = core_healthy as f64 / core_total as f64;
        if ratio < thresholds.core_health_ratio {
            conditions.push(Condition {
                kind: AlertKind::SystemFailure,
                severity: Severity::Critical,
                title: "Critical System Failure".to_string(),
                description: format!(
                    "SYSTEM FAILURE\n\nOnly **{core_healthy}/{core_total}** CORE queues are healthy!\n\nImmediate attention required.\n\nImpact: Severe service degradation",
                ),
                value: format!("{core_healthy}/{core_total} healthy"),
                threshold: Some(format!("{:.0}%", thresholds.core_health_ratio * 100.0)),
            });
        }
    }

    conditions
}
