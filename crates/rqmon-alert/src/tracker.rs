use chrono::{DateTime, Duration, Utc};
use rqmon_common::types::{AlertKey, AlertKind, QueueSnapshot, ThresholdSet};
use std::collections::HashMap;

/// Fraction of the high-backlog threshold a queue must drop below
/// before it is considered recovered.
const RECOVERY_BACKLOG_FRACTION: f64 = 0.3;

/// Absolute ready-message ceiling for recovery regardless of threshold.
const RECOVERY_BACKLOG_CEILING: u64 = 50;

/// Per-key alert state: created on first emission, updated on each
/// permitted re-fire, marked resolved once the recovery predicate holds.
#[derive(Debug, Clone)]
pub struct AlertRecord {
    pub kind: AlertKind,
    pub queue: Option<String>,
    pub first_fired_at: DateTime<Utc>,
    pub last_sent_at: DateTime<Utc>,
    pub resolved: bool,
}

/// Outcome of driving the tracker with a true condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    /// Notification should be sent; the record was created or refreshed.
    Sent,
    /// Condition still true but within the cooldown window; no notification.
    Suppressed,
}

/// A record that just transitioned to RESOLVED. Carries how long the
/// condition was active, for the resolution notification.
#[derive(Debug, Clone)]
pub struct ResolvedAlert {
    pub kind: AlertKind,
    pub queue: String,
    pub active_for: Duration,
}

/// The per-key alert lifecycle state machine.
///
/// States are implicit in the record map: no record is ABSENT, an
/// unresolved record inside the cooldown window is SUPPRESSED, outside
/// it FIRING, and `resolved` marks RESOLVED (terminal until re-armed by
/// a fresh firing). Cooldown is honored per key independently.
pub struct AlertTracker {
    records: HashMap<AlertKey, AlertRecord>,
    cooldown: Duration,
}

impl AlertTracker {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            records: HashMap::new(),
            cooldown,
        }
    }

    /// Drive the state machine with a condition that evaluated true.
    ///
    /// Check-cooldown-then-update is a single read-modify-write; callers
    /// hold the tracker behind a mutex so overlapping evaluations of the
    /// same key cannot both decide to fire.
    pub fn try_fire(&mut self, key: &AlertKey, now: DateTime<Utc>) -> FireOutcome {
        match self.records.get_mut(key) {
            None => {
                self.records.insert(
                    key.clone(),
                    AlertRecord {
                        kind: key.kind,
                        queue: key.queue.clone(),
                        first_fired_at: now,
                        last_sent_at: now,
                        resolved: false,
                    },
                );
                FireOutcome::Sent
            }
            Some(record) if record.resolved => {
                // Re-arm: fresh firing of a previously resolved condition.
                record.first_fired_at = now;
                record.last_sent_at = now;
                record.resolved = false;
                FireOutcome::Sent
            }
            Some(record) => {
                if now - record.last_sent_at >= self.cooldown {
                    record.last_sent_at = now;
                    FireOutcome::Sent
                } else {
                    FireOutcome::Suppressed
                }
            }
        }
    }

    /// The recovery predicate: backlog well below threshold, consumers
    /// active, and the queue at a reasonable absolute size.
    pub fn recovered(snapshot: &QueueSnapshot, thresholds: &ThresholdSet) -> bool {
        (snapshot.messages_ready as f64)
            < thresholds.high_backlog as f64 * RECOVERY_BACKLOG_FRACTION
            && snapshot.consumer_count > 0
            && snapshot.messages_ready < RECOVERY_BACKLOG_CEILING
    }

    /// Resolve every unresolved record for this queue if the recovery
    /// predicate holds. Runs before threshold evaluation each cycle so a
    /// resolution and a fresh firing cannot race in contradictory order.
    /// Returns at most one [`ResolvedAlert`] per key.
    pub fn check_recovery(
        &mut self,
        snapshot: &QueueSnapshot,
        thresholds: &ThresholdSet,
    ) -> Vec<ResolvedAlert> {
        if !Self::recovered(snapshot, thresholds) {
            return Vec::new();
        }

        let mut resolved = Vec::new();
        for record in self.records.values_mut() {
            if record.resolved || record.queue.as_deref() != Some(snapshot.name.as_str()) {
                continue;
            }
            record.resolved = true;
            resolved.push(ResolvedAlert {
                kind: record.kind,
                queue: snapshot.name.clone(),
                active_for: snapshot.observed_at - record.first_fired_at,
            });
        }
        resolved
    }

    /// Number of unresolved records, for the health responder.
    pub fn active_count(&self) -> usize {
        self.records.values().filter(|r| !r.resolved).count()
    }

    #[cfg(test)]
    pub(crate) fn record(&self, key: &AlertKey) -> Option<&AlertRecord> {
        self.records.get(key)
    }
}
