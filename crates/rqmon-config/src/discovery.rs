use crate::classify::Classifier;
use crate::model::{MonitorConfig, QueueEntry};
use rqmon_common::types::ThresholdSet;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Result of one discovery pass.
#[derive(Debug, Clone)]
pub struct DiscoveryOutcome {
    /// Explicit names unioned with pattern-matched live names.
    pub monitored: BTreeSet<String>,
    /// Names seen for the first time since monitoring started.
    pub newly_seen: Vec<String>,
}

/// Auto-enrollment of queues matching discovery patterns.
///
/// Tracks which names have been seen across cycles and keeps a registry
/// of entries for discovered queues that have no explicit configuration.
/// The registry survives configuration reloads; discovered queues are
/// not part of the configured map.
pub struct Discovery {
    enabled: bool,
    seen: HashSet<String>,
    registered: HashMap<String, QueueEntry>,
}

impl Discovery {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            seen: HashSet::new(),
            registered: HashMap::new(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Compute the monitored set for this cycle and register any newly
    /// seen names. When discovery is disabled the monitored set is the
    /// explicit names exactly and no registration occurs.
    pub fn discover<'a>(
        &mut self,
        config: &MonitorConfig,
        live_universe: impl Iterator<Item = &'a str>,
        classifier: &Classifier,
    ) -> DiscoveryOutcome {
        let mut monitored: BTreeSet<String> = config.queues.keys().cloned().collect();

        if !self.enabled {
            return DiscoveryOutcome {
                monitored,
                newly_seen: Vec::new(),
            };
        }

        for name in live_universe {
            if !monitored.contains(name) && config.matching_pattern(name).is_some() {
                monitored.insert(name.to_string());
            }
        }

        let mut newly_seen = Vec::new();
        for name in &monitored {
            if self.seen.insert(name.clone()) {
                newly_seen.push(name.clone());
                if !config.queues.contains_key(name) {
                    self.register(name, config, classifier);
                }
            }
        }

        DiscoveryOutcome {
            monitored,
            newly_seen,
        }
    }

    fn register(&mut self, name: &str, config: &MonitorConfig, classifier: &Classifier) {
        let category = classifier.classify(name, config);
        tracing::info!(queue = %name, category = %category, "Registered discovered queue");
        self.registered.insert(
            name.to_string(),
            QueueEntry {
                category,
                thresholds: ThresholdSet::default_for(category),
            },
        );
    }

    /// Effective entry for a monitored name: explicit configuration first,
    /// then the discovery registry.
    pub fn entry<'a>(&'a self, name: &str, config: &'a MonitorConfig) -> Option<&'a QueueEntry> {
        config.queues.get(name).or_else(|| self.registered.get(name))
    }
}
