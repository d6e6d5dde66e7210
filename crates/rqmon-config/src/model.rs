use crate::error::{ConfigError, Result};
use regex::Regex;
use rqmon_common::types::{Category, ThresholdSet};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// One explicitly configured queue: its category and threshold policy.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueEntry {
    pub category: Category,
    pub thresholds: ThresholdSet,
}

/// A compiled auto-discovery rule. Patterns are evaluated in file order;
/// the first match wins.
#[derive(Debug, Clone)]
pub struct DiscoveryPattern {
    pub pattern: String,
    pub regex: Regex,
    pub category: Category,
}

/// The active queue monitoring configuration. Swapped atomically as a
/// whole on reload; readers always see a complete, validated version.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub queues: BTreeMap<String, QueueEntry>,
    pub patterns: Vec<DiscoveryPattern>,
}

// Raw file shape, matching the queues.json layout.

#[derive(Deserialize)]
struct RawFile {
    queue_monitoring: RawMonitoring,
}

#[derive(Deserialize)]
struct RawMonitoring {
    queues: BTreeMap<String, QueueEntry>,
    #[serde(default)]
    discovery_patterns: Vec<RawPattern>,
}

#[derive(Deserialize)]
struct RawPattern {
    pattern: String,
    category: Category,
}

impl MonitorConfig {
    /// Load and validate a queues file. Rejected wholesale on any error;
    /// a partially valid file never becomes active.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let raw: RawFile = serde_json::from_str(content)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawFile) -> Result<Self> {
        if raw.queue_monitoring.queues.is_empty() {
            return Err(ConfigError::Validation(
                "'queues' section must contain at least one queue".to_string(),
            ));
        }

        let mut patterns = Vec::with_capacity(raw.queue_monitoring.discovery_patterns.len());
        for p in raw.queue_monitoring.discovery_patterns {
            let regex = Regex::new(&p.pattern).map_err(|source| ConfigError::InvalidPattern {
                pattern: p.pattern.clone(),
                source,
            })?;
            patterns.push(DiscoveryPattern {
                pattern: p.pattern,
                regex,
                category: p.category,
            });
        }

        Ok(Self {
            queues: raw.queue_monitoring.queues,
            patterns,
        })
    }

    pub fn queue_count(&self) -> usize {
        self.queues.len()
    }

    pub fn count_by_category(&self, category: Category) -> usize {
        self.queues
            .values()
            .filter(|e| e.category == category)
            .count()
    }

    /// First discovery pattern matching this name, if any.
    pub fn matching_pattern(&self, name: &str) -> Option<&DiscoveryPattern> {
        self.patterns.iter().find(|p| p.regex.is_match(name))
    }
}
