use crate::model::MonitorConfig;
use rqmon_common::types::Category;

/// Structural differences between two configuration generations.
#[derive(Debug, Clone, Default)]
pub struct ConfigDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub category_changes: Vec<(String, Category, Category)>,
}

impl ConfigDiff {
    pub fn between(old: &MonitorConfig, new: &MonitorConfig) -> Self {
        let added = new
            .queues
            .keys()
            .filter(|name| !old.queues.contains_key(*name))
            .cloned()
            .collect();

        let removed = old
            .queues
            .keys()
            .filter(|name| !new.queues.contains_key(*name))
            .cloned()
            .collect();

        let category_changes = new
            .queues
            .iter()
            .filter_map(|(name, entry)| {
                let old_entry = old.queues.get(name)?;
                (old_entry.category != entry.category)
                    .then(|| (name.clone(), old_entry.category, entry.category))
            })
            .collect();

        Self {
            added,
            removed,
            category_changes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.category_changes.is_empty()
    }

    /// Human-readable summary for the `configuration_change` alert.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if !self.added.is_empty() {
            parts.push(format!("Added: {}", self.added.join(", ")));
        }
        if !self.removed.is_empty() {
            parts.push(format!("Removed: {}", self.removed.join(", ")));
        }
        if !self.category_changes.is_empty() {
            let changes: Vec<String> = self
                .category_changes
                .iter()
                .map(|(name, old, new)| format!("{name}: {old} -> {new}"))
                .collect();
            parts.push(format!("Category changed: {}", changes.join("; ")));
        }
        parts.join("; ")
    }
}
