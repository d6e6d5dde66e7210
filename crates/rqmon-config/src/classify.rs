use crate::model::MonitorConfig;
use rqmon_common::types::Category;
use std::collections::HashMap;
use std::sync::Mutex;

/// Assigns each queue name a [`Category`].
///
/// Resolution order: explicit configuration entry, then first matching
/// discovery pattern, then default SUPPORT. Results are cached per name
/// for the lifetime of the current configuration generation; the cache
/// is invalidated wholesale on reload.
pub struct Classifier {
    cache: Mutex<HashMap<String, Category>>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier {
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn classify(&self, name: &str, config: &MonitorConfig) -> Category {
        let mut cache = self.cache.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(category) = cache.get(name) {
            return *category;
        }

        let category = config
            .queues
            .get(name)
            .map(|entry| entry.category)
            .or_else(|| config.matching_pattern(name).map(|p| p.category))
            .unwrap_or(Category::Support);

        cache.insert(name.to_string(), category);
        category
    }

    /// Drop all cached classifications. Called on configuration reload,
    /// since categories may have changed meaning.
    pub fn invalidate(&self) {
        self.cache
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clear();
    }
}
