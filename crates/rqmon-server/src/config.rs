use serde::Deserialize;
use std::path::Path;

/// Top-level server configuration, loaded once per run from TOML.
///
/// Per-queue monitoring policy lives in the separate queues file
/// (see `monitor.queues_file`), which is hot-reloaded; this file is not.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub rabbitmq: RabbitConfig,
    #[serde(default)]
    pub monitor: MonitorSettings,
    #[serde(default)]
    pub discovery: DiscoverySettings,
    #[serde(default)]
    pub health: HealthSettings,
    #[serde(default)]
    pub discord: DiscordSettings,
    #[serde(default)]
    pub influx: InfluxSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RabbitConfig {
    pub host: String,
    #[serde(default = "default_management_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitorSettings {
    #[serde(default = "default_collection_interval_secs")]
    pub collection_interval_secs: u64,
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    #[serde(default = "default_queues_file")]
    pub queues_file: String,
    #[serde(default = "default_system_backlog_threshold")]
    pub system_backlog_threshold: u64,
    #[serde(default = "default_core_health_ratio")]
    pub core_health_ratio: f64,
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default = "default_config_poll_secs")]
    pub config_poll_secs: u64,
    #[serde(default = "default_config_debounce_ms")]
    pub config_debounce_ms: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscoverySettings {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthSettings {
    #[serde(default = "default_health_port")]
    pub port: u16,
}

/// Discord delivery is enabled by supplying a webhook URL.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscordSettings {
    #[serde(default)]
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InfluxSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub org: String,
    #[serde(default)]
    pub bucket: String,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            collection_interval_secs: default_collection_interval_secs(),
            cooldown_secs: default_cooldown_secs(),
            queues_file: default_queues_file(),
            system_backlog_threshold: default_system_backlog_threshold(),
            core_health_ratio: default_core_health_ratio(),
            environment: default_environment(),
            config_poll_secs: default_config_poll_secs(),
            config_debounce_ms: default_config_debounce_ms(),
        }
    }
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            port: default_health_port(),
        }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }
}

fn default_management_port() -> u16 {
    15672
}

fn default_collection_interval_secs() -> u64 {
    15
}

fn default_cooldown_secs() -> u64 {
    300
}

fn default_queues_file() -> String {
    "config/queues.json".to_string()
}

fn default_system_backlog_threshold() -> u64 {
    10_000
}

fn default_core_health_ratio() -> f64 {
    0.5
}

fn default_environment() -> String {
    "production".to_string()
}

fn default_config_poll_secs() -> u64 {
    2
}

fn default_config_debounce_ms() -> u64 {
    500
}

fn default_health_port() -> u16 {
    8080
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_fills_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            [rabbitmq]
            host = "mq.internal"
            username = "monitor"
            password = "secret"
            "#,
        )
        .unwrap();

        assert_eq!(config.rabbitmq.port, 15672);
        assert_eq!(config.monitor.collection_interval_secs, 15);
        assert_eq!(config.monitor.cooldown_secs, 300);
        assert_eq!(config.monitor.system_backlog_threshold, 10_000);
        assert!((config.monitor.core_health_ratio - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.monitor.environment, "production");
        assert!(!config.discovery.enabled);
        assert_eq!(config.health.port, 8080);
        assert!(config.discord.webhook_url.is_none());
        assert!(!config.influx.enabled);
    }

    #[test]
    fn full_config_overrides_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            [rabbitmq]
            host = "mq.internal"
            port = 15673
            username = "monitor"
            password = "secret"

            [monitor]
            collection_interval_secs = 30
            cooldown_secs = 600
            system_backlog_threshold = 50000
            core_health_ratio = 0.75
            environment = "staging"

            [discovery]
            enabled = true

            [health]
            port = 9090

            [discord]
            webhook_url = "https://discord.com/api/webhooks/x/y"

            [influx]
            enabled = true
            url = "http://influx:8086"
            token = "t"
            org = "ops"
            bucket = "rabbitmq"
            "#,
        )
        .unwrap();

        assert_eq!(config.rabbitmq.port, 15673);
        assert_eq!(config.monitor.collection_interval_secs, 30);
        assert_eq!(config.monitor.cooldown_secs, 600);
        assert_eq!(config.monitor.system_backlog_threshold, 50_000);
        assert!(config.discovery.enabled);
        assert_eq!(config.health.port, 9090);
        assert!(config.discord.webhook_url.is_some());
        assert!(config.influx.enabled);
    }
}
