use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use chrono::Utc;
use rqmon_alert::engine::SystemThresholds;
use rqmon_alert::tracker::AlertTracker;
use rqmon_config::classify::Classifier;
use rqmon_config::discovery::Discovery;
use rqmon_config::model::MonitorConfig;
use rqmon_config::watcher::ConfigWatcher;
use rqmon_notify::{DiscordChannel, NotificationChannel};
use rqmon_rabbit::{ManagementClient, SnapshotProvider};
use rqmon_storage::{InfluxWriter, SnapshotWriter};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing_subscriber::EnvFilter;

use rqmon_server::config::ServerConfig;
use rqmon_server::monitor::{Monitor, Notifier};
use rqmon_server::state::AppState;
use rqmon_server::{health, reload};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("rqmon=info".parse()?))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let config_path = args
        .get(1)
        .map(String::as_str)
        .unwrap_or("config/server.toml");
    let server_config = ServerConfig::load(Path::new(config_path))
        .with_context(|| format!("Failed to load server config from {config_path}"))?;

    let queues_path = Path::new(&server_config.monitor.queues_file).to_path_buf();
    let monitor_config = MonitorConfig::load(&queues_path).with_context(|| {
        format!(
            "Failed to load queue configuration from {}",
            queues_path.display()
        )
    })?;
    tracing::info!(
        queues = monitor_config.queue_count(),
        patterns = monitor_config.patterns.len(),
        "Queue configuration loaded"
    );

    let rabbit = &server_config.rabbitmq;
    let target = format!("{}:{}", rabbit.host, rabbit.port);
    let provider: Arc<dyn SnapshotProvider> = Arc::new(ManagementClient::new(
        &rabbit.host,
        rabbit.port,
        &rabbit.username,
        &rabbit.password,
    )?);

    // Unreachable broker at startup is fatal; mid-run failures only
    // degrade individual cycles.
    provider
        .check_connectivity()
        .await
        .with_context(|| format!("RabbitMQ management API unreachable at {target}"))?;
    tracing::info!(target = %target, "Connected to RabbitMQ management API");

    let mut channels: Vec<Box<dyn NotificationChannel>> = Vec::new();
    if let Some(webhook_url) = &server_config.discord.webhook_url {
        channels.push(Box::new(DiscordChannel::new(webhook_url)?));
    }
    if channels.is_empty() {
        tracing::warn!("No notification channels configured, alerts will only be logged");
    }
    let notifier = Arc::new(Notifier::new(channels));

    let writer: Option<Arc<dyn SnapshotWriter>> = if server_config.influx.enabled {
        let influx = &server_config.influx;
        Some(Arc::new(InfluxWriter::new(
            &influx.url,
            &influx.token,
            &influx.org,
            &influx.bucket,
            &server_config.monitor.environment,
        )?))
    } else {
        None
    };

    let config = Arc::new(ArcSwap::from_pointee(monitor_config));
    let classifier = Arc::new(Classifier::new());
    let tracker = Arc::new(Mutex::new(AlertTracker::new(chrono::Duration::seconds(
        server_config.monitor.cooldown_secs as i64,
    ))));

    let state = AppState {
        config: config.clone(),
        classifier: classifier.clone(),
        tracker,
        provider,
        started_at: Utc::now(),
        target,
        collection_interval_secs: server_config.monitor.collection_interval_secs,
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let (reload_tx, reload_rx) = mpsc::channel(8);
    let watcher = ConfigWatcher::new(
        queues_path,
        Duration::from_secs(server_config.monitor.config_poll_secs),
        Duration::from_millis(server_config.monitor.config_debounce_ms),
    );
    tokio::spawn(watcher.run(reload_tx, shutdown_rx.clone()));
    tokio::spawn(reload::run(
        reload_rx,
        config,
        classifier,
        notifier.clone(),
    ));

    let health_addr = SocketAddr::from(([0, 0, 0, 0], server_config.health.port));
    let listener = tokio::net::TcpListener::bind(health_addr)
        .await
        .with_context(|| format!("Failed to bind health responder on {health_addr}"))?;
    tracing::info!(addr = %health_addr, "Health responder listening");
    let health_app = health::router(state.clone());
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, health_app).await {
            tracing::error!(error = %e, "Health responder terminated");
        }
    });

    let monitor = Monitor::new(
        state,
        notifier,
        writer,
        Discovery::new(server_config.discovery.enabled),
        SystemThresholds {
            backlog: server_config.monitor.system_backlog_threshold,
            core_health_ratio: server_config.monitor.core_health_ratio,
        },
    );
    let monitor_handle = tokio::spawn(monitor.run(shutdown_rx));

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutdown signal received");
    let _ = shutdown_tx.send(true);
    let _ = monitor_handle.await;

    Ok(())
}
