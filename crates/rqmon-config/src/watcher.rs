use crate::model::MonitorConfig;
use std::path::PathBuf;
use std::time::SystemTime;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, sleep, Duration};

/// Watches the queues file and emits freshly loaded configurations over
/// a channel, at most once per underlying change.
///
/// Polls the file's modification time; a short debounce after the first
/// observed change absorbs partial writes before the file is re-read.
/// A file that fails to load is rejected wholesale: the error is logged
/// and no event is emitted, leaving the previous configuration active.
pub struct ConfigWatcher {
    path: PathBuf,
    poll: Duration,
    debounce: Duration,
}

impl ConfigWatcher {
    pub fn new(path: PathBuf, poll: Duration, debounce: Duration) -> Self {
        Self {
            path,
            poll,
            debounce,
        }
    }

    pub async fn run(self, tx: mpsc::Sender<MonitorConfig>, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(path = %self.path.display(), "Configuration watcher started");

        let mut last_modified = self.modified_at();
        let mut tick = interval(self.poll);

        loop {
            tokio::select! {
                _ = tick.tick() => {}
                _ = shutdown.changed() => {
                    tracing::info!("Configuration watcher stopping");
                    return;
                }
            }

            let modified = self.modified_at();
            if modified == last_modified {
                continue;
            }

            // Let the write settle before reading; coalesce rapid saves.
            sleep(self.debounce).await;
            last_modified = self.modified_at();

            match MonitorConfig::load(&self.path) {
                Ok(config) => {
                    tracing::info!(
                        path = %self.path.display(),
                        queues = config.queue_count(),
                        "Configuration file changed, reload queued"
                    );
                    if tx.send(config).await.is_err() {
                        tracing::warn!("Reload channel closed, watcher exiting");
                        return;
                    }
                }
                Err(e) => {
                    tracing::error!(
                        path = %self.path.display(),
                        error = %e,
                        "Configuration reload rejected, keeping previous configuration"
                    );
                }
            }
        }
    }

    fn modified_at(&self) -> Option<SystemTime> {
        std::fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .ok()
    }
}
