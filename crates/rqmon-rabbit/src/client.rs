use crate::api::ApiQueue;
use crate::error::{FetchError, Result};
use crate::SnapshotProvider;
use async_trait::async_trait;
use chrono::Utc;
use rqmon_common::types::QueueSnapshot;
use std::collections::HashMap;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the RabbitMQ management API.
///
/// One snapshot call covers every queue on the broker; there is no
/// per-queue request amplification.
pub struct ManagementClient {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl ManagementClient {
    pub fn new(host: &str, port: u16, username: &str, password: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: format!("http://{host}:{port}"),
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl SnapshotProvider for ManagementClient {
    async fn fetch_all(&self) -> Result<HashMap<String, QueueSnapshot>> {
        let response = self.get("/api/queues").await?;
        let queues: Vec<ApiQueue> = response.json().await?;
        let observed_at = Utc::now();

        tracing::debug!(count = queues.len(), "Fetched queue statistics");

        Ok(queues
            .into_iter()
            .map(|q| {
                let snapshot = q.into_snapshot(observed_at);
                (snapshot.name.clone(), snapshot)
            })
            .collect())
    }

    async fn check_connectivity(&self) -> Result<()> {
        self.get("/api/overview").await?;
        Ok(())
    }
}
