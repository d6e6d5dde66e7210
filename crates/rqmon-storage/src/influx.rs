use crate::error::{Result, StorageError};
use crate::SnapshotWriter;
use async_trait::async_trait;
use rqmon_common::types::{Category, QueueSnapshot};
use std::time::Duration;

const MEASUREMENT: &str = "rabbitmq_queue";
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Writes queue snapshots to InfluxDB 2.x using the line protocol.
pub struct InfluxWriter {
    client: reqwest::Client,
    write_url: String,
    token: String,
    environment: String,
}

impl InfluxWriter {
    pub fn new(url: &str, token: &str, org: &str, bucket: &str, environment: &str) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(WRITE_TIMEOUT).build()?;
        Ok(Self {
            client,
            write_url: format!(
                "{}/api/v2/write?org={org}&bucket={bucket}&precision=s",
                url.trim_end_matches('/')
            ),
            token: token.to_string(),
            environment: environment.to_string(),
        })
    }
}

// Line protocol tag values escape comma, space and equals.
fn escape_tag(value: &str) -> String {
    value
        .replace(',', "\\,")
        .replace(' ', "\\ ")
        .replace('=', "\\=")
}

/// Encode one snapshot as a line protocol record.
///
/// Alongside the raw counters, three derived fields are stored so
/// dashboards don't have to recompute them: `total_messages`,
/// `net_rate` (publish minus ack) and `processing_lag_seconds`
/// (ready backlog over delivery rate, 0 when nothing is delivering).
pub fn encode_line(snapshot: &QueueSnapshot, category: Category, environment: &str) -> String {
    let total_messages = snapshot.messages_ready + snapshot.messages_unacked;
    let net_rate = snapshot.publish_rate - snapshot.ack_rate;
    let processing_lag_seconds = if snapshot.deliver_rate > 0.0 {
        snapshot.messages_ready as f64 / snapshot.deliver_rate
    } else {
        0.0
    };

    format!(
        "{MEASUREMENT},queue_name={},category={},environment={} \
         messages_ready={}i,messages_unacked={}i,consumer_count={}i,\
         publish_rate={},deliver_rate={},ack_rate={},\
         total_messages={}i,net_rate={},processing_lag_seconds={} {}",
        escape_tag(&snapshot.name),
        category,
        escape_tag(environment),
        snapshot.messages_ready,
        snapshot.messages_unacked,
        snapshot.consumer_count,
        snapshot.publish_rate,
        snapshot.deliver_rate,
        snapshot.ack_rate,
        total_messages,
        net_rate,
        processing_lag_seconds,
        snapshot.observed_at.timestamp()
    )
}

#[async_trait]
impl SnapshotWriter for InfluxWriter {
    async fn write(&self, batch: &[(QueueSnapshot, Category)]) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let body: String = batch
            .iter()
            .map(|(snapshot, category)| encode_line(snapshot, *category, &self.environment))
            .collect::<Vec<_>>()
            .join("\n");

        let response = self
            .client
            .post(&self.write_url)
            .header("Authorization", format!("Token {}", self.token))
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Api {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(points = batch.len(), "Snapshot batch written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn make_snapshot() -> QueueSnapshot {
        QueueSnapshot {
            name: "orders".to_string(),
            messages_ready: 120,
            messages_unacked: 30,
            consumer_count: 2,
            publish_rate: 10.0,
            deliver_rate: 8.0,
            ack_rate: 7.5,
            observed_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn encodes_tags_fields_and_timestamp() {
        let line = encode_line(&make_snapshot(), Category::Core, "production");
        assert!(line.starts_with(
            "rabbitmq_queue,queue_name=orders,category=CORE,environment=production "
        ));
        assert!(line.contains("messages_ready=120i"));
        assert!(line.contains("messages_unacked=30i"));
        assert!(line.contains("consumer_count=2i"));
        assert!(line.contains("total_messages=150i"));
        assert!(line.contains("net_rate=2.5"));
        assert!(line.contains("processing_lag_seconds=15"));
        assert!(line.ends_with(" 1717243200"));
    }

    #[test]
    fn zero_deliver_rate_reports_zero_lag() {
        let mut snapshot = make_snapshot();
        snapshot.deliver_rate = 0.0;
        let line = encode_line(&snapshot, Category::Support, "staging");
        assert!(line.contains("processing_lag_seconds=0"));
        assert!(line.contains("category=SUPPORT"));
    }

    #[test]
    fn tag_values_are_escaped() {
        let mut snapshot = make_snapshot();
        snapshot.name = "dead letter,v2".to_string();
        let line = encode_line(&snapshot, Category::Core, "production");
        assert!(line.contains("queue_name=dead\\ letter\\,v2"));
    }
}
