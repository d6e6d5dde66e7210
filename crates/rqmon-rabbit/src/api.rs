//! Wire shapes for the RabbitMQ management API.
//!
//! Only the fields the monitor reads are deserialized; everything else
//! in the (large) management payloads is ignored. Rate fields are
//! nested under `message_stats.*_details.rate` and are absent entirely
//! for idle queues, so every level defaults.

use chrono::{DateTime, Utc};
use rqmon_common::types::QueueSnapshot;
use serde::Deserialize;

/// One element of `GET /api/queues`.
#[derive(Debug, Deserialize)]
pub struct ApiQueue {
    pub name: String,
    #[serde(default)]
    pub messages_ready: u64,
    #[serde(default)]
    pub messages_unacknowledged: u64,
    #[serde(default)]
    pub consumers: u64,
    #[serde(default)]
    pub message_stats: MessageStats,
}

#[derive(Debug, Default, Deserialize)]
pub struct MessageStats {
    #[serde(default)]
    pub publish_details: RateDetails,
    #[serde(default)]
    pub deliver_get_details: RateDetails,
    #[serde(default)]
    pub ack_details: RateDetails,
}

#[derive(Debug, Default, Deserialize)]
pub struct RateDetails {
    #[serde(default)]
    pub rate: f64,
}

impl ApiQueue {
    pub fn into_snapshot(self, observed_at: DateTime<Utc>) -> QueueSnapshot {
        QueueSnapshot {
            name: self.name,
            messages_ready: self.messages_ready,
            messages_unacked: self.messages_unacknowledged,
            consumer_count: self.consumers,
            publish_rate: self.message_stats.publish_details.rate,
            deliver_rate: self.message_stats.deliver_get_details.rate,
            ack_rate: self.message_stats.ack_details.rate,
            observed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Trimmed from a real management API response.
    const QUEUES_PAYLOAD: &str = r#"[
        {
            "name": "orders",
            "messages_ready": 42,
            "messages_unacknowledged": 3,
            "consumers": 2,
            "message_stats": {
                "publish_details": { "rate": 5.2 },
                "deliver_get_details": { "rate": 4.8 },
                "ack_details": { "rate": 4.6 }
            },
            "vhost": "/",
            "durable": true
        },
        {
            "name": "idle_queue",
            "messages_ready": 0,
            "messages_unacknowledged": 0,
            "consumers": 0
        }
    ]"#;

    #[test]
    fn parses_active_and_idle_queues() {
        let queues: Vec<ApiQueue> = serde_json::from_str(QUEUES_PAYLOAD).unwrap();
        assert_eq!(queues.len(), 2);

        let now = Utc::now();
        let orders = queues
            .into_iter()
            .map(|q| q.into_snapshot(now))
            .next()
            .unwrap();
        assert_eq!(orders.name, "orders");
        assert_eq!(orders.messages_ready, 42);
        assert_eq!(orders.messages_unacked, 3);
        assert_eq!(orders.consumer_count, 2);
        assert!((orders.publish_rate - 5.2).abs() < f64::EPSILON);
        assert!((orders.ack_rate - 4.6).abs() < f64::EPSILON);
    }

    #[test]
    fn idle_queue_defaults_all_rates_to_zero() {
        let queues: Vec<ApiQueue> = serde_json::from_str(QUEUES_PAYLOAD).unwrap();
        let idle = queues.into_iter().nth(1).unwrap().into_snapshot(Utc::now());
        assert_eq!(idle.publish_rate, 0.0);
        assert_eq!(idle.deliver_rate, 0.0);
        assert_eq!(idle.ack_rate, 0.0);
        assert_eq!(idle.consumer_count, 0);
    }
}
