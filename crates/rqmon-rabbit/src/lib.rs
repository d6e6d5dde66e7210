//! RabbitMQ statistics collection.
//!
//! The monitor talks to the broker exclusively through
//! [`SnapshotProvider`]; [`client::ManagementClient`] is the production
//! implementation backed by the management HTTP API.

pub mod api;
pub mod client;
pub mod error;

use async_trait::async_trait;
use error::Result;
use rqmon_common::types::QueueSnapshot;
use std::collections::HashMap;

pub use client::ManagementClient;
pub use error::FetchError;

/// Source of per-queue statistics, keyed by queue name.
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    /// Fetch a snapshot of every queue visible on the broker.
    async fn fetch_all(&self) -> Result<HashMap<String, QueueSnapshot>>;

    /// Cheap reachability probe against the broker.
    async fn check_connectivity(&self) -> Result<()>;
}
