//! Best-effort snapshot persistence.

pub mod error;
pub mod influx;

use async_trait::async_trait;
use error::Result;
use rqmon_common::types::{Category, QueueSnapshot};

pub use error::StorageError;
pub use influx::InfluxWriter;

/// Sink for one cycle's worth of queue snapshots.
#[async_trait]
pub trait SnapshotWriter: Send + Sync {
    async fn write(&self, batch: &[(QueueSnapshot, Category)]) -> Result<()>;
}
