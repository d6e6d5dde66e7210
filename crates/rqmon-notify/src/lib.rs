//! Alert delivery channels.
//!
//! Channels implement [`NotificationChannel`]; the monitor fans each
//! alert out to every configured channel and treats delivery failures
//! as log-and-continue.

pub mod discord;
pub mod error;

use async_trait::async_trait;
use error::Result;
use rqmon_common::types::AlertMessage;

pub use discord::DiscordChannel;
pub use error::NotifyError;

#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, alert: &AlertMessage) -> Result<()>;

    /// Short channel identifier used in logs.
    fn channel_name(&self) -> &str;
}
