//! Notification sink that writes alerts to the log.

use alerts::{DeliveryError, NotificationSink};
use async_trait::async_trait;
use tracing::info;

/// Stand-in for a chat transport: every alert becomes an `info` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

#[async_trait]
impl NotificationSink for TracingSink {
    async fn send(&self, recipient: &str, text: &str) -> Result<(), DeliveryError> {
        info!(target: "series_sync::alerts", recipient, text, "alert");
        Ok(())
    }
}
