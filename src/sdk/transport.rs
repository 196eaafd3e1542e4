use crate::protocol::client_events::ClientEvent;
use crate::transport::peer::DataChannel;
use crate::{Result, TRACE_LOG_MAX_BYTES, safe_truncate};
use std::sync::Arc;

/// Serializes client events onto the shared data channel.
///
/// Cloned into every in-flight tool call; frames from different calls may interleave.
#[derive(Clone)]
pub struct EventSender {
    channel: Arc<dyn DataChannel>,
}

impl EventSender {
    #[must_use]
    pub fn new(channel: Arc<dyn DataChannel>) -> Self {
        Self { channel }
    }

    /// Send a client event.
    ///
    /// # Errors
    /// Returns an error if serialization or the channel send fails.
    pub async fn send(&self, event: &ClientEvent) -> Result<()> {
        let json = serde_json::to_string(event)?;
        tracing::trace!(
            channel = self.channel.label(),
            "Sending event: {}",
            safe_truncate(&json, TRACE_LOG_MAX_BYTES)
        );
        self.channel.send_text(json).await
    }
}

impl std::fmt::Debug for EventSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSender").field("channel", &self.channel.label()).finish()
    }
}
