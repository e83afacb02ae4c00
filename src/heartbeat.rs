//! Heartbeat keepalive protocol.
//!
//! The remote side periodically sends a request and expects an
//! acknowledgement in return; missing a window means either the channel or
//! the remote heartbeat service is dead, so a failed exchange is fatal to the
//! session loop rather than retried. The message encoding is owned by the
//! channel implementation, the engine only sets and reads the single command
//! field.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Bounded wait for each heartbeat request.
pub const RECEIVE_TIMEOUT: Duration = Duration::from_secs(15);

/// The structured heartbeat message. Requests carry `Marco`, acknowledgements
/// answer `Polo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatMessage {
    #[serde(rename = "Command")]
    pub command: String,
}

impl HeartbeatMessage {
    pub fn marco() -> Self {
        HeartbeatMessage {
            command: "Marco".to_string(),
        }
    }

    pub fn polo() -> Self {
        HeartbeatMessage {
            command: "Polo".to_string(),
        }
    }
}

/// Bidirectional conduit to a device's heartbeat service.
#[async_trait]
pub trait HeartbeatChannel: Send {
    /// Waits for the next request, up to `timeout`.
    async fn receive(&mut self, timeout: Duration) -> Result<HeartbeatMessage>;

    /// Sends a message to the remote side.
    async fn send(&mut self, message: &HeartbeatMessage) -> Result<()>;
}

/// Runs one request/acknowledgement exchange. Both legs must succeed for the
/// exchange to count; any error aborts the calling session's loop.
pub async fn exchange(channel: &mut dyn HeartbeatChannel) -> Result<()> {
    let request = channel.receive(RECEIVE_TIMEOUT).await?;
    log::trace!("heartbeat request: {}", request.command);
    channel.send(&HeartbeatMessage::polo()).await
}
